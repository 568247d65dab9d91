//! Customer use-case service.
//!
//! # Responsibility
//! - Own the auditor context for one caller and thread it into saves.
//! - Delegate persistence and queries to a `CustomerRepository`.
//!
//! # Invariants
//! - The auditor is read at the moment of each save, never cached per record.
//! - Log lines carry metadata only (ids, versions, counts), never names.

use crate::audit::tracker::{AuditorAware, AuditorId, AuditorTracker};
use crate::model::customer::{Customer, CustomerId, CustomerProbe};
use crate::repo::customer_repo::{CustomerRepository, RepoResult};
use log::{debug, info, warn};
use std::time::Instant;

/// Use-case service wrapping a customer repository and its auditor context.
///
/// `A` defaults to the mutable `AuditorTracker`; any `AuditorAware` source
/// (e.g. one backed by a request session) can be plugged in instead.
pub struct CustomerService<R: CustomerRepository, A: AuditorAware = AuditorTracker> {
    repo: R,
    auditor: A,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service with no auditor set.
    pub fn new(repo: R) -> Self {
        Self::with_auditor(repo, AuditorTracker::new())
    }

    pub fn set_current_auditor(&mut self, auditor: impl Into<AuditorId>) {
        self.auditor.set_current_auditor(auditor);
    }

    pub fn clear_current_auditor(&mut self) {
        self.auditor.clear_current_auditor();
    }
}

impl<R: CustomerRepository, A: AuditorAware> CustomerService<R, A> {
    /// Creates a service reading the acting user from `auditor`.
    pub fn with_auditor(repo: R, auditor: A) -> Self {
        Self { repo, auditor }
    }

    pub fn current_auditor(&self) -> Option<AuditorId> {
        self.auditor.current_auditor()
    }

    /// Inserts or updates `customer`, stamping the current auditor.
    ///
    /// Repository errors (`NotFound`, `VersionConflict`, `Db`) are returned
    /// unchanged.
    pub fn save(&self, customer: &Customer) -> RepoResult<Customer> {
        let started_at = Instant::now();
        let op = if customer.is_new() { "insert" } else { "update" };
        let auditor = self.auditor.current_auditor();

        match self.repo.save(customer, auditor.as_deref()) {
            Ok(saved) => {
                info!(
                    "event=customer_save module=service status=ok op={op} auditor_set={} version={} duration_ms={}",
                    auditor.is_some(),
                    saved.version().unwrap_or_default(),
                    started_at.elapsed().as_millis()
                );
                Ok(saved)
            }
            Err(err) => {
                warn!(
                    "event=customer_save module=service status=error op={op} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    pub fn find_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let customers = self.repo.find_all()?;
        debug!(
            "event=customer_query module=service kind=all hits={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn find_by_first_name(&self, first_name: &str) -> RepoResult<Vec<Customer>> {
        let customers = self.repo.find_by_first_name(first_name)?;
        debug!(
            "event=customer_query module=service kind=first_name hits={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn find_by_last_name(&self, last_name: &str) -> RepoResult<Vec<Customer>> {
        let customers = self.repo.find_by_last_name(last_name)?;
        debug!(
            "event=customer_query module=service kind=last_name hits={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn find_unmodified_customers(&self) -> RepoResult<Vec<Customer>> {
        let customers = self.repo.find_unmodified_customers()?;
        debug!(
            "event=customer_query module=service kind=unmodified hits={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn find_all_by_example(&self, probe: &CustomerProbe) -> RepoResult<Vec<Customer>> {
        let customers = self.repo.find_all_by_example(probe)?;
        debug!(
            "event=customer_query module=service kind=example hits={}",
            customers.len()
        );
        Ok(customers)
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }

    pub fn delete(&self, id: CustomerId) -> RepoResult<()> {
        self.repo.delete(id)?;
        info!("event=customer_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Removes every customer. Irreversible.
    pub fn delete_all(&self) -> RepoResult<u64> {
        let removed = self.repo.delete_all()?;
        info!("event=customer_delete_all module=service status=ok removed={removed}");
        Ok(removed)
    }
}
