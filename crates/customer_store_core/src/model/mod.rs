//! Customer domain model.
//!
//! # Responsibility
//! - Define the canonical customer record and its audit metadata.
//! - Define the probe shape used for query-by-example lookups.
//!
//! # Invariants
//! - Identity and audit metadata are assigned by the store, never by callers.
//! - `version == 0` iff a record has never been updated since creation.

pub mod customer;
