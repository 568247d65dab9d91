//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the customer data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Audit stamping happens inside `save`; callers never write audit columns.
//! - Repository APIs return semantic errors (`NotFound`, `VersionConflict`)
//!   in addition to DB transport errors.

pub mod customer_repo;
