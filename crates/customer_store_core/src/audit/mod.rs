//! Auditor tracking.
//!
//! # Responsibility
//! - Hold the identity of the acting user for one service/request context.
//! - Expose a read seam (`AuditorAware`) consulted at save time.
//!
//! # Invariants
//! - There is no process-wide auditor; each context owns its own tracker.

pub mod tracker;
