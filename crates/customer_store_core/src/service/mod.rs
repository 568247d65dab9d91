//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Carry the acting-auditor context into every write.

pub mod customer_service;
