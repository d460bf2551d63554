//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: string-backed identifiers for tasks, sessions, barriers and strategies
//! - [`score`]: helpers for values constrained to the `[0, 1]` interval
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
pub mod score;
pub mod string;
