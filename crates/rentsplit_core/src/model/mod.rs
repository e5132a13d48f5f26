//! Typed domain records for the payout distribution core.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories and services.
//! - Keep monetary amounts in integer minor units everywhere inside core.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - `Distribution` and `AuditRecord` rows are never updated after creation.

pub mod asset;
pub mod audit;
pub mod beneficiary;
pub mod distribution;
pub mod lock;
pub mod money;
pub mod period;
