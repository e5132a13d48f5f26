//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the distribution run use case.
//! - Keep CLI/scheduler layers decoupled from storage details.

pub mod allocation;
pub mod eligibility;
pub mod engine;
pub mod lock_manager;
pub mod share_validator;
