//! Append-only audit trail records.
//!
//! # Responsibility
//! - Describe completed or skipped distribution actions for compliance
//!   traceability.
//!
//! # Invariants
//! - Audit records are never mutated or deleted by this core.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Action label for a persisted audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RentDistributed,
    DistributionSkipped,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RentDistributed => "rent_distributed",
            Self::DistributionSkipped => "distribution_skipped",
        }
    }
}

/// Immutable entry describing one distribution action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    /// Kind of the referenced entity, e.g. `asset`.
    pub entity_type: &'static str,
    pub entity_id: String,
    pub tenant_id: String,
    /// Free-form structured context (period, amounts, reasons).
    pub metadata: Value,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        entity_type: &'static str,
        entity_id: impl Into<String>,
        tenant_id: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            entity_type,
            entity_id: entity_id.into(),
            tenant_id: tenant_id.into(),
            metadata,
        }
    }
}
