//! Beneficiary record and compliance gate.
//!
//! # Responsibility
//! - Mirror the identity/compliance collaborator's view of a beneficiary.
//!
//! # Invariants
//! - Core only reads compliance status; it never transitions it.

use crate::model::asset::BeneficiaryId;
use serde::{Deserialize, Serialize};

/// Compliance gate controlling payout eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl ComplianceStatus {
    /// Only approved beneficiaries receive allocations.
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Party entitled to a share of distributed income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub compliance_status: ComplianceStatus,
}
