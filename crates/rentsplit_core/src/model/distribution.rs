//! Distribution and allocation records.
//!
//! # Responsibility
//! - Define the persisted outcome of one period's payout for one asset.
//!
//! # Invariants
//! - Exactly one `Distribution` exists per (asset, period); the schema
//!   enforces this with a unique constraint.
//! - The sum of a distribution's allocation amounts equals its
//!   `total_amount` exactly, withheld line included.
//! - Distributions are never updated after creation.

use crate::model::asset::{AssetId, BeneficiaryId};
use crate::model::money::Money;
use crate::model::period::Period;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a distribution.
pub type DistributionId = Uuid;

/// Stable identifier for an allocation line.
pub type AllocationId = Uuid;

/// One period's payout computation for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: DistributionId,
    pub asset_id: AssetId,
    pub period: Period,
    pub total_amount: Money,
    /// Creation timestamp in epoch milliseconds, assigned by storage.
    pub created_at_ms: i64,
}

/// One beneficiary's (or the withheld pool's) amount within a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub distribution_id: DistributionId,
    /// `None` marks the withheld line attributed to no beneficiary,
    /// pending future compliance clearance.
    pub beneficiary_id: Option<BeneficiaryId>,
    /// Share percentage at computation time.
    pub share_percent: f64,
    pub amount: Money,
}

impl Allocation {
    pub fn is_withheld(&self) -> bool {
        self.beneficiary_id.is_none()
    }
}
