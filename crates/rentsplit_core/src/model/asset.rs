//! Asset and ownership records.
//!
//! # Responsibility
//! - Define the income-generating asset and its fractional ownerships.
//!
//! # Invariants
//! - Assets are immutable within a distribution run; only external
//!   asset-management flows mutate them.
//! - Active ownership percentages of one asset must sum to 100 (±0.01);
//!   this is enforced by the share validator, never assumed.

use crate::model::money::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an asset.
pub type AssetId = Uuid;

/// Stable identifier for a beneficiary.
pub type BeneficiaryId = Uuid;

/// Income-generating property or holding distributing periodic payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Owning-tenant identifier; an opaque external key.
    pub tenant_id: String,
    /// Payable amount for one period, in minor units.
    pub monthly_rent: Money,
}

/// A beneficiary's fractional claim on one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    pub asset_id: AssetId,
    pub beneficiary_id: BeneficiaryId,
    /// Share of the asset's payout, 0–100.
    pub share_percent: f64,
    /// Inactive ownerships are ignored by distribution runs.
    pub active: bool,
}
