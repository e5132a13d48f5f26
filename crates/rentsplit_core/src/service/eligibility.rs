//! Compliance-based eligibility filtering.
//!
//! # Responsibility
//! - Split ownership stakes into eligible and excluded sets at
//!   evaluation time.
//!
//! # Invariants
//! - Excluded stakes keep their original percentage so the caller can
//!   compute the withheld remainder instead of discarding it.

use crate::repo::asset_repo::OwnershipStake;

/// Splits stakes by compliance status: approved beneficiaries are
/// eligible, everyone else is excluded.
pub fn split_by_compliance(
    stakes: &[OwnershipStake],
) -> (Vec<OwnershipStake>, Vec<OwnershipStake>) {
    stakes
        .iter()
        .cloned()
        .partition(|stake| stake.beneficiary.compliance_status.is_approved())
}
