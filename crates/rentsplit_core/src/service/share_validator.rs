//! Ownership share-total validation.
//!
//! # Responsibility
//! - Verify that an asset's active ownership percentages sum to 100%
//!   within tolerance before any amount is allocated.
//!
//! # Invariants
//! - A failing asset is skipped by the run, it never aborts the run.

use crate::repo::asset_repo::OwnershipStake;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Expected total of one asset's active share percentages.
pub const FULL_SHARE_TOTAL: f64 = 100.0;

/// Tolerance absorbing representational noise in stored percentages.
pub const SHARE_SUM_TOLERANCE: f64 = 0.01;

/// Share percentages of one asset do not sum to 100%.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareMismatch {
    /// The actual sum observed.
    pub share_total: f64,
}

impl Display for ShareMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ownership percentages sum to {}%, expected {FULL_SHARE_TOTAL}% (±{SHARE_SUM_TOLERANCE})",
            self.share_total
        )
    }
}

impl Error for ShareMismatch {}

/// Validates that the stakes' percentages sum to 100% within tolerance.
pub fn validate_share_total(stakes: &[OwnershipStake]) -> Result<(), ShareMismatch> {
    let share_total: f64 = stakes.iter().map(|s| s.ownership.share_percent).sum();
    if (share_total - FULL_SHARE_TOTAL).abs() > SHARE_SUM_TOLERANCE {
        return Err(ShareMismatch { share_total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_share_total;
    use crate::model::asset::{Asset, Ownership};
    use crate::model::beneficiary::{Beneficiary, ComplianceStatus};
    use crate::model::money::Money;
    use crate::repo::asset_repo::OwnershipStake;
    use uuid::Uuid;

    fn stakes(percentages: &[f64]) -> Vec<OwnershipStake> {
        let asset = Asset {
            id: Uuid::new_v4(),
            tenant_id: "tenant-a".to_string(),
            monthly_rent: Money::from_minor_units(100_000),
        };
        percentages
            .iter()
            .map(|&share_percent| {
                let beneficiary_id = Uuid::new_v4();
                OwnershipStake {
                    ownership: Ownership {
                        asset_id: asset.id,
                        beneficiary_id,
                        share_percent,
                        active: true,
                    },
                    beneficiary: Beneficiary {
                        id: beneficiary_id,
                        compliance_status: ComplianceStatus::Approved,
                    },
                }
            })
            .collect()
    }

    #[test]
    fn accepts_exact_and_tolerated_totals() {
        assert!(validate_share_total(&stakes(&[50.0, 50.0])).is_ok());
        assert!(validate_share_total(&stakes(&[33.33, 33.33, 33.34])).is_ok());
        assert!(validate_share_total(&stakes(&[33.333, 33.333, 33.333])).is_ok());
    }

    #[test]
    fn rejects_mismatched_totals_and_names_the_sum() {
        let err = validate_share_total(&stakes(&[25.0, 25.0])).unwrap_err();
        assert_eq!(err.share_total, 50.0);
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn rejects_empty_stakes() {
        let err = validate_share_total(&stakes(&[])).unwrap_err();
        assert_eq!(err.share_total, 0.0);
    }
}
