//! Proportional allocation with an exact-sum guarantee.
//!
//! # Responsibility
//! - Split a total amount across shares proportionally to their
//!   percentages, in integer minor units.
//!
//! # Invariants
//! - The sum of line amounts equals the target pool exactly; line sum
//!   plus the withheld remainder equals the total exactly.
//! - Rounding differences are settled by largest fractional remainder,
//!   ties broken by ascending beneficiary id for determinism.
//!   Independent per-line rounding can drift by whole minor units and is
//!   not permitted here.

use crate::model::asset::BeneficiaryId;
use crate::model::money::Money;
use crate::service::share_validator::{FULL_SHARE_TOTAL, SHARE_SUM_TOLERANCE};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One beneficiary's percentage entering the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareInput {
    pub beneficiary_id: BeneficiaryId,
    pub share_percent: f64,
}

/// Declares what the caller asserts about the share set.
///
/// The basis is an explicit parameter on purpose: a deliberately partial
/// (eligible-only) subset must opt out of the 100% check at the call
/// site, never implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBasis {
    /// Shares cover the whole asset and must sum to 100% (±0.01); the
    /// whole total is allocated.
    FullCoverage,
    /// Shares are an eligible-only subset; the allocated pool is
    /// `total × Σpercent / 100` and the rest is reported as withheld.
    EligibleSubset,
}

/// One computed allocation line.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationLine {
    pub beneficiary_id: BeneficiaryId,
    pub share_percent: f64,
    pub amount: Money,
}

/// Result of one allocation: lines plus the withheld remainder.
///
/// `lines` sum to `total − withheld` exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub lines: Vec<AllocationLine>,
    pub withheld: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// No shares were provided.
    EmptyInput,
    /// Full-coverage shares do not sum to 100% within tolerance.
    PercentageMismatch { share_total: f64 },
    /// A share percentage is not a finite value in 0–100.
    InvalidShare {
        beneficiary_id: BeneficiaryId,
        share_percent: f64,
    },
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "no shares provided for allocation"),
            Self::PercentageMismatch { share_total } => write!(
                f,
                "share percentages sum to {share_total}%, expected {FULL_SHARE_TOTAL}% (±{SHARE_SUM_TOLERANCE})"
            ),
            Self::InvalidShare {
                beneficiary_id,
                share_percent,
            } => write!(
                f,
                "invalid share percentage {share_percent} for beneficiary {beneficiary_id}"
            ),
        }
    }
}

impl Error for AllocationError {}

/// Allocates `total` across `shares` in minor units.
///
/// Every line starts at its raw amount (`total × percent / 100`) floored
/// to the minor unit; the shortfall against the target pool is then
/// handed out one unit at a time to the largest fractional remainders.
pub fn allocate(
    total: Money,
    shares: &[ShareInput],
    basis: ShareBasis,
) -> Result<AllocationOutcome, AllocationError> {
    if shares.is_empty() {
        return Err(AllocationError::EmptyInput);
    }

    for share in shares {
        let pct = share.share_percent;
        if !pct.is_finite() || pct < 0.0 || pct > FULL_SHARE_TOTAL + SHARE_SUM_TOLERANCE {
            return Err(AllocationError::InvalidShare {
                beneficiary_id: share.beneficiary_id,
                share_percent: pct,
            });
        }
    }

    let share_total: f64 = shares.iter().map(|s| s.share_percent).sum();
    if basis == ShareBasis::FullCoverage
        && (share_total - FULL_SHARE_TOTAL).abs() > SHARE_SUM_TOLERANCE
    {
        return Err(AllocationError::PercentageMismatch { share_total });
    }

    let total_minor = total.minor_units();
    let target_minor = match basis {
        ShareBasis::FullCoverage => total_minor,
        ShareBasis::EligibleSubset => {
            (total_minor as f64 * share_total / FULL_SHARE_TOTAL).round() as i64
        }
    };

    let mut lines = Vec::with_capacity(shares.len());
    let mut remainders = Vec::with_capacity(shares.len());
    let mut floored_sum = 0i64;

    for (index, share) in shares.iter().enumerate() {
        let raw = total_minor as f64 * share.share_percent / FULL_SHARE_TOTAL;
        let floored = raw.floor() as i64;
        floored_sum += floored;
        lines.push(AllocationLine {
            beneficiary_id: share.beneficiary_id,
            share_percent: share.share_percent,
            amount: Money::from_minor_units(floored),
        });
        remainders.push((index, raw - raw.floor()));
    }

    // Largest remainder first; beneficiary id keeps the order total.
    remainders.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| shares[a.0].beneficiary_id.cmp(&shares[b.0].beneficiary_id))
    });

    let mut shortfall = target_minor - floored_sum;

    let one = Money::from_minor_units(1);
    let mut cursor = 0usize;
    while shortfall > 0 {
        let index = remainders[cursor % remainders.len()].0;
        lines[index].amount += one;
        shortfall -= 1;
        cursor += 1;
    }
    // Flooring keeps each line at or below its raw value, so an
    // overshoot can only come from float noise in `raw`; settle it from
    // the smallest remainders.
    cursor = remainders.len();
    while shortfall < 0 {
        cursor = if cursor == 0 {
            remainders.len() - 1
        } else {
            cursor - 1
        };
        let index = remainders[cursor].0;
        if lines[index].amount > Money::ZERO {
            lines[index].amount = lines[index].amount - one;
            shortfall += 1;
        }
    }

    Ok(AllocationOutcome {
        lines,
        withheld: Money::from_minor_units(total_minor - target_minor),
    })
}

#[cfg(test)]
mod tests {
    use super::{allocate, AllocationError, ShareBasis, ShareInput};
    use crate::model::money::Money;
    use uuid::Uuid;

    fn shares(percentages: &[f64]) -> Vec<ShareInput> {
        percentages
            .iter()
            .enumerate()
            .map(|(index, &share_percent)| ShareInput {
                beneficiary_id: Uuid::from_u128(index as u128 + 1),
                share_percent,
            })
            .collect()
    }

    #[test]
    fn empty_shares_are_rejected() {
        let err = allocate(
            Money::from_minor_units(100_000),
            &[],
            ShareBasis::FullCoverage,
        )
        .unwrap_err();
        assert_eq!(err, AllocationError::EmptyInput);
    }

    #[test]
    fn full_coverage_rejects_partial_sums() {
        let err = allocate(
            Money::from_minor_units(100_000),
            &shares(&[25.0, 25.0]),
            ShareBasis::FullCoverage,
        )
        .unwrap_err();
        assert_eq!(err, AllocationError::PercentageMismatch { share_total: 50.0 });
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn eligible_subset_bypasses_the_sum_check() {
        let outcome = allocate(
            Money::from_minor_units(100_000),
            &shares(&[25.0, 25.0]),
            ShareBasis::EligibleSubset,
        )
        .unwrap();

        let allocated: Money = outcome.lines.iter().map(|line| line.amount).sum();
        assert_eq!(allocated, Money::from_minor_units(50_000));
        assert_eq!(outcome.withheld, Money::from_minor_units(50_000));
    }

    #[test]
    fn negative_share_is_rejected() {
        let err = allocate(
            Money::from_minor_units(100_000),
            &shares(&[110.0, -10.0]),
            ShareBasis::FullCoverage,
        )
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidShare { .. }));
    }
}
