//! Distribution run orchestration.
//!
//! # Responsibility
//! - Drive one run: lock acquisition, per-asset validation, eligibility
//!   filtering, allocation, transactional persistence, audit, release.
//!
//! # Invariants
//! - A period already distributed for an asset is never reprocessed.
//! - Per-asset errors are contained and reported individually; only
//!   lock-storage and asset-query failures abort the run.
//! - The lock is released on every exit path; release failures are
//!   logged and the TTL remains the liveness backstop.

use crate::model::asset::AssetId;
use crate::model::audit::{AuditAction, AuditRecord};
use crate::model::distribution::DistributionId;
use crate::model::money::Money;
use crate::model::period::Period;
use crate::repo::asset_repo::{AssetHoldings, AssetRepository};
use crate::repo::distribution_repo::{DistributionBundle, DistributionRepository, NewAllocation};
use crate::repo::lock_repo::LockRepository;
use crate::repo::RepoError;
use crate::service::allocation::{allocate, AllocationError, ShareBasis, ShareInput};
use crate::service::eligibility::split_by_compliance;
use crate::service::lock_manager::{LockManager, DEFAULT_LOCK_TTL};
use crate::service::share_validator::validate_share_total;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Exclusive-claim lifetime for the run lock.
    pub lock_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }
}

/// Per-asset outcome within one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetOutcome {
    Distributed {
        asset_id: AssetId,
        distribution_id: DistributionId,
        allocation_count: usize,
        total_amount: Money,
        withheld_amount: Money,
    },
    Skipped {
        asset_id: AssetId,
        reason: SkipReason,
    },
    Failed {
        asset_id: AssetId,
        error: String,
    },
}

/// Why an asset was skipped without a distribution row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ShareMismatch { share_total: f64 },
    NoEligibleBeneficiaries,
    Calculator { message: String },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShareMismatch { share_total } => {
                write!(f, "share percentages sum to {share_total}%, expected 100%")
            }
            Self::NoEligibleBeneficiaries => write!(f, "no beneficiary is compliance-approved"),
            Self::Calculator { message } => write!(f, "{message}"),
        }
    }
}

/// Structured result of one run; serialized as the CLI payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub results: Vec<AssetOutcome>,
}

impl RunReport {
    fn completed(results: Vec<AssetOutcome>) -> Self {
        Self {
            success: true,
            reason: None,
            results,
        }
    }

    fn already_running() -> Self {
        Self {
            success: false,
            reason: Some("already_running".to_string()),
            results: Vec::new(),
        }
    }

    /// Whether the lock could not be acquired.
    pub fn is_already_running(&self) -> bool {
        self.reason.as_deref() == Some("already_running")
    }

    /// Whether any asset failed to persist.
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|outcome| matches!(outcome, AssetOutcome::Failed { .. }))
    }
}

/// Fatal run-level error; per-asset problems never surface here.
#[derive(Debug)]
pub enum EngineError {
    /// The lock table could not be read or written.
    LockStorage(RepoError),
    /// The asset selection query failed.
    Storage(RepoError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockStorage(err) => write!(f, "lock storage failure: {err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LockStorage(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

/// Orchestrates one payout-distribution run.
///
/// Repositories are injected so tests can substitute fakes and so no
/// global database state is involved.
pub struct DistributionEngine<A, D, L>
where
    A: AssetRepository,
    D: DistributionRepository,
    L: LockRepository,
{
    assets: A,
    distributions: D,
    locks: LockManager<L>,
    config: EngineConfig,
}

impl<A, D, L> DistributionEngine<A, D, L>
where
    A: AssetRepository,
    D: DistributionRepository,
    L: LockRepository,
{
    pub fn new(assets: A, distributions: D, locks: LockManager<L>, config: EngineConfig) -> Self {
        Self {
            assets,
            distributions,
            locks,
            config,
        }
    }

    /// Runs one distribution for (tenant, period).
    ///
    /// Lock contention is a normal outcome: the report says
    /// `already_running` and storage is left untouched.
    pub fn run(&self, tenant_id: &str, period: &Period) -> Result<RunReport, EngineError> {
        let lock_name = format!("distribute_rent_{tenant_id}_{period}");

        let lease = match self
            .locks
            .acquire(&lock_name, self.config.lock_ttl)
            .map_err(EngineError::LockStorage)?
        {
            Some(lease) => lease,
            None => {
                info!(
                    "event=run_rejected module=engine status=skip tenant={tenant_id} period={period} reason=already_running"
                );
                return Ok(RunReport::already_running());
            }
        };

        let outcome = self.run_locked(tenant_id, period);

        // Release must happen on every exit path before the result (or
        // error) propagates; a failed release is only logged because the
        // TTL reclaims the row eventually.
        if let Err(err) = self.locks.release(&lease) {
            warn!(
                "event=lock_release module=engine status=error name={} error={err}",
                lease.lock_name()
            );
        }

        outcome
    }

    fn run_locked(&self, tenant_id: &str, period: &Period) -> Result<RunReport, EngineError> {
        let holdings = self
            .assets
            .undistributed_assets(tenant_id, period)
            .map_err(EngineError::Storage)?;

        info!(
            "event=run_start module=engine status=ok tenant={tenant_id} period={period} assets={}",
            holdings.len()
        );

        let mut results = Vec::with_capacity(holdings.len());
        for holding in &holdings {
            results.push(self.process_asset(tenant_id, period, holding));
        }

        let distributed = results
            .iter()
            .filter(|outcome| matches!(outcome, AssetOutcome::Distributed { .. }))
            .count();
        info!(
            "event=run_complete module=engine status=ok tenant={tenant_id} period={period} distributed={distributed} total={}",
            results.len()
        );

        Ok(RunReport::completed(results))
    }

    fn process_asset(
        &self,
        tenant_id: &str,
        period: &Period,
        holding: &AssetHoldings,
    ) -> AssetOutcome {
        let asset = &holding.asset;

        if let Err(mismatch) = validate_share_total(&holding.stakes) {
            warn!(
                "event=asset_skipped module=engine status=skip asset={} share_total={}",
                asset.id, mismatch.share_total
            );
            let reason = SkipReason::ShareMismatch {
                share_total: mismatch.share_total,
            };
            self.audit_skip(tenant_id, asset.id, period, &reason);
            return AssetOutcome::Skipped {
                asset_id: asset.id,
                reason,
            };
        }

        let (eligible, excluded) = split_by_compliance(&holding.stakes);
        if eligible.is_empty() {
            warn!(
                "event=asset_skipped module=engine status=skip asset={} reason=no_eligible_beneficiaries",
                asset.id
            );
            let reason = SkipReason::NoEligibleBeneficiaries;
            self.audit_skip(tenant_id, asset.id, period, &reason);
            return AssetOutcome::Skipped {
                asset_id: asset.id,
                reason,
            };
        }

        let basis = if excluded.is_empty() {
            ShareBasis::FullCoverage
        } else {
            ShareBasis::EligibleSubset
        };
        let shares: Vec<ShareInput> = eligible
            .iter()
            .map(|stake| ShareInput {
                beneficiary_id: stake.ownership.beneficiary_id,
                share_percent: stake.ownership.share_percent,
            })
            .collect();

        let computed = match allocate(asset.monthly_rent, &shares, basis) {
            Ok(computed) => computed,
            Err(err) => {
                // Calculator misuse is fatal to this asset only.
                warn!(
                    "event=asset_skipped module=engine status=skip asset={} error={err}",
                    asset.id
                );
                let reason = match err {
                    AllocationError::EmptyInput => SkipReason::NoEligibleBeneficiaries,
                    other => SkipReason::Calculator {
                        message: other.to_string(),
                    },
                };
                self.audit_skip(tenant_id, asset.id, period, &reason);
                return AssetOutcome::Skipped {
                    asset_id: asset.id,
                    reason,
                };
            }
        };

        let mut allocations: Vec<NewAllocation> = computed
            .lines
            .iter()
            .map(|line| NewAllocation {
                beneficiary_id: Some(line.beneficiary_id),
                share_percent: line.share_percent,
                amount: line.amount,
            })
            .collect();

        if !excluded.is_empty() {
            let withheld_percent: f64 = excluded
                .iter()
                .map(|stake| stake.ownership.share_percent)
                .sum();
            allocations.push(NewAllocation {
                beneficiary_id: None,
                share_percent: withheld_percent,
                amount: computed.withheld,
            });
        }

        let bundle = DistributionBundle {
            tenant_id: tenant_id.to_string(),
            asset_id: asset.id,
            period: period.clone(),
            total_amount: asset.monthly_rent,
            withheld_amount: computed.withheld,
            allocations,
        };

        match self.distributions.persist_distribution(&bundle) {
            Ok(distribution_id) => {
                info!(
                    "event=asset_distributed module=engine status=ok asset={} distribution={} allocations={} total={} withheld={}",
                    asset.id,
                    distribution_id,
                    bundle.allocations.len(),
                    bundle.total_amount,
                    computed.withheld
                );
                AssetOutcome::Distributed {
                    asset_id: asset.id,
                    distribution_id,
                    allocation_count: bundle.allocations.len(),
                    total_amount: bundle.total_amount,
                    withheld_amount: computed.withheld,
                }
            }
            Err(err) => {
                error!(
                    "event=asset_failed module=engine status=error asset={} error={err}",
                    asset.id
                );
                AssetOutcome::Failed {
                    asset_id: asset.id,
                    error: err.to_string(),
                }
            }
        }
    }

    fn audit_skip(&self, tenant_id: &str, asset_id: AssetId, period: &Period, reason: &SkipReason) {
        let record = AuditRecord::new(
            AuditAction::DistributionSkipped,
            "asset",
            asset_id.to_string(),
            tenant_id,
            json!({
                "period": period.as_str(),
                "reason": reason,
            }),
        );
        // Best effort: a skip must stay visible in the run report even
        // when its audit row cannot be written.
        if let Err(err) = self.distributions.append_audit(&record) {
            warn!(
                "event=audit_append module=engine status=error asset={asset_id} error={err}"
            );
        }
    }
}
