//! Core domain logic for the rentsplit payout-distribution engine.
//! This crate is the single source of truth for allocation invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::asset::{Asset, AssetId, BeneficiaryId, Ownership};
pub use model::beneficiary::{Beneficiary, ComplianceStatus};
pub use model::distribution::{Allocation, AllocationId, Distribution, DistributionId};
pub use model::money::Money;
pub use model::period::{InvalidPeriod, Period};
pub use repo::asset_repo::{AssetHoldings, AssetRepository, OwnershipStake, SqliteAssetRepository};
pub use repo::distribution_repo::{
    DistributionBundle, DistributionRepository, NewAllocation, SqliteDistributionRepository,
};
pub use repo::lock_repo::{LockRepository, SqliteLockRepository};
pub use repo::{RepoError, RepoResult};
pub use service::allocation::{
    allocate, AllocationError, AllocationLine, AllocationOutcome, ShareBasis, ShareInput,
};
pub use service::eligibility::split_by_compliance;
pub use service::engine::{
    AssetOutcome, DistributionEngine, EngineConfig, EngineError, RunReport, SkipReason,
};
pub use service::lock_manager::{LockLease, LockManager, DEFAULT_LOCK_TTL};
pub use service::share_validator::{validate_share_total, ShareMismatch};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
