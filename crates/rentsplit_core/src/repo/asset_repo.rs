//! Asset read-side repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Select assets still undistributed for a period, with their active
//!   ownerships and each owner's compliance status.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Only `active = 1` ownerships participate in a run.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::asset::{Asset, AssetId, Ownership};
use crate::model::beneficiary::{Beneficiary, ComplianceStatus};
use crate::model::money::Money;
use crate::model::period::Period;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// One asset plus the ownership stakes a run operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHoldings {
    pub asset: Asset,
    pub stakes: Vec<OwnershipStake>,
}

/// Read model joining an ownership with its beneficiary.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipStake {
    pub ownership: Ownership,
    pub beneficiary: Beneficiary,
}

/// Repository interface for the engine's asset read side.
pub trait AssetRepository {
    /// Returns all of the tenant's assets that have no distribution for
    /// `period` yet, each with its active ownership stakes. Ordering is
    /// deterministic (ascending asset id) but not semantically relevant.
    fn undistributed_assets(&self, tenant_id: &str, period: &Period)
        -> RepoResult<Vec<AssetHoldings>>;
}

/// SQLite-backed asset repository.
pub struct SqliteAssetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn stakes_for(&self, asset_id: AssetId) -> RepoResult<Vec<OwnershipStake>> {
        let mut stmt = self.conn.prepare(
            "SELECT o.beneficiary_id, o.share_percent, o.active, b.compliance_status
             FROM ownerships o
             JOIN beneficiaries b ON b.id = o.beneficiary_id
             WHERE o.asset_id = ?1 AND o.active = 1
             ORDER BY o.beneficiary_id ASC;",
        )?;

        let mut rows = stmt.query(params![asset_id.to_string()])?;
        let mut stakes = Vec::new();
        while let Some(row) = rows.next()? {
            stakes.push(parse_stake_row(asset_id, row)?);
        }

        Ok(stakes)
    }
}

impl AssetRepository for SqliteAssetRepository<'_> {
    fn undistributed_assets(
        &self,
        tenant_id: &str,
        period: &Period,
    ) -> RepoResult<Vec<AssetHoldings>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.tenant_id, a.monthly_rent_minor
             FROM assets a
             WHERE a.tenant_id = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM distributions d
                   WHERE d.asset_id = a.id AND d.period = ?2
               )
             ORDER BY a.id ASC;",
        )?;

        let mut rows = stmt.query(params![tenant_id, period.as_str()])?;
        let mut assets = Vec::new();
        while let Some(row) = rows.next()? {
            assets.push(parse_asset_row(row)?);
        }

        let mut holdings = Vec::with_capacity(assets.len());
        for asset in assets {
            let stakes = self.stakes_for(asset.id)?;
            holdings.push(AssetHoldings { asset, stakes });
        }

        Ok(holdings)
    }
}

fn parse_asset_row(row: &Row<'_>) -> RepoResult<Asset> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "assets.id")?;

    Ok(Asset {
        id,
        tenant_id: row.get("tenant_id")?,
        monthly_rent: Money::from_minor_units(row.get("monthly_rent_minor")?),
    })
}

fn parse_stake_row(asset_id: AssetId, row: &Row<'_>) -> RepoResult<OwnershipStake> {
    let beneficiary_text: String = row.get("beneficiary_id")?;
    let beneficiary_id = parse_uuid(&beneficiary_text, "ownerships.beneficiary_id")?;

    let status_text: String = row.get("compliance_status")?;
    let compliance_status = parse_compliance_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid compliance status `{status_text}` in beneficiaries.compliance_status"
        ))
    })?;

    Ok(OwnershipStake {
        ownership: Ownership {
            asset_id,
            beneficiary_id,
            share_percent: row.get("share_percent")?,
            active: row.get::<_, i64>("active")? != 0,
        },
        beneficiary: Beneficiary {
            id: beneficiary_id,
            compliance_status,
        },
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_compliance_status(value: &str) -> Option<ComplianceStatus> {
    match value {
        "pending" => Some(ComplianceStatus::Pending),
        "approved" => Some(ComplianceStatus::Approved),
        "rejected" => Some(ComplianceStatus::Rejected),
        "suspended" => Some(ComplianceStatus::Suspended),
        _ => None,
    }
}
