//! Distribution write-side repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist one distribution, its allocation lines and the matching
//!   audit record in a single transaction.
//! - Append standalone audit records for skipped assets.
//! - Provide the read-back queries used for verification.
//!
//! # Invariants
//! - A distribution either appears with all of its allocations and its
//!   audit record, or not at all.
//! - A unique-constraint hit on (asset, period) surfaces as
//!   `RepoError::DuplicateDistribution`, never as a partial write.

use crate::model::asset::{AssetId, BeneficiaryId};
use crate::model::audit::{AuditAction, AuditRecord};
use crate::model::distribution::{Allocation, Distribution, DistributionId};
use crate::model::money::Money;
use crate::model::period::Period;
use crate::repo::asset_repo::parse_uuid;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};
use serde_json::json;
use uuid::Uuid;

/// One allocation line awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAllocation {
    /// `None` for the withheld line.
    pub beneficiary_id: Option<BeneficiaryId>,
    pub share_percent: f64,
    pub amount: Money,
}

/// Everything needed to persist one asset's distribution atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBundle {
    pub tenant_id: String,
    pub asset_id: AssetId,
    pub period: Period,
    pub total_amount: Money,
    pub withheld_amount: Money,
    pub allocations: Vec<NewAllocation>,
}

/// Repository interface for the engine's write side.
pub trait DistributionRepository {
    /// Creates the distribution, its allocations and the audit record in
    /// one transaction and returns the new distribution id.
    fn persist_distribution(&self, bundle: &DistributionBundle) -> RepoResult<DistributionId>;

    /// Appends one audit record outside any distribution transaction.
    fn append_audit(&self, record: &AuditRecord) -> RepoResult<()>;

    /// Returns the distribution for (asset, period) when one exists.
    fn find_distribution(
        &self,
        asset_id: AssetId,
        period: &Period,
    ) -> RepoResult<Option<Distribution>>;

    /// Returns a distribution's allocation lines ordered by beneficiary,
    /// withheld line last.
    fn list_allocations(&self, distribution_id: DistributionId) -> RepoResult<Vec<Allocation>>;
}

/// SQLite-backed distribution repository.
pub struct SqliteDistributionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDistributionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DistributionRepository for SqliteDistributionRepository<'_> {
    fn persist_distribution(&self, bundle: &DistributionBundle) -> RepoResult<DistributionId> {
        let distribution_id: DistributionId = Uuid::new_v4();

        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO distributions (id, asset_id, period, total_amount_minor)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                distribution_id.to_string(),
                bundle.asset_id.to_string(),
                bundle.period.as_str(),
                bundle.total_amount.minor_units(),
            ],
        );
        if let Err(err) = inserted {
            return Err(map_distribution_insert_error(err, bundle));
        }

        for allocation in &bundle.allocations {
            tx.execute(
                "INSERT INTO allocations
                     (id, distribution_id, beneficiary_id, share_percent, amount_minor)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    Uuid::new_v4().to_string(),
                    distribution_id.to_string(),
                    allocation.beneficiary_id.map(|id| id.to_string()),
                    allocation.share_percent,
                    allocation.amount.minor_units(),
                ],
            )?;
        }

        let audit = AuditRecord::new(
            AuditAction::RentDistributed,
            "asset",
            bundle.asset_id.to_string(),
            bundle.tenant_id.clone(),
            json!({
                "period": bundle.period.as_str(),
                "distribution_id": distribution_id,
                "total_amount": bundle.total_amount,
                "withheld_amount": bundle.withheld_amount,
                "allocations_count": bundle.allocations.len(),
            }),
        );
        insert_audit(&tx, &audit)?;

        tx.commit()?;
        Ok(distribution_id)
    }

    fn append_audit(&self, record: &AuditRecord) -> RepoResult<()> {
        insert_audit(self.conn, record)
    }

    fn find_distribution(
        &self,
        asset_id: AssetId,
        period: &Period,
    ) -> RepoResult<Option<Distribution>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, asset_id, period, total_amount_minor, created_at
             FROM distributions
             WHERE asset_id = ?1 AND period = ?2;",
        )?;

        let mut rows = stmt.query(params![asset_id.to_string(), period.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_distribution_row(row)?));
        }

        Ok(None)
    }

    fn list_allocations(&self, distribution_id: DistributionId) -> RepoResult<Vec<Allocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, distribution_id, beneficiary_id, share_percent, amount_minor
             FROM allocations
             WHERE distribution_id = ?1
             ORDER BY beneficiary_id IS NULL ASC, beneficiary_id ASC;",
        )?;

        let mut rows = stmt.query(params![distribution_id.to_string()])?;
        let mut allocations = Vec::new();
        while let Some(row) = rows.next()? {
            allocations.push(parse_allocation_row(row)?);
        }

        Ok(allocations)
    }
}

fn insert_audit(conn: &Connection, record: &AuditRecord) -> RepoResult<()> {
    let metadata = serde_json::to_string(&record.metadata)
        .map_err(|err| RepoError::InvalidData(format!("unserializable audit metadata: {err}")))?;

    conn.execute(
        "INSERT INTO audit_records (id, action, entity_type, entity_id, tenant_id, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            record.id.to_string(),
            record.action.as_str(),
            record.entity_type,
            record.entity_id,
            record.tenant_id,
            metadata,
        ],
    )?;

    Ok(())
}

fn map_distribution_insert_error(err: rusqlite::Error, bundle: &DistributionBundle) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return RepoError::DuplicateDistribution {
                asset_id: bundle.asset_id,
                period: bundle.period.clone(),
            };
        }
    }
    err.into()
}

fn parse_distribution_row(row: &Row<'_>) -> RepoResult<Distribution> {
    let id_text: String = row.get("id")?;
    let asset_text: String = row.get("asset_id")?;
    let period_text: String = row.get("period")?;

    let period = Period::parse(&period_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid period value `{period_text}` in distributions.period"
        ))
    })?;

    Ok(Distribution {
        id: parse_uuid(&id_text, "distributions.id")?,
        asset_id: parse_uuid(&asset_text, "distributions.asset_id")?,
        period,
        total_amount: Money::from_minor_units(row.get("total_amount_minor")?),
        created_at_ms: row.get("created_at")?,
    })
}

fn parse_allocation_row(row: &Row<'_>) -> RepoResult<Allocation> {
    let id_text: String = row.get("id")?;
    let distribution_text: String = row.get("distribution_id")?;
    let beneficiary_id = match row.get::<_, Option<String>>("beneficiary_id")? {
        Some(text) => Some(parse_uuid(&text, "allocations.beneficiary_id")?),
        None => None,
    };

    Ok(Allocation {
        id: parse_uuid(&id_text, "allocations.id")?,
        distribution_id: parse_uuid(&distribution_text, "allocations.distribution_id")?,
        beneficiary_id,
        share_percent: row.get("share_percent")?,
        amount: Money::from_minor_units(row.get("amount_minor")?),
    })
}
