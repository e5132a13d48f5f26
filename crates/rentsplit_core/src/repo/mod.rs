//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the engine.
//! - Isolate SQL details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`DuplicateDistribution`) in
//!   addition to DB transport errors.
//! - Repositories share one `&Connection`; write paths use
//!   `unchecked_transaction` because a run is single-threaded per
//!   connection.

use crate::db::DbError;
use crate::model::asset::AssetId;
use crate::model::period::Period;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod asset_repo;
pub mod distribution_repo;
pub mod lock_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for payout persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A distribution already exists for this (asset, period); raised by
    /// the unique-constraint backstop when locking is bypassed.
    DuplicateDistribution { asset_id: AssetId, period: Period },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateDistribution { asset_id, period } => write!(
                f,
                "distribution already exists for asset {asset_id} and period {period}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicateDistribution { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
