//! Job-lock repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the atomic row primitives the lock manager is built on.
//!
//! # Invariants
//! - `try_create` relies on the primary key for atomicity; a conflicting
//!   insert reports `false`, it never overwrites.
//! - Deletion is keyed on (lock_id, token) so only the matching lock
//!   generation can be removed.

use crate::model::lock::Lock;
use crate::repo::asset_repo::parse_uuid;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, ErrorCode, Row};
use uuid::Uuid;

/// Repository interface for lock-row operations.
pub trait LockRepository {
    /// Attempts to insert the lock row; `false` means another holder's
    /// row already exists.
    fn try_create(&self, lock: &Lock) -> RepoResult<bool>;

    /// Reads the current lock row for `lock_id`.
    fn find(&self, lock_id: &str) -> RepoResult<Option<Lock>>;

    /// Deletes the lock row only when its token matches; returns whether
    /// a row was removed.
    fn delete_if_token(&self, lock_id: &str, token: Uuid) -> RepoResult<bool>;
}

/// SQLite-backed lock repository.
pub struct SqliteLockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLockRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LockRepository for SqliteLockRepository<'_> {
    fn try_create(&self, lock: &Lock) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO job_locks (lock_id, lock_name, token, expires_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                lock.lock_id,
                lock.lock_name,
                lock.token.to_string(),
                lock.expires_at_ms,
            ],
        );

        match inserted {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find(&self, lock_id: &str) -> RepoResult<Option<Lock>> {
        let mut stmt = self.conn.prepare(
            "SELECT lock_id, lock_name, token, expires_at
             FROM job_locks
             WHERE lock_id = ?1;",
        )?;

        let mut rows = stmt.query(params![lock_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lock_row(row)?));
        }

        Ok(None)
    }

    fn delete_if_token(&self, lock_id: &str, token: Uuid) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM job_locks WHERE lock_id = ?1 AND token = ?2;",
            params![lock_id, token.to_string()],
        )?;

        Ok(removed > 0)
    }
}

fn parse_lock_row(row: &Row<'_>) -> RepoResult<Lock> {
    let token_text: String = row.get("token")?;

    Ok(Lock {
        lock_id: row.get("lock_id")?,
        lock_name: row.get("lock_name")?,
        token: parse_uuid(&token_text, "job_locks.token")?,
        expires_at_ms: row.get("expires_at")?,
    })
}
