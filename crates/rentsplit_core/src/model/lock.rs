//! Durable job-lock record.
//!
//! # Responsibility
//! - Represent the TTL-bounded exclusive claim over one (tenant, period)
//!   run.
//!
//! # Invariants
//! - `lock_id` is a stable digest of `lock_name`; one row per name.
//! - `token` identifies the lock generation; release and reclaim are
//!   keyed on it so a stale holder cannot delete a reclaimed lock.
//! - Not domain data: rows live at most until release or TTL expiry.

use uuid::Uuid;

/// Coordination row gating concurrent distribution runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// Hex digest of `lock_name`; primary key in storage.
    pub lock_id: String,
    /// Human-readable job name, kept for operability.
    pub lock_name: String,
    /// Generation token owned by the current holder.
    pub token: Uuid,
    /// Expiry in epoch milliseconds; past expiry the holder is presumed
    /// dead and the row is reclaimable.
    pub expires_at_ms: i64,
}

impl Lock {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at_ms < now_ms
    }
}
