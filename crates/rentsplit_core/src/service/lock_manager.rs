//! TTL-bounded cross-process mutual exclusion over durable storage.
//!
//! # Responsibility
//! - Acquire and release the named job lock gating a distribution run.
//! - Reclaim locks whose holder is presumed dead (TTL expired).
//!
//! # Invariants
//! - Acquisition is non-blocking: a live lock means `None`, not a wait.
//! - Reclaim retries are bounded; two racing reclaimers can never
//!   live-lock each other.
//! - Release and reclaim are keyed on the holder's generation token, so
//!   a stale holder cannot remove a lock it no longer owns.

use crate::model::lock::Lock;
use crate::repo::lock_repo::LockRepository;
use crate::repo::RepoResult;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Default exclusive-claim lifetime; a crashed run's lock becomes
/// reclaimable after this long.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30 * 60);

/// Bounded attempts when racing another caller for an expired lock.
const MAX_RECLAIM_ATTEMPTS: u32 = 3;

/// Proof of acquisition; required for release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    lock_id: String,
    lock_name: String,
    token: Uuid,
}

impl LockLease {
    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }
}

/// Named, TTL-bounded mutual exclusion backed by a lock repository.
pub struct LockManager<R: LockRepository> {
    repo: R,
}

impl<R: LockRepository> LockManager<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Attempts to take exclusive ownership of `lock_name` until release
    /// or TTL expiry.
    ///
    /// Returns `Ok(None)` when another run holds a live lock or when
    /// reclaim attempts are exhausted; the caller must treat that as
    /// "another run is in progress", not as an error.
    pub fn acquire(&self, lock_name: &str, ttl: Duration) -> RepoResult<Option<LockLease>> {
        let lock_id = lock_id_for(lock_name);

        for attempt in 1..=MAX_RECLAIM_ATTEMPTS {
            let token = Uuid::new_v4();
            let candidate = Lock {
                lock_id: lock_id.clone(),
                lock_name: lock_name.to_string(),
                token,
                expires_at_ms: now_epoch_ms() + ttl.as_millis() as i64,
            };

            if self.repo.try_create(&candidate)? {
                info!(
                    "event=lock_acquired module=lock status=ok name={lock_name} attempt={attempt}"
                );
                return Ok(Some(LockLease {
                    lock_id,
                    lock_name: lock_name.to_string(),
                    token,
                }));
            }

            match self.repo.find(&lock_id)? {
                Some(existing) if existing.is_expired_at(now_epoch_ms()) => {
                    // Holder presumed dead. Deletion is keyed on the stale
                    // token, so a concurrent reclaimer cannot remove the
                    // row twice; the loop retries the insert either way.
                    let reclaimed = self.repo.delete_if_token(&lock_id, existing.token)?;
                    info!(
                        "event=lock_reclaim module=lock status={} name={lock_name} attempt={attempt}",
                        if reclaimed { "ok" } else { "lost_race" }
                    );
                }
                Some(_) => {
                    info!("event=lock_contended module=lock status=skip name={lock_name}");
                    return Ok(None);
                }
                // Row vanished between insert and read: the holder
                // released. Retry the insert.
                None => {}
            }
        }

        warn!(
            "event=lock_reclaim module=lock status=exhausted name={lock_name} attempts={MAX_RECLAIM_ATTEMPTS}"
        );
        Ok(None)
    }

    /// Releases the lease's lock; a lock already reclaimed by another
    /// holder is left untouched.
    pub fn release(&self, lease: &LockLease) -> RepoResult<bool> {
        let removed = self.repo.delete_if_token(&lease.lock_id, lease.token)?;
        if removed {
            info!(
                "event=lock_release module=lock status=ok name={}",
                lease.lock_name
            );
        } else {
            warn!(
                "event=lock_release module=lock status=skip name={} detail=lock_already_reclaimed",
                lease.lock_name
            );
        }
        Ok(removed)
    }
}

/// Stable digest keying lock rows by name.
pub fn lock_id_for(lock_name: &str) -> String {
    let digest = Sha256::digest(lock_name.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
