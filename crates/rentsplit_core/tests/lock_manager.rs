use rentsplit_core::db::open_db_in_memory;
use rentsplit_core::model::lock::Lock;
use rentsplit_core::service::lock_manager::{lock_id_for, now_epoch_ms};
use rentsplit_core::{LockManager, LockRepository, RepoResult, SqliteLockRepository};
use std::cell::Cell;
use std::time::Duration;
use uuid::Uuid;

const TTL: Duration = Duration::from_secs(60);

#[test]
fn acquire_then_contend() {
    let conn = open_db_in_memory().unwrap();
    let manager = LockManager::new(SqliteLockRepository::new(&conn));

    let lease = manager.acquire("job_a", TTL).unwrap();
    assert!(lease.is_some());

    // Same name is contended; a different name is independent.
    assert!(manager.acquire("job_a", TTL).unwrap().is_none());
    assert!(manager.acquire("job_b", TTL).unwrap().is_some());
}

#[test]
fn release_frees_the_name() {
    let conn = open_db_in_memory().unwrap();
    let manager = LockManager::new(SqliteLockRepository::new(&conn));

    let lease = manager.acquire("job_a", TTL).unwrap().unwrap();
    assert!(manager.release(&lease).unwrap());

    assert!(manager.acquire("job_a", TTL).unwrap().is_some());
}

#[test]
fn expired_lock_is_reclaimed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLockRepository::new(&conn);

    let stale = Lock {
        lock_id: lock_id_for("job_a"),
        lock_name: "job_a".to_string(),
        token: Uuid::new_v4(),
        expires_at_ms: now_epoch_ms() - 1_000,
    };
    assert!(repo.try_create(&stale).unwrap());

    let manager = LockManager::new(SqliteLockRepository::new(&conn));
    let lease = manager.acquire("job_a", TTL).unwrap();
    assert!(lease.is_some(), "expired lock should be reclaimable");
}

#[test]
fn live_lock_is_not_reclaimed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLockRepository::new(&conn);

    let live = Lock {
        lock_id: lock_id_for("job_a"),
        lock_name: "job_a".to_string(),
        token: Uuid::new_v4(),
        expires_at_ms: now_epoch_ms() + 60_000,
    };
    assert!(repo.try_create(&live).unwrap());

    let manager = LockManager::new(SqliteLockRepository::new(&conn));
    assert!(manager.acquire("job_a", TTL).unwrap().is_none());
}

#[test]
fn stale_release_leaves_the_new_holders_lock_alone() {
    let conn = open_db_in_memory().unwrap();
    let manager = LockManager::new(SqliteLockRepository::new(&conn));

    let stale_lease = manager.acquire("job_a", TTL).unwrap().unwrap();

    // The holder stalls past its TTL and the lock is reclaimed.
    conn.execute(
        "UPDATE job_locks SET expires_at = ?1;",
        [now_epoch_ms() - 1_000],
    )
    .unwrap();
    let new_lease = manager.acquire("job_a", TTL).unwrap().unwrap();

    // The stale holder's release is token-keyed and removes nothing.
    assert!(!manager.release(&stale_lease).unwrap());
    let repo = SqliteLockRepository::new(&conn);
    assert!(repo.find(&lock_id_for("job_a")).unwrap().is_some());

    // The new holder's release still works.
    assert!(manager.release(&new_lease).unwrap());
    assert!(repo.find(&lock_id_for("job_a")).unwrap().is_none());
}

/// Repository where the insert always loses the race to a freshly
/// re-created expired lock, as when another reclaimer keeps winning.
struct AlwaysContendedRepo {
    create_attempts: Cell<u32>,
}

impl LockRepository for &AlwaysContendedRepo {
    fn try_create(&self, _lock: &Lock) -> RepoResult<bool> {
        self.create_attempts.set(self.create_attempts.get() + 1);
        Ok(false)
    }

    fn find(&self, lock_id: &str) -> RepoResult<Option<Lock>> {
        Ok(Some(Lock {
            lock_id: lock_id.to_string(),
            lock_name: "job_a".to_string(),
            token: Uuid::new_v4(),
            expires_at_ms: now_epoch_ms() - 1_000,
        }))
    }

    fn delete_if_token(&self, _lock_id: &str, _token: Uuid) -> RepoResult<bool> {
        Ok(true)
    }
}

#[test]
fn reclaim_retries_are_bounded() {
    let repo = AlwaysContendedRepo {
        create_attempts: Cell::new(0),
    };
    let manager = LockManager::new(&repo);

    assert!(manager.acquire("job_a", TTL).unwrap().is_none());
    assert_eq!(repo.create_attempts.get(), 3);
}
