//! Integration tests for the session pool lifecycle invariants:
//! single-flight creation, age rotation, and the
//! superseded-and-zero-leases teardown predicate.

use std::collections::HashSet;
use std::time::Duration;

use oddsgate::browser::SessionPool;
use oddsgate::testkit::pool::TestBackend;

const LONG_AGE: Duration = Duration::from_secs(60);
const TINY_AGE: Duration = Duration::from_millis(10);

#[tokio::test]
async fn concurrent_leases_share_one_creation() {
    let backend = TestBackend::new().with_create_delay(Duration::from_millis(50));
    let pool = SessionPool::new(backend, LONG_AGE);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.lease().await.unwrap() }));
    }

    let mut ids = HashSet::new();
    let mut leases = Vec::new();
    for handle in handles {
        let lease = handle.await.unwrap();
        ids.insert(lease.id());
        leases.push(lease);
    }

    assert_eq!(ids.len(), 1, "all callers must share one session");
    assert_eq!(pool.stats().outstanding_leases, 8);
    assert_eq!(pool.stats().total_rotations, 1);

    for lease in leases {
        pool.release(lease).await.unwrap();
    }
    assert_eq!(pool.stats().outstanding_leases, 0);
}

#[tokio::test]
async fn session_past_max_age_is_rotated() {
    let pool = SessionPool::new(TestBackend::new(), TINY_AGE);

    let first = pool.lease().await.unwrap();
    let first_id = first.id();
    pool.release(first).await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = pool.lease().await.unwrap();
    assert_ne!(second.id(), first_id, "stale session must not be returned");
    assert_eq!(pool.stats().total_rotations, 2);
    pool.release(second).await.unwrap();
}

#[tokio::test]
async fn superseded_idle_session_is_torn_down_at_rotation() {
    let pool = SessionPool::new(TestBackend::new(), TINY_AGE);

    let first = pool.lease().await.unwrap();
    pool.release(first).await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    // Rotation finds the old session with zero leases and tears it down
    // immediately.
    let second = pool.lease().await.unwrap();
    assert_eq!(pool.backend().torn_down(), 1);
    pool.release(second).await.unwrap();
}

#[tokio::test]
async fn superseded_session_with_lease_outlives_rotation() {
    let pool = SessionPool::new(TestBackend::new(), TINY_AGE);

    let held = pool.lease().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Rotate while the old session still has an outstanding lease.
    let fresh = pool.lease().await.unwrap();
    assert_ne!(fresh.id(), held.id());
    assert_eq!(
        pool.backend().torn_down(),
        0,
        "session must not be torn down while leased"
    );
    assert_eq!(pool.stats().active_sessions, 2);

    // Releasing the fresh (current) session tears nothing down.
    pool.release(fresh).await.unwrap();
    assert_eq!(pool.backend().torn_down(), 0);

    // The last release of the superseded session triggers its teardown.
    pool.release(held).await.unwrap();
    assert_eq!(pool.backend().torn_down(), 1);
    assert_eq!(pool.stats().active_sessions, 1);
}

#[tokio::test]
async fn creation_failure_fails_all_waiters_together() {
    let backend = TestBackend::new().with_create_delay(Duration::from_millis(50));
    backend.fail_next_create();
    let pool = SessionPool::new(backend, LONG_AGE);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.lease().await }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_err(), "every waiter fails together");
    }

    // The failure is not sticky: the next lease starts a fresh creation.
    let lease = pool.lease().await.unwrap();
    pool.release(lease).await.unwrap();
}

#[tokio::test]
async fn with_session_releases_on_error_paths() {
    let pool = SessionPool::new(TestBackend::new(), LONG_AGE);

    let failed: oddsgate::error::Result<()> = pool
        .with_session(|_session| async {
            Err(oddsgate::error::PoolError::CreationFailed("boom".into()).into())
        })
        .await;

    assert!(failed.is_err());
    assert_eq!(pool.stats().outstanding_leases, 0, "lease must not leak");
}
