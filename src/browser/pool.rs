//! Session pool: lifecycle of expensive, long-lived browser sessions shared
//! across concurrent requests.
//!
//! # Invariants
//!
//! - One "current" session at a time; a lease always goes to the current
//!   session, and the lease-count increment happens under the same lock
//!   acquisition as the selection.
//! - Session creation is single-flight: callers that arrive while a creation
//!   is in flight await that same creation (a [`Shared`] future). If it
//!   fails, every waiter fails together; there is no internal retry.
//! - A session is torn down iff it is superseded AND its lease count is
//!   zero. The predicate is evaluated at both transitions that can make it
//!   true: supersession and release. Teardown happens exactly once.
//!
//! State mutation is synchronous under a `parking_lot` mutex; nothing awaits
//! while holding the lock.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::browser::session::SessionBackend;
use crate::error::{Error, PoolError, Result};

/// Unique identifier for a pooled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outstanding lease on a session.
///
/// Holding a lease guarantees the session will not be torn down. Must be
/// given back via [`SessionPool::release`] on every exit path; prefer
/// [`SessionPool::with_session`], which does this.
pub struct SessionLease<S> {
    id: SessionId,
    session: Arc<S>,
}

impl<S> SessionLease<S> {
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Shared handle to the leased session.
    #[must_use]
    pub fn session(&self) -> Arc<S> {
        Arc::clone(&self.session)
    }
}

/// Runtime statistics for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Sessions currently alive (current + superseded-but-leased).
    pub active_sessions: usize,
    /// Leases not yet released.
    pub outstanding_leases: usize,
    /// Completed session creations since pool construction.
    pub total_rotations: u64,
}

type SharedCreation = Shared<BoxFuture<'static, std::result::Result<SessionId, PoolError>>>;

struct SessionEntry<S> {
    session: Arc<S>,
    leases: usize,
    superseded: bool,
}

struct PoolState<S> {
    current: Option<SessionId>,
    current_created_at: Instant,
    sessions: HashMap<SessionId, SessionEntry<S>>,
    inflight: Option<SharedCreation>,
}

struct PoolInner<B: SessionBackend> {
    backend: B,
    max_age: Duration,
    state: Mutex<PoolState<B::Session>>,
    rotations: AtomicU64,
}

/// Owns the lifecycle of browser sessions and hands out leases to
/// concurrent callers.
pub struct SessionPool<B: SessionBackend> {
    inner: Arc<PoolInner<B>>,
}

impl<B: SessionBackend> Clone for SessionPool<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SessionBackend> SessionPool<B> {
    /// Create a pool. No session is launched until the first lease.
    pub fn new(backend: B, max_age: Duration) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                backend,
                max_age,
                state: Mutex::new(PoolState {
                    current: None,
                    current_created_at: Instant::now(),
                    sessions: HashMap::new(),
                    inflight: None,
                }),
                rotations: AtomicU64::new(0),
            }),
        }
    }

    /// Lease the current session, rotating first if it is absent or past its
    /// maximum age.
    pub async fn lease(&self) -> Result<SessionLease<B::Session>> {
        loop {
            let creation = {
                let mut state = self.inner.state.lock();
                if let Some(inflight) = state.inflight.clone() {
                    inflight
                } else if let Some(lease) = select_current(&mut state, self.inner.max_age) {
                    return Ok(lease);
                } else {
                    self.begin_creation(&mut state)
                }
            };

            let id = creation.await.map_err(Error::Pool)?;

            let mut state = self.inner.state.lock();
            if let Some(entry) = state.sessions.get_mut(&id) {
                entry.leases += 1;
                return Ok(SessionLease {
                    id,
                    session: Arc::clone(&entry.session),
                });
            }
            // The freshly created session was already superseded and torn
            // down before this waiter could lease it. Go around again.
            debug!(session_id = %id, "Created session gone before lease; retrying");
        }
    }

    /// Give back a lease. If the session is superseded and this was its last
    /// lease, it is torn down now.
    pub async fn release(&self, lease: SessionLease<B::Session>) -> Result<()> {
        let stale = {
            let mut state = self.inner.state.lock();
            let entry = state
                .sessions
                .get_mut(&lease.id)
                .ok_or_else(|| PoolError::UnknownSession(lease.id.to_string()))?;
            entry.leases = entry.leases.saturating_sub(1);
            if entry.superseded && entry.leases == 0 {
                state.sessions.remove(&lease.id)
            } else {
                None
            }
        };

        if let Some(entry) = stale {
            info!(session_id = %lease.id, "Last lease released, tearing down superseded session");
            self.inner.backend.teardown(entry.session).await;
        }
        Ok(())
    }

    /// Run `f` against a leased session, releasing the lease on every exit
    /// path.
    pub async fn with_session<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Arc<B::Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lease = self.lease().await?;
        let result = f(lease.session()).await;
        if let Err(e) = self.release(lease).await {
            warn!(error = %e, "Failed to release session lease");
        }
        result
    }

    /// The backend this pool creates sessions through.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Runtime statistics.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            active_sessions: state.sessions.len(),
            outstanding_leases: state.sessions.values().map(|e| e.leases).sum(),
            total_rotations: self.inner.rotations.load(Ordering::Relaxed),
        }
    }

    /// Tear down every session. Intended for process exit, after all
    /// operations have completed.
    pub async fn shutdown(&self) {
        let entries: Vec<_> = {
            let mut state = self.inner.state.lock();
            state.current = None;
            state.sessions.drain().collect()
        };
        for (id, entry) in entries {
            if entry.leases > 0 {
                warn!(session_id = %id, leases = entry.leases, "Shutting down session with outstanding leases");
            }
            self.inner.backend.teardown(entry.session).await;
        }
    }

    /// Start a single-flight session creation and register it as in-flight.
    ///
    /// The future installs the new session as current, marks the previous
    /// one superseded, and tears the previous one down immediately when its
    /// lease count is already zero (otherwise `release` does it later).
    fn begin_creation(&self, state: &mut PoolState<B::Session>) -> SharedCreation {
        let inner = Arc::clone(&self.inner);
        let had_current = state.current.is_some();
        let creation: SharedCreation = async move {
            if had_current {
                info!("Current session past max age, launching replacement");
            } else {
                info!("Launching first session");
            }

            let session = match inner.backend.create().await {
                Ok(session) => session,
                Err(e) => {
                    inner.state.lock().inflight = None;
                    warn!(error = %e, "Session creation failed; failing all waiters");
                    return Err(PoolError::CreationFailed(e.to_string()));
                }
            };

            let id = SessionId::new();
            let stale = {
                let mut state = inner.state.lock();
                state.inflight = None;
                state.sessions.insert(
                    id,
                    SessionEntry {
                        session: Arc::new(session),
                        leases: 0,
                        superseded: false,
                    },
                );
                let previous = state.current.replace(id);
                state.current_created_at = Instant::now();
                previous.and_then(|prev_id| {
                    let entry = state.sessions.get_mut(&prev_id)?;
                    entry.superseded = true;
                    if entry.leases == 0 {
                        state.sessions.remove(&prev_id)
                    } else {
                        debug!(session_id = %prev_id, leases = entry.leases, "Deferring teardown to last release");
                        None
                    }
                })
            };

            if let Some(entry) = stale {
                inner.backend.teardown(entry.session).await;
            }

            inner.rotations.fetch_add(1, Ordering::Relaxed);
            info!(session_id = %id, "Session ready");
            Ok(id)
        }
        .boxed()
        .shared();

        state.inflight = Some(creation.clone());
        creation
    }
}

/// Lease the current session if it exists and is within its maximum age.
///
/// The increment happens on the entry looked up by the id captured here, so
/// there is no race between "which session is current" and "whose counter
/// gets bumped".
fn select_current<S>(state: &mut PoolState<S>, max_age: Duration) -> Option<SessionLease<S>> {
    let id = state.current?;
    if state.current_created_at.elapsed() > max_age {
        return None;
    }
    let entry = state.sessions.get_mut(&id)?;
    entry.leases += 1;
    Some(SessionLease {
        id,
        session: Arc::clone(&entry.session),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Minimal backend for in-file invariant checks; richer scripted
    /// scenarios live in `tests/pool_tests.rs` against the testkit backend.
    struct StubBackend {
        created: AtomicUsize,
        torn_down: AtomicUsize,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                created: AtomicUsize::new(0),
                torn_down: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionBackend for StubBackend {
        type Session = usize;

        async fn create(&self) -> Result<usize> {
            Ok(self.created.fetch_add(1, Ordering::SeqCst))
        }

        async fn teardown(&self, _session: Arc<usize>) {
            self.torn_down.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pool(max_age: Duration) -> SessionPool<StubBackend> {
        SessionPool::new(StubBackend::new(), max_age)
    }

    #[tokio::test]
    async fn first_lease_creates_a_session() {
        let pool = pool(Duration::from_secs(60));
        let lease = pool.lease().await.unwrap();
        assert_eq!(pool.stats().active_sessions, 1);
        assert_eq!(pool.stats().outstanding_leases, 1);
        pool.release(lease).await.unwrap();
        assert_eq!(pool.stats().outstanding_leases, 0);
    }

    #[tokio::test]
    async fn fresh_session_is_reused() {
        let pool = pool(Duration::from_secs(60));
        let a = pool.lease().await.unwrap();
        let b = pool.lease().await.unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(pool.stats().total_rotations, 1);
        pool.release(a).await.unwrap();
        pool.release(b).await.unwrap();
    }

    #[tokio::test]
    async fn release_of_current_session_does_not_tear_down() {
        let pool = pool(Duration::from_secs(60));
        let lease = pool.lease().await.unwrap();
        pool.release(lease).await.unwrap();
        assert_eq!(pool.inner.backend.torn_down.load(Ordering::SeqCst), 0);
        assert_eq!(pool.stats().active_sessions, 1);
    }

    #[tokio::test]
    async fn shutdown_tears_down_everything() {
        let pool = pool(Duration::from_secs(60));
        let lease = pool.lease().await.unwrap();
        pool.release(lease).await.unwrap();
        pool.shutdown().await;
        assert_eq!(pool.stats().active_sessions, 0);
        assert_eq!(pool.inner.backend.torn_down.load(Ordering::SeqCst), 1);
    }
}
