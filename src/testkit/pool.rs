//! A scriptable [`SessionBackend`] that counts lifecycle events.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::SessionBackend;
use crate::error::{PoolError, Result};

/// A fake session: just a serial number.
#[derive(Debug, PartialEq, Eq)]
pub struct TestSession {
    pub serial: usize,
}

/// Backend recording creations and teardowns, with an optional creation
/// delay (to hold a creation in flight while concurrent leases pile up) and
/// a scriptable one-shot failure.
#[derive(Default)]
pub struct TestBackend {
    created: AtomicUsize,
    torn_down: AtomicUsize,
    fail_next: AtomicBool,
    create_delay: Option<Duration>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each creation, keeping it observable in flight.
    #[must_use]
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Make the next creation fail.
    pub fn fail_next_create(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn torn_down(&self) -> usize {
        self.torn_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for TestBackend {
    type Session = TestSession;

    async fn create(&self) -> Result<TestSession> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PoolError::CreationFailed("scripted failure".into()).into());
        }
        let serial = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(TestSession { serial })
    }

    async fn teardown(&self, _session: Arc<TestSession>) {
        self.torn_down.fetch_add(1, Ordering::SeqCst);
    }
}
