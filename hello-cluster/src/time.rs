//! Clock abstraction for the connection retry loop.
//!
//! The connect protocol waits between attempts. Routing that wait through a
//! trait lets tests substitute a clock that never actually sleeps.

use std::time::Duration;

use async_trait::async_trait;

/// Source of the waits between connection attempts.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Sleep for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl TokioTimeProvider {
    /// Create a tokio-backed clock.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
