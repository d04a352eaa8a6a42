//! Connect and disconnect protocol for the cluster client.
//!
//! # Connect
//!
//! One handshake attempt, then up to `retry_budget` retries with a fixed
//! delay between them. The delay is the only point where `start` suspends on
//! something other than the handshake, and it races the caller's
//! cancellation token:
//!
//! ```text
//! attempt ─ok──► Connected
//!    │
//!   err ── budget left? ──no──► Failed (BudgetExhausted)
//!    │          │
//!    │         yes: consume one unit
//!    │          ▼
//!    └──── wait(retry_delay) ◄── cancel ──► Unconnected (Cancelled)
//! ```
//!
//! # Disconnect
//!
//! `stop` races the graceful close against the caller's cancellation token
//! and drops whichever loses. A hung close never blocks process shutdown.
//! A stopped manager stays closed: reconnecting takes a new manager.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::cluster::{ClientBuilder, ClusterClient};
use super::health::HealthProbe;
use super::invoker::ActorInvoker;
use crate::config::ClientConfig;
use crate::{ClusterClientError, ConnectFailure, TimeProvider, TokioTimeProvider};

/// Retries granted to a new manager.
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Fixed wait between handshake attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Lifecycle state of the cluster link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    /// No connect attempted yet, or the last one was cancelled.
    Unconnected,
    /// Handshake attempts in progress.
    Connecting,
    /// Link established.
    Connected,
    /// Graceful close in progress.
    Closing,
    /// Link released; the manager cannot connect again.
    Closed,
    /// Retry budget exhausted; the manager must be replaced.
    Failed,
}

/// Retries left before the connect protocol gives up.
///
/// Never refilled: a manager that spends its whole budget stays failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
    initial: u32,
}

impl RetryBudget {
    /// A budget of `initial` retries.
    pub fn new(initial: u32) -> Self {
        Self {
            remaining: initial,
            initial,
        }
    }

    /// Retries left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Retries granted at construction.
    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Whether no retries are left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one retry. Returns `false` when none were left.
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET)
    }
}

/// Tunables for the connect protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Retries after the first failed handshake.
    pub retry_budget: u32,
    /// Wait between handshake attempts.
    pub retry_delay: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ConnectOptions {
    /// Same budget, different delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Same delay, different budget.
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }
}

/// Sole owner of the process's cluster client.
///
/// Lifecycle calls take `&mut self`, so two `start` calls can never race on
/// the same manager. Collaborators get capabilities through
/// [`invoker`](Self::invoker) and [`health`](Self::health).
///
/// # Type Parameters
///
/// * `C` - The runtime's cluster client
/// * `T` - Clock used for the retry delay (defaults to [`TokioTimeProvider`])
pub struct ConnectionManager<C: ClusterClient, T: TimeProvider = TokioTimeProvider> {
    client: Rc<C>,
    state: Rc<Cell<ConnectionState>>,
    budget: RetryBudget,
    options: ConnectOptions,
    time: T,
    attempts: u32,
    last_error: Option<String>,
}

impl<C: ClusterClient, T: TimeProvider> ConnectionManager<C, T> {
    /// Wrap an unconnected client.
    pub fn new(client: C, options: ConnectOptions, time: T) -> Self {
        Self {
            client: Rc::new(client),
            state: Rc::new(Cell::new(ConnectionState::Unconnected)),
            budget: RetryBudget::new(options.retry_budget),
            options,
            time,
            attempts: 0,
            last_error: None,
        }
    }

    /// Build the client for the clustering mechanism `config` selects.
    ///
    /// # Errors
    ///
    /// Propagates the builder's error when it cannot produce a client.
    pub fn build<B>(
        builder: &B,
        config: &ClientConfig,
        options: ConnectOptions,
        time: T,
    ) -> Result<Self, ClusterClientError>
    where
        B: ClientBuilder<Client = C>,
    {
        tracing::debug!(
            cluster_id = %config.identity.cluster_id,
            service_id = %config.identity.service_id,
            clustering = ?config.clustering(),
            "building cluster client"
        );
        let client = builder.build(config)?;
        Ok(Self::new(client, options, time))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Remaining retry budget.
    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Handshake attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Capability to call grains through this manager's link.
    pub fn invoker(&self) -> ActorInvoker<C> {
        ActorInvoker::new(self.client.clone(), self.state.clone())
    }

    /// Readiness signal for health checks.
    pub fn health(&self) -> HealthProbe {
        HealthProbe::new(self.state.clone())
    }

    /// Connect to the cluster.
    ///
    /// Returns immediately when already connected. A `Connecting` state on
    /// entry means an earlier `start` future was dropped; attempts resume
    /// with whatever budget is left.
    ///
    /// # Errors
    ///
    /// - [`ConnectFailure::BudgetExhausted`] once every retry failed. The
    ///   manager stays [`Failed`](ConnectionState::Failed) and later calls
    ///   fail the same way without attempting.
    /// - [`ConnectFailure::Cancelled`] when `cancel` fires during a retry
    ///   wait. No further attempt is made.
    /// - [`ConnectFailure::Closed`] once [`stop`](Self::stop) has run.
    pub async fn start(&mut self, cancel: &CancellationToken) -> Result<(), ConnectFailure> {
        match self.state.get() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Failed => return Err(self.exhausted()),
            ConnectionState::Closing | ConnectionState::Closed => {
                return Err(ConnectFailure::Closed);
            }
            ConnectionState::Unconnected | ConnectionState::Connecting => {}
        }
        if self.client.is_initialized() {
            self.state.set(ConnectionState::Connected);
            return Ok(());
        }

        tracing::info!(
            remaining_retries = self.budget.remaining(),
            "connecting cluster client"
        );
        self.state.set(ConnectionState::Connecting);

        loop {
            self.attempts += 1;
            let error = match self.client.connect().await {
                Ok(()) => {
                    self.state.set(ConnectionState::Connected);
                    tracing::info!(
                        attempts = self.attempts,
                        initialized = self.client.is_initialized(),
                        "cluster client connected"
                    );
                    return Ok(());
                }
                Err(error) => error,
            };
            self.last_error = Some(error.to_string());

            if !self.budget.consume() {
                tracing::error!(
                    attempts = self.attempts,
                    error = %error,
                    "could not connect cluster client, retry budget exhausted"
                );
                self.state.set(ConnectionState::Failed);
                return Err(self.exhausted());
            }

            tracing::warn!(
                attempt = self.attempts,
                remaining_retries = self.budget.remaining(),
                error = %error,
                "error connecting cluster client"
            );

            let waited = tokio::select! {
                biased;
                () = cancel.cancelled() => false,
                () = self.time.sleep(self.options.retry_delay) => true,
            };
            if !waited {
                tracing::info!(attempts = self.attempts, "cluster client connect cancelled");
                self.state.set(ConnectionState::Unconnected);
                return Err(ConnectFailure::Cancelled {
                    attempts: self.attempts,
                });
            }
        }
    }

    /// Disconnect from the cluster.
    ///
    /// No-op unless a link may exist. Otherwise races the graceful close
    /// against `cancel` and abandons the close if `cancel` fires first.
    pub async fn stop(&mut self, cancel: &CancellationToken) {
        match self.state.get() {
            ConnectionState::Unconnected | ConnectionState::Closed | ConnectionState::Failed => {
                tracing::debug!(
                    state = ?self.state.get(),
                    "cluster client not connected, nothing to close"
                );
                return;
            }
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Closing => {}
        }

        self.state.set(ConnectionState::Closing);
        tracing::info!("closing cluster client");

        tokio::select! {
            biased;
            result = self.client.close() => match result {
                Ok(()) => tracing::info!("cluster client closed"),
                Err(error) => tracing::warn!(error = %error, "cluster client close failed"),
            },
            () = cancel.cancelled() => {
                tracing::warn!("shutdown cancelled, abandoning cluster client close");
            }
        }

        self.state.set(ConnectionState::Closed);
    }

    fn exhausted(&self) -> ConnectFailure {
        ConnectFailure::BudgetExhausted {
            attempts: self.attempts,
            last_error: self.last_error.clone().unwrap_or_default(),
        }
    }
}
