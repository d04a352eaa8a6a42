//! Shared fakes: a scripted cluster client and a clock that never sleeps.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use hello_cluster::client::{ActorCall, ClusterClient};
use hello_cluster::{ClusterClientError, TimeProvider};
use tokio_util::sync::CancellationToken;

/// Counters shared between a [`ScriptedClient`] and the test body.
#[derive(Debug, Default)]
pub struct Calls {
    pub connect: Cell<u32>,
    pub close: Cell<u32>,
}

/// How [`ScriptedClient::close`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseBehavior {
    Graceful,
    Fail,
    Hang,
}

/// Cluster client whose handshake fails a fixed number of times.
pub struct ScriptedClient {
    failures: Cell<u32>,
    close: CloseBehavior,
    initialized: Cell<bool>,
    calls: Rc<Calls>,
}

impl ScriptedClient {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures: Cell::new(failures),
            close: CloseBehavior::Graceful,
            initialized: Cell::new(false),
            calls: Rc::new(Calls::default()),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    pub fn healthy() -> Self {
        Self::failing(0)
    }

    pub fn with_close(mut self, close: CloseBehavior) -> Self {
        self.close = close;
        self
    }

    pub fn already_initialized(self) -> Self {
        self.initialized.set(true);
        self
    }

    pub fn calls(&self) -> Rc<Calls> {
        self.calls.clone()
    }
}

#[async_trait(?Send)]
impl ClusterClient for ScriptedClient {
    async fn connect(&self) -> Result<(), ClusterClientError> {
        self.calls.connect.set(self.calls.connect.get() + 1);
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get().saturating_sub(1));
            return Err(ClusterClientError::Unreachable(
                "no gateway answered".to_string(),
            ));
        }
        self.initialized.set(true);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClusterClientError> {
        self.calls.close.set(self.calls.close.get() + 1);
        match self.close {
            CloseBehavior::Graceful => {
                self.initialized.set(false);
                Ok(())
            }
            CloseBehavior::Fail => Err(ClusterClientError::Unreachable("gateway gone".to_string())),
            CloseBehavior::Hang => std::future::pending().await,
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    async fn invoke(&self, call: ActorCall) -> Result<Vec<u8>, ClusterClientError> {
        Ok(call.body)
    }
}

/// Clock whose sleeps return immediately.
///
/// Optionally cancels a token on the n-th sleep and then never wakes, so
/// the cancellation is observed in the middle of a wait.
#[derive(Clone, Default)]
pub struct InstantTime {
    sleeps: Rc<Cell<u32>>,
    cancel_on: Option<(u32, CancellationToken)>,
}

impl InstantTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_on_sleep(nth: u32, token: CancellationToken) -> Self {
        Self {
            sleeps: Rc::new(Cell::new(0)),
            cancel_on: Some((nth, token)),
        }
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

#[async_trait(?Send)]
impl TimeProvider for InstantTime {
    async fn sleep(&self, _duration: Duration) {
        let count = self.sleeps.get() + 1;
        self.sleeps.set(count);
        if let Some((nth, token)) = &self.cancel_on {
            if *nth == count {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }
    }
}
