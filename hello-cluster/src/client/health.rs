//! Readiness derived from the connection state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::manager::ConnectionState;

/// Health of the cluster link as seen by a health-check endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Connected and able to serve grain calls.
    Healthy,
    /// Not connected yet, but still expected to become ready.
    Degraded,
    /// Closing, closed, or permanently failed.
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Point-in-time health report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Connection state the status was derived from.
    pub state: ConnectionState,
}

/// Read-only view of a manager's connection state.
#[derive(Clone)]
pub struct HealthProbe {
    state: Rc<Cell<ConnectionState>>,
}

impl HealthProbe {
    pub(crate) fn new(state: Rc<Cell<ConnectionState>>) -> Self {
        Self { state }
    }

    /// Current report.
    pub fn check(&self) -> HealthReport {
        let state = self.state.get();
        let status = match state {
            ConnectionState::Connected => HealthStatus::Healthy,
            ConnectionState::Unconnected | ConnectionState::Connecting => HealthStatus::Degraded,
            ConnectionState::Closing | ConnectionState::Closed | ConnectionState::Failed => {
                HealthStatus::Unhealthy
            }
        };
        HealthReport { status, state }
    }

    /// Whether grain calls can currently be served.
    pub fn is_ready(&self) -> bool {
        self.check().status == HealthStatus::Healthy
    }
}

impl fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthProbe")
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_for(state: ConnectionState) -> HealthReport {
        HealthProbe::new(Rc::new(Cell::new(state))).check()
    }

    #[test]
    fn test_status_mapping() {
        let expected = [
            (ConnectionState::Connected, HealthStatus::Healthy),
            (ConnectionState::Unconnected, HealthStatus::Degraded),
            (ConnectionState::Connecting, HealthStatus::Degraded),
            (ConnectionState::Closing, HealthStatus::Unhealthy),
            (ConnectionState::Closed, HealthStatus::Unhealthy),
            (ConnectionState::Failed, HealthStatus::Unhealthy),
        ];
        for (state, status) in expected {
            let report = report_for(state);
            assert_eq!(report.status, status, "state {state:?}");
            assert_eq!(report.state, state);
        }
    }

    #[test]
    fn test_report_follows_shared_state() {
        let state = Rc::new(Cell::new(ConnectionState::Connecting));
        let probe = HealthProbe::new(state.clone());
        assert!(!probe.is_ready());

        state.set(ConnectionState::Connected);
        assert!(probe.is_ready());
        assert_eq!(probe.check().state, ConnectionState::Connected);
    }
}
