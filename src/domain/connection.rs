//! Connection lifecycle state machine.

use super::models::ConnectionState;
use tracing::{info, warn};

/// Drives the bridge lifecycle from transport signals and gates all sensor
/// and button processing: nothing runs while `Inactive`, everything runs
/// while `Active`.
#[derive(Debug)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Transition table. Disconnect (to `Inactive`) is permitted from anywhere;
/// the observed connect flow goes `Connecting` directly to `Active`, with
/// `ConnectionComplete` kept as a legal intermediate.
fn permitted(from: ConnectionState, to: ConnectionState) -> bool {
    use ConnectionState::*;
    match (from, to) {
        (_, Inactive) => true,
        (Inactive, Scanning) | (Inactive, Connecting) => true,
        (Scanning, ScanComplete) => true,
        (ScanComplete, Connecting) => true,
        (Connecting, ConnectionComplete) | (Connecting, Active) => true,
        (ConnectionComplete, Active) => true,
        _ => false,
    }
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Inactive,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// Attempt a transition. Re-entering the current state is a no-op, as is
    /// any transition outside the table; both return `None` so the caller
    /// emits no lifecycle event. A real change returns the entered state.
    pub fn enter(&mut self, next: ConnectionState) -> Option<ConnectionState> {
        if next == self.state {
            return None;
        }
        if !permitted(self.state, next) {
            warn!(from = ?self.state, to = ?next, "transition outside table ignored");
            return None;
        }
        info!(from = ?self.state, to = ?next, "connection state change");
        self.state = next;
        Some(next)
    }
}
