//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the latest door sample, the monotonic time of that
//! sample, the stuck-open timer, and the indicator output.  Think of it as
//! the "blackboard" in a blackboard architecture.

use crate::app::events::DoorState;
use crate::config::SystemConfig;

/// The shared context passed to every state handler function.
#[derive(Debug, Clone)]
pub struct FsmContext {
    // -- Timing --
    /// Monotonic time of the latest sample (ms).  Updated before each tick.
    pub now_ms: u64,
    /// Time the current state was entered (ms).
    pub state_entered_ms: u64,

    // -- Sensor data --
    /// Latest door reading.  Updated before each tick.
    pub door: DoorState,

    // -- Stuck timer --
    /// Time the door was last seen going Closed → Open.  Cleared on close.
    pub opened_at_ms: Option<u64>,
    /// Grace period before an open door counts as stuck (ms).
    pub stuck_grace_ms: u64,

    // -- Outputs --
    /// Desired state of the "door open" indicator, applied after the tick.
    pub indicator_on: bool,
}

impl FsmContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            now_ms: 0,
            state_entered_ms: 0,
            door: DoorState::Closed,
            opened_at_ms: None,
            stuck_grace_ms: u64::from(config.stuck_grace_ms),
            indicator_on: false,
        }
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Milliseconds the door has been open in steady state, 0 when closed.
    pub fn stuck_for_ms(&self) -> u64 {
        self.opened_at_ms
            .map_or(0, |opened| self.now_ms.saturating_sub(opened))
    }

    /// Whether the grace period has run out.
    pub fn grace_expired(&self) -> bool {
        self.opened_at_ms.is_some() && self.stuck_for_ms() >= self.stuck_grace_ms
    }
}
