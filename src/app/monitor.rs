//! Door monitor — tracks the trap door through the FSM.
//!
//! [`DoorMonitor`] owns the state table and its blackboard.  Each call to
//! [`sample`](DoorMonitor::sample) reads the sensor once, runs one FSM tick,
//! and reports the resulting phase change, if any.  Every phase change maps
//! to at most one operator [`Notice`], so a notice can never be sent twice
//! for the same physical transition.

use crate::config::SystemConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

use super::events::{DoorState, Notice, TransitionEvent};
use super::ports::SensorPort;

/// A phase change observed by one [`DoorMonitor::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: StateId,
    pub to: StateId,
    /// Time of the sample that caused the change.
    pub at_ms: u64,
}

impl StateChange {
    /// The notice owed to the operator for this change.
    pub fn notice(&self) -> Option<Notice> {
        use StateId::*;
        match (self.from, self.to) {
            (Booting | AwaitingClose, Closed) => Some(Notice::InitComplete),
            (Booting, AwaitingClose) => Some(Notice::CloseToInitialize),
            (Closed, Open) => Some(Notice::MailArrived),
            (Open, StuckOpen) => Some(Notice::NotClosing),
            (Open | StuckOpen, Closed) => Some(Notice::ClosedAgain),
            _ => None,
        }
    }

    /// The physical door transition behind this change.
    ///
    /// `None` for the first sample (there is no previous reading) and for
    /// Open → StuckOpen (the door did not move).
    pub fn door_transition(&self) -> Option<TransitionEvent> {
        if self.from == StateId::Booting {
            return None;
        }
        let from = door_of(self.from);
        let to = door_of(self.to);
        (from != to).then_some(TransitionEvent {
            from,
            to,
            at_ms: self.at_ms,
        })
    }
}

fn door_of(state: StateId) -> DoorState {
    match state {
        StateId::AwaitingClose | StateId::Open | StateId::StuckOpen => DoorState::Open,
        StateId::Booting | StateId::Closed => DoorState::Closed,
    }
}

/// Debounced interpretation of the reed sensor.
pub struct DoorMonitor {
    fsm: Fsm,
    ctx: FsmContext,
}

impl DoorMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Booting),
            ctx: FsmContext::new(config),
        }
    }

    /// Run the initial state entry.  Call once before the first sample.
    pub fn begin(&mut self, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
    }

    /// Sample the sensor and evaluate one step of the state machine.
    pub fn sample(&mut self, now_ms: u64, sensor: &mut impl SensorPort) -> Option<StateChange> {
        self.ctx.now_ms = now_ms;
        self.ctx.door = DoorState::from_open(sensor.door_open());

        let t = self.fsm.tick(&mut self.ctx)?;
        Some(StateChange {
            from: t.from,
            to: t.to,
            at_ms: now_ms,
        })
    }

    // ── Queries ───────────────────────────────────────────────

    /// The last sampled door state.
    pub fn door_state(&self) -> DoorState {
        self.ctx.door
    }

    pub fn phase(&self) -> StateId {
        self.fsm.current_state()
    }

    /// `true` until the first Closed sample has been seen.
    pub fn is_initializing(&self) -> bool {
        self.fsm.current_state().is_initializing()
    }

    /// Desired indicator LED state.
    pub fn indicator_on(&self) -> bool {
        self.ctx.indicator_on
    }

    /// Elapsed stuck timer (ms); zero while closed.
    pub fn open_for_ms(&self) -> u64 {
        self.ctx.stuck_for_ms()
    }

    /// Samples taken since boot.
    pub fn samples(&self) -> u64 {
        self.fsm.tick_count()
    }
}
