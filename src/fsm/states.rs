//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  BOOTING ──[open]──▶ AWAITING_CLOSE
//!     │                      │
//!  [closed]              [closed]
//!     ▼                      ▼
//!   CLOSED ◀─────────────────┘
//!    │  ▲
//! [open]│  [closed]
//!    ▼  │
//!    OPEN ──[open ≥ grace]──▶ STUCK_OPEN ──[closed]──▶ CLOSED
//! ```

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Booting
        StateDescriptor {
            id: StateId::Booting,
            name: "Booting",
            on_enter: None,
            on_exit: None,
            on_update: booting_update,
        },
        // Index 1 — AwaitingClose
        StateDescriptor {
            id: StateId::AwaitingClose,
            name: "AwaitingClose",
            on_enter: Some(awaiting_close_enter),
            on_exit: None,
            on_update: awaiting_close_update,
        },
        // Index 2 — Closed
        StateDescriptor {
            id: StateId::Closed,
            name: "Closed",
            on_enter: Some(closed_enter),
            on_exit: None,
            on_update: closed_update,
        },
        // Index 3 — Open
        StateDescriptor {
            id: StateId::Open,
            name: "Open",
            on_enter: Some(open_enter),
            on_exit: None,
            on_update: open_update,
        },
        // Index 4 — StuckOpen
        StateDescriptor {
            id: StateId::StuckOpen,
            name: "StuckOpen",
            on_enter: Some(stuck_open_enter),
            on_exit: Some(stuck_open_exit),
            on_update: stuck_open_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTING state — waiting for the first sample
// ═══════════════════════════════════════════════════════════════════════════

fn booting_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.door.is_open() {
        Some(StateId::AwaitingClose)
    } else {
        Some(StateId::Closed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_CLOSE state — door was open at boot
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_close_enter(ctx: &mut FsmContext) {
    ctx.indicator_on = true;
    warn!("AWAITING_CLOSE: trap door open at boot, waiting for it to close");
}

fn awaiting_close_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.door.is_open() {
        return None;
    }
    info!(
        "AWAITING_CLOSE: door closed after {} ms, initialisation complete",
        ctx.ms_in_state()
    );
    Some(StateId::Closed)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED state
// ═══════════════════════════════════════════════════════════════════════════

fn closed_enter(ctx: &mut FsmContext) {
    ctx.indicator_on = false;
    ctx.opened_at_ms = None;
}

fn closed_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.door.is_open().then_some(StateId::Open)
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN state — mail arrived, grace period running
// ═══════════════════════════════════════════════════════════════════════════

fn open_enter(ctx: &mut FsmContext) {
    ctx.indicator_on = true;
    ctx.opened_at_ms = Some(ctx.now_ms);
    info!("OPEN: trap door opened at {} ms", ctx.now_ms);
}

fn open_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.door.is_open() {
        return Some(StateId::Closed);
    }
    ctx.grace_expired().then_some(StateId::StuckOpen)
}

// ═══════════════════════════════════════════════════════════════════════════
//  STUCK_OPEN state — grace period exceeded
// ═══════════════════════════════════════════════════════════════════════════

fn stuck_open_enter(ctx: &mut FsmContext) {
    warn!(
        "STUCK_OPEN: trap door open for {} ms (grace {} ms)",
        ctx.stuck_for_ms(),
        ctx.stuck_grace_ms
    );
}

fn stuck_open_exit(ctx: &mut FsmContext) {
    info!("STUCK_OPEN: cleared after {} ms open", ctx.stuck_for_ms());
}

fn stuck_open_update(ctx: &mut FsmContext) -> Option<StateId> {
    (!ctx.door.is_open()).then_some(StateId::Closed)
}
