//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the door monitor and the command servicer and
//! drives them from one cooperative loop.  All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────┐ ──▶ ChannelPort
//!                  │        AppService        │
//! IndicatorPort ◀──│  DoorMonitor · Servicer  │ ──▶ EventSink
//!                  └──────────────────────────┘
//! ```
//!
//! One iteration is always: sample → indicator → notice → commands.  A
//! notice for a transition therefore goes out before any `/status` reply
//! that could observe the new state.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::StateId;

use super::events::{AppEvent, Notice, NoticeCue};
use super::monitor::{DoorMonitor, StateChange};
use super::ports::{ChannelPort, ClockPort, EventSink, IndicatorPort, SensorPort};
use super::servicer::CommandServicer;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    monitor: DoorMonitor,
    servicer: CommandServicer,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** sample anything; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let monitor = DoorMonitor::new(&config);
        let servicer = CommandServicer::new(&config);
        Self {
            config,
            monitor,
            servicer,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the device, take the first sample, and block until the
    /// door has been seen closed.  Commands are serviced throughout.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        channel: &mut impl ChannelPort,
        clock: &mut (impl ClockPort + DelayNs),
        sink: &mut impl EventSink,
    ) {
        if self.config.authorized_chat_id.is_empty() {
            warn!("No operator chat id configured; notifications are disabled");
        }
        self.announce(Notice::StartedUp, channel, clock, sink);
        self.monitor.begin(clock.now_ms());

        self.tick(hw, channel, clock, sink);
        while self.monitor.is_initializing() {
            clock.delay_ms(self.config.loop_interval_ms);
            self.tick(hw, channel, clock, sink);
        }
        info!("AppService started; door {:?}", self.monitor.door_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: sample → indicator → notice → commands.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`IndicatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.  Likewise `clock` is both the
    /// time source and the delay used for typing pauses.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        channel: &mut impl ChannelPort,
        clock: &mut (impl ClockPort + DelayNs),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let now = clock.now_ms();

        if let Some(change) = self.monitor.sample(now, hw) {
            hw.set_indicator(self.monitor.indicator_on());
            self.emit_change(&change, sink);
            if let Some(notice) = change.notice() {
                self.announce(notice, channel, clock, sink);
            }
        }

        let door = self.monitor.door_state();
        let now = clock.now_ms();
        self.servicer.tick(now, door, channel, clock, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn monitor(&self) -> &DoorMonitor {
        &self.monitor
    }

    pub fn servicer(&self) -> &CommandServicer {
        &self.servicer
    }

    /// Period the caller should wait between two [`tick`](Self::tick)s.
    pub fn loop_interval_ms(&self) -> u32 {
        self.config.loop_interval_ms
    }

    /// Loop iterations executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_change(&self, change: &StateChange, sink: &mut impl EventSink) {
        if change.from == StateId::Booting {
            sink.emit(&AppEvent::Started(self.monitor.door_state()));
        }
        if let Some(t) = change.door_transition() {
            sink.emit(&AppEvent::DoorChanged(t));
        }
        match (change.from.is_initializing(), change.to) {
            (_, StateId::AwaitingClose) => sink.emit(&AppEvent::InitializationBlocked),
            (true, StateId::Closed) => sink.emit(&AppEvent::InitializationComplete),
            (_, StateId::StuckOpen) => sink.emit(&AppEvent::StuckOpen {
                open_for_ms: self.monitor.open_for_ms(),
            }),
            _ => {}
        }
    }

    /// Send a notice to the operator, preceded by its typing cue.
    fn announce(
        &self,
        notice: Notice,
        channel: &mut impl ChannelPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        let chat_id = self.config.authorized_chat_id.as_str();
        if chat_id.is_empty() {
            return;
        }

        if let Some(cue) = notice.cue() {
            if let Err(e) = channel.indicate_composing(chat_id) {
                log::debug!("typing cue failed: {}", e);
            }
            delay.delay_ms(match cue {
                NoticeCue::Boot => self.config.reply_typing_ms,
                NoticeCue::Door => self.config.notify_typing_ms,
            });
        }

        if let Err(error) = channel.notify(chat_id, notice.text()) {
            sink.emit(&AppEvent::DeliveryFailed {
                operation: "notify",
                error,
            });
        }
    }
}
