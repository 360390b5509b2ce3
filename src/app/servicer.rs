//! Command servicer — answers chat commands between door samples.
//!
//! [`CommandServicer::tick`] is called once per loop iteration.  A
//! [`RateGate`] limits how often the channel is polled; when the gate
//! opens, one batch of inbound requests is fetched and every request is
//! answered before `tick` returns.  Requests that arrive while the batch is
//! being answered are left to the channel's cursor and picked up when the
//! gate next opens.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::SystemConfig;

use super::commands::{BotCommand, CommandRequest};
use super::events::{AppEvent, DoorState};
use super::ports::{ChannelPort, EventSink};

pub const NOT_VALID_USER: &str = "Not valid user!";
pub const NOT_VALID_COMMAND: &str =
    "Not valid command!, please use /help command to see available commands.";
pub const GETID_HELP_LINE: &str = "/getid : Check Telegram chat ID for configuration purpose.\n";

// ───────────────────────────────────────────────────────────────
// RateGate
// ───────────────────────────────────────────────────────────────

/// Minimum-interval gate on a monotonic millisecond clock.
///
/// Hand-written rather than `burster`: polling needs only the last opening
/// time and an interval on the injected clock, not a token bucket.
#[derive(Debug, Clone)]
pub struct RateGate {
    last_ms: Option<u64>,
    min_interval_ms: u64,
}

impl RateGate {
    pub fn new(min_interval_ms: u32) -> Self {
        Self {
            last_ms: None,
            min_interval_ms: u64::from(min_interval_ms),
        }
    }

    /// Returns `true` and records `now_ms` if at least the minimum interval
    /// has passed since the last opening.  The first call always opens.
    pub fn try_open(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_ms {
            if now_ms.saturating_sub(last) < self.min_interval_ms {
                return false;
            }
        }
        self.last_ms = Some(now_ms);
        true
    }

    /// Time of the last opening.
    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatch
// ───────────────────────────────────────────────────────────────

/// How one request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub command: BotCommand,
    pub authorized: bool,
    /// Replies in send order.
    pub replies: Vec<String>,
}

// ───────────────────────────────────────────────────────────────
// CommandServicer
// ───────────────────────────────────────────────────────────────

pub struct CommandServicer {
    gate: RateGate,
    config: SystemConfig,
}

impl CommandServicer {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            gate: RateGate::new(config.command_poll_interval_ms),
            config: config.clone(),
        }
    }

    /// Poll and answer, if the rate gate allows.  Returns the number of
    /// requests served.
    ///
    /// `door` is the monitor's last sampled state; `/status` never reads
    /// the sensor itself.
    pub fn tick(
        &mut self,
        now_ms: u64,
        door: DoorState,
        channel: &mut impl ChannelPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> usize {
        if !self.gate.try_open(now_ms) {
            return 0;
        }

        let batch = match channel.poll_inbound() {
            Ok(batch) => batch,
            Err(error) => {
                sink.emit(&AppEvent::DeliveryFailed {
                    operation: "poll",
                    error,
                });
                return 0;
            }
        };

        for request in &batch {
            let dispatch = self.dispatch(request, door);
            for reply in &dispatch.replies {
                self.send_reply(request.chat_id.as_str(), reply, channel, delay, sink);
            }
            sink.emit(&AppEvent::CommandServed {
                chat_id: request.chat_id.clone(),
                command: dispatch.command,
                authorized: dispatch.authorized,
            });
        }

        if !batch.is_empty() {
            info!("Served {} command(s)", batch.len());
        }
        batch.len()
    }

    /// Decide the replies for one request.  Pure: no channel I/O.
    pub fn dispatch(&self, request: &CommandRequest, door: DoorState) -> Dispatch {
        let command = request.command();
        let authorized = self.config.is_authorized(&request.chat_id);

        let mut replies = Vec::with_capacity(2);
        if authorized {
            replies.push(match command {
                BotCommand::Status => format!("Mail trap door is {}!\n", door.as_word()),
                BotCommand::Check => format!("{} is online!\n", self.config.device_name),
                BotCommand::GetId => request.chat_id.as_str().into(),
                BotCommand::Help => self.help_text(request.display_name()),
                BotCommand::Unknown => NOT_VALID_COMMAND.into(),
            });
        } else {
            replies.push(NOT_VALID_USER.into());
            if command.is_public() {
                replies.push(match command {
                    BotCommand::GetId => request.chat_id.as_str().into(),
                    _ => GETID_HELP_LINE.into(),
                });
            }
        }

        Dispatch {
            command,
            authorized,
            replies,
        }
    }

    pub fn rate_gate(&self) -> &RateGate {
        &self.gate
    }

    // ── Internal ──────────────────────────────────────────────

    fn help_text(&self, name: &str) -> String {
        format!(
            "Welcome to {dev}, {name}.\n\
             This is Commands {dev} help:\n\n\
             /check : Check if {dev} is online.\n\
             {GETID_HELP_LINE}\
             /status : Check if mailbox trap door is open or closed.\n",
            dev = self.config.device_name,
        )
    }

    fn send_reply(
        &self,
        chat_id: &str,
        text: &str,
        channel: &mut impl ChannelPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        if let Err(e) = channel.indicate_composing(chat_id) {
            debug!("typing cue to {} failed: {}", chat_id, e);
        }
        delay.delay_ms(self.config.reply_typing_ms);
        if let Err(error) = channel.respond(chat_id, text) {
            sink.emit(&AppEvent::DeliveryFailed {
                operation: "respond",
                error,
            });
        }
    }
}
