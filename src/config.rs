//! System configuration parameters
//!
//! All tunable parameters for the Imail mailbox notifier.
//! Values can be overridden via NVS (non-volatile storage); the authorized
//! chat id defaults to the `IMAIL_CHAT_ID` build-time variable.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum length of a chat identifier (Telegram ids are signed 64-bit).
pub const CHAT_ID_CAP: usize = 24;
/// Maximum length of the device name shown in replies.
pub const DEVICE_NAME_CAP: usize = 16;
/// Longest accepted typing pause before a notice or reply.
pub const MAX_TYPING_MS: u32 = 5_000;
/// Longest accepted main loop period.
pub const MAX_LOOP_INTERVAL_MS: u32 = 1_000;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// The single operator allowed the full command surface.
    /// Empty means nobody is authorized (every sender gets `/getid` only).
    pub authorized_chat_id: String<CHAT_ID_CAP>,
    /// Name used in help and online replies.
    pub device_name: String<DEVICE_NAME_CAP>,

    // --- Door monitoring ---
    /// Main loop period; also the re-check period while the door is stuck
    /// or the boot wait is active (milliseconds).
    pub loop_interval_ms: u32,
    /// How long the door may stay open before the "not closing" warning
    /// (milliseconds).
    pub stuck_grace_ms: u32,
    /// Input level that means "trap door open" (`true` = HIGH).
    pub sensor_open_high: bool,

    // --- Command channel ---
    /// Minimum interval between two inbound polls (milliseconds).
    pub command_poll_interval_ms: u32,
    /// Pause after the typing cue before a door notification (milliseconds).
    pub notify_typing_ms: u32,
    /// Pause after the typing cue before a reply or boot notice (milliseconds).
    pub reply_typing_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            authorized_chat_id: truncated(option_env!("IMAIL_CHAT_ID").unwrap_or("")),
            device_name: truncated("Imail"),

            loop_interval_ms: 100,
            stuck_grace_ms: 15_000,
            sensor_open_high: true,

            command_poll_interval_ms: 1_000,
            notify_typing_ms: 1_000,
            reply_typing_ms: 500,
        }
    }
}

impl SystemConfig {
    /// Whether `chat_id` is the configured operator.
    pub fn is_authorized(&self, chat_id: &str) -> bool {
        !self.authorized_chat_id.is_empty() && self.authorized_chat_id.as_str() == chat_id
    }
}

/// Copy as many whole characters of `s` as fit into a `String<N>`.
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
