//! Inbound chat commands.
//!
//! The channel hands over raw [`CommandRequest`]s; the
//! [`CommandServicer`](super::servicer::CommandServicer) parses each one
//! exactly once into a [`BotCommand`] and dispatches on the enum.

use heapless::String;

use crate::config::{CHAT_ID_CAP, truncated};

/// Capacity of the sender display name.
pub const SENDER_NAME_CAP: usize = 64;
/// Capacity of the command text.  A longer text is kept truncated for
/// logging but always parses as [`BotCommand::Unknown`].
pub const COMMAND_TEXT_CAP: usize = 128;

/// One inbound message, as received from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub chat_id: String<CHAT_ID_CAP>,
    pub sender_name: String<SENDER_NAME_CAP>,
    pub text: String<COMMAND_TEXT_CAP>,
    /// The original text did not fit in `text`.
    pub overlong: bool,
}

impl CommandRequest {
    pub fn new(chat_id: &str, sender_name: &str, text: &str) -> Self {
        let kept: String<COMMAND_TEXT_CAP> = truncated(text);
        Self {
            chat_id: truncated(chat_id),
            sender_name: truncated(sender_name),
            overlong: kept.len() < text.len(),
            text: kept,
        }
    }

    /// The command this request asks for.
    pub fn command(&self) -> BotCommand {
        if self.overlong {
            BotCommand::Unknown
        } else {
            BotCommand::parse(&self.text)
        }
    }

    /// Sender name for greetings, `"Guest"` when the channel gave none.
    pub fn display_name(&self) -> &str {
        if self.sender_name.is_empty() {
            "Guest"
        } else {
            self.sender_name.as_str()
        }
    }
}

/// The closed command surface of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `/help` — list the available commands.
    Help,
    /// `/status` — report whether the trap door is open or closed.
    Status,
    /// `/check` — online check.
    Check,
    /// `/getid` — echo the requester's chat id.
    GetId,
    /// Anything else.
    Unknown,
}

impl BotCommand {
    /// Parse message text.
    ///
    /// Matching is exact apart from surrounding whitespace and the
    /// `@botname` suffix chat clients append in group chats.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let word = match text.split_once('@') {
            Some((cmd, bot)) if !bot.is_empty() && !bot.contains(char::is_whitespace) => cmd,
            _ => text,
        };
        match word {
            "/help" => Self::Help,
            "/status" => Self::Status,
            "/check" => Self::Check,
            "/getid" => Self::GetId,
            _ => Self::Unknown,
        }
    }

    /// Commands an unauthorized sender may still use.
    pub fn is_public(self) -> bool {
        matches!(self, Self::GetId | Self::Help)
    }
}
