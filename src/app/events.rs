//! Door state, transitions, and outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port and sends
//! [`Notice`]s to the operator through the
//! [`ChannelPort`](super::ports::ChannelPort).

use super::commands::BotCommand;
use super::ports::ChannelError;

/// Physical trap-door condition, as last sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorState {
    #[default]
    Closed,
    Open,
}

impl DoorState {
    pub fn from_open(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    /// Word used in status replies.
    pub fn as_word(self) -> &'static str {
        match self {
            Self::Open => "opened",
            Self::Closed => "closed",
        }
    }
}

/// A change of [`DoorState`] observed by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: DoorState,
    pub to: DoorState,
    /// Monotonic timestamp of the sample that observed the change.
    pub at_ms: u64,
}

/// Operator notifications sent on door events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Device finished booting.
    StartedUp,
    /// Door found closed; initialisation done.
    InitComplete,
    /// Door found open at boot; startup waits for it to close.
    CloseToInitialize,
    /// Closed → Open in steady state.
    MailArrived,
    /// Door still open after the grace period.
    NotClosing,
    /// Open → Closed in steady state.
    ClosedAgain,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Self::StartedUp => "Imail started up",
            Self::InitComplete => "Mailbox trap door is closed!\nInitialization is complete!\n",
            Self::CloseToInitialize => {
                "Mailbox trap door is open, please close it to initialize correctly!\n"
            }
            Self::MailArrived => "YOU GOT MAIL!\n",
            Self::NotClosing => "Mailbox trap door is not closing!\n",
            Self::ClosedAgain => "Mailbox trap door is closed again!\n",
        }
    }

    /// Whether the notice is preceded by a typing cue, and if so whether it
    /// belongs to the boot sequence (short pause) or steady state (long).
    pub fn cue(self) -> Option<NoticeCue> {
        match self {
            Self::StartedUp => None,
            Self::InitComplete | Self::CloseToInitialize => Some(NoticeCue::Boot),
            Self::MailArrived | Self::NotClosing | Self::ClosedAgain => Some(NoticeCue::Door),
        }
    }
}

/// Pause class for the typing cue in front of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCue {
    Boot,
    Door,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started; carries the first sampled door state.
    Started(DoorState),

    /// The door changed state.
    DoorChanged(TransitionEvent),

    /// The door has been open longer than the grace period.
    StuckOpen { open_for_ms: u64 },

    /// Startup is waiting for the door to close.
    InitializationBlocked,

    /// Startup finished.
    InitializationComplete,

    /// An inbound command was answered.
    CommandServed {
        chat_id: heapless::String<{ crate::config::CHAT_ID_CAP }>,
        command: BotCommand,
        authorized: bool,
    },

    /// A channel operation failed; the loop carries on.
    DeliveryFailed {
        operation: &'static str,
        error: ChannelError,
    },
}
