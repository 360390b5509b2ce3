//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (reed switch, indicator LED, chat channel, clock, event
//! sinks, storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware or the network directly.
//!
//! ## Failure policy
//!
//! - **SensorPort** is infallible by contract: implementations return the
//!   last known reading when the hardware read fails.
//! - **ChannelPort** errors are typed, but the domain only logs them; a
//!   lost notification is never retried.

use crate::config::SystemConfig;

use super::commands::CommandRequest;

/// Maximum number of inbound requests handed over by one poll.
pub const MAX_INBOUND_BATCH: usize = 8;

/// One batch of inbound requests.
pub type InboundBatch = heapless::Vec<CommandRequest, MAX_INBOUND_BATCH>;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to sample the trap door.
pub trait SensorPort {
    /// `true` when the trap door is open.
    fn door_open(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the on-board LED that mirrors "door open".
pub trait IndicatorPort {
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Channel port (driven adapter: domain ↔ chat service)
// ───────────────────────────────────────────────────────────────

/// The notification and command transport.
///
/// The inbound cursor is owned by the implementation: every successful
/// [`poll_inbound`](ChannelPort::poll_inbound) advances it past the
/// requests it returned, so nothing is handed over twice.
pub trait ChannelPort {
    /// Fire-and-forget outbound message to a chat.
    fn notify(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Reply to a specific requester.
    fn respond(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Fetch requests received since the last poll.
    fn poll_inbound(&mut self) -> Result<InboundBatch, ChannelError>;

    /// "Typing…" cue shown before a message.  Purely cosmetic.
    fn indicate_composing(&mut self, chat_id: &str) -> Result<(), ChannelError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting and
/// reject invalid ranges with [`ConfigError::ValidationFailed`] rather
/// than clamping them.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for config blobs and credentials.
///
/// Keys are namespaced to prevent collisions between subsystems.
/// Write operations MUST be atomic; no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ChannelPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// Connection, TLS or socket failure.
    Io,
    /// The service did not answer in time.
    Timeout,
    /// Non-success HTTP status.
    Http(u16),
    /// The service answered but rejected the call (API error code).
    Api(i32),
    /// The response body could not be decoded.
    Decode,
    /// The response body exceeded the receive buffer.
    Oversize,
    /// The request could not be encoded (e.g. text too long).
    Encode,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "transport I/O error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Http(status) => write!(f, "HTTP status {}", status),
            Self::Api(code) => write!(f, "API error {}", code),
            Self::Decode => write!(f, "malformed response"),
            Self::Oversize => write!(f, "response too large"),
            Self::Encode => write!(f, "request could not be encoded"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
