//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(door) => {
                info!("START | door={}", door.as_word());
            }
            AppEvent::DoorChanged(t) => {
                info!(
                    "DOOR | {} -> {} at {} ms",
                    t.from.as_word(),
                    t.to.as_word(),
                    t.at_ms
                );
            }
            AppEvent::StuckOpen { open_for_ms } => {
                warn!("DOOR | stuck open for {} ms", open_for_ms);
            }
            AppEvent::InitializationBlocked => {
                warn!("INIT | blocked, trap door open");
            }
            AppEvent::InitializationComplete => {
                info!("INIT | complete");
            }
            AppEvent::CommandServed {
                chat_id,
                command,
                authorized,
            } => {
                info!(
                    "CMD | chat={} cmd={:?} authorized={}",
                    chat_id, command, authorized
                );
            }
            AppEvent::DeliveryFailed { operation, error } => {
                warn!("CHANNEL | {} failed: {}", operation, error);
            }
        }
    }
}
