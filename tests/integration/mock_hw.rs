//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real GPIO or the network.

use std::cell::Cell;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use imail::app::commands::CommandRequest;
use imail::app::events::AppEvent;
use imail::app::ports::{
    ChannelError, ChannelPort, ClockPort, EventSink, InboundBatch, IndicatorPort, SensorPort,
};
use imail::config::{SystemConfig, truncated};

pub const OPERATOR: &str = "424242";

/// Config with the test operator and no typing pauses.
pub fn test_config() -> SystemConfig {
    SystemConfig {
        authorized_chat_id: truncated(OPERATOR),
        notify_typing_ms: 0,
        reply_typing_ms: 0,
        ..Default::default()
    }
}

// ── MockHardware ──────────────────────────────────────────────

/// Scripted reed contact plus recorded indicator writes.  Once the
/// script runs out the last sample repeats.
pub struct MockHardware {
    samples: VecDeque<bool>,
    last: bool,
    pub reads: usize,
    pub indicator: Vec<bool>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn scripted(samples: &[bool]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            last: false,
            reads: 0,
            indicator: Vec::new(),
        }
    }

    pub fn push(&mut self, open: bool) {
        self.samples.push_back(open);
    }

    pub fn indicator_on(&self) -> bool {
        self.indicator.last().copied().unwrap_or(false)
    }
}

impl SensorPort for MockHardware {
    fn door_open(&mut self) -> bool {
        self.reads += 1;
        if let Some(s) = self.samples.pop_front() {
            self.last = s;
        }
        self.last
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, on: bool) {
        self.indicator.push(on);
    }
}

// ── MockChannel ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Notify { chat_id: String, text: String },
    Respond { chat_id: String, text: String },
    Typing { chat_id: String },
}

#[derive(Default)]
pub struct MockChannel {
    pub sent: Vec<Sent>,
    /// One entry per poll; an exhausted queue polls empty.
    inbound: VecDeque<InboundBatch>,
    pub polls: usize,
    pub fail_notify: bool,
    pub fail_respond: bool,
    pub fail_poll: bool,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one batch for the next poll.
    pub fn queue(&mut self, requests: &[(&str, &str, &str)]) {
        let mut batch = InboundBatch::new();
        for (chat_id, name, text) in requests {
            batch
                .push(CommandRequest::new(chat_id, name, text))
                .expect("batch overflow in test");
        }
        self.inbound.push_back(batch);
    }

    /// Queue an empty poll result.
    pub fn queue_empty(&mut self) {
        self.inbound.push_back(InboundBatch::new());
    }

    pub fn notices(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Notify { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn responses_to(&self, chat_id: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Respond { chat_id: c, text } if c == chat_id => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, text: &str) -> Option<usize> {
        self.sent.iter().position(|s| match s {
            Sent::Notify { text: t, .. } | Sent::Respond { text: t, .. } => t == text,
            Sent::Typing { .. } => false,
        })
    }
}

impl ChannelPort for MockChannel {
    fn notify(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        if self.fail_notify {
            return Err(ChannelError::Io);
        }
        self.sent.push(Sent::Notify {
            chat_id: chat_id.into(),
            text: text.into(),
        });
        Ok(())
    }

    fn respond(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        if self.fail_respond {
            return Err(ChannelError::Timeout);
        }
        self.sent.push(Sent::Respond {
            chat_id: chat_id.into(),
            text: text.into(),
        });
        Ok(())
    }

    fn poll_inbound(&mut self) -> Result<InboundBatch, ChannelError> {
        self.polls += 1;
        if self.fail_poll {
            return Err(ChannelError::Http(502));
        }
        Ok(self.inbound.pop_front().unwrap_or_default())
    }

    fn indicate_composing(&mut self, chat_id: &str) -> Result<(), ChannelError> {
        self.sent.push(Sent::Typing {
            chat_id: chat_id.into(),
        });
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Manual clock.  Time only moves through `advance` and delays.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
    pub delays_ms: Vec<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        self.advance(u64::from(ms));
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
