//! Telegram Bot API channel adapter.
//!
//! Implements [`ChannelPort`] on top of three Bot API methods:
//!
//! | Port operation       | Bot API method   |
//! |----------------------|------------------|
//! | `notify` / `respond` | `sendMessage`    |
//! | `indicate_composing` | `sendChatAction` |
//! | `poll_inbound`       | `getUpdates`     |
//!
//! The adapter owns the update cursor: after every successful poll the
//! next `getUpdates` asks for `offset = last update_id + 1`, which also
//! acknowledges the consumed updates server-side. A batch that overruns
//! the receive buffer is fetched again one update at a time, and a single
//! update that still does not fit is skipped.

pub mod api;
pub mod http;

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::{ChannelError, ChannelPort, InboundBatch, MAX_INBOUND_BATCH};

use api::{GetUpdates, SendChatAction, SendMessage};
use http::HttpTransport;

pub use http::MAX_RESPONSE_BYTES;
#[cfg(target_os = "espidf")]
pub use http::EspHttpTransport;

pub const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramChannel<T> {
    transport: T,
    /// `https://api.telegram.org/bot<token>`
    base_url: String,
    next_offset: Option<i64>,
    response: Vec<u8>,
}

impl<T: HttpTransport> TelegramChannel<T> {
    pub fn new(transport: T, bot_token: &str) -> Self {
        Self::with_base(transport, API_BASE, bot_token)
    }

    /// Point the adapter at a different API host (local Bot API server).
    pub fn with_base(transport: T, api_base: &str, bot_token: &str) -> Self {
        Self {
            transport,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
            next_offset: None,
            response: Vec::new(),
        }
    }

    /// Offset the next `getUpdates` will send.
    pub fn next_offset(&self) -> Option<i64> {
        self.next_offset
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ── Internal ──────────────────────────────────────────────

    /// POST one Bot API call; returns the raw response body on HTTP 200.
    fn call(&mut self, method: &str, payload: &impl Serialize) -> Result<&[u8], ChannelError> {
        let body = serde_json::to_vec(payload).map_err(|_| ChannelError::Encode)?;
        let url = format!("{}/{}", self.base_url, method);

        let status = self.transport.post_json(&url, &body, &mut self.response)?;
        debug!("Telegram: {} -> HTTP {}", method, status);
        if status != 200 {
            // Bot API errors come back as 4xx with an `ok: false` envelope.
            return Err(match api::decode_ack(&self.response) {
                Err(e @ ChannelError::Api(_)) => e,
                _ => ChannelError::Http(status),
            });
        }
        Ok(&self.response)
    }

    fn get_updates(&mut self, limit: u8) -> Result<InboundBatch, ChannelError> {
        let req = GetUpdates {
            offset: self.next_offset,
            limit,
            timeout: 0,
            allowed_updates: &["message"],
        };
        let body = self.call("getUpdates", &req)?;
        let decoded = api::decode_updates(body)?;
        if decoded.next_offset.is_some() {
            self.next_offset = decoded.next_offset;
        }
        Ok(decoded.requests)
    }

    /// A single update too large to buffer can never be decoded; move the
    /// cursor past it so later updates still arrive. The id is read from the
    /// truncated body left in `response`.
    fn skip_oversized_update(&mut self) -> Result<InboundBatch, ChannelError> {
        let id = api::leading_update_id(&self.response).ok_or(ChannelError::Oversize)?;
        warn!(
            "Telegram: dropping update {} (over {} bytes)",
            id, MAX_RESPONSE_BYTES
        );
        self.next_offset = Some(id.saturating_add(1));
        Ok(InboundBatch::new())
    }

    fn send_message(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        if text.chars().count() > api::MAX_TEXT_CHARS {
            return Err(ChannelError::Encode);
        }
        let body = self.call("sendMessage", &SendMessage { chat_id, text })?;
        api::decode_ack(body)
    }
}

impl<T: HttpTransport> ChannelPort for TelegramChannel<T> {
    fn notify(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        self.send_message(chat_id, text)
    }

    fn respond(&mut self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        self.send_message(chat_id, text)
    }

    fn poll_inbound(&mut self) -> Result<InboundBatch, ChannelError> {
        match self.get_updates(MAX_INBOUND_BATCH as u8) {
            Err(ChannelError::Oversize) => {}
            other => return other,
        }
        warn!("Telegram: update batch overran the receive buffer, fetching one at a time");
        match self.get_updates(1) {
            Err(ChannelError::Oversize) => self.skip_oversized_update(),
            other => other,
        }
    }

    fn indicate_composing(&mut self, chat_id: &str) -> Result<(), ChannelError> {
        let body = self.call(
            "sendChatAction",
            &SendChatAction {
                chat_id,
                action: "typing",
            },
        )?;
        api::decode_ack(body)
    }
}
