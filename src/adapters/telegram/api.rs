//! Telegram Bot API wire types.
//!
//! Only the handful of fields the firmware reads are modelled; serde
//! ignores everything else in an update.

use serde::{Deserialize, Serialize};

use crate::app::commands::CommandRequest;
use crate::app::ports::{ChannelError, InboundBatch};

/// Longest message text the Bot API accepts (characters).
pub const MAX_TEXT_CHARS: usize = 4096;

// ───────────────────────────────────────────────────────────────
// Requests
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendChatAction<'a> {
    pub chat_id: &'a str,
    pub action: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub limit: u8,
    /// Long-poll timeout in seconds; 0 keeps the loop responsive.
    pub timeout: u32,
    pub allowed_updates: &'static [&'static str],
}

// ───────────────────────────────────────────────────────────────
// Responses
// ───────────────────────────────────────────────────────────────

/// Envelope around every Bot API result.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub first_name: String,
}

/// Inbound requests plus the cursor to send with the next `getUpdates`.
#[derive(Debug, Default)]
pub struct DecodedUpdates {
    pub requests: InboundBatch,
    /// `Some(last update_id + 1)` when anything was consumed.
    pub next_offset: Option<i64>,
}

/// Map an `ok: false` envelope to a [`ChannelError`].
pub fn api_error<T>(resp: &ApiResponse<T>) -> ChannelError {
    if let Some(desc) = &resp.description {
        log::warn!("Telegram: {}", desc);
    }
    ChannelError::Api(resp.error_code.unwrap_or(0))
}

/// Check a response envelope whose result the caller does not need.
pub fn decode_ack(body: &[u8]) -> Result<(), ChannelError> {
    let resp: ApiResponse<serde_json::Value> =
        serde_json::from_slice(body).map_err(|_| ChannelError::Decode)?;
    if resp.ok {
        Ok(())
    } else {
        Err(api_error(&resp))
    }
}

/// Decode a `getUpdates` response into command requests.
///
/// Updates without message text (edits, joins, stickers) are skipped but
/// still advance the cursor.  Decoding stops once the batch is full; the
/// cursor then points at the first update left behind, so it is returned
/// by the next poll.
pub fn decode_updates(body: &[u8]) -> Result<DecodedUpdates, ChannelError> {
    let resp: ApiResponse<Vec<Update>> =
        serde_json::from_slice(body).map_err(|_| ChannelError::Decode)?;
    if !resp.ok {
        return Err(api_error(&resp));
    }

    let mut out = DecodedUpdates::default();
    for update in resp.result.unwrap_or_default() {
        if let Some(Message {
            chat,
            from,
            text: Some(text),
        }) = update.message
        {
            let name = from.as_ref().map_or("", |u| u.first_name.as_str());
            let request = CommandRequest::new(&chat.id.to_string(), name, &text);
            if out.requests.push(request).is_err() {
                break;
            }
        }
        out.next_offset = Some(update.update_id + 1);
    }
    Ok(out)
}

/// `update_id` of the first update in a (possibly truncated) `getUpdates`
/// body.
///
/// Used when a response overran the receive buffer: the id always comes
/// first in an update object, so it survives truncation.
pub fn leading_update_id(prefix: &[u8]) -> Option<i64> {
    const KEY: &[u8] = b"\"update_id\"";
    let at = prefix.windows(KEY.len()).position(|w| w == KEY)?;
    let rest = trim_start(&prefix[at + KEY.len()..]).strip_prefix(b":")?;
    let digits = trim_start(rest);
    let len = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    // A number cut off by the truncation cannot be trusted.
    if len == 0 || len == digits.len() {
        return None;
    }
    core::str::from_utf8(&digits[..len]).ok()?.parse().ok()
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[skip..]
}
