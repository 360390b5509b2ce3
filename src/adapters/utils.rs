//! Text checks shared by the credential and config validators.
//!
//! Telegram ids and tokens, Wi-Fi SSIDs and the device name all end up in
//! NVS and in HTTP request bodies, so each is restricted to plain ASCII.

/// Every byte is printable ASCII, space through tilde.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// A Telegram chat id: decimal digits, negative for groups and channels.
pub(super) fn is_chat_id(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The part of a bot token after the colon: printable, no spaces.
pub(super) fn is_token_secret(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| (0x21..=0x7E).contains(&b))
}
