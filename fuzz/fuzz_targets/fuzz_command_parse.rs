//! Fuzz target: `BotCommand::parse` and request dispatch
//!
//! Arbitrary UTF-8 message text must parse without panicking, and an
//! unauthorized sender must always be refused first.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use imail::app::commands::{BotCommand, CommandRequest};
use imail::app::events::DoorState;
use imail::app::servicer::{CommandServicer, NOT_VALID_USER};
use imail::config::{SystemConfig, truncated};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let _ = BotCommand::parse(text);

    let config = SystemConfig {
        authorized_chat_id: truncated("1"),
        ..Default::default()
    };
    let servicer = CommandServicer::new(&config);
    let d = servicer.dispatch(&CommandRequest::new("2", text, text), DoorState::Closed);
    assert_eq!(d.replies.first().map(String::as_str), Some(NOT_VALID_USER));
});
