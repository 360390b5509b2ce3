//! Fuzz target: `telegram::api::decode_updates` and `leading_update_id`
//!
//! Feeds arbitrary bytes as a `getUpdates` response body.  The decoder
//! must never panic, never overfill the batch, and only ever move the
//! cursor forward past an update it actually saw.
//!
//! cargo fuzz run fuzz_update_decoder

#![no_main]

use imail::adapters::telegram::api::{decode_ack, decode_updates, leading_update_id};
use imail::app::ports::MAX_INBOUND_BATCH;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(decoded) = decode_updates(data) {
        assert!(decoded.requests.len() <= MAX_INBOUND_BATCH);
        if !decoded.requests.is_empty() {
            assert!(decoded.next_offset.is_some(), "requests without a cursor");
        }
    }

    let _ = decode_ack(data);

    // Every prefix is a possible truncated oversize body.
    if let Some(id) = leading_update_id(data) {
        assert!(id >= 0);
    }
});
