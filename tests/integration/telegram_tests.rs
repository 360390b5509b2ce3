//! Telegram channel adapter over a scripted HTTP transport.

use std::cell::Cell;
use std::collections::VecDeque;

use imail::adapters::telegram::TelegramChannel;
use imail::adapters::telegram::http::{HttpTransport, Supervised};
use imail::app::events::Notice;
use imail::app::ports::{ChannelError, ChannelPort};
use imail::app::service::AppService;

use crate::mock_hw::{LogSink, MockClock, MockHardware, OPERATOR, test_config};

const TOKEN: &str = "123:abc";
const OK_ACK: &str = r#"{"ok":true,"result":true}"#;

/// One scripted transport outcome.
enum Step {
    Reply(u16, String),
    Fail(ChannelError),
    /// Body larger than the receive buffer: only this prefix arrives.
    Overflow(String),
}

/// Replays canned responses and records every request.
#[derive(Default)]
struct MockHttp {
    steps: VecDeque<Step>,
    /// `(url, body)` of each request.
    requests: Vec<(String, serde_json::Value)>,
}

impl MockHttp {
    fn reply(&mut self, status: u16, body: &str) {
        self.steps.push_back(Step::Reply(status, body.into()));
    }

    fn fail(&mut self, error: ChannelError) {
        self.steps.push_back(Step::Fail(error));
    }

    fn overflow(&mut self, prefix: &str) {
        self.steps.push_back(Step::Overflow(prefix.into()));
    }

    fn methods(&self) -> Vec<&str> {
        self.requests
            .iter()
            .map(|(url, _)| url.rsplit('/').next().unwrap_or(""))
            .collect()
    }
}

impl HttpTransport for MockHttp {
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        response: &mut Vec<u8>,
    ) -> Result<u16, ChannelError> {
        let json = serde_json::from_slice(body).expect("request body is JSON");
        self.requests.push((url.into(), json));
        response.clear();
        // An unscripted call gets a plain acknowledgement.
        match self
            .steps
            .pop_front()
            .unwrap_or_else(|| Step::Reply(200, OK_ACK.into()))
        {
            Step::Reply(status, text) => {
                response.extend_from_slice(text.as_bytes());
                Ok(status)
            }
            Step::Fail(error) => Err(error),
            Step::Overflow(prefix) => {
                response.extend_from_slice(prefix.as_bytes());
                Err(ChannelError::Oversize)
            }
        }
    }
}

fn channel() -> TelegramChannel<MockHttp> {
    TelegramChannel::new(MockHttp::default(), TOKEN)
}

fn updates(entries: &[(i64, &str, &str)]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|(id, chat, text)| {
            format!(
                r#"{{"update_id":{id},"message":{{"message_id":1,"chat":{{"id":{chat},"type":"private"}},"from":{{"id":{chat},"is_bot":false,"first_name":"Ana"}},"text":"{text}"}}}}"#
            )
        })
        .collect();
    format!(r#"{{"ok":true,"result":[{}]}}"#, items.join(","))
}

// ── Outbound ──────────────────────────────────────────────────

#[test]
fn send_message_posts_chat_and_text() {
    let mut ch = channel();
    ch.notify(OPERATOR, "YOU GOT MAIL!\n").unwrap();

    let (url, body) = &ch.transport().requests[0];
    assert_eq!(url, "https://api.telegram.org/bot123:abc/sendMessage");
    assert_eq!(body["chat_id"], OPERATOR);
    assert_eq!(body["text"], "YOU GOT MAIL!\n");
}

#[test]
fn typing_cue_uses_chat_action() {
    let mut ch = channel();
    ch.indicate_composing(OPERATOR).unwrap();

    let (url, body) = &ch.transport().requests[0];
    assert!(url.ends_with("/sendChatAction"));
    assert_eq!(body["action"], "typing");
}

#[test]
fn custom_api_base_is_honoured() {
    let mut ch = TelegramChannel::with_base(MockHttp::default(), "http://localhost:8081/", TOKEN);
    ch.respond(OPERATOR, "hi").unwrap();
    assert_eq!(
        ch.transport().requests[0].0,
        "http://localhost:8081/bot123:abc/sendMessage"
    );
}

#[test]
fn overlong_text_is_rejected_before_sending() {
    let mut ch = channel();
    let text = "x".repeat(4097);
    assert_eq!(ch.notify(OPERATOR, &text), Err(ChannelError::Encode));
    assert!(ch.transport().requests.is_empty());
}

// ── Errors ────────────────────────────────────────────────────

#[test]
fn api_rejection_maps_to_api_error() {
    let mut ch = channel();
    ch.transport_reply(
        403,
        r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#,
    );
    assert_eq!(ch.notify(OPERATOR, "hi"), Err(ChannelError::Api(403)));
}

#[test]
fn non_json_error_page_maps_to_http_status() {
    let mut ch = channel();
    ch.transport_reply(502, "<html>Bad Gateway</html>");
    assert_eq!(ch.respond(OPERATOR, "hi"), Err(ChannelError::Http(502)));
}

#[test]
fn transport_failure_is_passed_through() {
    let mut ch = channel();
    ch.transport_fail(ChannelError::Timeout);
    assert_eq!(ch.poll_inbound(), Err(ChannelError::Timeout));
    assert_eq!(ch.next_offset(), None);
}

#[test]
fn garbage_body_is_a_decode_error() {
    let mut ch = channel();
    ch.transport_reply(200, "not json");
    assert_eq!(ch.poll_inbound(), Err(ChannelError::Decode));
}

// ── Inbound cursor ────────────────────────────────────────────

#[test]
fn cursor_advances_past_consumed_updates() {
    let mut ch = channel();
    ch.transport_reply(200, &updates(&[(10, OPERATOR, "/status"), (11, "777", "/getid")]));
    ch.transport_reply(200, r#"{"ok":true,"result":[]}"#);

    let batch = ch.poll_inbound().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].chat_id.as_str(), OPERATOR);
    assert_eq!(batch[0].text.as_str(), "/status");
    assert_eq!(batch[0].sender_name.as_str(), "Ana");
    assert_eq!(batch[1].chat_id.as_str(), "777");
    assert_eq!(ch.next_offset(), Some(12));

    // First poll carries no offset; the next acknowledges update 11.
    let first = &ch.transport().requests[0].1;
    assert!(first.get("offset").is_none());
    assert_eq!(first["limit"], 8);

    assert!(ch.poll_inbound().unwrap().is_empty());
    assert_eq!(ch.transport().requests[1].1["offset"], 12);
    assert_eq!(ch.next_offset(), Some(12), "empty poll keeps the cursor");
}

#[test]
fn failed_poll_keeps_the_cursor() {
    let mut ch = channel();
    ch.transport_reply(200, &updates(&[(5, OPERATOR, "/check")]));
    ch.transport_fail(ChannelError::Io);
    ch.poll_inbound().unwrap();
    assert!(ch.poll_inbound().is_err());
    assert_eq!(ch.next_offset(), Some(6));
}

// ── Oversized responses ───────────────────────────────────────

/// What arrives of a `getUpdates` body cut off at the receive buffer.
fn truncated_updates(first_id: i64) -> String {
    format!(
        r#"{{"ok":true,"result":[{{"update_id":{first_id},"message":{{"message_id":1,"chat":{{"id":5,"type":"private"}},"text":"xxxxxxxx"#
    )
}

#[test]
fn oversized_batch_is_fetched_one_update_at_a_time() {
    let mut ch = channel();
    ch.transport_mut().overflow(&truncated_updates(20));
    ch.transport_reply(200, &updates(&[(20, OPERATOR, "/status")]));

    let batch = ch.poll_inbound().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].text.as_str(), "/status");
    assert_eq!(ch.next_offset(), Some(21));

    let limits: Vec<_> = ch.transport().requests.iter().map(|(_, b)| b["limit"].clone()).collect();
    assert_eq!(limits, vec![8, 1]);
}

#[test]
fn oversized_single_update_is_skipped() {
    let mut ch = channel();
    ch.transport_reply(200, &updates(&[(29, OPERATOR, "/check")]));
    ch.poll_inbound().unwrap();

    ch.transport_mut().overflow(&truncated_updates(30));
    ch.transport_mut().overflow(&truncated_updates(30));
    ch.transport_reply(200, &updates(&[(31, OPERATOR, "/status")]));

    assert!(ch.poll_inbound().unwrap().is_empty());
    assert_eq!(ch.next_offset(), Some(31));

    // The next poll acknowledges the dropped update and gets the rest.
    let batch = ch.poll_inbound().unwrap();
    assert_eq!(batch[0].text.as_str(), "/status");
    let requests = &ch.transport().requests;
    assert_eq!(requests[1].1["offset"], 30);
    assert_eq!(requests[2].1["offset"], 30);
    assert_eq!(requests[3].1["offset"], 31);
    assert_eq!(ch.next_offset(), Some(32));
}

#[test]
fn unreadable_oversized_body_keeps_the_cursor() {
    let mut ch = channel();
    ch.transport_reply(200, &updates(&[(3, OPERATOR, "/check")]));
    ch.poll_inbound().unwrap();

    ch.transport_mut().overflow("<html>");
    ch.transport_mut().overflow(r#"{"ok":true,"result":[{"update_id":12"#);
    assert_eq!(ch.poll_inbound(), Err(ChannelError::Oversize));
    assert_eq!(ch.next_offset(), Some(4));
}

#[test]
fn oversized_send_is_reported_not_retried() {
    let mut ch = channel();
    ch.transport_mut().overflow(r#"{"ok":true,"result":{"message_id":1"#);
    assert_eq!(ch.notify(OPERATOR, "hi"), Err(ChannelError::Oversize));
    assert_eq!(ch.transport().requests.len(), 1);
}

#[test]
fn operator_is_served_after_an_oversized_update() {
    let mut ch = channel();
    let mut app = AppService::new(test_config());
    let mut hw = MockHardware::scripted(&[false]);
    let mut clock = MockClock::new();
    let mut sink = LogSink::new();

    // start(): announcement, typing + init notice, then a poll that
    // overflows twice and skips update 40.
    ch.transport_reply(200, OK_ACK);
    ch.transport_reply(200, OK_ACK);
    ch.transport_reply(200, OK_ACK);
    ch.transport_mut().overflow(&truncated_updates(40));
    ch.transport_mut().overflow(&truncated_updates(40));
    app.start(&mut hw, &mut ch, &mut clock, &mut sink);
    assert_eq!(ch.next_offset(), Some(41));

    ch.transport_reply(200, &updates(&[(41, OPERATOR, "/status")]));
    clock.advance(1_000);
    app.tick(&mut hw, &mut ch, &mut clock, &mut sink);

    let texts: Vec<_> = ch
        .transport()
        .requests
        .iter()
        .filter_map(|(_, b)| b.get("text").and_then(|t| t.as_str()))
        .collect();
    assert_eq!(texts.last(), Some(&"Mail trap door is closed!\n"));
    assert_eq!(ch.next_offset(), Some(42));
}

// ── Watchdog feeding ──────────────────────────────────────────

#[test]
fn supervised_transport_feeds_before_every_request() {
    let feeds = Cell::new(0u32);
    let mut inner = MockHttp::default();
    inner.overflow(&truncated_updates(7));
    inner.reply(200, &updates(&[(7, OPERATOR, "/check")]));
    let transport = Supervised::new(inner, || feeds.set(feeds.get() + 1));
    let mut ch = TelegramChannel::new(transport, TOKEN);

    ch.poll_inbound().unwrap();
    ch.indicate_composing(OPERATOR).unwrap();
    ch.respond(OPERATOR, "Imail is online!\n").unwrap();

    assert_eq!(ch.transport().inner().requests.len(), 4);
    assert_eq!(feeds.get(), 4);
}

// ── Through the service ───────────────────────────────────────

#[test]
fn status_command_round_trip() {
    let mut ch = channel();
    let mut app = AppService::new(test_config());
    let mut hw = MockHardware::scripted(&[false]);
    let mut clock = MockClock::new();
    let mut sink = LogSink::new();

    // Calls in order: started-up notice, typing + init notice, poll.
    ch.transport_reply(200, OK_ACK);
    ch.transport_reply(200, OK_ACK);
    ch.transport_reply(200, OK_ACK);
    ch.transport_reply(200, &updates(&[(1, OPERATOR, "/status")]));
    app.start(&mut hw, &mut ch, &mut clock, &mut sink);

    assert_eq!(
        ch.transport().methods(),
        vec![
            "sendMessage",
            "sendChatAction",
            "sendMessage",
            "getUpdates",
            "sendChatAction",
            "sendMessage",
        ]
    );
    let bodies: Vec<_> = ch
        .transport()
        .requests
        .iter()
        .filter_map(|(_, b)| b.get("text").and_then(|t| t.as_str()))
        .collect();
    assert_eq!(
        bodies,
        vec![
            Notice::StartedUp.text(),
            Notice::InitComplete.text(),
            "Mail trap door is closed!\n",
        ]
    );
    assert_eq!(ch.next_offset(), Some(2));
}

/// Scripting helpers that reach through the channel to its transport.
trait Scripted {
    fn transport_reply(&mut self, status: u16, body: &str);
    fn transport_fail(&mut self, error: ChannelError);
}

impl Scripted for TelegramChannel<MockHttp> {
    fn transport_reply(&mut self, status: u16, body: &str) {
        self.transport_mut().reply(status, body);
    }

    fn transport_fail(&mut self, error: ChannelError) {
        self.transport_mut().fail(error);
    }
}
