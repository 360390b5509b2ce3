//! AppService end-to-end behaviour against mock adapters.
//!
//! The mock clock only moves through the service's own delays and the
//! explicit `advance` calls below, so every sample timestamp is exact.

use embedded_hal::delay::DelayNs;
use imail::app::events::{AppEvent, DoorState, Notice};
use imail::app::service::AppService;
use imail::config::SystemConfig;
use imail::fsm::StateId;

use crate::mock_hw::{LogSink, MockChannel, MockClock, MockHardware, OPERATOR, Sent, test_config};

struct Rig {
    app: AppService,
    hw: MockHardware,
    channel: MockChannel,
    clock: MockClock,
    sink: LogSink,
}

impl Rig {
    fn new(config: SystemConfig, samples: &[bool]) -> Self {
        Self {
            app: AppService::new(config),
            hw: MockHardware::scripted(samples),
            channel: MockChannel::new(),
            clock: MockClock::new(),
            sink: LogSink::new(),
        }
    }

    fn start(&mut self) {
        self.app
            .start(&mut self.hw, &mut self.channel, &mut self.clock, &mut self.sink);
    }

    /// One main-loop iteration as the firmware runs it: wait, then tick.
    fn step(&mut self) {
        let interval = self.app.loop_interval_ms();
        self.clock.delay_ms(interval);
        self.app
            .tick(&mut self.hw, &mut self.channel, &mut self.clock, &mut self.sink);
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn closed_at_boot_completes_initialization_immediately() {
    let mut rig = Rig::new(test_config(), &[false]);
    rig.start();

    assert_eq!(rig.app.monitor().phase(), StateId::Closed);
    assert_eq!(rig.app.tick_count(), 1);
    assert_eq!(
        rig.channel.notices(),
        vec![Notice::StartedUp.text(), Notice::InitComplete.text()]
    );
    assert!(rig.sink.events.contains(&AppEvent::Started(DoorState::Closed)));
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::InitializationComplete)),
        1
    );
    assert!(!rig.hw.indicator_on());
}

#[test]
fn open_at_boot_blocks_until_closed() {
    let mut rig = Rig::new(test_config(), &[true, true, true, false]);
    rig.start();

    assert_eq!(rig.hw.reads, 4, "start() returns on the first closed sample");
    assert_eq!(rig.app.monitor().phase(), StateId::Closed);
    assert_eq!(
        rig.channel.notices(),
        vec![
            Notice::StartedUp.text(),
            Notice::CloseToInitialize.text(),
            Notice::InitComplete.text(),
        ]
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::InitializationBlocked)),
        1
    );
    // Lit while waiting, dark once closed.
    assert_eq!(rig.hw.indicator, vec![true, false]);
}

#[test]
fn boot_wait_never_reports_mail() {
    let mut rig = Rig::new(test_config(), &[true, true, false, true]);
    rig.start();
    rig.step();

    let notices = rig.channel.notices();
    assert_eq!(
        notices
            .iter()
            .filter(|n| **n == Notice::MailArrived.text())
            .count(),
        1,
        "only the open after initialization is mail"
    );
    assert_eq!(notices.last(), Some(&Notice::MailArrived.text()));
}

#[test]
fn commands_are_answered_during_boot_wait() {
    let mut rig = Rig::new(test_config(), &[true; 15]);
    rig.hw.push(false);
    rig.channel.queue(&[(OPERATOR, "Ana", "/status")]);
    rig.start();

    assert_eq!(
        rig.channel.responses_to(OPERATOR),
        vec!["Mail trap door is opened!\n"]
    );
}

#[test]
fn no_operator_means_no_notices() {
    let config = SystemConfig {
        authorized_chat_id: heapless::String::new(),
        ..test_config()
    };
    let mut rig = Rig::new(config, &[false, true, false]);
    rig.start();
    rig.step();
    rig.step();

    assert!(rig.channel.notices().is_empty());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::DoorChanged(_))),
        2,
        "transitions are still tracked"
    );
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn mail_cycle_with_stuck_warning() {
    // 1 s per sample, 2 s grace: open at sample 3, stuck at sample 5.
    let config = SystemConfig {
        loop_interval_ms: 1_000,
        stuck_grace_ms: 2_000,
        command_poll_interval_ms: 60_000,
        ..test_config()
    };
    let mut rig = Rig::new(config, &[false, false, true, true, true, false]);
    rig.start();
    let mut per_sample = vec![rig.channel.notices().len()];
    for _ in 0..5 {
        rig.step();
        per_sample.push(rig.channel.notices().len());
    }

    assert_eq!(
        rig.channel.notices(),
        vec![
            Notice::StartedUp.text(),
            Notice::InitComplete.text(),
            Notice::MailArrived.text(),
            Notice::NotClosing.text(),
            Notice::ClosedAgain.text(),
        ]
    );
    // Notice count after samples 1..=6.
    assert_eq!(per_sample, vec![2, 2, 3, 3, 4, 5]);

    let stuck: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StuckOpen { open_for_ms } => Some(*open_for_ms),
            _ => None,
        })
        .collect();
    assert_eq!(stuck, vec![2_000]);
    // Re-applied on every transition, including Open -> StuckOpen.
    assert_eq!(rig.hw.indicator, vec![false, true, true, false]);
}

#[test]
fn steady_door_sends_nothing_new() {
    let mut rig = Rig::new(test_config(), &[false]);
    rig.start();
    let before = rig.channel.sent.len();
    for _ in 0..50 {
        rig.step();
    }
    assert_eq!(rig.channel.sent.len(), before);
    assert_eq!(rig.app.tick_count(), 51);
}

#[test]
fn door_notices_use_the_longer_typing_pause() {
    let config = SystemConfig {
        notify_typing_ms: 1_000,
        reply_typing_ms: 500,
        command_poll_interval_ms: 60_000,
        ..test_config()
    };
    let mut rig = Rig::new(config, &[false, true]);
    rig.start();
    rig.step();

    // Boot notice pause, loop wait, then the door notice pause.
    assert_eq!(rig.clock.delays_ms, vec![500, 100, 1_000]);
    let typing_before_mail = rig
        .channel
        .sent
        .iter()
        .position(|s| matches!(s, Sent::Notify { text, .. } if text == Notice::MailArrived.text()))
        .and_then(|i| i.checked_sub(1))
        .map(|i| &rig.channel.sent[i]);
    assert_eq!(
        typing_before_mail,
        Some(&Sent::Typing {
            chat_id: OPERATOR.into()
        })
    );
}

#[test]
fn status_reply_follows_the_transition_notice() {
    let mut rig = Rig::new(test_config(), &[false, true]);
    rig.start();
    // The first poll happened during start(); the next one is the status.
    rig.channel.queue(&[(OPERATOR, "Ana", "/status")]);
    rig.clock.advance(1_000);
    rig.app
        .tick(&mut rig.hw, &mut rig.channel, &mut rig.clock, &mut rig.sink);

    let mail = rig.channel.position(Notice::MailArrived.text());
    let status = rig.channel.position("Mail trap door is opened!\n");
    assert!(mail.is_some() && status.is_some());
    assert!(mail < status, "notice must precede the status reply");
}

#[test]
fn failed_notification_does_not_stop_the_loop() {
    let mut rig = Rig::new(test_config(), &[false, true, false]);
    rig.start();
    rig.channel.fail_notify = true;
    rig.step();
    rig.channel.fail_notify = false;
    rig.step();

    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::DeliveryFailed {
                operation: "notify",
                ..
            }
        )),
        1
    );
    // The lost notice is not retried; the next one goes out normally.
    assert_eq!(
        rig.channel.notices().last(),
        Some(&Notice::ClosedAgain.text())
    );
    assert!(!rig.channel.notices().contains(&Notice::MailArrived.text()));
}
