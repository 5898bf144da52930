#![allow(missing_docs, reason = "test crate")]
//! Boot visuals and the bounded wait for the network.

mod support;

use embassy_futures::block_on;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use matrix_envoy::animation::{FAILURE_COLOR, SUCCESS_TICK_COLOR};
use matrix_envoy::connectivity::{
    BootConfig, ConnectionState, ConnectivityStateMachine, NetworkLink, RestartRequest,
    TimeoutPolicy,
};
use matrix_envoy::matrix::MatrixRenderer;
use support::{RecordingDelay, RecordingStrip, switch_on};

const SWEEP_FRAMES: usize = 14;
// "Matrix Envoy": 12 characters.
const BANNER_FRAMES: usize = 12 * 8 + 8;
const TIMEOUT_FRAMES: usize = 7 * 8 + 8;

/// Raises the link after a number of wait-loop ticks.
struct LinkUpAfter<'a> {
    link: &'a NetworkLink,
    ticks_left: usize,
    recorder: RecordingDelay,
}

impl DelayNs for LinkUpAfter<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.recorder.delay_ns(ns).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        if ms == 50 && !self.link.is_connected() {
            self.ticks_left = self.ticks_left.saturating_sub(1);
            if self.ticks_left == 0 {
                self.link.publish("192.168.1.42").expect("publish once");
            }
        }
        self.recorder.delay_ms(ms).await;
    }
}

#[test]
fn no_link_times_out_after_two_hundred_ticks() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    let delay = RecordingDelay::new();
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, delay.clone(), BootConfig::new());
    assert_eq!(boot.state(), ConnectionState::Idle);

    let state = block_on(boot.run_boot()).expect("boot");
    assert_eq!(state, ConnectionState::TimedOut);
    assert_eq!(boot.state(), ConnectionState::TimedOut);
    assert_eq!(delay.count_of(50), 200);
    assert_eq!(
        boot.scheduler().frames_played(),
        SWEEP_FRAMES + BANNER_FRAMES + 200 + TIMEOUT_FRAMES
    );

    block_on(async {
        let frame = renderer.frame().await;
        assert_eq!(frame.lit_count(), 28);
        assert_eq!(frame[(2, 2)], FAILURE_COLOR);
    });
}

#[test]
fn waiting_breathes_on_the_leds_while_on() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    let link = NetworkLink::new();
    let config = BootConfig::new()
        .with_banner("")
        .with_connect_timeout(Duration::from_millis(500));
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, RecordingDelay::new(), config);

    block_on(async {
        switch_on(&renderer).await;
        boot.run_boot().await.expect("boot");
    });

    // resync, sweep, empty banner, ten breaths, timeout banner, icon
    let frames = strip.frames();
    assert_eq!(frames.len(), 1 + SWEEP_FRAMES + 8 + 10 + TIMEOUT_FRAMES + 1);
    let breaths = &frames[1 + SWEEP_FRAMES + 8..][..10];
    let center_levels: Vec<u8> = breaths.iter().map(|frame| frame[27].r).collect();
    assert_eq!(center_levels, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert!(!frames.last().expect("icon").is_dark());
}

#[test]
fn link_already_up_skips_the_wait() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    link.publish("192.168.1.42").expect("publish");
    let delay = RecordingDelay::new();
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, delay.clone(), BootConfig::new());

    let state = block_on(boot.run_boot()).expect("boot");
    assert_eq!(state, ConnectionState::Connected);
    assert_eq!(delay.count_of(50), 0);
    // flash, then "192.168.1.42" (12 characters)
    assert_eq!(
        boot.scheduler().frames_played(),
        SWEEP_FRAMES + BANNER_FRAMES + 1 + (12 * 8 + 8)
    );
    assert_eq!(delay.count_of(700), 1);

    block_on(async {
        let frame = renderer.frame().await;
        assert_eq!(frame.lit_count(), 24);
        assert_eq!(frame[(5, 4)], SUCCESS_TICK_COLOR);
    });
}

#[test]
fn link_coming_up_mid_wait_ends_the_wait() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    let recorder = RecordingDelay::new();
    let delay = LinkUpAfter {
        link: &link,
        ticks_left: 30,
        recorder: recorder.clone(),
    };
    let config = BootConfig::new().with_banner("");
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, delay, config);

    let state = block_on(boot.run_boot()).expect("boot");
    assert_eq!(state, ConnectionState::Connected);
    assert_eq!(recorder.count_of(50), 30);
    assert_eq!(link.address().as_deref(), Some("192.168.1.42"));
}

#[test]
fn terminal_state_is_final() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    let config = BootConfig::new()
        .with_banner("")
        .with_connect_timeout(Duration::from_millis(100));
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, RecordingDelay::new(), config);

    assert_eq!(block_on(boot.run_boot()).expect("boot"), ConnectionState::TimedOut);
    let played = boot.scheduler().frames_played();

    // A late link changes nothing.
    link.publish("10.0.0.7").expect("publish");
    assert_eq!(block_on(boot.run_boot()).expect("boot"), ConnectionState::TimedOut);
    assert_eq!(boot.scheduler().frames_played(), played);
}

#[test]
fn zero_timeout_fails_immediately() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    let delay = RecordingDelay::new();
    let config = BootConfig::new()
        .with_banner("")
        .with_connect_timeout(Duration::from_millis(0));
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, delay.clone(), config);

    assert_eq!(block_on(boot.run_boot()).expect("boot"), ConnectionState::TimedOut);
    assert_eq!(delay.count_of(50), 0);
}

#[test]
fn restart_policy_asks_for_a_reboot() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    let link = NetworkLink::new();
    let delay = RecordingDelay::new();
    let config = BootConfig::new()
        .with_banner("")
        .with_connect_timeout(Duration::from_millis(50))
        .with_timeout_policy(TimeoutPolicy::RestartAfter(Duration::from_millis(12_000)));
    let mut boot = ConnectivityStateMachine::new(&renderer, &link, delay.clone(), config);

    block_on(boot.run_boot()).expect("boot");
    let waits_before_hold = delay.waits_ms().len();
    let request = block_on(boot.hold());
    assert_eq!(
        request,
        RestartRequest {
            after: Duration::from_millis(12_000)
        }
    );
    assert_eq!(delay.waits_ms()[waits_before_hold..], [5_000, 5_000, 2_000]);
}

#[test]
fn default_config_matches_documented_timings() {
    let config = BootConfig::default();
    assert_eq!(config.connect_timeout, Duration::from_millis(10_000));
    assert_eq!(config.connect_tick, Duration::from_millis(50));
    assert_eq!(config.connect_budget(), 200);
    assert_eq!(config.timeout_policy, TimeoutPolicy::Hold);
}

#[test]
fn link_publishes_once() {
    let link = NetworkLink::default();
    assert_eq!(link.address(), None);
    link.publish("192.168.4.1").expect("publish");
    assert!(link.is_connected());
    assert!(link.publish("192.168.4.2").is_err());
    assert_eq!(link.address().as_deref(), Some("192.168.4.1"));
}
