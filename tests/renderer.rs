#![allow(missing_docs, reason = "test crate")]
//! The shadow buffer is always authoritative; the LEDs follow it only while the display is on.

mod support;

use embassy_futures::block_on;
use matrix_envoy::Error;
use matrix_envoy::button::{DisplayPowerController, PowerConfig};
use matrix_envoy::led_strip::{BLACK, Rgb, colors};
use matrix_envoy::led2d::matrix_index;
use matrix_envoy::matrix::{MatrixRenderer, PixelBuffer};
use support::{
    FailingStrip, PRESS_ACTIVE_LOW, RecordingDelay, RecordingStrip, ScriptedPin, switch_on,
};

#[test]
fn set_pixel_lands_in_buffer_while_off() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        renderer.set_pixel(2, 5, colors::BLUE).await;
        assert_eq!(renderer.pixel(2, 5).await, Some(colors::BLUE));
        renderer.refresh().await.expect("refresh");
        assert!(!renderer.is_display_on().await);
    });
    assert_eq!(strip.write_count(), 0);
}

#[test]
fn set_pixel_lands_in_buffer_while_on() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        switch_on(&renderer).await;
        renderer.set_pixel(2, 5, colors::BLUE).await;
        assert_eq!(renderer.pixel(2, 5).await, Some(colors::BLUE));
        renderer.refresh().await.expect("refresh");
    });
    let shown = strip.last().expect("refresh writes while on");
    let index = matrix_index(2, 5).expect("on panel");
    assert_eq!(shown[index], colors::BLUE);
    assert_eq!(shown.iter().filter(|led| **led != BLACK).count(), 1);
}

#[test]
fn set_pixel_alone_does_not_touch_the_strip() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        switch_on(&renderer).await;
        let writes = strip.write_count();
        renderer.set_pixel(0, 0, colors::RED).await;
        assert_eq!(strip.write_count(), writes);
    });
}

#[test]
fn off_panel_writes_are_ignored() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    block_on(async {
        renderer.set_pixel(8, 0, colors::RED).await;
        renderer.set_pixel(0, 8, colors::RED).await;
        renderer.set_pixel(100, 100, colors::RED).await;
        assert_eq!(renderer.buffer().await, PixelBuffer::new());
        assert_eq!(renderer.pixel(8, 0).await, None);
    });
}

#[test]
fn clear_all_zeroes_every_cell() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    block_on(async {
        for y_index in 0..8 {
            for x_index in 0..8 {
                renderer.set_pixel(x_index, y_index, colors::WHITE).await;
            }
        }
        renderer.clear_all().await.expect("clear");
        assert!(renderer.buffer().await.as_frame().is_dark());
    });
}

#[test]
fn clear_all_while_off_leaves_the_strip_alone() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        renderer.set_pixel(2, 6, colors::WHITE).await;
        renderer.clear_all().await.expect("clear");
    });
    assert_eq!(strip.write_count(), 0);
}

#[test]
fn clear_all_while_on_darkens_the_strip_at_once() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        switch_on(&renderer).await;
        renderer.set_pixel(4, 4, colors::GREEN).await;
        renderer.refresh().await.expect("refresh");
        assert!(!strip.last().expect("lit frame").is_dark());
        renderer.clear_all().await.expect("clear");
    });
    assert_eq!(strip.write_count(), 3);
    assert!(strip.last().expect("dark frame").is_dark());
}

#[test]
fn clear_all_reports_strip_failure_after_clearing_the_buffer() {
    let renderer = MatrixRenderer::new(FailingStrip);
    let pin = ScriptedPin::pull_up();
    pin.push(&PRESS_ACTIVE_LOW);
    let mut controller =
        DisplayPowerController::new(&renderer, pin, RecordingDelay::new(), PowerConfig::new());
    block_on(async {
        renderer.set_pixel(0, 0, colors::RED).await;
        // The gate flips before the resync write fails.
        assert!(matches!(controller.poll_once().await, Err(Error::StripWrite)));
        assert!(renderer.is_display_on().await);
        assert!(matches!(renderer.clear_all().await, Err(Error::StripWrite)));
        assert!(renderer.buffer().await.as_frame().is_dark());
    });
}

#[test]
fn switching_on_shows_what_was_drawn_while_off() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        renderer.set_pixel(1, 1, colors::RED).await;
        renderer.set_pixel(6, 3, colors::CYAN).await;
        switch_on(&renderer).await;
        assert!(renderer.is_display_on().await);
        assert_eq!(strip.frames(), [*renderer.buffer().await.as_frame()]);
    });
}

#[test]
fn resync_ignores_the_gate() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(async {
        renderer.set_pixel(3, 3, colors::YELLOW).await;
        renderer.resync_from_buffer().await.expect("resync");
        assert_eq!(strip.last(), Some(*renderer.buffer().await.as_frame()));
    });
}

#[test]
fn frame_view_is_in_xy_space() {
    let renderer = MatrixRenderer::new(RecordingStrip::new());
    block_on(async {
        // Odd row: x = 0 is strip index 15.
        renderer.set_pixel(0, 1, colors::RED).await;
        let frame = renderer.frame().await;
        assert_eq!(frame[(0, 1)], colors::RED);
        assert_eq!(frame.lit_count(), 1);
        assert_eq!(renderer.buffer().await.read(15), colors::RED);
    });
}

#[test]
fn buffer_reads_past_the_end_are_black() {
    let mut buffer = PixelBuffer::new();
    buffer.write(64, Rgb::new(1, 2, 3));
    assert_eq!(buffer.read(64), BLACK);
    assert_eq!(buffer, PixelBuffer::new());
}

#[test]
fn strip_errors_propagate() {
    let renderer = MatrixRenderer::new(FailingStrip);
    let result = block_on(renderer.resync_from_buffer());
    assert!(matches!(result, Err(Error::StripWrite)));
}

#[test]
fn into_strip_returns_the_writer() {
    let strip = RecordingStrip::new();
    let renderer = MatrixRenderer::new(strip.clone());
    block_on(renderer.resync_from_buffer()).expect("resync");
    assert_eq!(renderer.into_strip().write_count(), 1);
}
