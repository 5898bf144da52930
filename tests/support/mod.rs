//! Host stand-ins for the strip, the button pin and the delay.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use matrix_envoy::button::{DisplayPowerController, PowerConfig, PowerState};
use matrix_envoy::led_strip::{Frame1d, StripWriter};
use matrix_envoy::matrix::MatrixRenderer;
use matrix_envoy::{Error, Result};

pub type Frame = Frame1d<64>;

/// Remembers every frame it is asked to show.
#[derive(Clone, Default)]
pub struct RecordingStrip {
    frames: Rc<RefCell<Vec<Frame>>>,
}

impl RecordingStrip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.borrow().last().copied()
    }
}

impl StripWriter<64> for RecordingStrip {
    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.borrow_mut().push(*frame);
        Ok(())
    }
}

/// Rejects every frame.
pub struct FailingStrip;

impl StripWriter<64> for FailingStrip {
    async fn write_frame(&mut self, _frame: &Frame) -> Result<()> {
        Err(Error::StripWrite)
    }
}

/// Reads a queued sequence of levels (`true` = high), then the idle level forever.
///
/// Clones share the queue, so a test can keep one and feed more presses later.
#[derive(Clone)]
pub struct ScriptedPin {
    levels: Rc<RefCell<VecDeque<bool>>>,
    idle_high: bool,
}

impl ScriptedPin {
    /// An active-low button at rest: reads high once the script runs out.
    pub fn pull_up() -> Self {
        Self {
            levels: Rc::default(),
            idle_high: true,
        }
    }

    /// An active-high button at rest: reads low once the script runs out.
    pub fn pull_down() -> Self {
        Self {
            levels: Rc::default(),
            idle_high: false,
        }
    }

    pub fn push(&self, levels: &[bool]) {
        self.levels.borrow_mut().extend(levels.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.levels.borrow().len()
    }

    fn next_level(&mut self) -> bool {
        self.levels.borrow_mut().pop_front().unwrap_or(self.idle_high)
    }
}

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.next_level())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.next_level())
    }
}

/// Returns at once and remembers every requested wait, in milliseconds.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    waits_ms: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits_ms(&self) -> Vec<u32> {
        self.waits_ms.borrow().clone()
    }

    pub fn count_of(&self, millis: u32) -> usize {
        self.waits_ms.borrow().iter().filter(|wait| **wait == millis).count()
    }

    pub fn total_ms(&self) -> u64 {
        self.waits_ms.borrow().iter().map(|wait| u64::from(*wait)).sum()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.borrow_mut().push(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.waits_ms.borrow_mut().push(us / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.borrow_mut().push(ms);
    }
}

/// One clean press on an active-low button: down, still down after settling, released.
pub const PRESS_ACTIVE_LOW: [bool; 3] = [false, false, true];

/// Switch a fresh renderer's display on with one scripted button press.
pub async fn switch_on<S: StripWriter<64>>(renderer: &MatrixRenderer<S>) {
    let pin = ScriptedPin::pull_up();
    pin.push(&PRESS_ACTIVE_LOW);
    let mut controller =
        DisplayPowerController::new(renderer, pin, RecordingDelay::new(), PowerConfig::new());
    let toggled = controller.poll_once().await.expect("press must toggle");
    assert_eq!(toggled, Some(PowerState::On));
}
