//! A power button for the matrix: a debounced toggle that switches the LEDs off and on
//! without touching what has been drawn.
//!
//! See [`DisplayPowerController`] for usage.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

use crate::led2d::MATRIX_LEN;
use crate::led_strip::StripWriter;
use crate::matrix::MatrixRenderer;
use crate::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// How long a press must hold before it counts.
pub const SETTLE_DEFAULT: Duration = Duration::from_millis(50);

/// Poll interval while waiting for a press.
pub const IDLE_POLL_DEFAULT: Duration = Duration::from_millis(50);

/// Poll interval while waiting for release.
pub const RELEASE_POLL_DEFAULT: Duration = Duration::from_millis(10);

// ============================================================================
// PressedTo - How the button is wired
// ============================================================================

/// Describes how the button is physically wired.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressedTo {
    /// Button connects pin to voltage (3.3V) when pressed.
    /// Pin reads HIGH when pressed.
    Voltage,

    /// Button connects pin to ground (GND) when pressed.
    /// Pin reads LOW when pressed.
    Ground,
}

// ============================================================================
// PowerState
// ============================================================================

/// Whether the LEDs follow the shadow buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// LEDs dark; drawing still lands in the buffer.
    Off,
    /// LEDs mirror the buffer.
    On,
}

impl PowerState {
    /// The other state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

// ============================================================================
// PowerConfig
// ============================================================================

/// Timing and wiring for a [`DisplayPowerController`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PowerConfig {
    /// How long a press must hold before it counts.
    pub settle: Duration,
    /// Poll interval while waiting for a press.
    pub idle_poll: Duration,
    /// Poll interval while waiting for release.
    pub release_poll: Duration,
    /// How the button is wired.
    pub pressed_to: PressedTo,
    /// Switch the display on once when [`DisplayPowerController::run`] starts.
    pub start_on: bool,
}

impl PowerConfig {
    /// Active-low button, 50 ms settle, display starts dark.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            settle: SETTLE_DEFAULT,
            idle_poll: IDLE_POLL_DEFAULT,
            release_poll: RELEASE_POLL_DEFAULT,
            pressed_to: PressedTo::Ground,
            start_on: false,
        }
    }

    /// Set the button wiring.
    #[must_use]
    pub const fn with_pressed_to(mut self, pressed_to: PressedTo) -> Self {
        self.pressed_to = pressed_to;
        self
    }

    /// Switch the display on when the controller starts.
    #[must_use]
    pub const fn with_start_on(mut self, start_on: bool) -> Self {
        self.start_on = start_on;
        self
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DisplayPowerController
// ============================================================================

/// Debounces a button and flips the renderer's display gate.
///
/// A press is a level that is still asserted after the settle window. Each press
/// toggles [`PowerState`], then the controller waits for release before polling again,
/// so holding the button down counts once.
///
/// - Off → On: the LEDs are resynced from the shadow buffer, showing whatever was drawn
///   while they were dark.
/// - On → Off: the LEDs are blanked; the buffer is left alone.
///
/// This is the only code that changes the gate.
///
/// # Example
///
/// ```rust,no_run
/// # use core::convert::Infallible;
/// # use matrix_envoy::{Result, led_strip::StripWriter};
/// use matrix_envoy::button::{DisplayPowerController, PowerConfig};
/// use matrix_envoy::matrix::MatrixRenderer;
///
/// async fn power_task<S, P, D>(renderer: &MatrixRenderer<S>, pin: P, delay: D) -> Result<Infallible>
/// where
///     S: StripWriter<64>,
///     P: embedded_hal::digital::InputPin,
///     D: embedded_hal_async::delay::DelayNs,
/// {
///     DisplayPowerController::new(renderer, pin, delay, PowerConfig::new())
///         .run()
///         .await
/// }
/// ```
pub struct DisplayPowerController<'a, S, P, D> {
    renderer: &'a MatrixRenderer<S>,
    pin: P,
    delay: D,
    config: PowerConfig,
    state: PowerState,
}

impl<'a, S, P, D> DisplayPowerController<'a, S, P, D>
where
    S: StripWriter<MATRIX_LEN>,
    P: InputPin,
    D: DelayNs,
{
    /// Create a controller. The display is assumed off, matching a fresh renderer.
    #[must_use]
    pub const fn new(renderer: &'a MatrixRenderer<S>, pin: P, delay: D, config: PowerConfig) -> Self {
        Self {
            renderer,
            pin,
            delay,
            config,
            state: PowerState::Off,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Returns whether the button is currently pressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputPin`] if the pin cannot be read.
    pub fn is_pressed(&mut self) -> Result<bool> {
        let level = match self.config.pressed_to {
            PressedTo::Voltage => self.pin.is_high(),
            PressedTo::Ground => self.pin.is_low(),
        };
        level.map_err(|_| Error::InputPin)
    }

    /// One debounced sample. Returns the new state if this sample toggled it.
    ///
    /// Does not sleep when the button is up; the caller owns the idle interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be read or the strip rejects a frame.
    pub async fn poll_once(&mut self) -> Result<Option<PowerState>> {
        if !self.is_pressed()? {
            return Ok(None);
        }
        wait(&mut self.delay, self.config.settle).await;
        if !self.is_pressed()? {
            trace!("power button bounce ignored");
            return Ok(None);
        }

        let next = self.state.toggled();
        self.apply(next).await?;
        self.wait_for_release().await?;
        Ok(Some(next))
    }

    /// Poll forever, toggling the display on each press.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be read or the strip rejects a frame.
    pub async fn run(&mut self) -> Result<Infallible> {
        if self.config.start_on && self.state == PowerState::Off {
            self.apply(PowerState::On).await?;
        }
        loop {
            if self.poll_once().await?.is_none() {
                wait(&mut self.delay, self.config.idle_poll).await;
            }
        }
    }

    async fn apply(&mut self, next: PowerState) -> Result<()> {
        match next {
            PowerState::On => self.renderer.power_on().await?,
            PowerState::Off => self.renderer.power_off().await?,
        }
        self.state = next;
        info!("display power {:?}", next);
        Ok(())
    }

    async fn wait_for_release(&mut self) -> Result<()> {
        while self.is_pressed()? {
            wait(&mut self.delay, self.config.release_poll).await;
        }
        Ok(())
    }
}

async fn wait<D: DelayNs>(delay: &mut D, duration: Duration) {
    let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    delay.delay_ms(millis).await;
}
