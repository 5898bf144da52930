//! The physical side of the matrix: a WS2812 strip fed one whole frame at a time.
//!
//! Everything above this module works in `(x, y)` space. This module only knows
//! about strip order: a [`Frame1d`] holds one color per LED in wiring order and a
//! [`StripWriter`] pushes it to the LEDs in a single transfer.
//!
//! On the Pico, [`StripWriter`] is implemented for embassy-rp's `PioWs2812` driver.
//! On the host, tests supply their own recording writer.
//!
//! # Example
//!
//! ```rust,no_run
//! use matrix_envoy::led_strip::{Frame1d, StripWriter, colors};
//! use matrix_envoy::Result;
//!
//! async fn flash_red<S: StripWriter<64>>(strip: &mut S) -> Result<()> {
//!     strip.write_frame(&Frame1d::filled(colors::RED)).await?;
//!     strip.write_frame(&Frame1d::new()).await
//! }
//! ```

/// Predefined RGB color constants from the `smart_leds` crate.
///
/// Common colors include `RED`, `GREEN`, `BLUE`, `YELLOW`, `WHITE`, `BLACK`, `CYAN`, `MAGENTA`, `ORANGE`, `PURPLE`.
#[doc(inline)]
pub use smart_leds::colors;

use core::ops::{Deref, DerefMut};

use smart_leds::RGB8;

use crate::Result;

/// RGB color representation re-exported from the `smart_leds` crate.
pub type Rgb = RGB8;

/// The all-channels-off color.
pub const BLACK: Rgb = Rgb::new(0, 0, 0);

// ============================================================================
// Frame1d
// ============================================================================

/// [`Rgb`] pixel data for an LED strip, in wiring order.
///
/// Frames deref to `[Rgb; N]`, so you can mutate pixels directly before passing them to
/// [`StripWriter::write_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame1d<const N: usize>(pub [Rgb; N]);

impl<const N: usize> Frame1d<N> {
    /// Number of LEDs in this frame.
    pub const LEN: usize = N;

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([BLACK; N])
    }

    /// Create a frame filled with a single color.
    #[must_use]
    pub const fn filled(color: Rgb) -> Self {
        Self([color; N])
    }

    /// Set every LED to black.
    pub fn clear(&mut self) {
        self.0 = [BLACK; N];
    }

    /// True when every LED is black.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.0.iter().all(|color| *color == BLACK)
    }
}

impl<const N: usize> Deref for Frame1d<N> {
    type Target = [Rgb; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for Frame1d<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<[Rgb; N]> for Frame1d<N> {
    fn from(array: [Rgb; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> From<Frame1d<N>> for [Rgb; N] {
    fn from(frame: Frame1d<N>) -> Self {
        frame.0
    }
}

impl<const N: usize> Default for Frame1d<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// StripWriter
// ============================================================================

/// Anything that can show a whole [`Frame1d`] on physical LEDs.
///
/// One call is one latch: the LEDs change together, never pixel by pixel.
pub trait StripWriter<const N: usize> {
    /// Push `frame` to the LEDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StripWrite`](crate::Error::StripWrite) if the transfer fails.
    async fn write_frame(&mut self, frame: &Frame1d<N>) -> Result<()>;
}

impl<const N: usize, T: StripWriter<N>> StripWriter<N> for &mut T {
    async fn write_frame(&mut self, frame: &Frame1d<N>) -> Result<()> {
        (**self).write_frame(frame).await
    }
}

#[cfg(any(feature = "pico1", feature = "pico2"))]
impl<PIO, const SM: usize, const N: usize, ORDER> StripWriter<N>
    for embassy_rp::pio_programs::ws2812::PioWs2812<'static, PIO, SM, N, ORDER>
where
    PIO: embassy_rp::pio::Instance,
    ORDER: embassy_rp::pio_programs::ws2812::RgbColorOrder,
{
    async fn write_frame(&mut self, frame: &Frame1d<N>) -> Result<()> {
        // The PIO driver waits for DMA completion and cannot fail.
        self.write(&frame.0).await;
        Ok(())
    }
}
