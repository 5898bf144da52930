//! The display engine: a shadow buffer that is always authoritative, and a renderer
//! that mirrors it onto the LEDs only while the display is switched on.
//!
//! See [`MatrixRenderer`] for usage.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use crate::Result;
use crate::led_strip::{BLACK, Frame1d, Rgb, StripWriter};
use crate::led2d::{MATRIX_HEIGHT, MATRIX_LEN, MATRIX_WIDTH, MatrixFrame, matrix_index};

// ============================================================================
// PixelBuffer
// ============================================================================

/// The 64-cell shadow buffer, indexed by strip position.
///
/// Out-of-range writes are ignored and out-of-range reads return black.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer(Frame1d<MATRIX_LEN>);

impl PixelBuffer {
    /// An all-black buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self(Frame1d::new())
    }

    /// Store `color` at strip position `index`.
    pub fn write(&mut self, index: usize, color: Rgb) {
        if let Some(cell) = self.0.get_mut(index) {
            *cell = color;
        }
    }

    /// Color at strip position `index`.
    #[must_use]
    pub fn read(&self, index: usize) -> Rgb {
        self.0.get(index).copied().unwrap_or(BLACK)
    }

    /// Zero every cell.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The buffer in strip order, ready to hand to a [`StripWriter`].
    #[must_use]
    pub const fn as_frame(&self) -> &Frame1d<MATRIX_LEN> {
        &self.0
    }
}

// ============================================================================
// MatrixRenderer
// ============================================================================

struct MatrixState<S> {
    buffer: PixelBuffer,
    display_on: bool,
    strip: S,
}

/// Maps `(x, y)` drawing onto the shadow buffer and, while the display is on, onto the strip.
///
/// Every write lands in the [`PixelBuffer`]. The LEDs are touched only by
/// [`refresh`](Self::refresh), [`clear_all`](Self::clear_all) and
/// [`resync_from_buffer`](Self::resync_from_buffer), and apart from the resync only
/// while the display gate is on. The gate starts off and is flipped by
/// [`DisplayPowerController`](crate::button::DisplayPowerController).
///
/// Buffer, gate and strip share one lock, so a gate flip can never land between a
/// write and the flush that follows it.
///
/// # Example
///
/// ```rust
/// # use matrix_envoy::{Result, led_strip::{Frame1d, StripWriter, colors}};
/// use matrix_envoy::matrix::MatrixRenderer;
/// # struct NullStrip;
/// # impl StripWriter<64> for NullStrip {
/// #     async fn write_frame(&mut self, _frame: &Frame1d<64>) -> Result<()> { Ok(()) }
/// # }
///
/// # embassy_futures::block_on(async {
/// let renderer = MatrixRenderer::new(NullStrip);
/// renderer.clear_all().await?;
/// renderer.set_pixel(2, 5, colors::BLUE).await;
/// renderer.refresh().await?; // no-op until the display is switched on
/// assert_eq!(renderer.pixel(2, 5).await, Some(colors::BLUE));
/// # Ok::<(), matrix_envoy::Error>(())
/// # }).expect("render must succeed");
/// ```
pub struct MatrixRenderer<S> {
    state: Mutex<CriticalSectionRawMutex, MatrixState<S>>,
}

impl<S: StripWriter<MATRIX_LEN>> MatrixRenderer<S> {
    /// Wrap a strip. The buffer starts black and the display starts off.
    #[must_use]
    pub const fn new(strip: S) -> Self {
        Self {
            state: Mutex::new(MatrixState {
                buffer: PixelBuffer::new(),
                display_on: false,
                strip,
            }),
        }
    }

    /// Draw one cell. Coordinates off the panel are ignored.
    pub async fn set_pixel(&self, x: usize, y: usize, color: Rgb) {
        let Some(index) = matrix_index(x, y) else {
            return;
        };
        self.state.lock().await.buffer.write(index, color);
    }

    /// Zero the buffer. While the display is on, the LEDs go dark as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip write fails. The buffer is cleared either way.
    pub async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.buffer.clear();
        if !state.display_on {
            return Ok(());
        }
        state.strip.write_frame(&Frame1d::new()).await
    }

    // Buffer only; the caller's next refresh carries the dark cells to the strip.
    pub(crate) async fn clear_staged(&self) {
        self.state.lock().await.buffer.clear();
    }

    /// Latch the current frame onto the LEDs. Does nothing while the display is off.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip write fails.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.display_on {
            return Ok(());
        }
        let MatrixState { buffer, strip, .. } = &mut *state;
        strip.write_frame(buffer.as_frame()).await
    }

    /// Push the whole shadow buffer to the LEDs, regardless of the gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip write fails.
    pub async fn resync_from_buffer(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let MatrixState { buffer, strip, .. } = &mut *state;
        debug!("resync {} cells to strip", MATRIX_LEN);
        strip.write_frame(buffer.as_frame()).await
    }

    pub(crate) async fn power_on(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.display_on = true;
        let MatrixState { buffer, strip, .. } = &mut *state;
        strip.write_frame(buffer.as_frame()).await
    }

    pub(crate) async fn power_off(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.display_on = false;
        state.strip.write_frame(&Frame1d::new()).await
    }

    /// Whether the LEDs currently follow the buffer.
    pub async fn is_display_on(&self) -> bool {
        self.state.lock().await.display_on
    }

    /// Buffered color at `(x, y)`, or `None` off the panel.
    pub async fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        let index = matrix_index(x, y)?;
        Some(self.state.lock().await.buffer.read(index))
    }

    /// A copy of the shadow buffer.
    pub async fn buffer(&self) -> PixelBuffer {
        self.state.lock().await.buffer
    }

    /// The shadow buffer in `(x, y)` space.
    pub async fn frame(&self) -> MatrixFrame {
        let buffer = self.buffer().await;
        let mut frame = MatrixFrame::new();
        for y_index in 0..MATRIX_HEIGHT {
            for x_index in 0..MATRIX_WIDTH {
                if let Some(index) = matrix_index(x_index, y_index) {
                    frame[(x_index, y_index)] = buffer.read(index);
                }
            }
        }
        frame
    }

    /// Give back the strip.
    pub fn into_strip(self) -> S {
        self.state.into_inner().strip
    }
}
