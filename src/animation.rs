//! Frame-sequenced drawing on the matrix: boot sweep, scrolling text, breathing idle
//! pulse and the two status icons.
//!
//! A [`Sequence`] knows how many frames it has, how long each one stays up and how to
//! draw it. A [`FrameScheduler`] plays sequences: every frame is
//! clear → draw → `refresh` → delay, strictly in order. The clear only empties the
//! buffer; the refresh that closes the frame is the only strip write. The delay is an
//! await point, so other tasks (the power button in particular) keep running.
//!
//! # Example
//!
//! ```rust
//! # use matrix_envoy::{Result, led_strip::{Frame1d, StripWriter, colors}};
//! use embassy_time::Duration;
//! use matrix_envoy::animation::{FrameScheduler, ScrollText, Sequence};
//! use matrix_envoy::matrix::MatrixRenderer;
//! # struct NullStrip;
//! # impl StripWriter<64> for NullStrip {
//! #     async fn write_frame(&mut self, _frame: &Frame1d<64>) -> Result<()> { Ok(()) }
//! # }
//! # struct NoDelay;
//! # impl embedded_hal_async::delay::DelayNs for NoDelay {
//! #     async fn delay_ns(&mut self, _ns: u32) {}
//! # }
//!
//! # embassy_futures::block_on(async {
//! let renderer = MatrixRenderer::new(NullStrip);
//! let mut scheduler = FrameScheduler::new(NoDelay);
//! let banner = ScrollText::new("Hi", colors::WHITE, Duration::from_millis(60));
//! assert_eq!(banner.frame_count(), 2 * 8 + 8);
//! scheduler.play(&renderer, &banner).await?;
//! assert_eq!(scheduler.frames_played(), 24);
//! # Ok::<(), matrix_envoy::Error>(())
//! # }).expect("play must succeed");
//! ```

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::Result;
use crate::led_strip::{Rgb, StripWriter};
use crate::led2d::font::{GLYPH_WIDTH, glyph_columns};
use crate::led2d::{MATRIX_HEIGHT, MATRIX_LEN, MATRIX_WIDTH, mirror_x};
use crate::matrix::MatrixRenderer;

// ============================================================================
// Constants
// ============================================================================

/// Sweep frames before the flash: radius 0 to 5.5 in half-cell steps.
pub const SWEEP_STEPS: usize = 12;
/// How long each sweep radius stays up.
pub const SWEEP_FRAME_DURATION: Duration = Duration::from_millis(80);
/// How long the all-cells flash stays up.
pub const SWEEP_FLASH_DURATION: Duration = Duration::from_millis(100);
/// How long the panel stays dark after the flash.
pub const SWEEP_BLANK_DURATION: Duration = Duration::from_millis(500);
/// Global brightness of the sweep, in percent.
pub const SWEEP_BRIGHTNESS_PERCENT: u8 = 15;
const SWEEP_FLASH_COLOR: Rgb = Rgb::new(30, 30, 30);

/// Frames in one up-and-down breathing pulse.
pub const BREATHING_PERIOD: usize = 40;
/// Peak channel value of the breathing pulse.
pub const BREATHING_PEAK: usize = BREATHING_PERIOD / 2;
/// How long each breathing frame stays up.
pub const BREATHING_FRAME_DURATION: Duration = Duration::from_millis(50);
const BREATHING_CELLS: [(usize, usize); 4] = [(3, 3), (3, 4), (4, 3), (4, 4)];

/// Outline color of the success icon.
pub const SUCCESS_OUTLINE_COLOR: Rgb = Rgb::new(0, 15, 0);
/// Check-stroke color of the success icon.
pub const SUCCESS_TICK_COLOR: Rgb = Rgb::new(0, 30, 0);
/// Outline and cross color of the failure icon.
pub const FAILURE_COLOR: Rgb = Rgb::new(20, 0, 0);

// A circle with clipped corners.
const ICON_OUTLINE: [(usize, usize); 20] = [
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 0),
    (2, 7),
    (3, 7),
    (4, 7),
    (5, 7),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (7, 2),
    (7, 3),
    (7, 4),
    (7, 5),
    (1, 1),
    (6, 1),
    (1, 6),
    (6, 6),
];
const ICON_TICK: [(usize, usize); 4] = [(5, 4), (4, 5), (3, 4), (2, 3)];
const ICON_CROSS: [(usize, usize); 8] = [
    (2, 2),
    (2, 5),
    (3, 3),
    (3, 4),
    (4, 4),
    (4, 3),
    (5, 5),
    (5, 2),
];

// ============================================================================
// Sequence
// ============================================================================

/// A finite run of frames.
pub trait Sequence {
    /// Number of frames.
    fn frame_count(&self) -> usize;

    /// How long frame `frame_index` stays up after it is latched.
    fn frame_duration(&self, frame_index: usize) -> Duration;

    /// Draw frame `frame_index` onto a freshly cleared renderer.
    async fn draw_frame<S: StripWriter<MATRIX_LEN>>(
        &self,
        renderer: &MatrixRenderer<S>,
        frame_index: usize,
    );
}

// ============================================================================
// FrameScheduler
// ============================================================================

/// Plays [`Sequence`]s one frame at a time, sleeping on a [`DelayNs`] between frames.
pub struct FrameScheduler<D> {
    delay: D,
    frames_played: usize,
}

impl<D: DelayNs> FrameScheduler<D> {
    /// Create a scheduler that waits on `delay`.
    #[must_use]
    pub const fn new(delay: D) -> Self {
        Self {
            delay,
            frames_played: 0,
        }
    }

    /// Play every frame of `sequence`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip rejects a frame.
    pub async fn play<S, Q>(&mut self, renderer: &MatrixRenderer<S>, sequence: &Q) -> Result<()>
    where
        S: StripWriter<MATRIX_LEN>,
        Q: Sequence,
    {
        for frame_index in 0..sequence.frame_count() {
            self.play_frame(renderer, sequence, frame_index).await?;
        }
        Ok(())
    }

    /// Play a single frame: clear, draw, refresh, then wait out its duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip rejects the frame.
    pub async fn play_frame<S, Q>(
        &mut self,
        renderer: &MatrixRenderer<S>,
        sequence: &Q,
        frame_index: usize,
    ) -> Result<()>
    where
        S: StripWriter<MATRIX_LEN>,
        Q: Sequence,
    {
        renderer.clear_staged().await;
        sequence.draw_frame(renderer, frame_index).await;
        renderer.refresh().await?;
        self.pause(sequence.frame_duration(frame_index)).await;
        self.frames_played = self.frames_played.saturating_add(1);
        Ok(())
    }

    /// Draw `icon` and leave it up. No delay follows.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip rejects the frame.
    pub async fn show<S: StripWriter<MATRIX_LEN>>(
        &mut self,
        renderer: &MatrixRenderer<S>,
        icon: Icon,
    ) -> Result<()> {
        renderer.clear_staged().await;
        icon.draw(renderer).await;
        renderer.refresh().await
    }

    /// Sleep without drawing.
    pub async fn pause(&mut self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(millis).await;
    }

    /// Frames played since creation.
    #[must_use]
    pub const fn frames_played(&self) -> usize {
        self.frames_played
    }
}

// ============================================================================
// Startup sweep
// ============================================================================

/// Boot animation: a disc growing from the center, a dim white flash, then darkness.
///
/// Distances are kept in doubled integer units (`2x - 7`) so the center `(3.5, 3.5)`
/// and the half-cell radius steps are exact.
#[derive(Clone, Copy, Debug, Default)]
pub struct StartupSweep;

impl StartupSweep {
    /// Total frames: the sweep, the flash and the blank.
    pub const FRAME_COUNT: usize = SWEEP_STEPS + 2;

    /// Color of a lit cell whose doubled distance from the center, squared, is `doubled_dist_sq`.
    #[must_use]
    pub fn gradient(doubled_dist_sq: u32) -> Rgb {
        // dist < 1.5
        let red: u32 = if doubled_dist_sq < 9 { 100 } else { 0 };
        // 30 * dist = sqrt(225 * (2 * dist)^2); floor(255 - v) = 255 - ceil(v)
        let green = 255_u32.saturating_sub(ceil_isqrt(225 * doubled_dist_sq));
        let blue: u32 = 200;
        Rgb::new(scale_sweep(red), scale_sweep(green), scale_sweep(blue))
    }

    fn doubled_dist_sq(x: usize, y: usize) -> u32 {
        let dx = (2 * x).abs_diff(MATRIX_WIDTH - 1) as u32;
        let dy = (2 * y).abs_diff(MATRIX_HEIGHT - 1) as u32;
        dx * dx + dy * dy
    }
}

impl Sequence for StartupSweep {
    fn frame_count(&self) -> usize {
        Self::FRAME_COUNT
    }

    fn frame_duration(&self, frame_index: usize) -> Duration {
        match frame_index {
            index if index < SWEEP_STEPS => SWEEP_FRAME_DURATION,
            SWEEP_STEPS => SWEEP_FLASH_DURATION,
            _ => SWEEP_BLANK_DURATION,
        }
    }

    async fn draw_frame<S: StripWriter<MATRIX_LEN>>(
        &self,
        renderer: &MatrixRenderer<S>,
        frame_index: usize,
    ) {
        if frame_index == SWEEP_STEPS {
            fill(renderer, SWEEP_FLASH_COLOR).await;
            return;
        }
        if frame_index > SWEEP_STEPS {
            return;
        }
        // radius r = frame_index / 2, so (2r)^2 = frame_index^2
        let doubled_radius_sq = (frame_index * frame_index) as u32;
        for y_index in 0..MATRIX_HEIGHT {
            for x_index in 0..MATRIX_WIDTH {
                let doubled_dist_sq = Self::doubled_dist_sq(x_index, y_index);
                if doubled_dist_sq <= doubled_radius_sq {
                    renderer
                        .set_pixel(x_index, y_index, Self::gradient(doubled_dist_sq))
                        .await;
                }
            }
        }
    }
}

fn scale_sweep(channel: u32) -> u8 {
    u8::try_from(channel * u32::from(SWEEP_BRIGHTNESS_PERCENT) / 100).unwrap_or(u8::MAX)
}

/// Smallest `r` with `r * r >= value`.
const fn ceil_isqrt(value: u32) -> u32 {
    let mut root = 0;
    while root * root < value {
        root += 1;
    }
    root
}

// ============================================================================
// Scroll text
// ============================================================================

/// Text entering from the right one column per frame.
///
/// Frame count is `chars * 8 + 8`: eight lead-in frames, then one frame per message
/// column until the last character has scrolled off.
#[derive(Clone, Copy, Debug)]
pub struct ScrollText<'a> {
    text: &'a str,
    color: Rgb,
    frame_duration: Duration,
}

impl<'a> ScrollText<'a> {
    /// Scroll `text` in `color`, holding each frame for `frame_duration`.
    #[must_use]
    pub const fn new(text: &'a str, color: Rgb, frame_duration: Duration) -> Self {
        Self {
            text,
            color,
            frame_duration,
        }
    }

    fn message_columns(&self) -> usize {
        self.text.chars().count() * GLYPH_WIDTH
    }
}

impl Sequence for ScrollText<'_> {
    fn frame_count(&self) -> usize {
        self.message_columns() + MATRIX_WIDTH
    }

    fn frame_duration(&self, _frame_index: usize) -> Duration {
        self.frame_duration
    }

    async fn draw_frame<S: StripWriter<MATRIX_LEN>>(
        &self,
        renderer: &MatrixRenderer<S>,
        frame_index: usize,
    ) {
        let message_columns = self.message_columns();
        let mut cached: Option<(usize, [u8; GLYPH_WIDTH])> = None;
        for screen_x in 0..MATRIX_WIDTH {
            // Message column shown at this screen column: frame_index + screen_x - 8.
            let Some(message_column) = (frame_index + screen_x).checked_sub(MATRIX_WIDTH) else {
                continue;
            };
            if message_column >= message_columns {
                continue;
            }
            let char_index = message_column / GLYPH_WIDTH;
            let columns = match cached {
                Some((index, columns)) if index == char_index => columns,
                _ => {
                    let ch = self.text.chars().nth(char_index).unwrap_or(' ');
                    let columns = glyph_columns(ch);
                    cached = Some((char_index, columns));
                    columns
                }
            };
            let bits = columns.get(message_column % GLYPH_WIDTH).copied().unwrap_or(0);
            for y_index in 0..MATRIX_HEIGHT {
                if bits & (1 << y_index) != 0 {
                    renderer
                        .set_pixel(mirror_x(screen_x), y_index, self.color)
                        .await;
                }
            }
        }
    }
}

// ============================================================================
// Breathing
// ============================================================================

/// A yellow 2×2 center block pulsing 0 → 20 → 0 over [`BREATHING_PERIOD`] frames.
#[derive(Clone, Copy, Debug)]
pub struct Breathing {
    frames: usize,
    frame_duration: Duration,
}

impl Breathing {
    /// A pulse that runs for `frames` frames of [`BREATHING_FRAME_DURATION`].
    #[must_use]
    pub const fn new(frames: usize) -> Self {
        Self {
            frames,
            frame_duration: BREATHING_FRAME_DURATION,
        }
    }

    /// Hold each frame for `frame_duration` instead.
    #[must_use]
    pub const fn with_frame_duration(mut self, frame_duration: Duration) -> Self {
        self.frame_duration = frame_duration;
        self
    }

    /// Triangular wave: channel value for frame `frame_index`.
    #[must_use]
    pub const fn level(frame_index: usize) -> u8 {
        let mut level = frame_index % BREATHING_PERIOD;
        if level > BREATHING_PEAK {
            level = BREATHING_PERIOD - level;
        }
        level as u8
    }
}

impl Sequence for Breathing {
    fn frame_count(&self) -> usize {
        self.frames
    }

    fn frame_duration(&self, _frame_index: usize) -> Duration {
        self.frame_duration
    }

    async fn draw_frame<S: StripWriter<MATRIX_LEN>>(
        &self,
        renderer: &MatrixRenderer<S>,
        frame_index: usize,
    ) {
        let level = Self::level(frame_index);
        let color = Rgb::new(level, level, 0);
        for (x_index, y_index) in BREATHING_CELLS {
            renderer.set_pixel(x_index, y_index, color).await;
        }
    }
}

// ============================================================================
// Solid fill
// ============================================================================

/// One frame of a single color.
#[derive(Clone, Copy, Debug)]
pub struct SolidFill {
    color: Rgb,
    duration: Duration,
}

impl SolidFill {
    /// Fill the panel with `color` for `duration`.
    #[must_use]
    pub const fn new(color: Rgb, duration: Duration) -> Self {
        Self { color, duration }
    }
}

impl Sequence for SolidFill {
    fn frame_count(&self) -> usize {
        1
    }

    fn frame_duration(&self, _frame_index: usize) -> Duration {
        self.duration
    }

    async fn draw_frame<S: StripWriter<MATRIX_LEN>>(
        &self,
        renderer: &MatrixRenderer<S>,
        _frame_index: usize,
    ) {
        fill(renderer, self.color).await;
    }
}

async fn fill<S: StripWriter<MATRIX_LEN>>(renderer: &MatrixRenderer<S>, color: Rgb) {
    for y_index in 0..MATRIX_HEIGHT {
        for x_index in 0..MATRIX_WIDTH {
            renderer.set_pixel(x_index, y_index, color).await;
        }
    }
}

// ============================================================================
// Icons
// ============================================================================

/// Static status icons. Drawn once with [`FrameScheduler::show`]; they stay until something
/// else is drawn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Icon {
    /// Green outline with a check stroke.
    Success,
    /// Red outline with a cross.
    Failure,
}

impl Icon {
    /// Draw the icon without clearing or refreshing.
    pub async fn draw<S: StripWriter<MATRIX_LEN>>(self, renderer: &MatrixRenderer<S>) {
        let (outline_color, inner, inner_color): (Rgb, &[(usize, usize)], Rgb) = match self {
            Self::Success => (SUCCESS_OUTLINE_COLOR, &ICON_TICK, SUCCESS_TICK_COLOR),
            Self::Failure => (FAILURE_COLOR, &ICON_CROSS, FAILURE_COLOR),
        };
        for &(x_index, y_index) in &ICON_OUTLINE {
            renderer.set_pixel(x_index, y_index, outline_color).await;
        }
        for &(x_index, y_index) in inner {
            renderer.set_pixel(x_index, y_index, inner_color).await;
        }
    }
}
