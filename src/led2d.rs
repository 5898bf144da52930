//! Two-dimensional view of the 8×8 panel: frames in `(x, y)` space, the wiring layout
//! and the column font used for scrolling text.
//!
//! For custom graphics, create a [`Frame2d`] and use the
//! [`embedded-graphics`](https://docs.rs/embedded-graphics) drawing API.
//!
//! # Example: Draw with embedded-graphics
//!
//! ```rust
//! use matrix_envoy::led2d::MatrixFrame;
//! use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::{PrimitiveStyle, Rectangle}};
//!
//! let mut frame = MatrixFrame::new();
//! Rectangle::new(MatrixFrame::TOP_LEFT, MatrixFrame::SIZE)
//!     .into_styled(PrimitiveStyle::with_stroke(Rgb888::RED, 1))
//!     .draw(&mut frame)
//!     .expect("rectangle draw must succeed");
//! assert_eq!(frame[(0, 0)].r, 255);
//! ```

use core::{
    convert::Infallible,
    ops::{Deref, DerefMut, Index, IndexMut},
};

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use smart_leds::RGB8;

#[doc(inline)]
pub use embedded_graphics::geometry::{Point, Size};

// ============================================================================
// Submodules
// ============================================================================

pub mod font;
pub mod layout;

pub use layout::LedLayout;

// ============================================================================
// Constants
// ============================================================================

/// Columns on the panel.
pub const MATRIX_WIDTH: usize = 8;
/// Rows on the panel.
pub const MATRIX_HEIGHT: usize = 8;
/// LEDs on the panel.
pub const MATRIX_LEN: usize = MATRIX_WIDTH * MATRIX_HEIGHT;

/// How the panel's strip is wired: a serpentine, starting top-left and running right.
pub const MATRIX_LAYOUT: LedLayout<MATRIX_LEN, MATRIX_WIDTH, MATRIX_HEIGHT> =
    LedLayout::serpentine_row_major();

/// Strip index for every cell, row-major (`y * 8 + x`). Computed once, at compile time.
pub const MATRIX_INDEX_BY_XY: [u16; MATRIX_LEN] = MATRIX_LAYOUT.xy_to_index();

/// A frame the size of the panel.
pub type MatrixFrame = Frame2d<MATRIX_WIDTH, MATRIX_HEIGHT>;

/// Strip index wired to `(x, y)`, or `None` when the cell is off the panel.
#[must_use]
pub const fn matrix_index(x: usize, y: usize) -> Option<usize> {
    if x >= MATRIX_WIDTH || y >= MATRIX_HEIGHT {
        return None;
    }
    Some(MATRIX_INDEX_BY_XY[y * MATRIX_WIDTH + x] as usize)
}

/// Mirror a column left-to-right. The panel is mounted so that message and protocol
/// columns run opposite to the layout's `x`.
#[must_use]
pub const fn mirror_x(x: usize) -> usize {
    MATRIX_WIDTH - 1 - x
}

/// Convert Rgb888 (embedded-graphics) to RGB8 (smart-leds).
#[must_use]
pub fn rgb888_to_rgb8(color: Rgb888) -> RGB8 {
    RGB8::new(color.r(), color.g(), color.b())
}

// ============================================================================
// Frame2d
// ============================================================================

/// 2D pixel array used for panel previews, fonts and embedded-graphics drawing.
///
/// Indexed as `frame[(x, y)]`; stored row-major as `frame.0[y][x]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame2d<const W: usize, const H: usize>(pub [[RGB8; W]; H]);

impl<const W: usize, const H: usize> Frame2d<W, H> {
    /// Frame2d width in pixels (columns).
    pub const WIDTH: usize = W;
    /// Frame2d height in pixels (rows).
    pub const HEIGHT: usize = H;
    /// Total number of pixels (WIDTH × HEIGHT).
    pub const LEN: usize = W * H;
    /// Frame dimensions as a [`Size`].
    pub const SIZE: Size = Size::new(W as u32, H as u32);
    /// Top-left corner coordinate as a [`Point`].
    pub const TOP_LEFT: Point = Point::new(0, 0);

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([[RGB8::new(0, 0, 0); W]; H])
    }

    /// Number of pixels that are not black.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.0
            .iter()
            .flatten()
            .filter(|color| **color != RGB8::new(0, 0, 0))
            .count()
    }
}

impl<const W: usize, const H: usize> Deref for Frame2d<W, H> {
    type Target = [[RGB8; W]; H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const W: usize, const H: usize> DerefMut for Frame2d<W, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const W: usize, const H: usize> Index<(usize, usize)> for Frame2d<W, H> {
    type Output = RGB8;

    fn index(&self, (x_index, y_index): (usize, usize)) -> &Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> IndexMut<(usize, usize)> for Frame2d<W, H> {
    fn index_mut(&mut self, (x_index, y_index): (usize, usize)) -> &mut Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &mut self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> Default for Frame2d<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Frame2d<W, H> {
    fn size(&self) -> Size {
        Self::SIZE
    }
}

impl<const W: usize, const H: usize> DrawTarget for Frame2d<W, H> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x_index), Ok(y_index)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            if let Some(cell) = self.0.get_mut(y_index).and_then(|row| row.get_mut(x_index)) {
                *cell = rgb888_to_rgb8(color);
            }
        }
        Ok(())
    }
}
