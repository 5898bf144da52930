//! Column font for scrolling text.
//!
//! Each character occupies one 8×8 cell and is read column by column: bit `y` of a
//! column byte lights row `y`. Glyphs come from embedded-graphics' `FONT_5X8`,
//! drawn one column in from the left edge so neighbouring characters stay apart.

use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_5X8},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};

use crate::led2d::{Frame2d, MATRIX_HEIGHT, MATRIX_WIDTH};

/// Columns per character cell.
pub const GLYPH_WIDTH: usize = MATRIX_WIDTH;

/// Character drawn in place of anything outside printable ASCII.
pub const REPLACEMENT_CHAR: char = '?';

const GLYPH_X_OFFSET: i32 = 1;

/// Column bitmaps for `ch`: eight bytes, left to right, bit `y` set when row `y` is lit.
///
/// Characters outside printable ASCII render as [`REPLACEMENT_CHAR`].
#[must_use]
pub fn glyph_columns(ch: char) -> [u8; GLYPH_WIDTH] {
    let ch = if ch.is_ascii() && !ch.is_ascii_control() {
        ch
    } else {
        REPLACEMENT_CHAR
    };
    let mut utf8 = [0u8; 4];
    let text = ch.encode_utf8(&mut utf8);

    let mut cell = Frame2d::<GLYPH_WIDTH, MATRIX_HEIGHT>::new();
    let style = MonoTextStyle::new(&FONT_5X8, Rgb888::WHITE);
    if let Err(never) =
        Text::with_baseline(text, Point::new(GLYPH_X_OFFSET, 0), style, Baseline::Top)
            .draw(&mut cell)
    {
        match never {}
    }

    let mut columns = [0u8; GLYPH_WIDTH];
    for (y_index, row) in cell.iter().enumerate() {
        for (column, pixel) in columns.iter_mut().zip(row.iter()) {
            if pixel.r != 0 {
                *column |= 1 << y_index;
            }
        }
    }
    columns
}
