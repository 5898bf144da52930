//! Remote pixel updates: a JSON body carrying a brightness and up to 64 packed colors.
//!
//! ```json
//! { "brightness": 50, "data": [16711680, 65280, 255] }
//! ```
//!
//! `brightness` is a percentage (default 20, clamped to 0..=100). `data` lists colors as
//! `0xRRGGBB` integers in panel order: entry `i` lands on row `i / 8`, column
//! `7 - i % 8`. Entries past the 64th are ignored. Any JSON number is accepted and
//! reduced to its low 24 bits; `null` entries draw black.
//!
//! Applying a request clears the panel first, so cells the list does not reach end up
//! dark. A request without a usable `data` list changes nothing.
//!
//! The HTTP side is out of scope here: the transport hands over the body, calls
//! [`handle_pixel_update`] and replies with [`ACK_BODY`] and [`CORS_HEADERS`].

use core::fmt;

use heapless::Vec;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::led2d::{MATRIX_LEN, MATRIX_WIDTH, mirror_x};
use crate::led_strip::{Rgb, StripWriter};
use crate::matrix::MatrixRenderer;
use crate::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Brightness used when a request leaves it out.
pub const BRIGHTNESS_DEFAULT: u8 = 20;

/// Largest accepted body, matching the transport's receive buffer.
pub const MAX_BODY_LEN: usize = 1024;

/// Fixed reply to every accepted update.
pub const ACK_BODY: &str = r#"{"status":"ok"}"#;

/// Headers the transport adds to replies so browser pages on other origins can post.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

// ============================================================================
// ColorList
// ============================================================================

/// Packed `0xRRGGBB` colors, at most one per LED.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorList {
    colors: Vec<u32, MATRIX_LEN>,
    dropped: usize,
}

impl ColorList {
    /// The kept colors, in panel order.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.colors
    }

    /// How many entries past the 64th were read and ignored.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Reduce a JSON number to a packed color: truncate toward zero, saturate to `i32`,
/// keep the low 24 bits. `null` arrives as NaN and becomes black.
#[must_use]
pub fn packed_color_from_number(value: f64) -> u32 {
    // `as` saturates and maps NaN to 0.
    ((value as i32) as u32) & 0x00FF_FFFF
}

// The `data` field as sent: a list of colors, or some other value that carries none.
enum DataField {
    Colors(ColorList),
    Other,
}

impl DataField {
    fn into_colors(self) -> Option<ColorList> {
        match self {
            Self::Colors(list) => Some(list),
            Self::Other => None,
        }
    }
}

impl<'de> Deserialize<'de> for DataField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        struct DataFieldVisitor;

        impl<'de> Visitor<'de> for DataFieldVisitor {
            type Value = DataField;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an array of packed 24-bit colors")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> core::result::Result<Self::Value, A::Error> {
                let mut list = ColorList::default();
                // Every entry must be a number or null; anything else fails the request.
                while let Some(number) = seq.next_element::<f64>()? {
                    if list.colors.push(packed_color_from_number(number)).is_err() {
                        list.dropped = list.dropped.saturating_add(1);
                    }
                }
                Ok(DataField::Colors(list))
            }

            fn visit_unit<E: de::Error>(self) -> core::result::Result<Self::Value, E> {
                Ok(DataField::Other)
            }

            fn visit_bool<E: de::Error>(self, _value: bool) -> core::result::Result<Self::Value, E> {
                Ok(DataField::Other)
            }

            fn visit_str<E: de::Error>(self, _value: &str) -> core::result::Result<Self::Value, E> {
                Ok(DataField::Other)
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> core::result::Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(DataField::Other)
            }
        }

        // Scalars are skipped without being typed, which lands in `visit_unit`.
        deserializer.deserialize_ignored_any(DataFieldVisitor)
    }
}

fn color_list_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> core::result::Result<Option<ColorList>, D::Error> {
    Ok(Option::<DataField>::deserialize(deserializer)?.and_then(DataField::into_colors))
}

fn truncated_percent<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> core::result::Result<Option<i64>, D::Error> {
    // Saturating, toward zero.
    Ok(Option::<f64>::deserialize(deserializer)?.map(|value| value as i64))
}

// ============================================================================
// PixelUpdateRequest
// ============================================================================

/// A decoded pixel update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PixelUpdateRequest {
    /// Brightness percentage as sent, truncated to an integer; see
    /// [`brightness_percent`](Self::brightness_percent).
    #[serde(default, deserialize_with = "truncated_percent")]
    pub brightness: Option<i64>,
    /// Colors as sent, if `data` was a list.
    #[serde(default, deserialize_with = "color_list_or_none")]
    pub data: Option<ColorList>,
}

impl PixelUpdateRequest {
    /// Decode a request body.
    ///
    /// A `data` field that is not a list counts as absent. List entries and the
    /// brightness may be any JSON number; see [`packed_color_from_number`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BodyTooLarge`] for bodies over [`MAX_BODY_LEN`] and
    /// [`Error::MalformedRequest`] when the body is not a JSON object of the expected
    /// shape, including a `data` list with an entry that is not a number.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        if body.len() > MAX_BODY_LEN {
            return Err(Error::BodyTooLarge(MAX_BODY_LEN));
        }
        match serde_json_core::from_slice::<Self>(body) {
            Ok((request, _)) => {
                match request.data.as_ref() {
                    Some(list) if list.dropped() > 0 => {
                        debug!("pixel update: ignored {} extra colors", list.dropped());
                    }
                    None => debug!("pixel update: no color list, pixels untouched"),
                    Some(_) => {}
                }
                Ok(request)
            }
            Err(error) => {
                warn!("pixel update rejected: malformed body");
                Err(Error::MalformedRequest(error))
            }
        }
    }

    /// Brightness clamped to `0..=100`, or [`BRIGHTNESS_DEFAULT`] when absent.
    #[must_use]
    pub fn brightness_percent(&self) -> u8 {
        self.brightness.map_or(BRIGHTNESS_DEFAULT, |brightness| {
            u8::try_from(brightness.clamp(0, 100)).unwrap_or(BRIGHTNESS_DEFAULT)
        })
    }

    /// The colors to draw, if any.
    #[must_use]
    pub fn colors(&self) -> Option<&[u32]> {
        self.data.as_ref().map(ColorList::as_slice)
    }

    /// Redraw the panel from this request: clear, draw every listed color, refresh.
    ///
    /// Does nothing when there is no color list.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip rejects the clear or the frame.
    pub async fn apply<S: StripWriter<MATRIX_LEN>>(&self, renderer: &MatrixRenderer<S>) -> Result<()> {
        let Some(colors) = self.colors() else {
            return Ok(());
        };
        let percent = self.brightness_percent();
        renderer.clear_all().await?;
        for (index, packed) in colors.iter().enumerate() {
            let x_index = mirror_x(index % MATRIX_WIDTH);
            let y_index = index / MATRIX_WIDTH;
            renderer
                .set_pixel(x_index, y_index, unpack_color(*packed, percent))
                .await;
        }
        renderer.refresh().await?;
        debug!("pixel update: {} colors at {}%", colors.len(), percent);
        Ok(())
    }
}

/// Split `0xRRGGBB` into channels and scale each by `percent / 100`, rounding to nearest.
#[must_use]
pub const fn unpack_color(packed: u32, percent: u8) -> Rgb {
    let percent = if percent > 100 { 100 } else { percent as u32 };
    Rgb::new(
        scale_channel((packed >> 16) & 0xFF, percent),
        scale_channel((packed >> 8) & 0xFF, percent),
        scale_channel(packed & 0xFF, percent),
    )
}

const fn scale_channel(channel: u32, percent: u32) -> u8 {
    ((channel * percent + 50) / 100) as u8
}

/// Decode `body` and apply it. Returns the acknowledgement for the transport to send.
///
/// # Errors
///
/// Returns an error for a malformed or oversized body (the panel is left untouched) or if
/// the strip rejects the frame.
pub async fn handle_pixel_update<S: StripWriter<MATRIX_LEN>>(
    renderer: &MatrixRenderer<S>,
    body: &[u8],
) -> Result<&'static str> {
    let request = PixelUpdateRequest::from_json(body)?;
    request.apply(renderer).await?;
    Ok(ACK_BODY)
}
