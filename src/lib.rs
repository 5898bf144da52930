//! An 8×8 WS2812 matrix engine for the Pico: a shadow buffer that survives the display
//! being switched off, boot animations and status icons, a debounced power button, and a
//! JSON pixel-update protocol.
//!
//! # Glossary
//!
//! - **Shadow buffer:** the in-memory pixel state, authoritative whether or not the LEDs
//!   are currently showing it. See [`matrix::PixelBuffer`].
//! - **Gate:** the display-on flag deciding whether drawing reaches the LEDs. Flipped only
//!   by [`button::DisplayPowerController`].
//! - **Serpentine addressing:** the strip snakes across rows, so odd rows run right to
//!   left. See [`led2d::MATRIX_LAYOUT`].
//! - **Resync:** pushing the whole shadow buffer to the LEDs after the display comes back on.
//! - **PIO ([Programmable I/O](https://medium.com/data-science/nine-pico-pio-wats-with-rust-part-1-9d062067dc25)):**
//!   drives the WS2812 data line on the device.
#![cfg_attr(not(feature = "host"), no_std)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod animation;
pub mod button;
pub mod connectivity;
mod error;
pub mod led2d;
pub mod led_strip;
pub mod matrix;
pub mod pixel_update;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
