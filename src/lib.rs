//! Framebuffer and driver for PCD8544 monochrome LCD panels (Nokia 5110/3310).
//!
//! ## How the PCD8544 Works
//!
//! The PCD8544 is an 84×48 pixel controller with its own display RAM. The host
//! never streams pixels continuously; it writes into the controller's RAM over
//! a write-only serial bus and the controller refreshes the glass by itself.
//!
//! ### Signal names
//! - **SCE** – Chip enable (active LOW)
//! - **D/C** – Data/command select: LOW for instruction bytes, HIGH for RAM data
//! - **SDIN / SCLK** – Serial data and clock, MSB first
//! - **RST** – Reset (active LOW), must be pulsed after power-up
//!
//! ### Memory layout
//! Display RAM is organised as 6 banks of 84 bytes. Each byte is a vertical
//! "chunk" of 8 pixels, bit 0 at the top. After every data byte the X address
//! advances and wraps into the next bank, so a contiguous byte range of the
//! framebuffer can be sent in one burst after a single Set-X/Set-Y pair.
//!
//! ## Crate layout
//!
//! - [`framebuffer::FrameBuffer`] mirrors the display RAM, tracks a write
//!   cursor and the contiguous range that changed since the last flush. It is
//!   an `embedded-graphics` [`DrawTarget`](embedded_graphics::draw_target::DrawTarget)
//!   over [`BinaryColor`].
//! - [`text`] renders ASCII with the built-in [`font::FONT_5X7`].
//! - [`image`] decodes run-length compressed images into the framebuffer.
//! - [`display::Pcd8544`] owns a framebuffer and a [`interface::DisplayInterface`],
//!   initialises the controller and flushes only what changed.
//!
//! ## Available Feature Flags
//!
//! ### `esp-dma` Feature
//! Switches the `ReadBuffer` implementation of the framebuffer from
//! `embedded-dma` to `esp-hal::dma`, so the raw 504 bytes can be handed to an
//! ESP32 SPI DMA transfer. Enable one of `esp32`, `esp32s3` or `esp32c6` with it.
//!
//! ```toml
//! [dependencies]
//! pcd8544-framebuffer = { version = "0.1.0", features = ["esp-dma", "esp32c6"] }
//! ```
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types and emits `debug`/`trace`
//! messages from the driver (init, flush ranges, command bytes).
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use embedded_graphics::pixelcolor::BinaryColor;

pub mod command;
pub mod config;
pub mod dirty;
pub mod display;
pub mod error;
pub mod font;
pub mod framebuffer;
pub mod image;
pub mod interface;
pub mod text;

pub use config::Config;
pub use display::Pcd8544;
pub use error::{DecodeError, Error, FrameBufferError};
pub use framebuffer::FrameBuffer;

/// Color type used in the framebuffer
pub type Color = BinaryColor;

/// Chunk columns per chunk row.
pub const COLS: usize = 84;

/// Chunk rows (controller banks).
pub const ROWS: usize = 6;

/// Pixels stacked in one chunk byte.
pub const CHUNK_HEIGHT: usize = 8;

/// Panel width in pixels.
pub const WIDTH: usize = COLS;

/// Panel height in pixels.
pub const HEIGHT: usize = ROWS * CHUNK_HEIGHT;

/// Size of the pixel buffer in bytes.
pub const BUFFER_SIZE: usize = COLS * ROWS;

/// Flat buffer offset of chunk column `x` in chunk row `y`.
///
/// # Arguments
///
/// * `x` - Chunk column, `0..84`
/// * `y` - Chunk row, `0..6`
#[must_use]
pub const fn chunk_index(x: usize, y: usize) -> usize {
    x + y * COLS
}
