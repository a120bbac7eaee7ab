//! Error types returned by the framebuffer, the image decoder and the display.

use crate::dirty::DirtyKind;

/// Errors raised by operations on the in-memory [`FrameBuffer`](crate::framebuffer::FrameBuffer).
///
/// None of these leave partial state behind: a rejected goto keeps the
/// cursor, and a rejected glyph writes no columns at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameBufferError {
    /// Chunk (or character cell) coordinates outside the panel.
    #[error("position ({x}, {y}) is outside the panel")]
    OutOfRange {
        /// Requested column
        x: u16,
        /// Requested row
        y: u16,
    },
    /// The write would run past the end of the pixel buffer.
    #[error("pixel buffer is full")]
    BufferFull,
    /// The byte has no entry in the glyph table (only ASCII 32..=126 do).
    #[error("no glyph for character code {0:#04x}")]
    InvalidGlyph(u8),
}

/// Errors raised while parsing a compressed image.
///
/// The whole stream is validated before the destination is touched, so a
/// decode error never leaves a half-drawn image behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The stream ended before the header or the last run was complete.
    #[error("compressed image is truncated")]
    Truncated,
    /// A two byte length had its continuation bit set on the second byte.
    #[error("length field is longer than two bytes")]
    BadVarint,
    /// The polarity field is neither 0 nor 1.
    #[error("invalid polarity {0}")]
    InvalidPolarity(u16),
    /// Width or height is zero.
    #[error("image has no columns or rows")]
    EmptyImage,
    /// The image is larger than the destination canvas and cannot be placed.
    #[error("image of {width}x{height} chunks does not fit the canvas")]
    TooLarge {
        /// Image width in chunk columns
        width: u16,
        /// Image height in chunk rows
        height: u16,
    },
    /// The runs describe more columns than `width * height`.
    #[error("runs overflow the image area")]
    Overrun,
    /// A run pair with both lengths zero before the image was complete.
    #[error("run pair makes no progress")]
    Stalled,
    /// The destination slice is shorter than the canvas it claims to be.
    #[error("destination buffer is smaller than the canvas")]
    BufferTooSmall,
}

/// Errors returned by [`Pcd8544`](crate::display::Pcd8544).
///
/// `E` is the error type of the injected
/// [`DisplayInterface`](crate::interface::DisplayInterface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A framebuffer operation was rejected.
    #[error(transparent)]
    FrameBuffer(#[from] FrameBufferError),
    /// A compressed image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The transport failed to send a command or data burst.
    ///
    /// The dirty state is left as it was, so the flush can be retried.
    #[error("transport failure")]
    Transport(E),
    /// The pending dirty state has no synchronization strategy yet.
    #[error("no synchronization strategy for {0:?} updates")]
    UnsupportedSync(DirtyKind),
}
