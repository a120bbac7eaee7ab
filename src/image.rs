//! Decoder for the compact run-length image format.
//!
//! Images are stored column-chunk by column-chunk (the same byte layout as
//! the pixel buffer) and compressed by alternating runs of literal chunks and
//! "blank" chunks. The blank value depends on the image polarity, so mostly
//! dark and mostly light images compress equally well.
//!
//! # Wire format
//! ```text
//! polarity  len   0 = blank chunks are 0x00, 1 = blank chunks are 0xff
//! width     len   image width in chunk columns
//! height    len   image height in chunk rows
//! offset    len   blank chunks before the first run pair
//! pairs     { literal: len, blank: len, literal × u8 }
//! ```
//! `len` is a 7-bit continuation number: one byte below `0x80`, otherwise the
//! low seven bits followed by a second byte with bits 7 to 13.
//!
//! Chunks are emitted row-major over the image's own width; crossing an
//! image row moves the destination to the next canvas row. Decoding ends as
//! soon as `width * height` chunks have been emitted, and anything after that
//! is ignored.
//!
//! # Example
//! ```rust
//! use pcd8544_framebuffer::image::{decode_and_blit, Placement};
//! use pcd8544_framebuffer::BUFFER_SIZE;
//!
//! // 1x1 image, one literal chunk 0xaa and no blank run
//! let data = [0, 1, 1, 0, 1, 0, 0xaa];
//! let mut canvas = [0u8; BUFFER_SIZE];
//! let placed = decode_and_blit(&data, &mut canvas, 5, 2).unwrap();
//! assert_eq!(canvas[5 + 2 * 84], 0xaa);
//! assert_eq!(placed, Placement { x: 5, y: 2, width: 1, height: 1 });
//! ```
//!
//! The decoder only touches the destination slice. When it targets a
//! [`FrameBuffer`](crate::framebuffer::FrameBuffer) the caller has to mark the
//! region dirty, or use [`FrameBuffer::draw_image`] which does both.

use core::ops::Range;

use crate::error::DecodeError;
use crate::framebuffer::FrameBuffer;
use crate::{COLS, ROWS};

/// Chunk geometry of a destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Canvas {
    /// Width in chunk columns
    pub width: usize,
    /// Height in chunk rows
    pub height: usize,
}

impl Canvas {
    /// The PCD8544 panel: 84 columns by 6 chunk rows.
    pub const PANEL: Canvas = Canvas {
        width: COLS,
        height: ROWS,
    };

    const fn size(&self) -> usize {
        self.width * self.height
    }
}

/// Value used for blank runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Blank chunks are `0x00`
    Clear,
    /// Blank chunks are `0xff`
    Set,
}

impl Polarity {
    /// The chunk byte written for blank runs.
    #[must_use]
    pub const fn fill(self) -> u8 {
        match self {
            Polarity::Clear => 0x00,
            Polarity::Set => 0xff,
        }
    }
}

/// Decoded image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageHeader {
    /// Blank run value
    pub polarity: Polarity,
    /// Width in chunk columns
    pub width: u16,
    /// Height in chunk rows
    pub height: u16,
    /// Blank chunks before the first run pair
    pub offset: u16,
}

impl ImageHeader {
    /// Number of chunks the image covers.
    #[must_use]
    pub const fn chunks(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Where an image ended up on the canvas, after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Placement {
    /// Left chunk column
    pub x: usize,
    /// Top chunk row
    pub y: usize,
    /// Width in chunk columns
    pub width: usize,
    /// Height in chunk rows
    pub height: usize,
}

impl Placement {
    /// Flat byte span from the first to the last chunk written on a canvas
    /// `canvas_width` columns wide.
    #[must_use]
    pub const fn byte_range(&self, canvas_width: usize) -> Range<usize> {
        let start = self.x + self.y * canvas_width;
        let end = (self.x + self.width - 1) + (self.y + self.height - 1) * canvas_width + 1;
        start..end
    }
}

/// One run of chunks in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Literal(&'a [u8]),
    Blank(usize),
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    fn length(&mut self) -> Result<u16, DecodeError> {
        let low = self.byte()?;
        if low & 0x80 == 0 {
            return Ok(u16::from(low));
        }
        let high = self.byte()?;
        if high & 0x80 != 0 {
            return Err(DecodeError::BadVarint);
        }
        Ok(u16::from(low & 0x7f) | (u16::from(high) << 7))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or(DecodeError::Truncated)?;
        self.pos += n;
        Ok(bytes)
    }
}

/// A parsed compressed image whose run stream has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedImage<'a> {
    header: ImageHeader,
    body: &'a [u8],
}

impl<'a> CompressedImage<'a> {
    /// Parse the header and validate every run against it.
    ///
    /// # Errors
    /// Any [`DecodeError`] describing the first problem in the stream.
    pub fn parse(data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(data);
        let polarity = match reader.length()? {
            0 => Polarity::Clear,
            1 => Polarity::Set,
            other => return Err(DecodeError::InvalidPolarity(other)),
        };
        let width = reader.length()?;
        let height = reader.length()?;
        let offset = reader.length()?;
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyImage);
        }
        let image = Self {
            header: ImageHeader {
                polarity,
                width,
                height,
                offset,
            },
            body: &data[reader.pos..],
        };
        image.walk(|_| {})?;
        Ok(image)
    }

    /// The image header.
    #[must_use]
    pub const fn header(&self) -> ImageHeader {
        self.header
    }

    /// Feed every run, leading offset included, to `emit`.
    ///
    /// Stops once the image area is covered. A zero blank run does not end
    /// the image by itself.
    fn walk<F>(&self, mut emit: F) -> Result<(), DecodeError>
    where
        F: FnMut(Run<'a>),
    {
        let total = self.header.chunks();
        let mut reader = Reader::new(self.body);
        let mut emitted = usize::from(self.header.offset);
        if emitted > total {
            return Err(DecodeError::Overrun);
        }
        if emitted > 0 {
            emit(Run::Blank(emitted));
        }
        while emitted < total {
            let literal = usize::from(reader.length()?);
            let blank = usize::from(reader.length()?);
            if literal == 0 && blank == 0 {
                return Err(DecodeError::Stalled);
            }
            if emitted + literal + blank > total {
                return Err(DecodeError::Overrun);
            }
            let bytes = reader.take(literal)?;
            if literal > 0 {
                emit(Run::Literal(bytes));
            }
            if blank > 0 {
                emit(Run::Blank(blank));
            }
            emitted += literal + blank;
        }
        Ok(())
    }

    /// Where the image lands on `canvas` for the requested origin.
    ///
    /// An origin that would push the image past the right or bottom edge is
    /// moved inward until the image fits.
    ///
    /// # Errors
    /// [`DecodeError::TooLarge`] if the image is bigger than the canvas.
    pub fn placement(&self, canvas: Canvas, x: usize, y: usize) -> Result<Placement, DecodeError> {
        let width = usize::from(self.header.width);
        let height = usize::from(self.header.height);
        if width > canvas.width || height > canvas.height {
            return Err(DecodeError::TooLarge {
                width: self.header.width,
                height: self.header.height,
            });
        }
        Ok(Placement {
            x: x.min(canvas.width - width),
            y: y.min(canvas.height - height),
            width,
            height,
        })
    }

    /// Decode into `dest`, a buffer laid out as `canvas`.
    ///
    /// # Errors
    /// [`DecodeError::BufferTooSmall`] or [`DecodeError::TooLarge`]; the run
    /// stream itself was already validated by [`parse`](Self::parse).
    pub fn decode_into(
        &self,
        dest: &mut [u8],
        canvas: Canvas,
        x: usize,
        y: usize,
    ) -> Result<Placement, DecodeError> {
        if dest.len() < canvas.size() {
            return Err(DecodeError::BufferTooSmall);
        }
        let placement = self.placement(canvas, x, y)?;
        let mut blitter = Blitter {
            dest,
            stride: canvas.width,
            width: placement.width,
            index: placement.x + placement.y * canvas.width,
            column: 0,
        };
        let fill = self.header.polarity.fill();
        self.walk(|run| match run {
            Run::Literal(bytes) => blitter.copy(bytes),
            Run::Blank(count) => blitter.fill(fill, count),
        })?;
        Ok(placement)
    }
}

/// Writes chunks row-major into a window of the destination canvas.
struct Blitter<'d> {
    dest: &'d mut [u8],
    stride: usize,
    width: usize,
    index: usize,
    column: usize,
}

impl Blitter<'_> {
    /// Next span that stays within the current image row.
    fn span(&mut self, wanted: usize) -> (&mut [u8], usize) {
        let n = wanted.min(self.width - self.column);
        let start = self.index;
        self.index += n;
        self.column += n;
        if self.column == self.width {
            self.column = 0;
            self.index += self.stride - self.width;
        }
        // the placement keeps the window on the canvas and `dest` covers it
        (&mut self.dest[start..start + n], n)
    }

    fn copy(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let (span, n) = self.span(bytes.len());
            let (head, tail) = bytes.split_at(n);
            span.copy_from_slice(head);
            bytes = tail;
        }
    }

    fn fill(&mut self, value: u8, mut count: usize) {
        while count > 0 {
            let (span, n) = self.span(count);
            span.fill(value);
            count -= n;
        }
    }
}

/// Decode `data` into a panel sized buffer with the image's top left chunk at
/// (`x`, `y`), clamping the origin so the image fits.
///
/// Nothing is written unless the whole stream is valid.
///
/// # Errors
/// Any [`DecodeError`] found while parsing or placing the image.
pub fn decode_and_blit(
    data: &[u8],
    dest: &mut [u8],
    x: usize,
    y: usize,
) -> Result<Placement, DecodeError> {
    CompressedImage::parse(data)?.decode_into(dest, Canvas::PANEL, x, y)
}

impl FrameBuffer {
    /// Decode a compressed image into the framebuffer and mark the span it
    /// covers as dirty. The cursor does not move.
    ///
    /// # Errors
    /// Any [`DecodeError`]; the framebuffer is unchanged in that case.
    pub fn draw_image(
        &mut self,
        data: &[u8],
        x: usize,
        y: usize,
    ) -> Result<Placement, DecodeError> {
        let placement = decode_and_blit(data, self.as_mut_bytes(), x, y)?;
        self.mark_dirty(placement.byte_range(COLS));
        Ok(placement)
    }
}
