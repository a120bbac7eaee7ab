//! In-memory mirror of the PCD8544 display RAM.
//!
//! The panel's 84×48 pixels are stored as 6 rows of 84 "chunks". A chunk is
//! one byte holding 8 vertically stacked pixels with bit 0 at the top, which
//! is exactly the layout the controller expects on the wire. The whole
//! buffer is therefore 504 bytes and can be streamed to the panel verbatim.
//!
//! # Cursor and dirty range
//! Sequential writes go through a flat cursor (`x + y * 84`). Every write,
//! and every cursor move, folds its offset into a single contiguous dirty
//! range. [`Pcd8544::flush`](crate::display::Pcd8544::flush) sends exactly
//! that range and collapses it to zero length.
//!
//! # Example
//! ```rust
//! use pcd8544_framebuffer::framebuffer::FrameBuffer;
//! use pcd8544_framebuffer::dirty::SyncState;
//!
//! let mut fb = FrameBuffer::new();
//! fb.clear();
//! assert!(matches!(fb.sync_state(), SyncState::RangeDirty(_)));
//!
//! fb.goto_chunk(10, 2).unwrap();
//! fb.write_byte(0xff).unwrap();
//! assert_eq!(fb.cursor(), 10 + 2 * 84 + 1);
//! ```
//!
//! # Drawing
//! The framebuffer is an `embedded-graphics` [`DrawTarget`] over
//! [`BinaryColor`], so primitives, fonts and images from that ecosystem can
//! render into it. Pixel writes mark their chunk dirty like any other write.

use core::convert::Infallible;
use core::ops::Range;

#[cfg(not(feature = "esp-dma"))]
use embedded_dma::ReadBuffer;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{OriginDimensions, Point, Size};
#[cfg(feature = "esp-dma")]
use esp_hal::dma::ReadBuffer;

use crate::dirty::{DirtyArea, DirtyRange, DirtyTracker, SyncState};
use crate::error::FrameBufferError;
use crate::{chunk_index, BUFFER_SIZE, CHUNK_HEIGHT, COLS, HEIGHT, ROWS, WIDTH};

/// Pixel buffer, write cursor and dirty tracking for one panel.
#[derive(Clone)]
#[repr(C)]
#[repr(align(4))]
pub struct FrameBuffer {
    buffer: [u8; BUFFER_SIZE],
    cursor: usize,
    dirty: DirtyTracker,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Create a blank framebuffer.
    ///
    /// The panel RAM is unknown at power-up, so a new framebuffer starts out
    /// fully dirty, exactly as after [`clear`](Self::clear).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
            cursor: 0,
            dirty: DirtyTracker {
                range: DirtyRange::new(0, BUFFER_SIZE),
                range_pending: true,
                area: None,
            },
        }
    }

    /// Zero every chunk, mark the whole buffer dirty and move the cursor home.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.dirty.mark_all(BUFFER_SIZE);
        self.cursor = 0;
    }

    /// Move the cursor to chunk column `x` (0..84) of chunk row `y` (0..6).
    ///
    /// The new offset is folded into the dirty range bounds. Coordinates off
    /// the panel are rejected and leave the cursor and range untouched.
    ///
    /// # Errors
    /// [`FrameBufferError::OutOfRange`] if `x >= 84` or `y >= 6`.
    pub fn goto_chunk(&mut self, x: u16, y: u16) -> Result<(), FrameBufferError> {
        let (col, row) = (usize::from(x), usize::from(y));
        if col >= COLS || row >= ROWS {
            return Err(FrameBufferError::OutOfRange { x, y });
        }
        let pos = chunk_index(col, row);
        self.dirty.range.include(pos);
        self.cursor = pos;
        Ok(())
    }

    /// Store one chunk at the cursor and advance it.
    ///
    /// # Errors
    /// [`FrameBufferError::BufferFull`] if the cursor is already past the
    /// last chunk. Nothing is written in that case.
    pub fn write_byte(&mut self, value: u8) -> Result<(), FrameBufferError> {
        self.write_run(&[value])
    }

    /// Store `bytes` at the cursor as one unit.
    ///
    /// Either every byte fits and is written, or nothing is written.
    ///
    /// # Errors
    /// [`FrameBufferError::BufferFull`] if the run does not fit in front of
    /// the end of the buffer.
    pub fn write_run(&mut self, bytes: &[u8]) -> Result<(), FrameBufferError> {
        let start = self.cursor;
        let end = start + bytes.len();
        let Some(dest) = self.buffer.get_mut(start..end) else {
            return Err(FrameBufferError::BufferFull);
        };
        if bytes.is_empty() {
            return Ok(());
        }
        dest.copy_from_slice(bytes);
        self.cursor = end;
        self.dirty.range.include(start);
        self.dirty.range.extend_to(end);
        self.dirty.range_pending = true;
        Ok(())
    }

    /// Replace the whole buffer with a full-screen image.
    ///
    /// The cursor ends up past the last chunk, so further sequential writes
    /// need a goto first.
    pub fn blit_full_buffer(&mut self, image: &[u8; BUFFER_SIZE]) {
        self.dirty.range.include(0);
        self.buffer.copy_from_slice(image);
        self.cursor = BUFFER_SIZE;
        self.dirty.range.extend_to(BUFFER_SIZE);
        self.dirty.range_pending = true;
    }

    /// Flag `range` as changed after writing into [`as_mut_bytes`](Self::as_mut_bytes)
    /// or decoding an image into the buffer directly.
    ///
    /// The range is clipped to the buffer; an empty range is ignored.
    pub fn mark_dirty(&mut self, range: Range<usize>) {
        let range = range.start.min(BUFFER_SIZE)..range.end.min(BUFFER_SIZE);
        if range.is_empty() {
            return;
        }
        self.dirty.range.union(range);
        self.dirty.range_pending = true;
    }

    /// Record a rectangular area update.
    ///
    /// Area updates are a reserved tracking mode: they are remembered and
    /// reported by [`sync_state`](Self::sync_state), but no flush strategy
    /// exists for them yet.
    ///
    /// # Errors
    /// [`FrameBufferError::OutOfRange`] if the rectangle is empty or leaves
    /// the panel.
    pub fn mark_area(&mut self, area: DirtyArea) -> Result<(), FrameBufferError> {
        let right = usize::from(area.x) + usize::from(area.width);
        let bottom = usize::from(area.y) + usize::from(area.height);
        if area.width == 0 || area.height == 0 || right > COLS || bottom > ROWS {
            return Err(FrameBufferError::OutOfRange {
                x: right as u16,
                y: bottom as u16,
            });
        }
        self.dirty.mark_area(area);
        Ok(())
    }

    /// Current flat cursor offset.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The dirty byte range, pending or not.
    #[must_use]
    pub const fn dirty_range(&self) -> DirtyRange {
        self.dirty.range
    }

    /// What a flush would have to send right now.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.dirty.state()
    }

    /// Called by the sync engine once the pending range reached the panel.
    ///
    /// The cursor follows the new anchor, so writing continues right after
    /// the flushed range and wraps to the first chunk after a full screen.
    pub(crate) fn range_sent(&mut self) {
        self.dirty.range_sent(BUFFER_SIZE);
        self.cursor = self.dirty.range.start();
    }

    /// Raw chunk bytes in panel order.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    /// Mutable chunk bytes.
    ///
    /// Writes through this slice are not tracked; follow them with
    /// [`mark_dirty`](Self::mark_dirty).
    pub fn as_mut_bytes(&mut self) -> &mut [u8; BUFFER_SIZE] {
        &mut self.buffer
    }

    /// Set a single pixel.
    ///
    /// Points outside the 84×48 panel are ignored.
    pub fn set_pixel(&mut self, p: Point, color: BinaryColor) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        self.set_pixel_internal(p.x as usize, p.y as usize, color);
    }

    /// Read a single pixel, `None` outside the panel.
    #[must_use]
    pub fn get_pixel(&self, p: Point) -> Option<BinaryColor> {
        if p.x < 0 || p.y < 0 || p.x as usize >= WIDTH || p.y as usize >= HEIGHT {
            return None;
        }
        let (x, y) = (p.x as usize, p.y as usize);
        let chunk = self.buffer[chunk_index(x, y / CHUNK_HEIGHT)];
        Some(BinaryColor::from(chunk & (1 << (y % CHUNK_HEIGHT)) != 0))
    }

    fn set_pixel_internal(&mut self, x: usize, y: usize, color: BinaryColor) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let index = chunk_index(x, y / CHUNK_HEIGHT);
        let mask = 1 << (y % CHUNK_HEIGHT);
        let chunk = &mut self.buffer[index];
        if color.is_on() {
            *chunk |= mask;
        } else {
            *chunk &= !mask;
        }
        self.dirty.range.include(index);
        self.dirty.range.extend_to(index + 1);
        self.dirty.range_pending = true;
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl embedded_graphics::draw_target::DrawTarget for FrameBuffer {
    type Color = BinaryColor;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for pixel in pixels {
            self.set_pixel(pixel.0, pixel.1);
        }
        Ok(())
    }
}

unsafe impl ReadBuffer for FrameBuffer {
    #[cfg(not(feature = "esp-dma"))]
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.buffer.as_ptr(), self.buffer.len())
    }
}

unsafe impl ReadBuffer for &mut FrameBuffer {
    #[cfg(not(feature = "esp-dma"))]
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        (self.buffer.as_ptr(), self.buffer.len())
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &self.buffer.len())
            .field("cursor", &self.cursor)
            .field("state", &self.dirty.state())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameBuffer {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FrameBuffer<{}x{}>", COLS, ROWS);
        defmt::write!(f, " size: {}", self.buffer.len());
        defmt::write!(f, " cursor: {}", self.cursor);
        defmt::write!(f, " state: {}", self.dirty.state());
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;

    use super::*;
    use crate::dirty::DirtyKind;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

    /// A cleared buffer whose full-screen range has already been sent.
    fn synced() -> FrameBuffer {
        let mut fb = FrameBuffer::new();
        fb.clear();
        fb.range_sent();
        fb
    }

    #[test]
    fn test_new_is_blank_and_fully_dirty() {
        let fb = FrameBuffer::new();
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(fb.cursor(), 0);
        assert_eq!(
            fb.sync_state(),
            SyncState::RangeDirty(DirtyRange::new(0, BUFFER_SIZE))
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut fb = synced();
        fb.goto_chunk(40, 3).unwrap();
        fb.write_run(&[0xaa; 10]).unwrap();
        fb.set_pixel(Point::new(83, 47), BinaryColor::On);

        fb.clear();

        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(fb.cursor(), 0);
        assert_eq!(fb.dirty_range(), DirtyRange::new(0, BUFFER_SIZE));
        assert_eq!(fb.sync_state().kind(), DirtyKind::Range);
    }

    #[test]
    fn test_goto_chunk_sets_cursor() {
        let mut fb = synced();
        fb.goto_chunk(5, 1).unwrap();
        assert_eq!(fb.cursor(), 5 + 84);
        fb.goto_chunk(83, 5).unwrap();
        assert_eq!(fb.cursor(), BUFFER_SIZE - 1);
    }

    #[test]
    fn test_goto_chunk_extends_bounds_without_marking_pending() {
        let mut fb = synced();
        fb.goto_chunk(20, 2).unwrap();
        assert_eq!(fb.dirty_range(), DirtyRange::new(0, 188));
        assert_eq!(fb.sync_state(), SyncState::Idle);
    }

    #[test]
    fn test_goto_chunk_out_of_range_changes_nothing() {
        let mut fb = synced();
        fb.goto_chunk(3, 2).unwrap();
        fb.write_byte(0x11).unwrap();
        let cursor = fb.cursor();
        let range = fb.dirty_range();

        for (x, y) in [(84, 0), (0, 6), (84, 6), (u16::MAX, 0), (0, u16::MAX)] {
            assert_eq!(
                fb.goto_chunk(x, y),
                Err(FrameBufferError::OutOfRange { x, y })
            );
            assert_eq!(fb.cursor(), cursor);
            assert_eq!(fb.dirty_range(), range);
        }
    }

    #[test]
    fn test_write_byte_advances_and_marks() {
        let mut fb = synced();
        fb.goto_chunk(0, 0).unwrap();
        fb.write_byte(0x81).unwrap();
        fb.write_byte(0x42).unwrap();
        assert_eq!(&fb.as_bytes()[..3], &[0x81, 0x42, 0x00]);
        assert_eq!(fb.cursor(), 2);
        assert_eq!(fb.sync_state(), SyncState::RangeDirty(DirtyRange::new(0, 2)));
    }

    #[test]
    fn test_write_byte_at_end_is_buffer_full() {
        let mut fb = synced();
        fb.goto_chunk(83, 5).unwrap();
        fb.write_byte(0xff).unwrap();
        assert_eq!(fb.cursor(), BUFFER_SIZE);
        let before = fb.clone();

        assert_eq!(fb.write_byte(0x01), Err(FrameBufferError::BufferFull));
        assert_eq!(fb.as_bytes(), before.as_bytes());
        assert_eq!(fb.dirty_range(), before.dirty_range());
        assert_eq!(fb.cursor(), BUFFER_SIZE);
    }

    #[test]
    fn test_write_run_is_all_or_nothing() {
        let mut fb = synced();
        fb.goto_chunk(80, 5).unwrap();
        let range = fb.dirty_range();
        assert_eq!(fb.write_run(&[1, 2, 3, 4, 5]), Err(FrameBufferError::BufferFull));
        assert!(fb.as_bytes()[500..].iter().all(|&b| b == 0));
        assert_eq!(fb.dirty_range(), range);
        assert_eq!(fb.cursor(), 500);

        fb.write_run(&[1, 2, 3, 4]).unwrap();
        assert_eq!(&fb.as_bytes()[500..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_blit_full_buffer() {
        let mut fb = synced();
        let mut image = [0u8; BUFFER_SIZE];
        for (i, b) in image.iter_mut().enumerate() {
            *b = i as u8;
        }
        fb.blit_full_buffer(&image);
        assert_eq!(fb.as_bytes(), &image);
        assert_eq!(fb.cursor(), BUFFER_SIZE);
        assert_eq!(
            fb.sync_state(),
            SyncState::RangeDirty(DirtyRange::new(0, BUFFER_SIZE))
        );
        assert_eq!(fb.write_byte(0), Err(FrameBufferError::BufferFull));
    }

    #[test]
    fn test_mark_dirty_clips_and_ignores_empty() {
        let mut fb = synced();
        fb.mark_dirty(10..10);
        assert_eq!(fb.sync_state(), SyncState::Idle);

        fb.mark_dirty(400..900);
        assert_eq!(
            fb.sync_state(),
            SyncState::RangeDirty(DirtyRange::new(0, BUFFER_SIZE))
        );
    }

    #[test]
    fn test_range_sent_anchors_at_end() {
        let mut fb = synced();
        fb.goto_chunk(0, 1).unwrap();
        fb.write_run(&[0xff; 12]).unwrap();
        assert_eq!(fb.dirty_range(), DirtyRange::new(0, 96));
        fb.range_sent();
        assert_eq!(fb.dirty_range(), DirtyRange::empty_at(96));
        assert_eq!(fb.sync_state(), SyncState::Idle);
        assert_eq!(fb.cursor(), 96);
    }

    #[test]
    fn test_range_sent_moves_cursor_to_anchor() {
        let mut fb = synced();
        fb.goto_chunk(10, 0).unwrap();
        fb.write_byte(0x01).unwrap();
        // a goto past the written bytes pulls the range end along
        fb.goto_chunk(0, 2).unwrap();
        assert_eq!(fb.cursor(), 168);
        fb.goto_chunk(50, 1).unwrap();
        fb.range_sent();
        assert_eq!(fb.dirty_range(), DirtyRange::empty_at(168));
        assert_eq!(fb.cursor(), 168);
    }

    #[test]
    fn test_range_sent_after_full_blit_wraps_cursor() {
        let mut fb = synced();
        fb.blit_full_buffer(&[0x33; BUFFER_SIZE]);
        assert_eq!(fb.cursor(), BUFFER_SIZE);
        fb.range_sent();
        assert_eq!(fb.cursor(), 0);
        fb.write_byte(0xc3).unwrap();
        assert_eq!(fb.as_bytes()[0], 0xc3);
    }

    #[test]
    fn test_mark_area() {
        let mut fb = synced();
        let area = DirtyArea {
            x: 10,
            y: 1,
            width: 20,
            height: 2,
        };
        fb.mark_area(area).unwrap();
        assert_eq!(fb.sync_state(), SyncState::AreaDirty(area));

        let too_wide = DirtyArea {
            x: 80,
            y: 0,
            width: 5,
            height: 1,
        };
        assert!(fb.mark_area(too_wide).is_err());
        let empty = DirtyArea {
            x: 0,
            y: 0,
            width: 0,
            height: 1,
        };
        assert!(fb.mark_area(empty).is_err());
        assert_eq!(fb.sync_state(), SyncState::AreaDirty(area));

        fb.write_byte(1).unwrap();
        assert_eq!(fb.sync_state().kind(), DirtyKind::RangeAndArea);
    }

    #[test]
    fn test_set_and_get_pixel() {
        let mut fb = synced();
        fb.set_pixel(Point::new(3, 10), BinaryColor::On);
        // row 10 is bit 2 of chunk row 1
        assert_eq!(fb.as_bytes()[84 + 3], 0b0000_0100);
        assert_eq!(fb.get_pixel(Point::new(3, 10)), Some(BinaryColor::On));
        assert_eq!(fb.get_pixel(Point::new(3, 11)), Some(BinaryColor::Off));
        // the range after a full flush is anchored at offset 0
        assert_eq!(
            fb.sync_state(),
            SyncState::RangeDirty(DirtyRange::new(0, 88))
        );

        fb.set_pixel(Point::new(3, 10), BinaryColor::Off);
        assert_eq!(fb.as_bytes()[84 + 3], 0);
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let mut fb = synced();
        fb.set_pixel(Point::new(-1, 0), BinaryColor::On);
        fb.set_pixel(Point::new(0, -1), BinaryColor::On);
        fb.set_pixel(Point::new(84, 0), BinaryColor::On);
        fb.set_pixel(Point::new(0, 48), BinaryColor::On);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(fb.sync_state(), SyncState::Idle);
        assert_eq!(fb.get_pixel(Point::new(84, 0)), None);
        assert_eq!(fb.get_pixel(Point::new(-3, 2)), None);
    }

    #[test]
    fn test_draw_target_size() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.size(), Size::new(84, 48));
    }

    #[test]
    fn test_draw_rectangle() {
        let mut fb = synced();
        Rectangle::new(Point::new(0, 8), Size::new(4, 8))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(&fb.as_bytes()[84..89], &[0xff, 0xff, 0xff, 0xff, 0x00]);
        assert_eq!(fb.dirty_range(), DirtyRange::new(0, 88));
    }

    #[test]
    fn test_draw_horizontal_line() {
        let mut fb = synced();
        Line::new(Point::new(0, 47), Point::new(83, 47))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut fb)
            .unwrap();
        assert!(fb.as_bytes()[420..].iter().all(|&b| b == 0x80));
        assert!(fb.as_bytes()[..420].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_buffer() {
        let mut fb = FrameBuffer::new();
        fb.as_mut_bytes()[0] = 0x5a;
        let (ptr, len) = unsafe { fb.read_buffer() };
        assert_eq!(len, BUFFER_SIZE);
        assert_eq!(unsafe { *ptr }, 0x5a);
    }

    #[test]
    fn test_debug_output() {
        let fb = FrameBuffer::new();
        let debug = format!("{:?}", fb);
        assert!(debug.contains("FrameBuffer"));
        assert!(debug.contains("size: 504"));
        assert!(debug.contains("cursor: 0"));
    }
}
