//! Cursor driven text rendering with the built-in 5x7 font.
//!
//! A character cell is one chunk row high and [`CELL_WIDTH`] chunk columns
//! wide: five glyph columns and one blank spacing column. Text is written at
//! the framebuffer cursor and never wraps on its own; the flat cursor simply
//! runs on into the next chunk row.

use crate::error::FrameBufferError;
use crate::font::{glyph, CELL_WIDTH, GLYPH_WIDTH};
use crate::framebuffer::FrameBuffer;

impl FrameBuffer {
    /// Render one ASCII character at the cursor.
    ///
    /// The glyph and its spacing column are written as a unit, so a rejected
    /// character leaves no trace in the buffer or the dirty range.
    ///
    /// # Errors
    /// - [`FrameBufferError::InvalidGlyph`] for codes outside `' '..='~'`.
    /// - [`FrameBufferError::BufferFull`] if fewer than six chunks are left.
    pub fn write_char(&mut self, code: u8) -> Result<(), FrameBufferError> {
        let columns = glyph(code).ok_or(FrameBufferError::InvalidGlyph(code))?;
        let mut cell = [0u8; CELL_WIDTH];
        cell[..GLYPH_WIDTH].copy_from_slice(columns);
        self.write_run(&cell)
    }

    /// Render a byte string at the cursor.
    ///
    /// Rendering stops at the end of `text` or at the first NUL byte. On an
    /// error the characters already written stay in place. Returns the number
    /// of characters written.
    ///
    /// # Errors
    /// The first error returned by [`write_char`](Self::write_char).
    pub fn write_string(&mut self, text: &[u8]) -> Result<usize, FrameBufferError> {
        let mut written = 0;
        for &code in text.iter().take_while(|&&code| code != 0) {
            self.write_char(code)?;
            written += 1;
        }
        Ok(written)
    }

    /// Move the cursor to character cell `x` of chunk row `y`.
    ///
    /// # Errors
    /// [`FrameBufferError::OutOfRange`] if the cell starts off the panel.
    pub fn goto_char(&mut self, x: u16, y: u16) -> Result<(), FrameBufferError> {
        let col = x
            .checked_mul(CELL_WIDTH as u16)
            .ok_or(FrameBufferError::OutOfRange { x, y })?;
        self.goto_chunk(col, y)
            .map_err(|_| FrameBufferError::OutOfRange { x, y })
    }
}

impl core::fmt::Write for FrameBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_string(s.as_bytes())
            .map(|_| ())
            .map_err(|_| core::fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::fmt::Write;

    use super::*;
    use crate::dirty::{DirtyRange, SyncState};
    use crate::BUFFER_SIZE;

    fn synced() -> FrameBuffer {
        let mut fb = FrameBuffer::new();
        fb.clear();
        fb.range_sent();
        fb
    }

    #[test]
    fn test_write_char_writes_glyph_and_spacing() {
        let mut fb = synced();
        fb.goto_chunk(0, 0).unwrap();
        fb.write_char(b'A').unwrap();
        assert_eq!(&fb.as_bytes()[..7], &[0x7e, 0x11, 0x11, 0x11, 0x7e, 0x00, 0x00]);
        assert_eq!(fb.cursor(), 6);
    }

    #[test]
    fn test_write_string_cursor_and_range() {
        let text = b"Hello, 5110!";
        let mut fb = synced();
        fb.goto_chunk(0, 0).unwrap();
        assert_eq!(fb.write_string(text), Ok(text.len()));
        assert_eq!(fb.cursor(), 6 * text.len());
        assert_eq!(
            fb.sync_state(),
            SyncState::RangeDirty(DirtyRange::new(0, 6 * text.len()))
        );
    }

    #[test]
    fn test_write_string_runs_into_next_row() {
        let mut fb = synced();
        fb.goto_char(13, 0).unwrap();
        fb.write_string(b"AB").unwrap();
        // 14 cells are 84 columns, so 'B' starts row 1
        assert_eq!(fb.as_bytes()[84], 0x7f);
        assert_eq!(fb.cursor(), 90);
    }

    #[test]
    fn test_write_string_stops_at_nul() {
        let mut fb = synced();
        assert_eq!(fb.write_string(b"ab\0cd"), Ok(2));
        assert_eq!(fb.cursor(), 12);
    }

    #[test]
    fn test_invalid_glyph_is_rejected() {
        let mut fb = synced();
        fb.goto_chunk(0, 0).unwrap();
        assert_eq!(fb.write_char(b'\n'), Err(FrameBufferError::InvalidGlyph(b'\n')));
        assert_eq!(fb.write_char(0x80), Err(FrameBufferError::InvalidGlyph(0x80)));
        assert_eq!(fb.cursor(), 0);
        assert_eq!(fb.sync_state(), SyncState::Idle);
    }

    #[test]
    fn test_write_string_keeps_prefix_on_error() {
        let mut fb = synced();
        assert_eq!(
            fb.write_string(b"ok\tno"),
            Err(FrameBufferError::InvalidGlyph(b'\t'))
        );
        assert_eq!(fb.cursor(), 12);
        assert_eq!(fb.as_bytes()[12], 0);
    }

    #[test]
    fn test_char_without_room_is_dropped() {
        let mut fb = synced();
        // 5 chunks left in the last row
        fb.goto_chunk(79, 5).unwrap();
        let before = fb.clone();

        assert_eq!(fb.write_char(b'X'), Err(FrameBufferError::BufferFull));
        assert_eq!(fb.as_bytes(), before.as_bytes());
        assert_eq!(fb.dirty_range(), before.dirty_range());
        assert_eq!(fb.sync_state(), before.sync_state());
        assert_eq!(fb.cursor(), 499);
    }

    #[test]
    fn test_write_string_stops_when_full() {
        let mut fb = synced();
        fb.goto_chunk(72, 5).unwrap();
        // room for exactly two cells
        assert_eq!(fb.write_string(b"abc"), Err(FrameBufferError::BufferFull));
        assert_eq!(fb.cursor(), BUFFER_SIZE);
        assert_eq!(fb.dirty_range().end(), BUFFER_SIZE);
    }

    #[test]
    fn test_goto_char() {
        let mut fb = synced();
        fb.goto_char(2, 3).unwrap();
        assert_eq!(fb.cursor(), 12 + 3 * 84);
        // cell 13 starts at column 78, cell 14 would start off the panel
        fb.goto_char(13, 5).unwrap();
        assert_eq!(
            fb.goto_char(14, 0),
            Err(FrameBufferError::OutOfRange { x: 14, y: 0 })
        );
        assert_eq!(
            fb.goto_char(u16::MAX, 0),
            Err(FrameBufferError::OutOfRange { x: u16::MAX, y: 0 })
        );
        assert_eq!(
            fb.goto_char(0, 6),
            Err(FrameBufferError::OutOfRange { x: 0, y: 6 })
        );
    }

    #[test]
    fn test_fmt_write() {
        let mut fb = synced();
        write!(fb, "T={}", 21).unwrap();
        assert_eq!(fb.cursor(), 4 * 6);
        assert_eq!(&fb.as_bytes()[12..17], &[0x42, 0x61, 0x51, 0x49, 0x46]);
        assert!(write!(fb, "\u{e9}").is_err());
    }
}
