//! Display driver: owns the framebuffer and keeps the panel in sync with it.
//!
//! Drawing only ever touches the in-memory [`FrameBuffer`]. [`Pcd8544::flush`]
//! then moves the controller's address pointer to the first dirty chunk and
//! streams the dirty range in a single data burst. The controller advances
//! its address horizontally and wraps into the next bank on its own, so one
//! burst covers a range that spans several chunk rows.
//!
//! # Example
//! ```rust
//! use core::convert::Infallible;
//! use pcd8544_framebuffer::display::Pcd8544;
//! use pcd8544_framebuffer::interface::DisplayInterface;
//!
//! # struct NullInterface;
//! # impl DisplayInterface for NullInterface {
//! #     type Error = Infallible;
//! #     fn send_command(&mut self, _command: u8) -> Result<(), Infallible> { Ok(()) }
//! #     fn send_data(&mut self, _data: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! # }
//! let mut display = Pcd8544::new(NullInterface);
//! display.init_with_contrast(60).unwrap();
//!
//! display.goto_char(0, 0).unwrap();
//! display.write_string(b"Hello").unwrap();
//! display.flush().unwrap();
//! ```

use crate::command::{self, DisplayMode, FunctionSet};
use crate::config::Config;
use crate::dirty::{DirtyRange, SyncState};
use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::image::Placement;
use crate::interface::DisplayInterface;
use crate::{BUFFER_SIZE, COLS};

type DisplayResult<T, E> = core::result::Result<T, Error<E>>;

/// PCD8544 driver over an injected [`DisplayInterface`].
#[derive(Debug)]
pub struct Pcd8544<DI> {
    interface: DI,
    framebuffer: FrameBuffer,
}

impl<DI: DisplayInterface> Pcd8544<DI> {
    /// Create a driver with a blank, fully dirty framebuffer.
    ///
    /// Nothing is sent until [`init`](Self::init) or [`flush`](Self::flush).
    pub fn new(interface: DI) -> Self {
        Self {
            interface,
            framebuffer: FrameBuffer::new(),
        }
    }

    /// Configure the controller, clear the framebuffer and push it out.
    ///
    /// The panel must already be out of reset.
    ///
    /// # Errors
    /// [`Error::Transport`] if any command or the first flush fails.
    pub fn init(&mut self, config: Config) -> DisplayResult<(), DI::Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("pcd8544: init {}", config);

        let extended = FunctionSet::new().with_extended(true);
        self.command(extended.bits())?;
        self.command(command::set_vop(config.contrast()))?;
        self.command(command::set_temperature_coefficient(
            config.temperature_coefficient(),
        ))?;
        self.command(command::set_bias(config.bias()))?;
        self.command(FunctionSet::new().bits())?;
        self.command(config.mode().command())?;
        self.command(command::set_x_address(0))?;
        self.command(command::set_y_address(0))?;

        self.framebuffer.clear();
        self.flush()
    }

    /// [`init`](Self::init) with default settings and the given contrast
    /// (clamped to `0..=127`).
    ///
    /// # Errors
    /// See [`init`](Self::init).
    pub fn init_with_contrast(&mut self, contrast: u8) -> DisplayResult<(), DI::Error> {
        self.init(Config::new().with_contrast(contrast))
    }

    /// Send whatever changed since the last flush.
    ///
    /// - Idle: nothing is sent.
    /// - Range pending: Set-X and Set-Y for the range start, then one data
    ///   burst. The range then collapses to zero length at its end, and the
    ///   cursor moves there (wrapping to chunk 0 after the last chunk).
    /// - Area or range-and-area pending: there is no strategy for these yet,
    ///   so [`Error::UnsupportedSync`] is returned and nothing changes.
    ///
    /// # Errors
    /// [`Error::Transport`] leaves the dirty state untouched, so calling
    /// `flush` again resends the same range.
    pub fn flush(&mut self) -> DisplayResult<(), DI::Error> {
        match self.framebuffer.sync_state() {
            SyncState::Idle => Ok(()),
            SyncState::RangeDirty(range) => self.send_range(range),
            state => Err(Error::UnsupportedSync(state.kind())),
        }
    }

    fn send_range(&mut self, range: DirtyRange) -> DisplayResult<(), DI::Error> {
        if !range.is_empty() {
            let start = range.start() % BUFFER_SIZE;
            let (x, y) = (start % COLS, start / COLS);

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "pcd8544: flush {}..{} from ({}, {})",
                range.start(),
                range.end(),
                x,
                y
            );

            self.command(command::set_x_address(x as u8))?;
            self.command(command::set_y_address(y as u8))?;
            let data = &self.framebuffer.as_bytes()[range.as_range()];
            self.interface.send_data(data).map_err(Error::Transport)?;
        }
        self.framebuffer.range_sent();
        Ok(())
    }

    /// Change Vop at runtime, clamped to `0..=127`.
    ///
    /// # Errors
    /// [`Error::Transport`] if a command fails.
    pub fn set_contrast(&mut self, contrast: u8) -> DisplayResult<(), DI::Error> {
        self.command(FunctionSet::new().with_extended(true).bits())?;
        self.command(command::set_vop(contrast))?;
        self.command(FunctionSet::new().bits())
    }

    /// Select blank, normal, all-on or inverted output.
    ///
    /// # Errors
    /// [`Error::Transport`] if the command fails.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> DisplayResult<(), DI::Error> {
        self.command(mode.command())
    }

    /// Enter power-down. Display RAM is kept.
    ///
    /// # Errors
    /// [`Error::Transport`] if the command fails.
    pub fn sleep(&mut self) -> DisplayResult<(), DI::Error> {
        self.command(FunctionSet::new().with_power_down(true).bits())
    }

    /// Leave power-down.
    ///
    /// # Errors
    /// [`Error::Transport`] if the command fails.
    pub fn wake(&mut self) -> DisplayResult<(), DI::Error> {
        self.command(FunctionSet::new().bits())
    }

    fn command(&mut self, command: u8) -> DisplayResult<(), DI::Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("pcd8544: command {=u8:#04x}", command);

        self.interface
            .send_command(command)
            .map_err(Error::Transport)
    }

    /// Clear the framebuffer. See [`FrameBuffer::clear`].
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// See [`FrameBuffer::goto_chunk`].
    ///
    /// # Errors
    /// [`Error::FrameBuffer`] for coordinates off the panel.
    pub fn goto_chunk(&mut self, x: u16, y: u16) -> DisplayResult<(), DI::Error> {
        Ok(self.framebuffer.goto_chunk(x, y)?)
    }

    /// See [`FrameBuffer::goto_char`].
    ///
    /// # Errors
    /// [`Error::FrameBuffer`] for cells off the panel.
    pub fn goto_char(&mut self, x: u16, y: u16) -> DisplayResult<(), DI::Error> {
        Ok(self.framebuffer.goto_char(x, y)?)
    }

    /// See [`FrameBuffer::write_char`].
    ///
    /// # Errors
    /// [`Error::FrameBuffer`] for unknown glyphs or a full buffer.
    pub fn write_char(&mut self, code: u8) -> DisplayResult<(), DI::Error> {
        Ok(self.framebuffer.write_char(code)?)
    }

    /// See [`FrameBuffer::write_string`].
    ///
    /// # Errors
    /// [`Error::FrameBuffer`] for the first character that could not be written.
    pub fn write_string(&mut self, text: &[u8]) -> DisplayResult<usize, DI::Error> {
        Ok(self.framebuffer.write_string(text)?)
    }

    /// See [`FrameBuffer::blit_full_buffer`].
    pub fn blit_full_buffer(&mut self, image: &[u8; BUFFER_SIZE]) {
        self.framebuffer.blit_full_buffer(image);
    }

    /// See [`FrameBuffer::draw_image`].
    ///
    /// # Errors
    /// [`Error::Decode`] if the compressed image is malformed.
    pub fn draw_image(
        &mut self,
        data: &[u8],
        x: usize,
        y: usize,
    ) -> DisplayResult<Placement, DI::Error> {
        Ok(self.framebuffer.draw_image(data, x, y)?)
    }

    /// The framebuffer.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// The framebuffer, for drawing with `embedded-graphics` or direct access.
    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.framebuffer
    }

    /// Give the interface back.
    pub fn release(self) -> DI {
        self.interface
    }
}
