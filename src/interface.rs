//! Byte transport between the framebuffer and the controller.
//!
//! The PCD8544 takes a serial stream in which a separate D/C line tells
//! commands from display data. [`DisplayInterface`] hides how that happens:
//! both calls block until the bytes are out, and any bounded retrying is the
//! implementation's business. A failure must be returned, never swallowed.
//!
//! [`SpiInterface`] is the usual implementation on top of `embedded-hal`
//! 1.0: an [`SpiDevice`] (which owns chip select) plus a D/C [`OutputPin`].
//! Reset and power-up sequencing stay with the board code.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// Transport used by [`Pcd8544`](crate::display::Pcd8544).
pub trait DisplayInterface {
    /// Error returned when a transfer fails.
    type Error;

    /// Send one instruction byte.
    ///
    /// # Errors
    /// Returns the transport error if the byte could not be sent.
    fn send_command(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Send a burst of display data bytes.
    ///
    /// # Errors
    /// Returns the transport error if the burst could not be sent.
    fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: DisplayInterface + ?Sized> DisplayInterface for &mut T {
    type Error = T::Error;

    fn send_command(&mut self, command: u8) -> Result<(), Self::Error> {
        (**self).send_command(command)
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).send_data(data)
    }
}

/// Errors from [`SpiInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceError<SpiE, PinE> {
    /// The SPI transfer failed.
    #[error("SPI transfer failed")]
    Spi(SpiE),
    /// Driving the D/C line failed.
    #[error("D/C pin error")]
    Pin(PinE),
}

/// SPI transport with a data/command select line.
#[derive(Debug)]
pub struct SpiInterface<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> SpiInterface<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// Wrap an SPI device and the D/C pin.
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Give the SPI device and pin back.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<SPI, DC> DisplayInterface for SpiInterface<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    type Error = InterfaceError<SPI::Error, DC::Error>;

    fn send_command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(InterfaceError::Pin)?;
        self.spi.write(&[command]).map_err(InterfaceError::Spi)
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(InterfaceError::Pin)?;
        self.spi.write(data).map_err(InterfaceError::Spi)
    }
}
