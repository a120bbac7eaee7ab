//! Power-up settings for the controller.

use crate::command::{DisplayMode, MAX_BIAS, MAX_CONTRAST, MAX_TEMPERATURE_COEFFICIENT};

/// Settings applied by [`Pcd8544::init`](crate::display::Pcd8544::init).
///
/// Values above the controller's limits are clamped when set, never rejected.
///
/// # Example
/// ```rust
/// use pcd8544_framebuffer::config::Config;
/// use pcd8544_framebuffer::command::DisplayMode;
///
/// let config = Config::default()
///     .with_contrast(200)
///     .with_mode(DisplayMode::Inverted);
/// assert_eq!(config.contrast(), 127);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    contrast: u8,
    bias: u8,
    temperature_coefficient: u8,
    mode: DisplayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Mid contrast, bias 3 (1:48 mux), no temperature compensation, normal mode.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            contrast: 0x40,
            bias: 0x03,
            temperature_coefficient: 0,
            mode: DisplayMode::Normal,
        }
    }

    /// Set Vop, clamped to `0..=127`.
    #[must_use]
    pub const fn with_contrast(mut self, contrast: u8) -> Self {
        self.contrast = if contrast > MAX_CONTRAST {
            MAX_CONTRAST
        } else {
            contrast
        };
        self
    }

    /// Set the bias system, clamped to `0..=7`.
    #[must_use]
    pub const fn with_bias(mut self, bias: u8) -> Self {
        self.bias = if bias > MAX_BIAS { MAX_BIAS } else { bias };
        self
    }

    /// Set the temperature coefficient, clamped to `0..=3`.
    #[must_use]
    pub const fn with_temperature_coefficient(mut self, tc: u8) -> Self {
        self.temperature_coefficient = if tc > MAX_TEMPERATURE_COEFFICIENT {
            MAX_TEMPERATURE_COEFFICIENT
        } else {
            tc
        };
        self
    }

    /// Set the display mode selected after power-up.
    #[must_use]
    pub const fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Vop value.
    #[must_use]
    pub const fn contrast(&self) -> u8 {
        self.contrast
    }

    /// Bias system value.
    #[must_use]
    pub const fn bias(&self) -> u8 {
        self.bias
    }

    /// Temperature coefficient.
    #[must_use]
    pub const fn temperature_coefficient(&self) -> u8 {
        self.temperature_coefficient
    }

    /// Display mode.
    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        self.mode
    }
}
