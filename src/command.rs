//! PCD8544 instruction bytes.
//!
//! The controller has a basic and an extended instruction set, selected by
//! the `H` bit of the function-set instruction. Addressing and display
//! control live in the basic set, while Vop (contrast), bias and temperature
//! coefficient need the extended set.

use bitfield::bitfield;

/// Largest Vop (contrast) value.
pub const MAX_CONTRAST: u8 = 0x7f;

/// Largest bias system value.
pub const MAX_BIAS: u8 = 0x07;

/// Largest temperature coefficient.
pub const MAX_TEMPERATURE_COEFFICIENT: u8 = 0x03;

bitfield! {
    /// Function set instruction, valid in both instruction sets.
    ///
    /// The bit layout is as follows:
    /// - Bit 5: Instruction marker (always set)
    /// - Bit 2: Power down
    /// - Bit 1: Vertical addressing
    /// - Bit 0: Extended instruction set
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct FunctionSet(u8);
    impl Debug;
    marker, set_marker: 5;
    pub power_down, set_power_down: 2;
    pub vertical, set_vertical: 1;
    pub extended, set_extended: 0;
}

impl FunctionSet {
    /// Horizontal addressing, powered up, basic instruction set.
    #[must_use]
    pub fn new() -> Self {
        let mut word = Self(0);
        word.set_marker(true);
        word
    }

    /// Same word with the extended instruction set selected.
    #[must_use]
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.set_extended(extended);
        self
    }

    /// Same word with power down requested.
    #[must_use]
    pub fn with_power_down(mut self, power_down: bool) -> Self {
        self.set_power_down(power_down);
        self
    }

    /// The instruction byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl Default for FunctionSet {
    fn default() -> Self {
        Self::new()
    }
}

bitfield! {
    /// Display control instruction (basic instruction set).
    ///
    /// The bit layout is as follows:
    /// - Bit 3: Instruction marker (always set)
    /// - Bit 2: D
    /// - Bit 0: E
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    struct DisplayControl(u8);
    impl Debug;
    marker, set_marker: 3;
    d, set_d: 2;
    e, set_e: 0;
}

/// How the controller maps display RAM to the glass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    /// All segments off
    Blank,
    /// RAM bit set means dark pixel
    #[default]
    Normal,
    /// All segments on
    AllOn,
    /// RAM bit set means light pixel
    Inverted,
}

impl DisplayMode {
    /// The display control instruction selecting this mode.
    #[must_use]
    pub fn command(self) -> u8 {
        let (d, e) = match self {
            DisplayMode::Blank => (false, false),
            DisplayMode::Normal => (true, false),
            DisplayMode::AllOn => (false, true),
            DisplayMode::Inverted => (true, true),
        };
        let mut word = DisplayControl(0);
        word.set_marker(true);
        word.set_d(d);
        word.set_e(e);
        word.0
    }
}

/// Set the X (column) address, `x` in `0..84`.
#[must_use]
pub const fn set_x_address(x: u8) -> u8 {
    0x80 | (x & 0x7f)
}

/// Set the Y (bank / chunk row) address, `y` in `0..6`.
#[must_use]
pub const fn set_y_address(y: u8) -> u8 {
    0x40 | (y & 0x07)
}

/// Set Vop (extended instruction set). Values above [`MAX_CONTRAST`] are clamped.
#[must_use]
pub const fn set_vop(contrast: u8) -> u8 {
    let contrast = if contrast > MAX_CONTRAST {
        MAX_CONTRAST
    } else {
        contrast
    };
    0x80 | contrast
}

/// Bias system (extended instruction set). Values above [`MAX_BIAS`] are clamped.
#[must_use]
pub const fn set_bias(bias: u8) -> u8 {
    let bias = if bias > MAX_BIAS { MAX_BIAS } else { bias };
    0x10 | bias
}

/// Temperature coefficient (extended instruction set), clamped to
/// [`MAX_TEMPERATURE_COEFFICIENT`].
#[must_use]
pub const fn set_temperature_coefficient(tc: u8) -> u8 {
    let tc = if tc > MAX_TEMPERATURE_COEFFICIENT {
        MAX_TEMPERATURE_COEFFICIENT
    } else {
        tc
    };
    0x04 | tc
}
