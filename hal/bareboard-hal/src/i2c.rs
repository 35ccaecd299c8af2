//! I2C bus configuration
//!
//! Bus transfers go through `embedded_hal::i2c::I2c`; this module only
//! carries the settings a chip HAL needs to bring its I2C master up.

/// I2C master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// SCL pin number
    pub scl_pin: u8,
    /// SDA pin number
    pub sda_pin: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz), nRF51-DK Arduino header pins
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        scl_pin: 7,
        sda_pin: 30,
    };

    /// Fast mode (400 kHz), same pins
    pub const FAST: Self = Self {
        frequency: 400_000,
        ..Self::STANDARD
    };

    /// Same settings on different pins
    pub const fn with_pins(self, scl_pin: u8, sda_pin: u8) -> Self {
        Self {
            scl_pin,
            sda_pin,
            ..self
        }
    }
}
