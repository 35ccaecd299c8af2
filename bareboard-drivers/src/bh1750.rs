//! BH1750FVI ambient light sensor
//!
//! The sensor has no register map: every write is a one-byte instruction
//! and a read returns the last 16-bit result, MSB first. Sensitivity is
//! adjusted through the measurement time register (MTreg), written in two
//! instructions carrying its upper 3 and lower 5 bits.

use embedded_hal::i2c::I2c;

/// Slave address, selected by the ADDR pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Address {
    /// ADDR low
    #[default]
    Low = 0x23,
    /// ADDR high
    High = 0x5C,
}

/// Instruction opcodes
pub mod opcode {
    pub const POWER_DOWN: u8 = 0x00;
    pub const POWER_ON: u8 = 0x01;
    /// Clears the data register; ignored while powered down
    pub const RESET: u8 = 0x07;
    pub const MTREG_HIGH: u8 = 0x40;
    pub const MTREG_LOW: u8 = 0x60;
}

/// Measurement mode (the instruction that starts it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// 1 lx resolution, repeated
    ContinuousHighRes = 0x10,
    /// 0.5 lx resolution, repeated
    ContinuousHighRes2 = 0x11,
    /// 4 lx resolution, repeated
    ContinuousLowRes = 0x13,
    /// 1 lx resolution, powers down afterwards
    #[default]
    OneTimeHighRes = 0x20,
    OneTimeHighRes2 = 0x21,
    OneTimeLowRes = 0x23,
}

impl Mode {
    fn is_high_res2(self) -> bool {
        matches!(self, Mode::ContinuousHighRes2 | Mode::OneTimeHighRes2)
    }

    fn is_low_res(self) -> bool {
        matches!(self, Mode::ContinuousLowRes | Mode::OneTimeLowRes)
    }

    /// Maximum conversion time at the given MTreg value
    pub fn measurement_time_ms(self, mt: u8) -> u32 {
        let nominal = if self.is_low_res() { 24 } else { 180 };
        (nominal * mt as u32).div_ceil(DEFAULT_SENSITIVITY as u32)
    }
}

/// MTreg power-on value
pub const DEFAULT_SENSITIVITY: u8 = 69;
/// Smallest MTreg value
pub const MIN_SENSITIVITY: u8 = 31;
/// Largest MTreg value
pub const MAX_SENSITIVITY: u8 = 254;

/// Convert a raw result to lux
///
/// `lx = raw / 1.2 · 69 / MTreg`, halved in the high-resolution-2 modes.
pub fn raw_to_lux(raw: u16, mode: Mode, mt: u8) -> f32 {
    let mut lux = raw as f32 / 1.2 * (DEFAULT_SENSITIVITY as f32 / mt as f32);
    if mode.is_high_res2() {
        lux /= 2.0;
    }
    lux
}

/// BH1750 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C transfer failed
    Bus(E),
    /// MTreg outside 31..=254
    InvalidSensitivity(u8),
}

/// BH1750 driver
pub struct Bh1750<I2C> {
    i2c: I2C,
    address: Address,
}

impl<I2C, E> Bh1750<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn instruction(&mut self, opcode: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address as u8, &[opcode])
            .map_err(Error::Bus)
    }

    pub fn power_down(&mut self) -> Result<(), Error<E>> {
        self.instruction(opcode::POWER_DOWN)
    }

    pub fn power_on(&mut self) -> Result<(), Error<E>> {
        self.instruction(opcode::POWER_ON)
    }

    /// Clear the data register (the sensor must be powered on)
    pub fn reset_data_register(&mut self) -> Result<(), Error<E>> {
        self.instruction(opcode::RESET)
    }

    /// Start a measurement; the result is ready after
    /// [`Mode::measurement_time_ms`]
    pub fn trigger_measurement(&mut self, mode: Mode) -> Result<(), Error<E>> {
        self.instruction(mode as u8)
    }

    /// Write MTreg (31..=254, 69 at power-on)
    pub fn set_sensitivity(&mut self, mt: u8) -> Result<(), Error<E>> {
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&mt) {
            return Err(Error::InvalidSensitivity(mt));
        }
        self.instruction(opcode::MTREG_HIGH | (mt >> 5))?;
        self.instruction(opcode::MTREG_LOW | (mt & 0x1F))
    }

    /// Last result as the two bytes the sensor sent, MSB first
    pub fn read_raw_bytes(&mut self) -> Result<[u8; 2], Error<E>> {
        let mut bytes = [0u8; 2];
        self.i2c
            .read(self.address as u8, &mut bytes)
            .map_err(Error::Bus)?;
        Ok(bytes)
    }

    /// Last result as a count
    pub fn read_raw(&mut self) -> Result<u16, Error<E>> {
        self.read_raw_bytes().map(u16::from_be_bytes)
    }

    /// Last result in lux, for a measurement taken in `mode` with MTreg `mt`
    pub fn read_lux(&mut self, mode: Mode, mt: u8) -> Result<f32, Error<E>> {
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&mt) {
            return Err(Error::InvalidSensitivity(mt));
        }
        let raw = self.read_raw()?;
        Ok(raw_to_lux(raw, mode, mt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{I2cOp, MockI2c};

    #[test]
    fn test_instructions() {
        let mut sensor = Bh1750::new(MockI2c::new(), Address::Low);

        sensor.power_on().unwrap();
        sensor.reset_data_register().unwrap();
        sensor.trigger_measurement(Mode::OneTimeHighRes).unwrap();
        sensor.power_down().unwrap();

        let i2c = sensor.release();
        assert_eq!(i2c.written(), vec![vec![0x01], vec![0x07], vec![0x20], vec![0x00]]);
        assert!(i2c.ops.iter().all(|op| matches!(op, I2cOp::Write(0x23, _))));
    }

    #[test]
    fn test_set_sensitivity_split() {
        let mut sensor = Bh1750::new(MockI2c::new(), Address::High);

        sensor.set_sensitivity(DEFAULT_SENSITIVITY).unwrap();
        sensor.set_sensitivity(MAX_SENSITIVITY).unwrap();

        let i2c = sensor.release();
        // 69 = 0b010_00101, 254 = 0b111_11110
        assert_eq!(
            i2c.written(),
            vec![vec![0x42], vec![0x65], vec![0x47], vec![0x7E]]
        );
        assert!(matches!(i2c.ops[0], I2cOp::Write(0x5C, _)));
    }

    #[test]
    fn test_sensitivity_out_of_range() {
        let mut sensor = Bh1750::new(MockI2c::new(), Address::Low);
        assert_eq!(sensor.set_sensitivity(30), Err(Error::InvalidSensitivity(30)));
        assert_eq!(sensor.set_sensitivity(255), Err(Error::InvalidSensitivity(255)));
        assert!(sensor.release().ops.is_empty());
    }

    #[test]
    fn test_read_raw_msb_first() {
        let i2c = MockI2c::new().respond(&[0x83, 0x90]);
        let mut sensor = Bh1750::new(i2c, Address::Low);

        assert_eq!(sensor.read_raw(), Ok(0x8390));
        assert_eq!(sensor.release().ops, vec![I2cOp::Read(0x23, 2)]);
    }

    #[test]
    fn test_read_lux() {
        // Datasheet example: 0x8390 = 33680 counts = 28067 lx
        let i2c = MockI2c::new().respond(&[0x83, 0x90]).respond(&[0x83, 0x90]);
        let mut sensor = Bh1750::new(i2c, Address::Low);

        let lux = sensor.read_lux(Mode::OneTimeHighRes, 69).unwrap();
        assert!((lux - 28066.67).abs() < 0.1);

        let lux = sensor.read_lux(Mode::ContinuousHighRes2, 69).unwrap();
        assert!((lux - 14033.33).abs() < 0.1);
    }

    #[test]
    fn test_lux_scales_with_sensitivity() {
        let at_default = raw_to_lux(1200, Mode::OneTimeHighRes, 69);
        let at_double = raw_to_lux(1200, Mode::OneTimeHighRes, 138);
        assert!((at_default - 1000.0).abs() < 1e-3);
        assert!((at_double - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_measurement_time() {
        assert_eq!(Mode::OneTimeHighRes.measurement_time_ms(69), 180);
        assert_eq!(Mode::OneTimeLowRes.measurement_time_ms(69), 24);
        assert_eq!(Mode::ContinuousHighRes.measurement_time_ms(254), 663);
    }

    #[test]
    fn test_bus_error() {
        let mut sensor = Bh1750::new(MockI2c::failing(), Address::Low);
        assert!(matches!(sensor.trigger_measurement(Mode::OneTimeLowRes), Err(Error::Bus(_))));
    }
}
