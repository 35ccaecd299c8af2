//! MCP4725 12-bit DAC with EEPROM
//!
//! # Write commands
//!
//! - Fast mode: 2 bytes, `0 0 PD1 PD0 D11..D8`, `D7..D0`; DAC register only
//! - Write DAC register: 3 bytes, `0x40 | PD << 1`, `D11..D4`, `D3..D0 << 4`
//! - Write DAC register and EEPROM: as above with `0x60`
//!
//! # Read
//!
//! A read returns 5 bytes: status/settings, the DAC register (2 bytes,
//! left-aligned) and the EEPROM contents (2 bytes, power-down bits on top).
//!
//! Reset and wake-up are I2C general calls (address 0) and reach every
//! device on the bus.

use embedded_hal::i2c::I2c;

/// General call address
pub const GENERAL_CALL: u8 = 0x00;

/// General call commands
pub mod general_call {
    /// Reload the DAC from EEPROM, as after power-on
    pub const RESET: u8 = 0x06;
    /// Clear the power-down bits
    pub const WAKE_UP: u8 = 0x09;
}

/// Command byte prefixes for the 3-byte writes
pub mod command {
    pub const WRITE_DAC: u8 = 0x40;
    pub const WRITE_DAC_AND_EEPROM: u8 = 0x60;
}

/// Largest DAC code
pub const MAX_VALUE: u16 = 0x0FFF;

/// 7-bit address, `0b1100 A2 A1 A0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address(u8);

impl Address {
    /// A0 tied low (A2 = A1 = 0 on the common parts)
    pub const LOW: Self = Self(0x60);
    /// A0 tied high
    pub const HIGH: Self = Self(0x61);

    /// Address from the three address bits (A2 and A1 are set at the factory)
    pub const fn from_pins(a2: bool, a1: bool, a0: bool) -> Self {
        Self(0x60 | (a2 as u8) << 2 | (a1 as u8) << 1 | a0 as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::LOW
    }
}

/// Output state; in the power-down modes VOUT is pulled to ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDown {
    #[default]
    Normal = 0b00,
    Resistor1k = 0b01,
    Resistor100k = 0b10,
    Resistor500k = 0b11,
}

impl PowerDown {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Normal,
            0b01 => Self::Resistor1k,
            0b10 => Self::Resistor100k,
            _ => Self::Resistor500k,
        }
    }
}

/// Which registers a write updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    /// DAC register, 2-byte frame
    #[default]
    Fast,
    /// DAC register, 3-byte frame
    WriteDac,
    /// DAC register and EEPROM; EEPROM busy for up to 50 ms afterwards
    WriteDacAndEeprom,
}

/// Decoded DAC register and status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacReading {
    /// EEPROM write finished
    pub ready: bool,
    /// Power-on reset flag
    pub power_on_reset: bool,
    pub power_down: PowerDown,
    pub value: u16,
}

/// Decoded EEPROM contents (the settings loaded at power-on)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromReading {
    pub power_down: PowerDown,
    pub value: u16,
}

const STATUS_READY: u8 = 1 << 7;
const STATUS_POR: u8 = 1 << 6;

/// Decode the DAC part of a 5-byte read
pub fn decode_dac(frame: &[u8; 5]) -> DacReading {
    DacReading {
        ready: frame[0] & STATUS_READY != 0,
        power_on_reset: frame[0] & STATUS_POR != 0,
        power_down: PowerDown::from_bits(frame[0] >> 1),
        value: (frame[1] as u16) << 4 | (frame[2] >> 4) as u16,
    }
}

/// Decode the EEPROM part of a 5-byte read
pub fn decode_eeprom(frame: &[u8; 5]) -> EepromReading {
    EepromReading {
        power_down: PowerDown::from_bits(frame[3] >> 5),
        value: ((frame[3] & 0x0F) as u16) << 8 | frame[4] as u16,
    }
}

/// MCP4725 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C transfer failed
    Bus(E),
    /// DAC code above 4095
    InvalidValue(u16),
}

/// MCP4725 driver
pub struct Mcp4725<I2C> {
    i2c: I2C,
    address: Address,
}

impl<I2C, E> Mcp4725<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    /// General-call reset: every MCP4725 on the bus reloads from EEPROM
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.i2c
            .write(GENERAL_CALL, &[general_call::RESET])
            .map_err(Error::Bus)
    }

    /// General-call wake-up: every MCP4725 on the bus leaves power-down
    pub fn wake_up(&mut self) -> Result<(), Error<E>> {
        self.i2c
            .write(GENERAL_CALL, &[general_call::WAKE_UP])
            .map_err(Error::Bus)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], Error<E>> {
        let mut frame = [0u8; 5];
        self.i2c
            .read(self.address.value(), &mut frame)
            .map_err(Error::Bus)?;
        Ok(frame)
    }

    /// Change the power-down state, keeping the current output code
    pub fn set_power_mode(&mut self, power_down: PowerDown) -> Result<(), Error<E>> {
        let current = self.dac_data()?;
        self.set_value(WriteMode::Fast, power_down, current.value)
    }

    /// Write a new output code
    pub fn set_value(
        &mut self,
        mode: WriteMode,
        power_down: PowerDown,
        value: u16,
    ) -> Result<(), Error<E>> {
        if value > MAX_VALUE {
            return Err(Error::InvalidValue(value));
        }

        let address = self.address.value();
        let pd = power_down as u8;
        let result = match mode {
            WriteMode::Fast => {
                let frame = [pd << 4 | (value >> 8) as u8, value as u8];
                self.i2c.write(address, &frame)
            }
            WriteMode::WriteDac | WriteMode::WriteDacAndEeprom => {
                let command = match mode {
                    WriteMode::WriteDacAndEeprom => command::WRITE_DAC_AND_EEPROM,
                    _ => command::WRITE_DAC,
                };
                let frame = [command | pd << 1, (value >> 4) as u8, (value << 4) as u8];
                self.i2c.write(address, &frame)
            }
        };
        result.map_err(Error::Bus)
    }

    pub fn dac_data(&mut self) -> Result<DacReading, Error<E>> {
        self.read_frame().map(|frame| decode_dac(&frame))
    }

    pub fn eeprom_data(&mut self) -> Result<EepromReading, Error<E>> {
        self.read_frame().map(|frame| decode_eeprom(&frame))
    }

    /// `true` once an EEPROM write has completed
    pub fn eeprom_status(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_frame()?[0] & STATUS_READY != 0)
    }
}
