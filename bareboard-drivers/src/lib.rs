//! Peripheral drivers
//!
//! Register-level drivers for the sensors and converters the Bareboard
//! firmwares talk to:
//!
//! - [`hts221`] - Humidity/temperature sensor (I2C)
//! - [`sx1272`] - SX1272/73 LoRa transceiver configuration (SPI)
//! - [`bh1750`] - Ambient light sensor (I2C)
//! - [`mcp4725`] - 12-bit DAC with EEPROM (I2C)
//!
//! Each driver owns its bus handle and nothing else. Every operation is one
//! bus transfer or one read-modify-write of a single register, and returns
//! `Result<_, Error<E>>` with the bus error wrapped in `Error::Bus`.
//! Argument validation happens before the bus is touched.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bh1750;
pub mod hts221;
pub mod mcp4725;
pub mod sx1272;

#[cfg(test)]
mod mock;
