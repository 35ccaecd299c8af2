//! Bus doubles for driver tests

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::i2c::{self, I2c};
use embedded_hal::spi::{self, SpiDevice};

/// One I2C operation as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cOp {
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

/// Scripted I2C bus
///
/// Logs every operation; reads are answered from a queue of responses.
#[derive(Debug, Default)]
pub struct MockI2c {
    pub ops: Vec<I2cOp>,
    responses: VecDeque<Vec<u8>>,
    fail: bool,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the bytes returned by the next read
    pub fn respond(mut self, bytes: &[u8]) -> Self {
        self.responses.push_back(bytes.to_vec());
        self
    }

    /// Make every transaction NACK
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Bytes of every write, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                I2cOp::Write(_, bytes) => Some(bytes.clone()),
                I2cOp::Read(..) => None,
            })
            .collect()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address,
            ));
        }

        for operation in operations {
            match operation {
                i2c::Operation::Write(bytes) => {
                    self.ops.push(I2cOp::Write(address, bytes.to_vec()));
                }
                i2c::Operation::Read(buffer) => {
                    self.ops.push(I2cOp::Read(address, buffer.len()));
                    let response = self.responses.pop_front().unwrap_or_default();
                    for (slot, byte) in buffer.iter_mut().zip(response) {
                        *slot = byte;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Register-file SPI device with address auto-increment
///
/// The first byte of a chip-select frame is the address: bit 7 set writes the
/// following bytes, clear reads into the following read buffers.
#[derive(Debug)]
pub struct MockSpi {
    pub registers: [u8; 128],
    /// Bytes written in each frame, in order
    pub frames: Vec<Vec<u8>>,
    fail: bool,
}

impl Default for MockSpi {
    fn default() -> Self {
        Self {
            registers: [0; 128],
            frames: Vec::new(),
            fail: false,
        }
    }
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, addr: u8, value: u8) -> Self {
        self.registers[addr as usize] = value;
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Frames that wrote data (address byte with bit 7 set)
    pub fn write_frames(&self) -> Vec<Vec<u8>> {
        self.frames
            .iter()
            .filter(|frame| frame.first().is_some_and(|a| a & 0x80 != 0))
            .cloned()
            .collect()
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [spi::Operation<'_, u8>]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(spi::ErrorKind::Other);
        }

        let mut frame = Vec::new();
        let mut cursor: Option<(u8, bool)> = None;

        for operation in operations {
            match operation {
                spi::Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        frame.push(byte);
                        match cursor {
                            None => cursor = Some((byte & 0x7F, byte & 0x80 != 0)),
                            Some((addr, true)) => {
                                self.registers[addr as usize] = byte;
                                cursor = Some(((addr + 1) & 0x7F, true));
                            }
                            Some((addr, false)) => cursor = Some(((addr + 1) & 0x7F, false)),
                        }
                    }
                }
                spi::Operation::Read(buffer) => {
                    for slot in buffer.iter_mut() {
                        if let Some((addr, write)) = cursor {
                            *slot = self.registers[addr as usize];
                            cursor = Some(((addr + 1) & 0x7F, write));
                        }
                    }
                }
                _ => return Err(spi::ErrorKind::Other),
            }
        }

        self.frames.push(frame);
        Ok(())
    }
}
