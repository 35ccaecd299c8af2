//! TWI0: legacy I2C master behind `embedded_hal::i2c::I2c`
//!
//! Transfers are byte-by-byte: each transmitted byte waits for `TXDSENT`,
//! each received byte for `RXDREADY`. Reads use the byte-boundary shortcuts,
//! `BB_SUSPEND` between bytes and `BB_STOP` on the final one, so the master
//! NACKs the last byte and issues STOP by itself. Every wait is bounded and
//! checks `EVENTS_ERROR`.
//!
//! Within one transaction, adjacent operations of the same direction form a
//! single transfer: only a change of direction issues a new `STARTTX` or
//! `STARTRX` (a repeated START).

use bareboard_hal::{spin_until, Backoff, I2cConfig, Spin, StaticRef};
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, trigger, Error, EventRegister, TaskRegister, DEFAULT_SPIN_BUDGET};

register_structs! {
    pub TwiRegisters {
        (0x000 => pub tasks_startrx: TaskRegister),
        (0x004 => _reserved0),
        (0x008 => pub tasks_starttx: TaskRegister),
        (0x00C => _reserved1),
        (0x014 => pub tasks_stop: TaskRegister),
        (0x018 => _reserved2),
        (0x01C => pub tasks_suspend: TaskRegister),
        (0x020 => pub tasks_resume: TaskRegister),
        (0x024 => _reserved3),
        (0x104 => pub events_stopped: EventRegister),
        (0x108 => pub events_rxdready: EventRegister),
        (0x10C => _reserved4),
        (0x11C => pub events_txdsent: EventRegister),
        (0x120 => _reserved5),
        (0x124 => pub events_error: EventRegister),
        (0x128 => _reserved6),
        (0x138 => pub events_bb: EventRegister),
        (0x13C => _reserved7),
        (0x148 => pub events_suspended: EventRegister),
        (0x14C => _reserved8),
        (0x200 => pub shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved9),
        (0x304 => pub intenset: ReadWrite<u32>),
        (0x308 => pub intenclr: ReadWrite<u32>),
        (0x30C => _reserved10),
        (0x4C4 => pub errorsrc: ReadWrite<u32, ErrorSrc::Register>),
        (0x4C8 => _reserved11),
        (0x500 => pub enable: ReadWrite<u32, Enable::Register>),
        (0x504 => _reserved12),
        (0x508 => pub pselscl: ReadWrite<u32>),
        (0x50C => pub pselsda: ReadWrite<u32>),
        (0x510 => _reserved13),
        (0x518 => pub rxd: ReadOnly<u32>),
        (0x51C => pub txd: ReadWrite<u32>),
        (0x520 => _reserved14),
        (0x524 => pub frequency: ReadWrite<u32>),
        (0x528 => _reserved15),
        (0x588 => pub address: ReadWrite<u32>),
        (0x58C => @END),
    }
}

register_bitfields![u32,
    Shorts [
        BB_SUSPEND OFFSET(0) NUMBITS(1) [],
        BB_STOP OFFSET(1) NUMBITS(1) []
    ],
    /// Write 1 to clear
    ErrorSrc [
        OVERRUN OFFSET(0) NUMBITS(1) [],
        ANACK OFFSET(1) NUMBITS(1) [],
        DNACK OFFSET(2) NUMBITS(1) []
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(3) [
            Disabled = 0,
            Enabled = 5
        ]
    ]
];

#[allow(unsafe_code)]
pub const TWI0: StaticRef<TwiRegisters> =
    unsafe { StaticRef::new(0x4000_3000 as *const TwiRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for TwiRegisters {}

/// `FREQUENCY` register value for a bus clock
pub fn frequency_register(hz: u32) -> Result<u32, Error> {
    match hz {
        100_000 => Ok(0x0198_0000),
        250_000 => Ok(0x0400_0000),
        400_000 => Ok(0x0668_0000),
        other => Err(Error::UnsupportedFrequency(other)),
    }
}

/// Route SCL/SDA, set the clock and enable the TWI
///
/// The pins must already be configured as inputs (the TWI drives them
/// open-drain itself).
pub fn configure(twi: &TwiRegisters, config: &I2cConfig) -> Result<(), Error> {
    let frequency = frequency_register(config.frequency)?;

    twi.enable.write(Enable::ENABLE::Disabled);
    twi.pselscl.set(config.scl_pin as u32);
    twi.pselsda.set(config.sda_pin as u32);
    twi.frequency.set(frequency);
    twi.enable.write(Enable::ENABLE::Enabled);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Tx,
    Rx,
}

/// Blocking TWI master
pub struct Twi<'a, B = Spin> {
    regs: &'a TwiRegisters,
    budget: u32,
    backoff: B,
}

impl<'a> Twi<'a> {
    /// Wrap a configured TWI with the default spin budget
    pub fn new(regs: &'a TwiRegisters) -> Self {
        Self::with_backoff(regs, DEFAULT_SPIN_BUDGET, Spin)
    }
}

impl<'a, B: Backoff> Twi<'a, B> {
    /// Wrap a configured TWI; each event wait checks at most `budget` times
    pub fn with_backoff(regs: &'a TwiRegisters, budget: u32, backoff: B) -> Self {
        Self {
            regs,
            budget,
            backoff,
        }
    }

    fn wait_for(&mut self, event: &EventRegister) -> Result<(), Error> {
        let regs = self.regs;
        spin_until(self.budget, &mut self.backoff, || {
            event.get() != 0 || regs.events_error.get() != 0
        })?;

        if event.get() != 0 {
            clear(event);
            Ok(())
        } else {
            Err(self.bus_error())
        }
    }

    /// Read and clear `ERRORSRC`, stop the bus
    fn bus_error(&mut self) -> Error {
        let regs = self.regs;
        let source = regs.errorsrc.extract();
        regs.errorsrc.set(source.get());
        clear(&regs.events_error);
        regs.shorts.set(0);
        trigger(&regs.tasks_stop);

        if source.is_set(ErrorSrc::ANACK) {
            Error::AddressNack
        } else if source.is_set(ErrorSrc::DNACK) {
            Error::DataNack
        } else if source.is_set(ErrorSrc::OVERRUN) {
            Error::Overrun
        } else {
            Error::Timeout
        }
    }

    /// Transmit `bytes`, starting a new transfer only when `start` is set
    fn write_bytes(&mut self, bytes: &[u8], start: bool) -> Result<(), Error> {
        let regs = self.regs;
        if start {
            regs.shorts.set(0);
            trigger(&regs.tasks_starttx);
        }
        for &byte in bytes {
            regs.txd.set(byte as u32);
            self.wait_for(&regs.events_txdsent)?;
        }
        Ok(())
    }

    /// Receive into `buffer`; without `start` the previous read, suspended
    /// after its last byte, is resumed instead
    fn read_bytes(&mut self, buffer: &mut [u8], start: bool, last: bool) -> Result<(), Error> {
        let regs = self.regs;
        let len = buffer.len();
        let shortcut = |index: usize| {
            if last && index + 1 == len {
                Shorts::BB_STOP::SET
            } else {
                Shorts::BB_SUSPEND::SET
            }
        };

        for (index, slot) in buffer.iter_mut().enumerate() {
            regs.shorts.write(shortcut(index));
            if start && index == 0 {
                trigger(&regs.tasks_startrx);
            } else {
                trigger(&regs.tasks_resume);
            }
            self.wait_for(&regs.events_rxdready)?;
            *slot = regs.rxd.get() as u8;
        }
        Ok(())
    }

    fn stop(&mut self, already_requested: bool) -> Result<(), Error> {
        let regs = self.regs;
        if !already_requested {
            trigger(&regs.tasks_stop);
        }
        let stopped = self.wait_for(&regs.events_stopped);
        regs.shorts.set(0);
        stopped
    }
}

impl<B: Backoff> ErrorType for Twi<'_, B> {
    type Error = Error;
}

impl<B: Backoff> I2c for Twi<'_, B> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.regs.address.set(address as u32);
        clear(&self.regs.events_error);

        let count = operations.len();
        let mut previous = None;
        let mut stop_requested = false;
        for (index, operation) in operations.iter_mut().enumerate() {
            let last = index + 1 == count;
            match operation {
                Operation::Write(bytes) => {
                    self.write_bytes(bytes, previous != Some(Direction::Tx))?;
                    previous = Some(Direction::Tx);
                }
                Operation::Read(buffer) if buffer.is_empty() => {}
                Operation::Read(buffer) => {
                    self.read_bytes(buffer, previous != Some(Direction::Rx), last)?;
                    previous = Some(Direction::Rx);
                    stop_requested = last;
                }
            }
        }

        self.stop(stop_requested)
    }
}
