//! nRF51/nRF52 peripheral configuration
//!
//! Register maps and the one-shot configuration routines the Bareboard
//! firmwares call at start-up: clocks, GPIO/GPIOTE, RTC, PPI, ADC, TEMP,
//! TIMER, UART and the TWI (I2C) master.
//!
//! Each peripheral is a `tock-registers` struct, and every routine takes the
//! block it programs. [`Peripherals::memory_mapped`] hands out the real
//! instances; host tests build the same set in RAM (`mock::RamPeripherals`).
//!
//! Where the two chips differ (the SAR `ADC` exists on nRF51 only, `RTC2` on
//! nRF52 only, channel counts) the module docs and [`Chip`] say so.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

use tock_registers::interfaces::Writeable;
use tock_registers::register_bitfields;
use tock_registers::registers::{ReadWrite, WriteOnly};

pub mod adc;
pub mod clock;
pub mod gpio;
pub mod gpiote;
pub mod power;
pub mod ppi;
pub mod rtc;
pub mod temp;
pub mod timer;
pub mod twi;
pub mod uart;

#[cfg(any(test, feature = "std"))]
pub mod mock;

mod error;

pub use error::Error;

/// Default number of status checks a bounded wait may spend
///
/// Roughly a few milliseconds at 16 MHz, far more than any clock start-up or
/// byte transfer at 100 kHz takes.
pub const DEFAULT_SPIN_BUDGET: u32 = 100_000;

register_bitfields![u32,
    /// `TASKS_*`
    pub Task [
        TRIGGER OFFSET(0) NUMBITS(1) []
    ],
    /// `EVENTS_*`
    pub Event [
        GENERATED OFFSET(0) NUMBITS(1) []
    ]
];

/// Task register: writing 1 starts the task
pub type TaskRegister = WriteOnly<u32, Task::Register>;

/// Event register: set by the peripheral, cleared by writing 0
pub type EventRegister = ReadWrite<u32, Event::Register>;

pub(crate) fn trigger(task: &TaskRegister) {
    task.write(Task::TRIGGER::SET);
}

pub(crate) fn clear(event: &EventRegister) {
    event.write(Event::GENERATED::CLEAR);
}

/// Bus address of a register, the form PPI endpoints take
pub fn endpoint<T>(register: &T) -> u32 {
    register as *const T as usize as u32
}

/// Which nRF5x the firmware runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Chip {
    Nrf51,
    Nrf52,
}

impl Chip {
    /// Programmable PPI channels
    pub const fn ppi_channels(self) -> u8 {
        match self {
            Chip::Nrf51 => 16,
            Chip::Nrf52 => 20,
        }
    }

    /// GPIOTE channels
    pub const fn gpiote_channels(self) -> u8 {
        match self {
            Chip::Nrf51 => 4,
            Chip::Nrf52 => 8,
        }
    }

    /// Whether PPI channels have a second task endpoint (`FORK.TEP`)
    pub const fn has_ppi_fork(self) -> bool {
        matches!(self, Chip::Nrf52)
    }
}

/// The register blocks the firmwares program
#[derive(Clone, Copy)]
pub struct Peripherals<'a> {
    pub clock: &'a clock::ClockRegisters,
    pub power: &'a power::PowerRegisters,
    pub gpio: &'a gpio::GpioRegisters,
    pub gpiote: &'a gpiote::GpioteRegisters,
    pub ppi: &'a ppi::PpiRegisters,
    pub rtc0: &'a rtc::RtcRegisters,
    pub rtc1: &'a rtc::RtcRegisters,
    /// nRF52 only
    pub rtc2: &'a rtc::RtcRegisters,
    pub timer0: &'a timer::TimerRegisters,
    pub timer1: &'a timer::TimerRegisters,
    pub timer2: &'a timer::TimerRegisters,
    /// nRF51 only
    pub adc: &'a adc::AdcRegisters,
    pub temp: &'a temp::TempRegisters,
    pub uart0: &'a uart::UartRegisters,
    pub twi0: &'a twi::TwiRegisters,
}

impl Peripherals<'static> {
    /// The memory-mapped instances
    pub fn memory_mapped() -> Self {
        Self {
            clock: clock::CLOCK.get(),
            power: power::POWER.get(),
            gpio: gpio::P0.get(),
            gpiote: gpiote::GPIOTE.get(),
            ppi: ppi::PPI.get(),
            rtc0: rtc::RTC0.get(),
            rtc1: rtc::RTC1.get(),
            rtc2: rtc::RTC2.get(),
            timer0: timer::TIMER0.get(),
            timer1: timer::TIMER1.get(),
            timer2: timer::TIMER2.get(),
            adc: adc::ADC.get(),
            temp: temp::TEMP.get(),
            uart0: uart::UART0.get(),
            twi0: twi::TWI0.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_counts_per_chip() {
        assert_eq!(Chip::Nrf51.ppi_channels(), 16);
        assert_eq!(Chip::Nrf52.ppi_channels(), 20);
        assert_eq!(Chip::Nrf51.gpiote_channels(), 4);
        assert_eq!(Chip::Nrf52.gpiote_channels(), 8);
        assert!(!Chip::Nrf51.has_ppi_fork());
    }

    #[test]
    fn test_instance_addresses() {
        assert_eq!(clock::CLOCK.address(), 0x4000_0000);
        assert_eq!(rtc::RTC1.address(), 0x4001_1000);
        assert_eq!(timer::TIMER0.address(), 0x4000_8000);
        assert_eq!(twi::TWI0.address(), 0x4000_3000);
        assert_eq!(ppi::PPI.address(), 0x4001_F000);
    }
}
