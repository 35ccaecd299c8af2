//! ADC: nRF51 successive-approximation converter
//!
//! Only present on nRF51. With the 1.2 V band-gap reference and 1/3 input
//! prescaling the usable input range is 0-3.6 V, which covers VDD.

use bareboard_hal::StaticRef;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::{trigger, EventRegister, TaskRegister};

register_structs! {
    pub AdcRegisters {
        (0x000 => pub tasks_start: TaskRegister),
        (0x004 => pub tasks_stop: TaskRegister),
        (0x008 => _reserved0),
        (0x100 => pub events_end: EventRegister),
        (0x104 => _reserved1),
        (0x304 => pub intenset: ReadWrite<u32>),
        (0x308 => pub intenclr: ReadWrite<u32>),
        (0x30C => _reserved2),
        (0x400 => pub busy: ReadOnly<u32>),
        (0x404 => _reserved3),
        (0x500 => pub enable: ReadWrite<u32>),
        (0x504 => pub config: ReadWrite<u32, Config::Register>),
        (0x508 => pub result: ReadOnly<u32, Conversion::Register>),
        (0x50C => @END),
    }
}

register_bitfields![u32,
    Config [
        RES OFFSET(0) NUMBITS(2) [],
        INPSEL OFFSET(2) NUMBITS(3) [],
        REFSEL OFFSET(5) NUMBITS(2) [],
        PSEL OFFSET(8) NUMBITS(8) []
    ],
    Conversion [
        RESULT OFFSET(0) NUMBITS(10) []
    ]
];

#[allow(unsafe_code)]
pub const ADC: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(0x4000_7000 as *const AdcRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for AdcRegisters {}

/// Band-gap reference voltage in millivolts
pub const VBG_MILLIVOLTS: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    #[default]
    Bits8 = 0,
    Bits9 = 1,
    Bits10 = 2,
}

impl Resolution {
    /// Full-scale conversion result
    pub const fn full_scale(self) -> u32 {
        match self {
            Resolution::Bits8 => 0xFF,
            Resolution::Bits9 => 0x1FF,
            Resolution::Bits10 => 0x3FF,
        }
    }
}

/// Converter input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Input {
    AnalogNoPrescaling = 0,
    AnalogTwoThirds = 1,
    AnalogOneThird = 2,
    SupplyTwoThirds = 5,
    #[default]
    SupplyOneThird = 6,
}

impl Input {
    /// Inverse of the prescaling as (numerator, denominator)
    const fn scale(self) -> (u32, u32) {
        match self {
            Input::AnalogNoPrescaling => (1, 1),
            Input::AnalogTwoThirds | Input::SupplyTwoThirds => (3, 2),
            Input::AnalogOneThird | Input::SupplyOneThird => (3, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Reference {
    /// 1.2 V band gap
    #[default]
    Vbg = 0,
    SupplyOneHalf = 1,
    SupplyOneThird = 2,
    External = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    pub resolution: Resolution,
    pub input: Input,
    pub reference: Reference,
    /// AIN pin mask for the analog inputs, 0 when sampling the supply
    pub analog_pins: u8,
}

/// Stop and disable the converter, write `CONFIG`, enable it again
pub fn configure(adc: &AdcRegisters, config: &AdcConfig) {
    trigger(&adc.tasks_stop);
    adc.enable.set(0);

    adc.config.write(
        Config::RES.val(config.resolution as u32)
            + Config::INPSEL.val(config.input as u32)
            + Config::REFSEL.val(config.reference as u32)
            + Config::PSEL.val(config.analog_pins as u32),
    );

    adc.enable.set(1);
}

/// Last conversion result
pub fn result(adc: &AdcRegisters) -> u16 {
    adc.result.read(Conversion::RESULT) as u16
}

/// Convert a result taken with the band-gap reference to the input
/// voltage in millivolts
pub fn millivolts(config: &AdcConfig, result: u16) -> u32 {
    let (num, den) = config.input.scale();
    result as u32 * VBG_MILLIVOLTS * num / (den * config.resolution.full_scale())
}
