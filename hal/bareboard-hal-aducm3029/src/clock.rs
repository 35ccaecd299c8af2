//! CLKG: oscillators and peripheral clock gates
//!
//! `CLKG0_OSC.CTL` is key-protected: every write must be preceded by the
//! unlock value in `CLKG0_OSC.KEY`.

use bareboard_hal::{spin_until, Backoff, StaticRef};
use tock_registers::fields::FieldValue;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::Error;

register_structs! {
    pub OscRegisters {
        (0x00 => pub key: WriteOnly<u32>),
        (0x04 => pub ctl: ReadWrite<u32, OscCtl::Register>),
        (0x08 => @END),
    }
}

register_structs! {
    pub ClkRegisters {
        (0x00 => pub ctl0: ReadWrite<u32>),
        (0x04 => pub ctl1: ReadWrite<u32>),
        (0x08 => _reserved0),
        (0x0C => pub ctl3: ReadWrite<u32>),
        (0x10 => _reserved1),
        (0x14 => pub ctl5: ReadWrite<u32, ClkCtl5::Register>),
        (0x18 => @END),
    }
}

register_bitfields![u32,
    pub OscCtl [
        LFCLKMUX OFFSET(0) NUMBITS(1) [
            Lfosc = 0,
            Lfxtal = 1
        ],
        HFOSCEN OFFSET(1) NUMBITS(1) [],
        LFXTALEN OFFSET(2) NUMBITS(1) [],
        HFXTALEN OFFSET(3) NUMBITS(1) [],
        LFOSCOK OFFSET(8) NUMBITS(1) [],
        HFOSCOK OFFSET(9) NUMBITS(1) [],
        LFXTALOK OFFSET(10) NUMBITS(1) []
    ],
    /// Clock gates, 1 = gated off
    ClkCtl5 [
        GPTCLK0OFF OFFSET(0) NUMBITS(1) [],
        GPTCLK1OFF OFFSET(1) NUMBITS(1) [],
        GPTCLK2OFF OFFSET(2) NUMBITS(1) [],
        UCLKI2COFF OFFSET(3) NUMBITS(1) [],
        GPIOCLKOFF OFFSET(4) NUMBITS(1) [],
        PERCLKOFF OFFSET(5) NUMBITS(1) []
    ]
];

#[allow(unsafe_code)]
pub const CLKG0_OSC: StaticRef<OscRegisters> =
    unsafe { StaticRef::new(0x4004_C10C as *const OscRegisters) };

#[allow(unsafe_code)]
pub const CLKG0_CLK: StaticRef<ClkRegisters> =
    unsafe { StaticRef::new(0x4004_C300 as *const ClkRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for OscRegisters {}

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for ClkRegisters {}

/// `CLKG0_OSC.KEY` unlock value
pub const OSC_KEY_UNLOCK: u32 = 0xCB14;

fn modify_osc(osc: &OscRegisters, value: FieldValue<u32, OscCtl::Register>) {
    osc.key.set(OSC_KEY_UNLOCK);
    osc.ctl.modify(value);
}

/// Start the 32.768 kHz crystal, wait until it is stable and switch LFCLK
/// over to it
///
/// RTC1 keeps counting through hibernation only when clocked from here.
pub fn start_lfxtal<B: Backoff>(osc: &OscRegisters, budget: u32, backoff: &mut B) -> Result<(), Error> {
    modify_osc(osc, OscCtl::LFXTALEN::SET);
    spin_until(budget, backoff, || osc.ctl.is_set(OscCtl::LFXTALOK))?;
    modify_osc(osc, OscCtl::LFCLKMUX::Lfxtal);
    Ok(())
}

/// Ungate the GPIO clock
pub fn enable_gpio_clock(clk: &ClkRegisters) {
    clk.ctl5.modify(ClkCtl5::GPIOCLKOFF::CLEAR);
}
