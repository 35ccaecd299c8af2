//! RTC1: wake-up counter with alarm
//!
//! Counts LFCLK (32.768 kHz) divided by `2^PRESCALE2EXP`. Registers are 16
//! bits wide, so the 32-bit counter and alarm each span two of them. The RTC
//! runs in its own clock domain: a write is only accepted once the previous
//! write to the same register has been posted, which `SR1.WPND*` reports.

use bareboard_hal::{spin_until, Backoff, StaticRef};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::Error;

register_structs! {
    pub RtcRegisters {
        (0x00 => pub cr0: ReadWrite<u16, Cr0::Register>),
        (0x02 => _reserved0),
        (0x04 => pub sr0: ReadWrite<u16, Sr0::Register>),
        (0x06 => _reserved1),
        (0x08 => pub sr1: ReadOnly<u16, Sr1::Register>),
        (0x0A => _reserved2),
        (0x0C => pub cnt0: ReadWrite<u16>),
        (0x0E => _reserved3),
        (0x10 => pub cnt1: ReadWrite<u16>),
        (0x12 => _reserved4),
        (0x14 => pub alm0: ReadWrite<u16>),
        (0x16 => _reserved5),
        (0x18 => pub alm1: ReadWrite<u16>),
        (0x1A => _reserved6),
        (0x28 => pub cr1: ReadWrite<u16, Cr1::Register>),
        (0x2A => @END),
    }
}

register_bitfields![u16,
    Cr0 [
        CNTEN OFFSET(0) NUMBITS(1) [],
        ALMEN OFFSET(1) NUMBITS(1) [],
        ALMINTEN OFFSET(2) NUMBITS(1) []
    ],
    /// Write 1 to clear
    Sr0 [
        ALMINT OFFSET(1) NUMBITS(1) []
    ],
    Sr1 [
        // One pending-write bit per register: CR0, SR0, CNT0, CNT1, ALM0,
        // ALM1, TRM
        WPND OFFSET(7) NUMBITS(7) []
    ],
    Cr1 [
        PRESCALE2EXP OFFSET(5) NUMBITS(4) []
    ]
];

#[allow(unsafe_code)]
pub const RTC1: StaticRef<RtcRegisters> =
    unsafe { StaticRef::new(0x4000_1400 as *const RtcRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for RtcRegisters {}

pub const LFCLK_HZ: u32 = 32_768;

/// Largest `PRESCALE2EXP`, one count per second
pub const MAX_PRESCALE_EXP: u8 = 15;

/// Counter frequency for a prescaler exponent
pub const fn frequency_hz(prescale_exp: u8) -> u32 {
    LFCLK_HZ >> prescale_exp
}

fn wait_posted<B: Backoff>(rtc: &RtcRegisters, budget: u32, backoff: &mut B) -> Result<(), Error> {
    spin_until(budget, backoff, || rtc.sr1.read(Sr1::WPND) == 0)?;
    Ok(())
}

/// Current alarm value
pub fn alarm(rtc: &RtcRegisters) -> u32 {
    (rtc.alm1.get() as u32) << 16 | rtc.alm0.get() as u32
}

fn set_alarm(rtc: &RtcRegisters, value: u32) {
    rtc.alm0.set(value as u16);
    rtc.alm1.set((value >> 16) as u16);
}

/// Restart the counter from zero with an alarm every `period` counts
///
/// Stops the counter, sets the prescaler, zeroes the count, places the alarm
/// `period` counts ahead and starts counting with the alarm enabled. The
/// interrupt is left as it was; see [`enable_alarm_interrupt`].
pub fn configure_alarm_period<B: Backoff>(
    rtc: &RtcRegisters,
    prescale_exp: u8,
    period: u32,
    budget: u32,
    backoff: &mut B,
) -> Result<(), Error> {
    if prescale_exp > MAX_PRESCALE_EXP {
        return Err(Error::InvalidPrescaler(prescale_exp));
    }
    if period == 0 {
        return Err(Error::ZeroPeriod);
    }

    wait_posted(rtc, budget, backoff)?;
    rtc.cr0.modify(Cr0::CNTEN::CLEAR);
    rtc.cr1.modify(Cr1::PRESCALE2EXP.val(prescale_exp as u16));
    rtc.cnt0.set(0);
    rtc.cnt1.set(0);
    set_alarm(rtc, period);

    wait_posted(rtc, budget, backoff)?;
    rtc.cr0.modify(Cr0::ALMEN::SET + Cr0::CNTEN::SET);
    Ok(())
}

/// Raise the RTC1 interrupt on the alarm
pub fn enable_alarm_interrupt(rtc: &RtcRegisters) {
    rtc.cr0.modify(Cr0::ALMINTEN::SET);
}

/// Clear `SR0.ALMINT` and move the alarm `period` counts on (top of the
/// RTC1 interrupt handler)
pub fn acknowledge_alarm(rtc: &RtcRegisters, period: u32) {
    rtc.sr0.write(Sr0::ALMINT::SET);
    set_alarm(rtc, alarm(rtc).wrapping_add(period));
}
