//! RTC: 24-bit real-time counters clocked from LFCLK
//!
//! `f_RTC = 32.768 kHz / (PRESCALER + 1)`. The firmwares use the TICK event
//! (one per counter increment) or COMPARE0, routed through PPI or raised as
//! an interrupt.

use bareboard_hal::StaticRef;
use tock_registers::interfaces::Writeable;
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, trigger, Error, EventRegister, TaskRegister};

register_structs! {
    pub RtcRegisters {
        (0x000 => pub tasks_start: TaskRegister),
        (0x004 => pub tasks_stop: TaskRegister),
        (0x008 => pub tasks_clear: TaskRegister),
        (0x00C => pub tasks_trigovrflw: TaskRegister),
        (0x010 => _reserved0),
        (0x100 => pub events_tick: EventRegister),
        (0x104 => pub events_ovrflw: EventRegister),
        (0x108 => _reserved1),
        (0x140 => pub events_compare: [EventRegister; 4]),
        (0x150 => _reserved2),
        (0x304 => pub intenset: ReadWrite<u32, Inten::Register>),
        (0x308 => pub intenclr: ReadWrite<u32, Inten::Register>),
        (0x30C => _reserved3),
        (0x340 => pub evten: ReadWrite<u32, Inten::Register>),
        (0x344 => pub evtenset: ReadWrite<u32, Inten::Register>),
        (0x348 => pub evtenclr: ReadWrite<u32, Inten::Register>),
        (0x34C => _reserved4),
        (0x504 => pub counter: ReadOnly<u32>),
        (0x508 => pub prescaler: ReadWrite<u32>),
        (0x50C => _reserved5),
        (0x540 => pub cc: [ReadWrite<u32>; 4]),
        (0x550 => @END),
    }
}

register_bitfields![u32,
    /// Shared by `INTEN*` and `EVTEN*`
    pub Inten [
        TICK OFFSET(0) NUMBITS(1) [],
        OVRFLW OFFSET(1) NUMBITS(1) [],
        COMPARE0 OFFSET(16) NUMBITS(1) [],
        COMPARE1 OFFSET(17) NUMBITS(1) [],
        COMPARE2 OFFSET(18) NUMBITS(1) [],
        COMPARE3 OFFSET(19) NUMBITS(1) []
    ]
];

#[allow(unsafe_code)]
pub const RTC0: StaticRef<RtcRegisters> =
    unsafe { StaticRef::new(0x4000_B000 as *const RtcRegisters) };

#[allow(unsafe_code)]
pub const RTC1: StaticRef<RtcRegisters> =
    unsafe { StaticRef::new(0x4001_1000 as *const RtcRegisters) };

/// nRF52 only
#[allow(unsafe_code)]
pub const RTC2: StaticRef<RtcRegisters> =
    unsafe { StaticRef::new(0x4002_4000 as *const RtcRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for RtcRegisters {}

/// LFCLK frequency feeding the counters
pub const LFCLK_HZ: u32 = 32_768;

/// Largest PRESCALER value (12-bit register)
pub const MAX_PRESCALER: u32 = 0xFFF;

/// Largest compare value (24-bit counter)
pub const MAX_COMPARE: u32 = 0x00FF_FFFF;

/// Counter frequency for a prescaler value, in Hz (integer part)
pub const fn frequency_hz(prescaler: u32) -> u32 {
    LFCLK_HZ / (prescaler + 1)
}

fn reset(rtc: &RtcRegisters, prescaler: u32) -> Result<(), Error> {
    if prescaler > MAX_PRESCALER {
        return Err(Error::InvalidPrescaler(prescaler));
    }

    // PRESCALER is only writable while stopped
    trigger(&rtc.tasks_stop);
    rtc.prescaler.set(prescaler);
    trigger(&rtc.tasks_clear);
    Ok(())
}

/// Stop, set the prescaler, clear, and route TICK to PPI
///
/// The counter stays stopped; call [`start`] once everything is wired.
pub fn configure_tick(rtc: &RtcRegisters, prescaler: u32) -> Result<(), Error> {
    reset(rtc, prescaler)?;
    rtc.evtenset.write(Inten::TICK::SET);
    Ok(())
}

/// Stop, set the prescaler, clear, load `CC[0]` and route COMPARE0 to PPI
///
/// With `interrupt` the COMPARE0 interrupt is enabled as well. The counter
/// is not reset on compare; pair it with a PPI fork to `TASKS_CLEAR` for a
/// periodic event.
pub fn configure_compare(
    rtc: &RtcRegisters,
    prescaler: u32,
    cc0: u32,
    interrupt: bool,
) -> Result<(), Error> {
    if cc0 > MAX_COMPARE {
        return Err(Error::CompareOutOfRange(cc0 as u64));
    }
    reset(rtc, prescaler)?;

    rtc.cc[0].set(cc0);
    rtc.evtenset.write(Inten::COMPARE0::SET);
    if interrupt {
        rtc.intenset.write(Inten::COMPARE0::SET);
    }
    Ok(())
}

pub fn start(rtc: &RtcRegisters) {
    trigger(&rtc.tasks_start);
}

pub fn clear_compare_event(rtc: &RtcRegisters, n: usize) {
    clear(&rtc.events_compare[n]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bareboard_hal::mock::{last_written, zeroed};
    use tock_registers::interfaces::Readable;

    #[test]
    fn test_frequency() {
        assert_eq!(frequency_hz(0), 32_768);
        assert_eq!(frequency_hz(4095), 8);
        assert_eq!(frequency_hz(327), 99);
    }

    #[test]
    fn test_configure_tick() {
        let rtc = zeroed::<RtcRegisters>();
        configure_tick(&rtc, 4095).unwrap();

        assert_eq!(last_written(&rtc.tasks_stop), 1);
        assert_eq!(last_written(&rtc.tasks_clear), 1);
        assert_eq!(rtc.prescaler.get(), 4095);
        assert_eq!(rtc.evtenset.get(), 1);
        // Left stopped
        assert_eq!(last_written(&rtc.tasks_start), 0);
    }

    #[test]
    fn test_configure_compare_without_interrupt() {
        let rtc = zeroed::<RtcRegisters>();
        configure_compare(&rtc, 4095, 8, false).unwrap();

        assert_eq!(rtc.cc[0].get(), 8);
        assert_eq!(rtc.evtenset.get(), 1 << 16);
        assert_eq!(rtc.intenset.get(), 0);
    }

    #[test]
    fn test_compare_interrupt() {
        let rtc = zeroed::<RtcRegisters>();
        configure_compare(&rtc, 0, 32_768, true).unwrap();
        assert_eq!(rtc.intenset.get(), 1 << 16);
        assert!(rtc.intenset.is_set(Inten::COMPARE0));
    }

    #[test]
    fn test_compare_wider_than_counter() {
        let rtc = zeroed::<RtcRegisters>();
        assert_eq!(
            configure_compare(&rtc, 0, MAX_COMPARE + 1, false),
            Err(Error::CompareOutOfRange(0x0100_0000))
        );
        assert_eq!(last_written(&rtc.tasks_stop), 0);
        assert_eq!(rtc.cc[0].get(), 0);
    }

    #[test]
    fn test_prescaler_out_of_range() {
        let rtc = zeroed::<RtcRegisters>();
        assert_eq!(configure_tick(&rtc, 4096), Err(Error::InvalidPrescaler(4096)));
        assert_eq!(last_written(&rtc.tasks_stop), 0);
        assert_eq!(rtc.evtenset.get(), 0);
    }

    #[test]
    fn test_start_and_acknowledge() {
        let rtc = zeroed::<RtcRegisters>();
        start(&rtc);
        assert_eq!(last_written(&rtc.tasks_start), 1);

        rtc.events_compare[0].set(1);
        clear_compare_event(&rtc, 0);
        assert_eq!(rtc.events_compare[0].get(), 0);
    }
}
