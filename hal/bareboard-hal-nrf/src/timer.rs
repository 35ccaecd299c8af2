//! TIMER: periodic compare interrupt
//!
//! `f_TIMER = 16 MHz / 2^PRESCALER`. [`configure_periodic`] sets up the
//! pattern the sensor firmwares tick from: COMPARE0 clears the timer through
//! the `COMPARE0_CLEAR` shortcut and raises the interrupt.

use bareboard_hal::StaticRef;
use tock_registers::interfaces::Writeable;
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, trigger, Error, EventRegister, TaskRegister};

register_structs! {
    pub TimerRegisters {
        (0x000 => pub tasks_start: TaskRegister),
        (0x004 => pub tasks_stop: TaskRegister),
        (0x008 => pub tasks_count: TaskRegister),
        (0x00C => pub tasks_clear: TaskRegister),
        (0x010 => pub tasks_shutdown: TaskRegister),
        (0x014 => _reserved0),
        (0x040 => pub tasks_capture: [TaskRegister; 4]),
        (0x050 => _reserved1),
        (0x140 => pub events_compare: [EventRegister; 4]),
        (0x150 => _reserved2),
        (0x200 => pub shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved3),
        (0x304 => pub intenset: ReadWrite<u32, Inten::Register>),
        (0x308 => pub intenclr: ReadWrite<u32, Inten::Register>),
        (0x30C => _reserved4),
        (0x504 => pub mode: ReadWrite<u32, Mode::Register>),
        (0x508 => pub bitmode: ReadWrite<u32, Bitmode::Register>),
        (0x50C => _reserved5),
        (0x510 => pub prescaler: ReadWrite<u32>),
        (0x514 => _reserved6),
        (0x540 => pub cc: [ReadWrite<u32>; 4]),
        (0x550 => @END),
    }
}

register_bitfields![u32,
    Shorts [
        COMPARE0_CLEAR OFFSET(0) NUMBITS(1) [],
        COMPARE0_STOP OFFSET(8) NUMBITS(1) []
    ],
    Inten [
        COMPARE0 OFFSET(16) NUMBITS(1) []
    ],
    Mode [
        MODE OFFSET(0) NUMBITS(2) [
            Timer = 0,
            Counter = 1
        ]
    ],
    Bitmode [
        BITMODE OFFSET(0) NUMBITS(2) [
            Bits16 = 0,
            Bits8 = 1,
            Bits24 = 2,
            Bits32 = 3
        ]
    ]
];

#[allow(unsafe_code)]
pub const TIMER0: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4000_8000 as *const TimerRegisters) };

#[allow(unsafe_code)]
pub const TIMER1: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4000_9000 as *const TimerRegisters) };

#[allow(unsafe_code)]
pub const TIMER2: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4000_A000 as *const TimerRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for TimerRegisters {}

/// HFCLK feeding the timers
pub const HFCLK_HZ: u32 = 16_000_000;

/// Largest PRESCALER value
pub const MAX_PRESCALER: u32 = 9;

/// Counter width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitMode {
    #[default]
    Bits16,
    Bits8,
    Bits24,
    Bits32,
}

impl BitMode {
    /// Largest value the counter (and so `CC[n]`) can hold
    pub const fn max(self) -> u32 {
        match self {
            BitMode::Bits8 => 0xFF,
            BitMode::Bits16 => 0xFFFF,
            BitMode::Bits24 => 0x00FF_FFFF,
            BitMode::Bits32 => u32::MAX,
        }
    }
}

/// Timer frequency for a prescaler value
pub const fn frequency_hz(prescaler: u32) -> u32 {
    HFCLK_HZ >> prescaler
}

/// Compare value giving a period of `ms` milliseconds
///
/// Fails when the prescaler is out of range or the count does not fit the
/// 32-bit `CC` register.
pub fn ticks_for_ms(prescaler: u32, ms: u32) -> Result<u32, Error> {
    if prescaler > MAX_PRESCALER {
        return Err(Error::InvalidPrescaler(prescaler));
    }

    let ticks = frequency_hz(prescaler) as u64 * ms as u64 / 1000;
    u32::try_from(ticks).map_err(|_| Error::CompareOutOfRange(ticks))
}

/// Stop, configure and clear `timer` with `CC[0] = cc0`, compare-clear
/// shortcut and COMPARE0 interrupt; the timer is left stopped
///
/// `cc0` must fit the counter width, otherwise COMPARE0 never fires.
pub fn configure_periodic(
    timer: &TimerRegisters,
    prescaler: u32,
    bitmode: BitMode,
    cc0: u32,
) -> Result<(), Error> {
    if prescaler > MAX_PRESCALER {
        return Err(Error::InvalidPrescaler(prescaler));
    }
    if cc0 > bitmode.max() {
        return Err(Error::CompareOutOfRange(cc0 as u64));
    }

    trigger(&timer.tasks_stop);
    timer.mode.write(Mode::MODE::Timer);
    timer.bitmode.write(match bitmode {
        BitMode::Bits16 => Bitmode::BITMODE::Bits16,
        BitMode::Bits8 => Bitmode::BITMODE::Bits8,
        BitMode::Bits24 => Bitmode::BITMODE::Bits24,
        BitMode::Bits32 => Bitmode::BITMODE::Bits32,
    });
    timer.prescaler.set(prescaler);
    trigger(&timer.tasks_clear);

    timer.cc[0].set(cc0);
    timer.shorts.write(Shorts::COMPARE0_CLEAR::SET);
    timer.intenset.write(Inten::COMPARE0::SET);
    Ok(())
}

pub fn start(timer: &TimerRegisters) {
    trigger(&timer.tasks_start);
}

/// Acknowledge COMPARE0 (top of the TIMER interrupt handler)
pub fn clear_compare(timer: &TimerRegisters) {
    clear(&timer.events_compare[0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bareboard_hal::mock::{last_written, zeroed};
    use proptest::prelude::*;
    use tock_registers::interfaces::Readable;

    #[test]
    fn test_ticks_for_ms() {
        assert_eq!(frequency_hz(9), 31_250);
        assert_eq!(ticks_for_ms(9, 1000), Ok(31_250));
        assert_eq!(ticks_for_ms(9, 500), Ok(15_625));
        assert_eq!(ticks_for_ms(4, 1), Ok(1_000));
        assert_eq!(ticks_for_ms(0, 0), Ok(0));
    }

    #[test]
    fn test_ticks_beyond_cc_width() {
        // 16 MHz for five minutes is 4.8e9 ticks
        assert_eq!(
            ticks_for_ms(0, 300_000),
            Err(Error::CompareOutOfRange(4_800_000_000))
        );
        assert_eq!(ticks_for_ms(10, 1), Err(Error::InvalidPrescaler(10)));
        assert_eq!(ticks_for_ms(0, 268_435), Ok(4_294_960_000));
    }

    #[test]
    fn test_configure_periodic_timer0() {
        let timer = zeroed::<TimerRegisters>();
        configure_periodic(&timer, 9, BitMode::Bits16, 31_250).unwrap();

        assert_eq!(last_written(&timer.tasks_stop), 1);
        assert_eq!(last_written(&timer.tasks_clear), 1);
        assert_eq!(timer.mode.get(), 0);
        assert_eq!(timer.bitmode.get(), 0);
        assert_eq!(timer.prescaler.get(), 9);
        assert_eq!(timer.cc[0].get(), 31_250);
        assert_eq!(timer.shorts.get(), 1);
        assert_eq!(timer.intenset.get(), 1 << 16);
        assert_eq!(last_written(&timer.tasks_start), 0);
    }

    #[test]
    fn test_compare_beyond_bitmode() {
        let timer = zeroed::<TimerRegisters>();
        // tick_ms 3000 at prescaler 9
        let cc0 = ticks_for_ms(9, 3000).unwrap();
        assert_eq!(cc0, 93_750);

        assert_eq!(
            configure_periodic(&timer, 9, BitMode::Bits16, cc0),
            Err(Error::CompareOutOfRange(93_750))
        );
        assert_eq!(last_written(&timer.tasks_stop), 0);
        assert_eq!(timer.cc[0].get(), 0);

        configure_periodic(&timer, 9, BitMode::Bits24, cc0).unwrap();
        assert_eq!(timer.bitmode.get(), 2);
        assert_eq!(timer.cc[0].get(), 93_750);
    }

    #[test]
    fn test_prescaler_out_of_range() {
        let timer = zeroed::<TimerRegisters>();
        assert_eq!(
            configure_periodic(&timer, 10, BitMode::Bits32, 1),
            Err(Error::InvalidPrescaler(10))
        );
    }

    #[test]
    fn test_start_and_acknowledge() {
        let timer = zeroed::<TimerRegisters>();
        start(&timer);
        assert_eq!(last_written(&timer.tasks_start), 1);

        timer.events_compare[0].set(1);
        clear_compare(&timer);
        assert_eq!(timer.events_compare[0].get(), 0);
    }

    proptest! {
        #[test]
        fn ticks_for_ms_matches_wide_arithmetic(prescaler in 0u32..=MAX_PRESCALER, ms in 0u32..=u32::MAX) {
            let exact = frequency_hz(prescaler) as u64 * ms as u64 / 1000;
            match ticks_for_ms(prescaler, ms) {
                Ok(ticks) => prop_assert_eq!(ticks as u64, exact),
                Err(err) => {
                    prop_assert!(exact > u32::MAX as u64);
                    prop_assert_eq!(err, Error::CompareOutOfRange(exact));
                }
            }
        }
    }
}
