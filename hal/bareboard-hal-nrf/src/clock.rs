//! CLOCK: high- and low-frequency clock start-up

use bareboard_hal::{spin_until, Backoff, StaticRef};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, trigger, Error, EventRegister, TaskRegister};

register_structs! {
    pub ClockRegisters {
        (0x000 => pub tasks_hfclkstart: TaskRegister),
        (0x004 => pub tasks_hfclkstop: TaskRegister),
        (0x008 => pub tasks_lfclkstart: TaskRegister),
        (0x00C => pub tasks_lfclkstop: TaskRegister),
        (0x010 => _reserved0),
        (0x100 => pub events_hfclkstarted: EventRegister),
        (0x104 => pub events_lfclkstarted: EventRegister),
        (0x108 => _reserved1),
        (0x518 => pub lfclksrc: ReadWrite<u32, Lfclksrc::Register>),
        (0x51C => @END),
    }
}

register_bitfields![u32,
    Lfclksrc [
        SRC OFFSET(0) NUMBITS(2) [
            Rc = 0,
            Xtal = 1,
            Synth = 2
        ]
    ]
];

#[allow(unsafe_code)]
pub const CLOCK: StaticRef<ClockRegisters> =
    unsafe { StaticRef::new(0x4000_0000 as *const ClockRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for ClockRegisters {}

/// LFCLK source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LfclkSource {
    /// Internal 32.768 kHz RC oscillator
    #[default]
    Rc,
    /// External 32.768 kHz crystal
    Xtal,
    /// Synthesized from HFCLK
    Synth,
}

/// Clear `started`, trigger `start`, wait for `started`, clear it again
fn start_and_wait<B: Backoff>(
    start: &TaskRegister,
    started: &EventRegister,
    budget: u32,
    backoff: &mut B,
) -> Result<(), Error> {
    clear(started);
    trigger(start);

    spin_until(budget, backoff, || started.get() != 0)?;
    clear(started);
    Ok(())
}

/// Start the external high-frequency crystal and wait until it runs
///
/// The wait checks `EVENTS_HFCLKSTARTED` at most `budget` times.
pub fn start_hfclk<B: Backoff>(
    clock: &ClockRegisters,
    budget: u32,
    backoff: &mut B,
) -> Result<(), Error> {
    start_and_wait(
        &clock.tasks_hfclkstart,
        &clock.events_hfclkstarted,
        budget,
        backoff,
    )
}

/// Select the LFCLK source, start it and wait until it runs
///
/// RTCs count nothing until this has returned `Ok`.
pub fn start_lfclk<B: Backoff>(
    clock: &ClockRegisters,
    source: LfclkSource,
    budget: u32,
    backoff: &mut B,
) -> Result<(), Error> {
    clock.lfclksrc.write(match source {
        LfclkSource::Rc => Lfclksrc::SRC::Rc,
        LfclkSource::Xtal => Lfclksrc::SRC::Xtal,
        LfclkSource::Synth => Lfclksrc::SRC::Synth,
    });
    start_and_wait(
        &clock.tasks_lfclkstart,
        &clock.events_lfclkstarted,
        budget,
        backoff,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ClockStartup;
    use bareboard_hal::mock::{last_written, zeroed, Stalled};

    #[test]
    fn test_start_lfclk_rc() {
        let clock = zeroed::<ClockRegisters>();
        let mut startup = ClockStartup::after(&clock, 2);

        assert_eq!(start_lfclk(&clock, LfclkSource::Rc, 10, &mut startup), Ok(()));

        assert_eq!(clock.lfclksrc.get(), 0);
        assert_eq!(last_written(&clock.tasks_lfclkstart), 1);
        // Event came up on the third check and was cleared afterwards
        assert_eq!(startup.backoffs(), 2);
        assert_eq!(clock.events_lfclkstarted.get(), 0);
    }

    #[test]
    fn test_stale_event_cleared_before_start() {
        let clock = zeroed::<ClockRegisters>();
        clock.events_lfclkstarted.set(1);

        let mut stalled = Stalled::default();
        assert_eq!(
            start_lfclk(&clock, LfclkSource::Xtal, 50, &mut stalled),
            Err(Error::Timeout)
        );
        assert_eq!(clock.lfclksrc.get(), 1);
        assert_eq!(stalled.backoffs(), 50);
    }

    #[test]
    fn test_start_hfclk() {
        let clock = zeroed::<ClockRegisters>();
        let mut startup = ClockStartup::after(&clock, 0);

        assert_eq!(start_hfclk(&clock, 10, &mut startup), Ok(()));
        assert_eq!(last_written(&clock.tasks_hfclkstart), 1);
        assert_eq!(last_written(&clock.tasks_lfclkstart), 0);
        assert_eq!(clock.events_hfclkstarted.get(), 0);
    }
}
