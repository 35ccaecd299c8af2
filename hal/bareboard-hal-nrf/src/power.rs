//! POWER: System ON sub-power mode and the sleep step

use bareboard_hal::{LowPower, StaticRef, WaitForEvent};
use tock_registers::interfaces::Writeable;
use tock_registers::registers::WriteOnly;
use tock_registers::{register_bitfields, register_structs};

use crate::{trigger, TaskRegister};

register_structs! {
    pub PowerRegisters {
        (0x000 => _reserved0),
        (0x078 => pub tasks_constlat: TaskRegister),
        (0x07C => pub tasks_lowpwr: TaskRegister),
        (0x080 => _reserved1),
        (0x500 => pub systemoff: WriteOnly<u32, SystemOff::Register>),
        (0x504 => @END),
    }
}

register_bitfields![u32,
    SystemOff [
        SYSTEMOFF OFFSET(0) NUMBITS(1) [
            Enter = 1
        ]
    ]
];

/// Shares its base address with CLOCK
#[allow(unsafe_code)]
pub const POWER: StaticRef<PowerRegisters> =
    unsafe { StaticRef::new(0x4000_0000 as *const PowerRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for PowerRegisters {}

/// System ON sleep in the low-power sub-mode
///
/// Every [`LowPower::sleep`] triggers `TASKS_LOWPWR` and then runs
/// `WFE; SEV; WFE`, which returns after any enabled event or interrupt and
/// leaves the event register clear.
pub struct NrfSleep<'a, W> {
    power: &'a PowerRegisters,
    core: W,
}

impl<'a, W: WaitForEvent> NrfSleep<'a, W> {
    pub fn new(power: &'a PowerRegisters, core: W) -> Self {
        Self { power, core }
    }

    /// Switch to constant latency (faster wake-up, higher idle current)
    ///
    /// Lasts until the next [`LowPower::sleep`] selects low power again.
    pub fn constant_latency(&mut self) {
        trigger(&self.power.tasks_constlat);
    }

    /// Enter System OFF; only a reset wakes the chip from here
    pub fn system_off(&mut self) {
        self.power.systemoff.write(SystemOff::SYSTEMOFF::Enter);
    }
}

impl<W: WaitForEvent> LowPower for NrfSleep<'_, W> {
    fn sleep(&mut self) {
        trigger(&self.power.tasks_lowpwr);
        self.core.sleep_and_clear_events();
    }
}
