//! PMG: power management
//!
//! `PWRMOD` is key-protected: `PWRKEY` must hold the unlock value for the
//! write to land. Entering a mode only takes effect at the next `WFI`.

use bareboard_hal::{LowPower, StaticRef, WaitForEvent};
use tock_registers::interfaces::{ReadWriteable, Writeable};
use tock_registers::registers::{ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

register_structs! {
    pub PmgRegisters {
        (0x000 => pub ien: ReadWrite<u32>),
        (0x004 => pub psm_stat: ReadWrite<u32>),
        (0x008 => pub pwrmod: ReadWrite<u32, Pwrmod::Register>),
        (0x00C => pub pwrkey: WriteOnly<u32>),
        (0x010 => @END),
    }
}

register_bitfields![u32,
    Pwrmod [
        MODE OFFSET(0) NUMBITS(2) [
            Flexi = 0,
            Hibernate = 2,
            Shutdown = 3
        ]
    ]
];

#[allow(unsafe_code)]
pub const PMG0: StaticRef<PmgRegisters> =
    unsafe { StaticRef::new(0x4004_C000 as *const PmgRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for PmgRegisters {}

/// `PWRKEY` unlock value
pub const PWRKEY_UNLOCK: u32 = 0x4859;

/// Low-power mode entered on the next `WFI`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Core clock gated, peripherals keep running
    Flexi,
    /// SRAM retained, wake-up from RTC or external interrupt
    Hibernate,
    /// Only a reset or wake-up pin brings the chip back
    Shutdown,
}

/// Unlock, select `mode`, relock
pub fn enter_mode(pmg: &PmgRegisters, mode: PowerMode) {
    pmg.pwrkey.set(PWRKEY_UNLOCK);
    pmg.pwrmod.modify(match mode {
        PowerMode::Flexi => Pwrmod::MODE::Flexi,
        PowerMode::Hibernate => Pwrmod::MODE::Hibernate,
        PowerMode::Shutdown => Pwrmod::MODE::Shutdown,
    });
    pmg.pwrkey.set(0);
}

/// Hibernate on every sleep, wake on the next interrupt
pub struct HibernateSleep<'a, W> {
    pmg: &'a PmgRegisters,
    core: W,
}

impl<'a, W: WaitForEvent> HibernateSleep<'a, W> {
    pub fn new(pmg: &'a PmgRegisters, core: W) -> Self {
        Self { pmg, core }
    }
}

impl<W: WaitForEvent> LowPower for HibernateSleep<'_, W> {
    fn sleep(&mut self) {
        enter_mode(self.pmg, PowerMode::Hibernate);
        self.core.wfi();
    }
}
