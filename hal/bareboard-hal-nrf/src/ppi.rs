//! PPI: event-to-task routing without the CPU
//!
//! Channel endpoints are register addresses: `EEP` takes the address of an
//! `EVENTS_*` register, `TEP` (and the nRF52 `FORK.TEP`) the address of a
//! `TASKS_*` register. [`Ppi`] takes the registers themselves and derives
//! the addresses, so only real tasks and events can be wired.

use bareboard_hal::StaticRef;
use tock_registers::interfaces::Writeable;
use tock_registers::register_structs;
use tock_registers::registers::ReadWrite;

use crate::{endpoint, Chip, Error, EventRegister, TaskRegister};

/// `CH[n]` endpoint pair
#[repr(C)]
pub struct Channel {
    pub eep: ReadWrite<u32>,
    pub tep: ReadWrite<u32>,
}

register_structs! {
    pub PpiRegisters {
        (0x000 => _reserved0),
        (0x500 => pub chen: ReadWrite<u32>),
        (0x504 => pub chenset: ReadWrite<u32>),
        (0x508 => pub chenclr: ReadWrite<u32>),
        (0x50C => _reserved1),
        (0x510 => pub ch: [Channel; 20]),
        (0x5B0 => _reserved2),
        (0x910 => pub fork_tep: [ReadWrite<u32>; 32]),
        (0x990 => @END),
    }
}

#[allow(unsafe_code)]
pub const PPI: StaticRef<PpiRegisters> =
    unsafe { StaticRef::new(0x4001_F000 as *const PpiRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for PpiRegisters {}

/// PPI block of one chip
#[derive(Clone, Copy)]
pub struct Ppi<'a> {
    regs: &'a PpiRegisters,
    chip: Chip,
}

impl<'a> Ppi<'a> {
    pub fn new(regs: &'a PpiRegisters, chip: Chip) -> Self {
        Self { regs, chip }
    }

    fn check(&self, channel: u8) -> Result<usize, Error> {
        if channel >= self.chip.ppi_channels() {
            Err(Error::InvalidChannel(channel))
        } else {
            Ok(channel as usize)
        }
    }

    /// Channel bit for `CHEN`/`CHENSET`/`CHENCLR`
    pub fn channel_mask(&self, channel: u8) -> Result<u32, Error> {
        self.check(channel).map(|index| 1 << index)
    }

    /// Route `event` to `task` on `channel` (not enabled yet)
    pub fn connect(
        &self,
        channel: u8,
        event: &EventRegister,
        task: &TaskRegister,
    ) -> Result<(), Error> {
        let index = self.check(channel)?;
        self.regs.ch[index].eep.set(endpoint(event));
        self.regs.ch[index].tep.set(endpoint(task));
        Ok(())
    }

    /// Trigger a second task from the same channel (nRF52)
    pub fn fork(&self, channel: u8, task: &TaskRegister) -> Result<(), Error> {
        let index = self.check(channel)?;
        if !self.chip.has_ppi_fork() {
            return Err(Error::NotOnChip);
        }
        self.regs.fork_tep[index].set(endpoint(task));
        Ok(())
    }

    /// Enable the channels in `mask`, leaving the others as they are
    pub fn enable(&self, mask: u32) {
        self.regs.chenset.set(mask);
    }

    /// Disable the channels in `mask`
    pub fn disable(&self, mask: u32) {
        self.regs.chenclr.set(mask);
    }
}
