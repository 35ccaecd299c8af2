//! GPIOTE: pin tasks that PPI can trigger
//!
//! nRF51 has 4 channels, nRF52 has 8; the block below maps 8 and
//! [`Chip::gpiote_channels`] bounds what may be used.

use bareboard_hal::StaticRef;
use tock_registers::interfaces::Writeable;
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

use crate::{Chip, Error, EventRegister, TaskRegister};

register_structs! {
    pub GpioteRegisters {
        (0x000 => pub tasks_out: [TaskRegister; 8]),
        (0x020 => _reserved0),
        (0x100 => pub events_in: [EventRegister; 8]),
        (0x120 => _reserved1),
        (0x17C => pub events_port: EventRegister),
        (0x180 => _reserved2),
        (0x304 => pub intenset: ReadWrite<u32>),
        (0x308 => pub intenclr: ReadWrite<u32>),
        (0x30C => _reserved3),
        (0x510 => pub config: [ReadWrite<u32, Config::Register>; 8]),
        (0x530 => @END),
    }
}

register_bitfields![u32,
    Config [
        MODE OFFSET(0) NUMBITS(2) [
            Disabled = 0,
            Event = 1,
            Task = 3
        ],
        PSEL OFFSET(8) NUMBITS(5) [],
        POLARITY OFFSET(16) NUMBITS(2) [],
        OUTINIT OFFSET(20) NUMBITS(1) [
            Low = 0,
            High = 1
        ]
    ]
];

#[allow(unsafe_code)]
pub const GPIOTE: StaticRef<GpioteRegisters> =
    unsafe { StaticRef::new(0x4000_6000 as *const GpioteRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for GpioteRegisters {}

/// What `TASKS_OUT` does to the pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Polarity {
    None = 0,
    /// Drive high
    LoToHi = 1,
    /// Drive low
    HiToLo = 2,
    Toggle = 3,
}

fn check(chip: Chip, channel: u8) -> Result<usize, Error> {
    if channel >= chip.gpiote_channels() {
        Err(Error::InvalidChannel(channel))
    } else {
        Ok(channel as usize)
    }
}

/// Put `channel` in task mode on `pin`
///
/// The pin is owned by GPIOTE afterwards; `initial_high` sets its level until
/// the first task. `TASKS_OUT` is written 0 to leave the task idle.
pub fn configure_task(
    gpiote: &GpioteRegisters,
    chip: Chip,
    channel: u8,
    pin: u8,
    polarity: Polarity,
    initial_high: bool,
) -> Result<(), Error> {
    let index = check(chip, channel)?;

    let outinit = if initial_high {
        Config::OUTINIT::High
    } else {
        Config::OUTINIT::Low
    };
    gpiote.config[index].write(
        Config::MODE::Task
            + Config::PSEL.val(pin as u32)
            + Config::POLARITY.val(polarity as u32)
            + outinit,
    );
    gpiote.tasks_out[index].set(0);
    Ok(())
}

/// Release `channel`, handing the pin back to GPIO
pub fn disable(gpiote: &GpioteRegisters, chip: Chip, channel: u8) -> Result<(), Error> {
    let index = check(chip, channel)?;
    gpiote.config[index].write(Config::MODE::Disabled);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bareboard_hal::mock::zeroed;
    use tock_registers::interfaces::Readable;

    #[test]
    fn test_toggle_task_on_led1() {
        let gpiote = zeroed::<GpioteRegisters>();
        configure_task(&gpiote, Chip::Nrf51, 0, 21, Polarity::Toggle, false).unwrap();

        assert_eq!(gpiote.config[0].get(), 0x0003_1503);
    }

    #[test]
    fn test_outinit_high() {
        let gpiote = zeroed::<GpioteRegisters>();
        configure_task(&gpiote, Chip::Nrf52, 3, 17, Polarity::HiToLo, true).unwrap();
        assert_eq!(gpiote.config[3].get(), 0x0012_1103);
    }

    #[test]
    fn test_disable_releases_pin() {
        let gpiote = zeroed::<GpioteRegisters>();
        configure_task(&gpiote, Chip::Nrf52, 1, 18, Polarity::Toggle, false).unwrap();
        disable(&gpiote, Chip::Nrf52, 1).unwrap();
        assert_eq!(gpiote.config[1].get(), 0);
    }

    #[test]
    fn test_channel_limit_follows_chip() {
        let gpiote = zeroed::<GpioteRegisters>();
        assert_eq!(
            configure_task(&gpiote, Chip::Nrf51, 4, 21, Polarity::Toggle, false),
            Err(Error::InvalidChannel(4))
        );
        assert_eq!(
            configure_task(&gpiote, Chip::Nrf52, 7, 17, Polarity::Toggle, false),
            Ok(())
        );
        assert_eq!(
            configure_task(&gpiote, Chip::Nrf52, 8, 17, Polarity::Toggle, false),
            Err(Error::InvalidChannel(8))
        );
        assert_eq!(disable(&gpiote, Chip::Nrf51, 5), Err(Error::InvalidChannel(5)));
        assert_eq!(gpiote.config[4].get(), 0);
    }
}
