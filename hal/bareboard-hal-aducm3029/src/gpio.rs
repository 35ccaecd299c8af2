//! GPIO ports
//!
//! Three 16-bit ports. `SET`, `CLR` and `TGL` act on the bits written as 1,
//! so pin updates need no read-modify-write.

use bareboard_hal::{OutputPin, StaticRef};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::register_structs;
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};

use crate::Peripherals;

register_structs! {
    pub GpioRegisters {
        (0x00 => pub cfg: ReadWrite<u32>),
        (0x04 => pub oen: ReadWrite<u16>),
        (0x06 => _reserved0),
        (0x08 => pub pe: ReadWrite<u16>),
        (0x0A => _reserved1),
        (0x0C => pub ien: ReadWrite<u16>),
        (0x0E => _reserved2),
        (0x10 => pub in_: ReadOnly<u16>),
        (0x12 => _reserved3),
        (0x14 => pub out: ReadWrite<u16>),
        (0x16 => _reserved4),
        (0x18 => pub set: WriteOnly<u16>),
        (0x1A => _reserved5),
        (0x1C => pub clr: WriteOnly<u16>),
        (0x1E => _reserved6),
        (0x20 => pub tgl: WriteOnly<u16>),
        (0x22 => _reserved7),
        (0x24 => @END),
    }
}

#[allow(unsafe_code)]
pub const GPIO0: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x4002_0000 as *const GpioRegisters) };

#[allow(unsafe_code)]
pub const GPIO1: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x4002_0040 as *const GpioRegisters) };

#[allow(unsafe_code)]
pub const GPIO2: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x4002_0080 as *const GpioRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for GpioRegisters {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    P0,
    P1,
    P2,
}

/// Enable the output driver of the pins in `mask`
pub fn configure_output(port: &GpioRegisters, mask: u16) {
    port.oen.set(port.oen.get() | mask);
}

/// Port pin, e.g. `P2.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinId {
    pub port: Port,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    pub const fn mask(self) -> u16 {
        1 << self.pin
    }
}

/// ADICUP3029 LED DS3 (green)
pub const DS3: PinId = PinId::new(Port::P2, 0);
/// ADICUP3029 LED DS4 (blue)
pub const DS4: PinId = PinId::new(Port::P1, 15);

/// Output pin
#[derive(Clone, Copy)]
pub struct AducPin<'a> {
    port: &'a GpioRegisters,
    id: PinId,
}

impl<'a> AducPin<'a> {
    /// Enable the output driver and wrap the pin
    pub fn output(peripherals: &Peripherals<'a>, id: PinId) -> Self {
        let port = peripherals.port(id.port);
        configure_output(port, id.mask());
        Self { port, id }
    }

    pub fn id(&self) -> PinId {
        self.id
    }
}

impl OutputPin for AducPin<'_> {
    fn set_high(&mut self) {
        self.port.set.set(self.id.mask());
    }

    fn set_low(&mut self) {
        self.port.clr.set(self.id.mask());
    }

    fn toggle(&mut self) {
        self.port.tgl.set(self.id.mask());
    }

    fn is_set_high(&mut self) -> bool {
        self.port.out.get() & self.id.mask() != 0
    }
}
