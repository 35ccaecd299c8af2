//! TEMP: on-die temperature sensor
//!
//! One measurement per `TASKS_START`; `EVENTS_DATARDY` fires when `TEMP`
//! holds the result in 0.25 °C steps (two's complement).

use bareboard_hal::StaticRef;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, EventRegister, TaskRegister};

register_structs! {
    pub TempRegisters {
        (0x000 => pub tasks_start: TaskRegister),
        (0x004 => pub tasks_stop: TaskRegister),
        (0x008 => _reserved0),
        (0x100 => pub events_datardy: EventRegister),
        (0x104 => _reserved1),
        (0x304 => pub intenset: ReadWrite<u32, Inten::Register>),
        (0x308 => pub intenclr: ReadWrite<u32, Inten::Register>),
        (0x30C => _reserved2),
        (0x508 => pub temp: ReadOnly<u32>),
        (0x50C => @END),
    }
}

register_bitfields![u32,
    Inten [
        DATARDY OFFSET(0) NUMBITS(1) []
    ]
];

#[allow(unsafe_code)]
pub const TEMP: StaticRef<TempRegisters> =
    unsafe { StaticRef::new(0x4000_C000 as *const TempRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for TempRegisters {}

/// Raise the TEMP interrupt on `EVENTS_DATARDY`
pub fn configure_interrupt(temp: &TempRegisters) {
    clear(&temp.events_datardy);
    temp.intenset.write(Inten::DATARDY::SET);
}

/// Acknowledge `EVENTS_DATARDY` (top of the TEMP interrupt handler)
pub fn clear_data_ready(temp: &TempRegisters) {
    clear(&temp.events_datardy);
}

/// Last measurement in quarter degrees
pub fn read_raw(temp: &TempRegisters) -> i32 {
    temp.temp.get() as i32
}

/// Quarter-degree reading to °C, with the +0.5 °C offset the readout uses
pub fn celsius(raw: i32) -> f32 {
    raw as f32 / 4.0 + 0.5
}

/// [`celsius`] truncated toward zero to whole degrees
pub const fn whole_degrees(raw: i32) -> i32 {
    (raw + 2) / 4
}
