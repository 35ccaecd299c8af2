//! GPIO: pin configuration and output pins
//!
//! Both DK boards wire their four LEDs active-low, so "off" means the pin is
//! driven high. [`configure_leds`] sets the output latch before switching the
//! pin to output, so the LEDs never flash at start-up.

use core::ops::RangeInclusive;

use bareboard_hal::{OutputPin, StaticRef};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

register_structs! {
    pub GpioRegisters {
        (0x000 => _reserved0),
        (0x504 => pub out: ReadWrite<u32>),
        (0x508 => pub outset: ReadWrite<u32>),
        (0x50C => pub outclr: ReadWrite<u32>),
        (0x510 => pub in_: ReadOnly<u32>),
        (0x514 => pub dir: ReadWrite<u32>),
        (0x518 => pub dirset: ReadWrite<u32>),
        (0x51C => pub dirclr: ReadWrite<u32>),
        (0x520 => _reserved1),
        (0x700 => pub pin_cnf: [ReadWrite<u32, PinCnf::Register>; 32]),
        (0x780 => @END),
    }
}

register_bitfields![u32,
    pub PinCnf [
        DIR OFFSET(0) NUMBITS(1) [
            Input = 0,
            Output = 1
        ],
        INPUT OFFSET(1) NUMBITS(1) [
            Connect = 0,
            Disconnect = 1
        ],
        PULL OFFSET(2) NUMBITS(2) [
            Disabled = 0,
            Pulldown = 1,
            Pullup = 3
        ],
        DRIVE OFFSET(8) NUMBITS(3) [
            S0S1 = 0
        ],
        SENSE OFFSET(16) NUMBITS(2) [
            Disabled = 0
        ]
    ]
];

#[allow(unsafe_code)]
pub const P0: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x5000_0000 as *const GpioRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for GpioRegisters {}

/// nRF51-DK LED1..LED4
pub const NRF51_DK_LEDS: RangeInclusive<u8> = 21..=24;
/// nRF52-DK LED1..LED4
pub const NRF52_DK_LEDS: RangeInclusive<u8> = 17..=20;

/// Pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    Disabled,
    Down,
    Up,
}

/// Configure `pin` as a standard-drive output with the input buffer
/// disconnected, no pull and no sense
pub fn configure_output(gpio: &GpioRegisters, pin: u8) {
    gpio.pin_cnf[pin as usize].write(
        PinCnf::DIR::Output
            + PinCnf::INPUT::Disconnect
            + PinCnf::PULL::Disabled
            + PinCnf::DRIVE::S0S1
            + PinCnf::SENSE::Disabled,
    );
}

/// Configure `pin` as a connected input with the given pull
pub fn configure_input(gpio: &GpioRegisters, pin: u8, pull: Pull) {
    let pull = match pull {
        Pull::Disabled => PinCnf::PULL::Disabled,
        Pull::Down => PinCnf::PULL::Pulldown,
        Pull::Up => PinCnf::PULL::Pullup,
    };
    gpio.pin_cnf[pin as usize].write(PinCnf::DIR::Input + PinCnf::INPUT::Connect + pull);
}

/// Drive every pin in `pins` high (LED off) and make it an output
pub fn configure_leds(gpio: &GpioRegisters, pins: RangeInclusive<u8>) {
    for pin in pins {
        gpio.outset.set(bit(pin));
        configure_output(gpio, pin);
    }
}

const fn bit(pin: u8) -> u32 {
    1 << pin
}

/// Output pin on P0
///
/// Uses the `OUTSET`/`OUTCLR` registers, so a pin handle in the main loop
/// and one in an interrupt handler never race on a read-modify-write of `OUT`.
#[derive(Clone, Copy)]
pub struct NrfPin<'a> {
    gpio: &'a GpioRegisters,
    pin: u8,
}

impl<'a> NrfPin<'a> {
    /// Wrap an already configured output pin
    pub fn new(gpio: &'a GpioRegisters, pin: u8) -> Self {
        Self { gpio, pin }
    }

    /// Configure `pin` as output, initially high, and wrap it
    pub fn output_high(gpio: &'a GpioRegisters, pin: u8) -> Self {
        gpio.outset.set(bit(pin));
        configure_output(gpio, pin);
        Self { gpio, pin }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl OutputPin for NrfPin<'_> {
    fn set_high(&mut self) {
        self.gpio.outset.set(bit(self.pin));
    }

    fn set_low(&mut self) {
        self.gpio.outclr.set(bit(self.pin));
    }

    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    fn is_set_high(&mut self) -> bool {
        self.gpio.out.get() & bit(self.pin) != 0
    }
}
