//! ADuCM3029 peripheral configuration
//!
//! GPIO ports, the PMG power-mode key sequence, the LF crystal and clock
//! gates, and RTC1 as the periodic wake-up source. Every block is a
//! `tock-registers` struct; [`Peripherals::memory_mapped`] hands out the
//! real instances and host tests build them in RAM (`mock::RamPeripherals`).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod pmg;
pub mod rtc;

#[cfg(any(test, feature = "std"))]
pub mod mock;

mod error;

pub use error::Error;

/// Default number of status checks a bounded wait may spend
pub const DEFAULT_SPIN_BUDGET: u32 = 100_000;

/// The register blocks the firmwares program
#[derive(Clone, Copy)]
pub struct Peripherals<'a> {
    pub gpio0: &'a gpio::GpioRegisters,
    pub gpio1: &'a gpio::GpioRegisters,
    pub gpio2: &'a gpio::GpioRegisters,
    pub pmg: &'a pmg::PmgRegisters,
    pub osc: &'a clock::OscRegisters,
    pub clk: &'a clock::ClkRegisters,
    pub rtc1: &'a rtc::RtcRegisters,
}

impl<'a> Peripherals<'a> {
    /// Register block of `port`
    pub fn port(&self, port: gpio::Port) -> &'a gpio::GpioRegisters {
        match port {
            gpio::Port::P0 => self.gpio0,
            gpio::Port::P1 => self.gpio1,
            gpio::Port::P2 => self.gpio2,
        }
    }
}

impl Peripherals<'static> {
    /// The memory-mapped instances
    pub fn memory_mapped() -> Self {
        Self {
            gpio0: gpio::GPIO0.get(),
            gpio1: gpio::GPIO1.get(),
            gpio2: gpio::GPIO2.get(),
            pmg: pmg::PMG0.get(),
            osc: clock::CLKG0_OSC.get(),
            clk: clock::CLKG0_CLK.get(),
            rtc1: rtc::RTC1.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_addresses() {
        assert_eq!(gpio::GPIO1.address(), 0x4002_0040);
        assert_eq!(gpio::GPIO2.address(), 0x4002_0080);
        assert_eq!(pmg::PMG0.address(), 0x4004_C000);
        assert_eq!(clock::CLKG0_OSC.address(), 0x4004_C10C);
        assert_eq!(rtc::RTC1.address(), 0x4000_1400);
    }

    #[test]
    fn test_port_lookup() {
        let ram = mock::RamPeripherals::new();
        let p = ram.peripherals();
        assert!(core::ptr::eq(p.port(gpio::Port::P1), p.gpio1));
        assert!(core::ptr::eq(p.port(gpio::Port::P2), p.gpio2));
    }
}
