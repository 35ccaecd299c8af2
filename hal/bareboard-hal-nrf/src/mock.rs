//! nRF5x register blocks in RAM
//!
//! [`RamPeripherals`] owns one zeroed block per peripheral and lends them out
//! as [`Peripherals`], so firmware code written against the memory-mapped set
//! runs unchanged on the host. [`ClockStartup`] plays the CLOCK block's part
//! of a start-up wait.

use std::boxed::Box;

use bareboard_hal::mock::{last_written, zeroed};
use bareboard_hal::Backoff;
use tock_registers::interfaces::Writeable;

use crate::clock::ClockRegisters;
use crate::{adc, clock, gpio, gpiote, power, ppi, rtc, temp, timer, twi, uart, Peripherals};

/// Every peripheral of [`Peripherals`], zeroed
pub struct RamPeripherals {
    clock: Box<clock::ClockRegisters>,
    power: Box<power::PowerRegisters>,
    gpio: Box<gpio::GpioRegisters>,
    gpiote: Box<gpiote::GpioteRegisters>,
    ppi: Box<ppi::PpiRegisters>,
    rtc: [Box<rtc::RtcRegisters>; 3],
    timer: [Box<timer::TimerRegisters>; 3],
    adc: Box<adc::AdcRegisters>,
    temp: Box<temp::TempRegisters>,
    uart0: Box<uart::UartRegisters>,
    twi0: Box<twi::TwiRegisters>,
}

impl RamPeripherals {
    pub fn new() -> Self {
        Self {
            clock: zeroed(),
            power: zeroed(),
            gpio: zeroed(),
            gpiote: zeroed(),
            ppi: zeroed(),
            rtc: [zeroed(), zeroed(), zeroed()],
            timer: [zeroed(), zeroed(), zeroed()],
            adc: zeroed(),
            temp: zeroed(),
            uart0: zeroed(),
            twi0: zeroed(),
        }
    }

    pub fn peripherals(&self) -> Peripherals<'_> {
        Peripherals {
            clock: &self.clock,
            power: &self.power,
            gpio: &self.gpio,
            gpiote: &self.gpiote,
            ppi: &self.ppi,
            rtc0: &self.rtc[0],
            rtc1: &self.rtc[1],
            rtc2: &self.rtc[2],
            timer0: &self.timer[0],
            timer1: &self.timer[1],
            timer2: &self.timer[2],
            adc: &self.adc,
            temp: &self.temp,
            uart0: &self.uart0,
            twi0: &self.twi0,
        }
    }

    /// Mutable access for presetting read-only registers
    pub fn temp_mut(&mut self) -> &mut temp::TempRegisters {
        &mut self.temp
    }

    pub fn adc_mut(&mut self) -> &mut adc::AdcRegisters {
        &mut self.adc
    }
}

impl Default for RamPeripherals {
    fn default() -> Self {
        Self::new()
    }
}

/// Oscillators that come up `after` backoffs once their start task is
/// written
pub struct ClockStartup<'a> {
    clock: &'a ClockRegisters,
    after: u32,
    backoffs: u32,
    hfclk_started: bool,
    lfclk_started: bool,
}

impl<'a> ClockStartup<'a> {
    pub fn after(clock: &'a ClockRegisters, after: u32) -> Self {
        Self {
            clock,
            after,
            backoffs: 0,
            hfclk_started: false,
            lfclk_started: false,
        }
    }

    pub fn backoffs(&self) -> u32 {
        self.backoffs
    }
}

impl Backoff for ClockStartup<'_> {
    fn backoff(&mut self) {
        self.backoffs += 1;
        if self.backoffs < self.after {
            return;
        }

        let clock = self.clock;
        if !self.hfclk_started && last_written(&clock.tasks_hfclkstart) == 1 {
            self.hfclk_started = true;
            clock.events_hfclkstarted.set(1);
        }
        if !self.lfclk_started && last_written(&clock.tasks_lfclkstart) == 1 {
            self.lfclk_started = true;
            clock.events_lfclkstarted.set(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::interfaces::Readable;

    #[test]
    fn test_blocks_are_distinct() {
        let ram = RamPeripherals::new();
        let p = ram.peripherals();
        p.rtc1.prescaler.set(7);
        assert_eq!(p.rtc0.prescaler.get(), 0);
        assert_eq!(p.rtc2.prescaler.get(), 0);
        assert!(!core::ptr::eq(p.timer0, p.timer1));
    }

    #[test]
    fn test_clock_startup_waits_for_task() {
        let ram = RamPeripherals::new();
        let clock = ram.peripherals().clock;
        let mut startup = ClockStartup::after(clock, 1);

        startup.backoff();
        assert_eq!(clock.events_lfclkstarted.get(), 0);

        clock.tasks_lfclkstart.set(1);
        startup.backoff();
        assert_eq!(clock.events_lfclkstarted.get(), 1);
        assert_eq!(clock.events_hfclkstarted.get(), 0);
    }
}
