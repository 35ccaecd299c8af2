//! Applications
//!
//! Each module has a `Config` with the board defaults, a `Shared` block for
//! the interrupt/main-loop flags (one `static` per board), `setup`, the
//! interrupt handlers and an application struct with `on_wake` and `run`.
//! `setup` takes the chip's `Peripherals`, so the same code runs against the
//! memory-mapped blocks and against RAM copies in the tests.

use bareboard_hal::gpio::{Led, Polarity};
use bareboard_hal_nrf::gpio::{GpioRegisters, NrfPin};

pub mod dac_stepper;
pub mod hibernate_blink;
pub mod light_meter;
pub mod temp_logger;
pub mod vdd_monitor;

/// Status LED on an nRF5x DK (active low, already configured by `setup`)
pub fn nrf_status_led(gpio: &GpioRegisters, pin: u8) -> Led<NrfPin<'_>> {
    Led::new(NrfPin::new(gpio, pin), Polarity::ActiveLow)
}
