//! Bareboard sleep-loop firmwares
//!
//! Every application here follows the same shape:
//!
//! 1. `setup` programs the peripherals once (clocks, pins, timers, PPI).
//! 2. The CPU sleeps until an event or interrupt.
//! 3. An interrupt handler acknowledges its event and latches a flag or
//!    advances a state counter in the application's `Shared` block.
//! 4. `on_wake` looks at the flags, performs one fixed action and returns.
//!
//! `run` is the endless `sleep(); on_wake()` loop. Interrupt handlers are
//! plain functions taking the shared block; wiring them into a vector table
//! is left to the board crate.
//!
//! # Applications
//!
//! | Module | Chip | Wake source |
//! |--------|------|-------------|
//! | [`apps::light_meter`] | nRF51 + BH1750 | TIMER0 compare |
//! | [`apps::dac_stepper`] | nRF51 + MCP4725 | TIMER0 compare |
//! | [`apps::vdd_monitor`] | nRF51 | none, PPI does the work |
//! | [`apps::temp_logger`] | nRF52 | TEMP data ready, UART0 TX ready |
//! | [`apps::hibernate_blink`] | ADuCM3029 | RTC alarm |

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod apps;
pub mod error;
pub mod event;
pub mod tx;

#[cfg(test)]
mod mock;

pub use error::AppError;
pub use event::{EventLatch, StateCounter};
pub use tx::{TxBuffer, TxError};
