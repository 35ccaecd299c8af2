//! Bareboard Hardware Abstraction Layer
//!
//! This crate defines the small set of traits the chip-specific HALs
//! (nRF51/nRF52, ADuCM3029) implement and the firmware applications consume.
//! Sensor drivers talk to their bus through `embedded-hal` directly; the
//! pieces here cover what `embedded-hal` does not: register block plumbing
//! for the `tock-registers` maps, interrupt-fed UART transmission and the
//! core sleep instructions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  bareboard-firmware (sleep loops)       │
//! └─────────────────────────────────────────┘
//!            │                     │
//!            ▼                     ▼
//! ┌──────────────────────┐ ┌───────────────────┐
//! │ bareboard-hal        │ │ bareboard-drivers │
//! │ (this crate, traits) │ │ (embedded-hal)    │
//! └──────────────────────┘ └───────────────────┘
//!            │
//!     ┌──────┴──────────────┐
//!     ▼                     ▼
//! ┌───────────────┐ ┌──────────────────────┐
//! │ bareboard-    │ │ bareboard-hal-       │
//! │   hal-nrf     │ │   aducm3029          │
//! └───────────────┘ └──────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`register::Backoff`] - Step between two checks of a busy-wait
//! - [`gpio::OutputPin`] - Digital output (LEDs)
//! - [`uart::UartTx`] - Interrupt-driven serial transmission
//! - [`power::WaitForEvent`], [`power::LowPower`] - Sleep until an event

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod power;
pub mod register;
pub mod uart;

#[cfg(any(test, feature = "std"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use i2c::I2cConfig;
pub use power::{LowPower, WaitForEvent};
pub use register::{spin_until, Backoff, RegisterBlock, Spin, StaticRef, Timeout};
pub use uart::UartTx;
