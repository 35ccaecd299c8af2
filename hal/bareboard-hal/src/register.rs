//! Memory-mapped register blocks
//!
//! Chip crates lay their peripherals out with `tock-registers`
//! (`register_structs!` for the block, `register_bitfields!` for the fields)
//! and reach the silicon through a [`StaticRef`] to that block. Configuration
//! routines only ever see `&XxxRegisters`, so host tests hand them the same
//! structs allocated in RAM (`mock::zeroed`).
//!
//! Busy-waits on status registers go through [`spin_until`], which calls a
//! [`Backoff`] between two checks. On target that is [`Spin`]; a test puts
//! the peripheral's reaction there instead.

#![allow(unsafe_code)]

use core::fmt;
use core::ops::Deref;

/// Reference to a register block at a fixed bus address
pub struct StaticRef<T> {
    ptr: *const T,
}

impl<T> StaticRef<T> {
    /// # Safety
    ///
    /// `ptr` must be the aligned base address of a peripheral laid out
    /// exactly as `T`, valid for the whole program.
    pub const unsafe fn new(ptr: *const T) -> Self {
        Self { ptr }
    }

    /// The block, borrowed for the rest of the program
    pub fn get(self) -> &'static T {
        // SAFETY: `new` requires a block that lives forever
        unsafe { &*self.ptr }
    }

    /// Bus address of the block
    pub fn address(self) -> usize {
        self.ptr as usize
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T> Deref for StaticRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: see `get`
        unsafe { &*self.ptr }
    }
}

impl<T> fmt::Debug for StaticRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticRef({:#010x})", self.ptr as usize)
    }
}

/// Register block for which all-zero memory is a valid value
///
/// # Safety
///
/// The type must consist of `tock-registers` cells and reserved padding only.
pub unsafe trait RegisterBlock {}

/// A bounded wait ran out of budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// Step taken between two checks of a status register
pub trait Backoff {
    fn backoff(&mut self);
}

impl<B: Backoff + ?Sized> Backoff for &mut B {
    fn backoff(&mut self) {
        (**self).backoff()
    }
}

/// Plain busy-wait
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl Backoff for Spin {
    fn backoff(&mut self) {
        core::hint::spin_loop();
    }
}

/// Check `done` at most `budget` times, backing off after every miss
pub fn spin_until<B, F>(budget: u32, backoff: &mut B, mut done: F) -> Result<(), Timeout>
where
    B: Backoff + ?Sized,
    F: FnMut() -> bool,
{
    for _ in 0..budget {
        if done() {
            return Ok(());
        }
        backoff.backoff();
    }
    Err(Timeout)
}
