//! Host-side doubles for register-level code
//!
//! Register blocks are the chip crates' own `tock-registers` structs,
//! allocated zeroed in RAM by [`zeroed`]. Configuration code writes them
//! through the normal register interfaces; tests read them back. The two
//! accessors the interfaces do not offer are here: the value last written to
//! a write-only register ([`last_written`]) and loading a read-only register
//! before the code under test borrows the block ([`preset`]).

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::boxed::Box;
use std::cell::RefCell;
use std::rc::Rc;

use tock_registers::registers::{ReadOnly, WriteOnly};
use tock_registers::{RegisterLongName, UIntLike};

use crate::power::WaitForEvent;
use crate::register::{Backoff, RegisterBlock};

/// Register block in RAM with every register reading 0
pub fn zeroed<T: RegisterBlock>() -> Box<T> {
    let layout = Layout::new::<T>();
    assert!(layout.size() > 0, "register block without registers");

    // SAFETY: `RegisterBlock` guarantees the all-zero bit pattern is a valid
    // `T`, and the allocation uses `T`'s own layout
    unsafe {
        let ptr = alloc::alloc_zeroed(layout) as *mut T;
        if ptr.is_null() {
            alloc::handle_alloc_error(layout);
        }
        Box::from_raw(ptr)
    }
}

/// Value last written to a write-only register (0 if never written)
pub fn last_written<T: UIntLike, R: RegisterLongName>(register: &WriteOnly<T, R>) -> T {
    // SAFETY: `WriteOnly` is a transparent wrapper around `UnsafeCell<T>`
    unsafe { core::ptr::read_volatile(register as *const WriteOnly<T, R> as *const T) }
}

/// Load a read-only register, standing in for the peripheral
pub fn preset<T: UIntLike, R: RegisterLongName>(register: &mut ReadOnly<T, R>, value: T) {
    // SAFETY: `ReadOnly` is a transparent wrapper around `T`, and `register`
    // is borrowed exclusively
    unsafe { core::ptr::write_volatile(register as *mut ReadOnly<T, R> as *mut T, value) }
}

/// Backoff of a peripheral that never becomes ready
#[derive(Debug, Default)]
pub struct Stalled {
    backoffs: u32,
}

impl Stalled {
    /// Backoffs taken so far, one per failed check
    pub fn backoffs(&self) -> u32 {
        self.backoffs
    }
}

impl Backoff for Stalled {
    fn backoff(&mut self) {
        self.backoffs += 1;
    }
}

#[derive(Debug, Default)]
struct CoreCounters {
    wfe: usize,
    sev: usize,
    wfi: usize,
}

/// Counts sleep instructions instead of executing them
#[derive(Debug, Clone, Default)]
pub struct MockCore {
    counters: Rc<RefCell<CoreCounters>>,
}

impl MockCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wfe_count(&self) -> usize {
        self.counters.borrow().wfe
    }

    pub fn sev_count(&self) -> usize {
        self.counters.borrow().sev
    }

    pub fn wfi_count(&self) -> usize {
        self.counters.borrow().wfi
    }
}

impl WaitForEvent for MockCore {
    fn wfe(&mut self) {
        self.counters.borrow_mut().wfe += 1;
    }

    fn sev(&mut self) {
        self.counters.borrow_mut().sev += 1;
    }

    fn wfi(&mut self) {
        self.counters.borrow_mut().wfi += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::interfaces::{Readable, Writeable};
    use tock_registers::registers::ReadWrite;
    use tock_registers::{register_bitfields, register_structs};

    register_bitfields![u32,
        Control [
            ENABLE OFFSET(0) NUMBITS(1) [],
            MODE OFFSET(4) NUMBITS(2) [
                Idle = 0,
                Run = 2
            ]
        ]
    ];

    register_structs! {
        Block {
            (0x000 => start: WriteOnly<u32>),
            (0x004 => _reserved0),
            (0x100 => ready: ReadWrite<u32>),
            (0x104 => control: ReadWrite<u32, Control::Register>),
            (0x108 => result: ReadOnly<u32>),
            (0x10C => @END),
        }
    }

    unsafe impl RegisterBlock for Block {}

    #[test]
    fn test_zeroed_block_reads_zero() {
        let block = zeroed::<Block>();
        assert_eq!(block.ready.get(), 0);
        assert_eq!(block.control.get(), 0);
        assert_eq!(block.result.get(), 0);
        assert_eq!(last_written(&block.start), 0);
    }

    #[test]
    fn test_fields_land_in_ram() {
        let block = zeroed::<Block>();
        block.control.write(Control::ENABLE::SET + Control::MODE::Run);
        assert_eq!(block.control.get(), 0b10_0001);

        block.start.set(1);
        assert_eq!(last_written(&block.start), 1);
    }

    #[test]
    fn test_preset_read_only() {
        let mut block = zeroed::<Block>();
        preset(&mut block.result, 0xBC);
        assert_eq!(block.result.get(), 0xBC);
    }
}
