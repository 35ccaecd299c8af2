//! Interrupt-fed UART transmission
//!
//! The main loop hands a message to [`TxBuffer::start`], which copies it,
//! marks the buffer busy and loads the first byte. Every TX-ready interrupt
//! then calls [`TxBuffer::on_tx_ready`] to load the next byte; after the last
//! one the transmitter is stopped and the busy flag drops. The CPU is free to
//! sleep in between.

use core::cell::RefCell;

use bareboard_hal::UartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::event::EventLatch;

/// Why a transmission could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxError<E> {
    /// Previous message still going out
    Busy,
    /// Message longer than the buffer
    TooLong(usize),
    /// UART refused the first byte
    Uart(E),
}

struct Pending<const N: usize> {
    bytes: Vec<u8, N>,
    next: usize,
}

/// Message buffer and read position walked by the TX-ready interrupt
pub struct TxBuffer<const N: usize> {
    pending: Mutex<CriticalSectionRawMutex, RefCell<Pending<N>>>,
    busy: EventLatch,
}

impl<const N: usize> TxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Pending {
                bytes: Vec::new(),
                next: 0,
            })),
            busy: EventLatch::new(),
        }
    }

    /// Buffer capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// A message is being transmitted
    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    /// Copy `message` and start sending it
    ///
    /// An empty message is a no-op.
    pub fn start<U: UartTx>(&self, uart: &mut U, message: &[u8]) -> Result<(), TxError<U::Error>> {
        let Some(&first) = message.first() else {
            return Ok(());
        };
        if self.busy.is_set() {
            return Err(TxError::Busy);
        }

        self.pending.lock(|cell| {
            let mut pending = cell.borrow_mut();
            pending.bytes.clear();
            pending
                .bytes
                .extend_from_slice(message)
                .map_err(|_| TxError::TooLong(message.len()))?;
            pending.next = 1;
            Ok::<(), TxError<U::Error>>(())
        })?;

        // Busy before the first byte: TX-ready can fire right after TXD is written
        self.busy.set();
        uart.start_tx(first).map_err(|e| {
            self.busy.clear();
            TxError::Uart(e)
        })
    }

    /// TX-ready interrupt: load the next byte or stop after the last one
    pub fn on_tx_ready<U: UartTx>(&self, uart: &mut U) -> Result<(), U::Error> {
        uart.clear_tx_ready();
        if !self.busy.is_set() {
            return Ok(());
        }

        let next = self.pending.lock(|cell| {
            let mut pending = cell.borrow_mut();
            let byte = pending.bytes.get(pending.next).copied();
            if byte.is_some() {
                pending.next += 1;
            }
            byte
        });

        match next {
            Some(byte) => uart.write_byte(byte),
            None => {
                let result = uart.stop_tx();
                self.busy.clear();
                result
            }
        }
    }
}

impl<const N: usize> Default for TxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
