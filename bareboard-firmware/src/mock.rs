//! Doubles for application tests
//!
//! All of them share their state between clones, so a test can move one
//! clone into the application and keep another to look at afterwards.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use core::convert::Infallible;

use bareboard_hal::{LowPower, OutputPin, UartTx};
use embedded_hal::i2c::{self, I2c};

#[derive(Debug, Default)]
struct I2cLog {
    writes: Vec<(u8, Vec<u8>)>,
    reads: Vec<(u8, usize)>,
    responses: VecDeque<Vec<u8>>,
    fail: bool,
}

/// Scripted I2C bus
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    log: Rc<RefCell<I2cLog>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the bytes returned by the next read
    pub fn respond(&self, bytes: &[u8]) {
        self.log.borrow_mut().responses.push_back(bytes.to_vec());
    }

    /// Make every following transaction NACK
    pub fn fail(&self) {
        self.log.borrow_mut().fail = true;
    }

    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.log.borrow().writes.clone()
    }

    pub fn reads(&self) -> Vec<(u8, usize)> {
        self.log.borrow().reads.clone()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            return Err(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address,
            ));
        }

        for operation in operations {
            match operation {
                i2c::Operation::Write(bytes) => log.writes.push((address, bytes.to_vec())),
                i2c::Operation::Read(buffer) => {
                    log.reads.push((address, buffer.len()));
                    let response = log.responses.pop_front().unwrap_or_default();
                    for (slot, byte) in buffer.iter_mut().zip(response) {
                        *slot = byte;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartEvent {
    Start(u8),
    Byte(u8),
    Stop,
}

#[derive(Debug, Default)]
struct UartLog {
    events: Vec<UartEvent>,
    acks: usize,
}

/// Recording transmitter
#[derive(Debug, Clone, Default)]
pub struct MockUart {
    log: Rc<RefCell<UartLog>>,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UartEvent> {
        self.log.borrow().events.clone()
    }

    /// Bytes put on the line, in order
    pub fn sent(&self) -> Vec<u8> {
        self.log
            .borrow()
            .events
            .iter()
            .filter_map(|event| match event {
                UartEvent::Start(b) | UartEvent::Byte(b) => Some(*b),
                UartEvent::Stop => None,
            })
            .collect()
    }

    /// Number of acknowledged TX-ready events
    pub fn acks(&self) -> usize {
        self.log.borrow().acks
    }
}

impl UartTx for MockUart {
    type Error = Infallible;

    fn start_tx(&mut self, first: u8) -> Result<(), Self::Error> {
        self.log.borrow_mut().events.push(UartEvent::Start(first));
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.log.borrow_mut().events.push(UartEvent::Byte(byte));
        Ok(())
    }

    fn stop_tx(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().events.push(UartEvent::Stop);
        Ok(())
    }

    fn clear_tx_ready(&mut self) {
        self.log.borrow_mut().acks += 1;
    }
}

/// Output pin remembering its level and how often it toggled
#[derive(Debug, Clone, Default)]
pub struct FakePin {
    high: Rc<Cell<bool>>,
    toggles: Rc<Cell<usize>>,
}

impl FakePin {
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.high.set(high);
        pin
    }

    pub fn level(&self) -> bool {
        self.high.get()
    }

    pub fn toggles(&self) -> usize {
        self.toggles.get()
    }
}

impl OutputPin for FakePin {
    fn set_high(&mut self) {
        self.high.set(true);
    }

    fn set_low(&mut self) {
        self.high.set(false);
    }

    fn toggle(&mut self) {
        self.high.set(!self.high.get());
        self.toggles.set(self.toggles.get() + 1);
    }

    fn is_set_high(&mut self) -> bool {
        self.high.get()
    }
}

/// Sleep step that runs a closure in place of the interrupts that would
/// have woken the core
pub struct IsrSleep<F: FnMut()> {
    on_sleep: F,
    count: Rc<Cell<usize>>,
}

impl<F: FnMut()> IsrSleep<F> {
    pub fn new(on_sleep: F) -> Self {
        Self {
            on_sleep,
            count: Rc::default(),
        }
    }

    /// Shared sleep counter
    pub fn counter(&self) -> Rc<Cell<usize>> {
        self.count.clone()
    }
}

impl<F: FnMut()> LowPower for IsrSleep<F> {
    fn sleep(&mut self) {
        self.count.set(self.count.get() + 1);
        (self.on_sleep)();
    }
}

fn idle() {}

/// Sleep step with nothing pending
pub fn no_interrupts() -> IsrSleep<fn()> {
    IsrSleep::new(idle as fn())
}
