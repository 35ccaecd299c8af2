//! Flags shared between interrupt handlers and the main loop
//!
//! Each flag has one writer in interrupt context and one reader in the main
//! loop. They are atomics rather than mutex-protected values so an interrupt
//! handler never waits. `portable-atomic` supplies swap and fetch-add on
//! cores without them (Cortex-M0) through a critical section.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// One-bit event latch ("something happened, go look")
#[derive(Debug, Default)]
pub struct EventLatch(AtomicBool);

impl EventLatch {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Read and clear in one step
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Step counter advanced by a periodic interrupt
///
/// The main loop dispatches on [`get`](Self::get) and calls
/// [`reset`](Self::reset) once a cycle is complete.
#[derive(Debug, Default)]
pub struct StateCounter(AtomicU32);

impl StateCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Move to the next state, returns the new value
    pub fn advance(&self) -> u32 {
        self.0.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latch_take_clears() {
        let latch = EventLatch::new();
        assert!(!latch.take());

        latch.set();
        assert!(latch.is_set());
        assert!(latch.take());
        assert!(!latch.is_set());
        assert!(!latch.take());
    }

    #[test]
    fn test_latch_clear() {
        let latch = EventLatch::new();
        latch.set();
        latch.clear();
        assert!(!latch.is_set());
    }

    #[test]
    fn test_counter_advance_and_reset() {
        let state = StateCounter::new();
        assert_eq!(state.advance(), 1);
        assert_eq!(state.advance(), 2);
        assert_eq!(state.get(), 2);

        state.reset();
        assert_eq!(state.get(), 0);
    }

    #[test]
    fn test_counter_wraps() {
        let state = StateCounter(AtomicU32::new(u32::MAX));
        assert_eq!(state.advance(), 0);
    }

    proptest! {
        #[test]
        fn counter_counts_every_advance(ticks in 0u32..500) {
            let state = StateCounter::new();
            for _ in 0..ticks {
                state.advance();
            }
            prop_assert_eq!(state.get(), ticks);
        }
    }
}
