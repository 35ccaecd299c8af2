//! Low-power wait abstractions
//!
//! The Bareboard firmwares spend almost all their time asleep. [`WaitForEvent`]
//! wraps the core's sleep instructions so the loop logic can run on the host;
//! [`LowPower`] is the chip-level "go to sleep until something happens" step
//! (sub-power-mode selection plus the instruction sequence).

/// Core sleep instructions
pub trait WaitForEvent {
    /// Wait for event (`WFE`)
    fn wfe(&mut self);

    /// Send event (`SEV`), sets the local event register
    fn sev(&mut self);

    /// Wait for interrupt (`WFI`)
    fn wfi(&mut self);

    /// `WFE; SEV; WFE`
    ///
    /// The first `WFE` sleeps, `SEV` + second `WFE` clears any event that was
    /// latched while awake so the next sleep is not skipped.
    fn sleep_and_clear_events(&mut self) {
        self.wfe();
        self.sev();
        self.wfe();
    }
}

/// Chip-level sleep step used by the firmware main loops
pub trait LowPower {
    /// Enter the configured low-power state and return after wake-up
    fn sleep(&mut self);
}

/// Cortex-M implementation of [`WaitForEvent`]
#[cfg(feature = "cortex-m")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CortexM;

#[cfg(feature = "cortex-m")]
impl WaitForEvent for CortexM {
    fn wfe(&mut self) {
        cortex_m::asm::wfe();
    }

    fn sev(&mut self) {
        cortex_m::asm::sev();
    }

    fn wfi(&mut self) {
        cortex_m::asm::wfi();
    }
}
