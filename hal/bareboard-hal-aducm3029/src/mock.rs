//! ADuCM3029 register blocks in RAM

use std::boxed::Box;

use bareboard_hal::mock::zeroed;
use bareboard_hal::Backoff;
use tock_registers::interfaces::{ReadWriteable, Readable};

use crate::clock::{ClkRegisters, OscCtl, OscRegisters};
use crate::{gpio, pmg, rtc, Peripherals};

/// Every peripheral of [`Peripherals`], zeroed
pub struct RamPeripherals {
    gpio: [Box<gpio::GpioRegisters>; 3],
    pmg: Box<pmg::PmgRegisters>,
    osc: Box<OscRegisters>,
    clk: Box<ClkRegisters>,
    rtc1: Box<rtc::RtcRegisters>,
}

impl RamPeripherals {
    pub fn new() -> Self {
        Self {
            gpio: [zeroed(), zeroed(), zeroed()],
            pmg: zeroed(),
            osc: zeroed(),
            clk: zeroed(),
            rtc1: zeroed(),
        }
    }

    pub fn peripherals(&self) -> Peripherals<'_> {
        Peripherals {
            gpio0: &self.gpio[0],
            gpio1: &self.gpio[1],
            gpio2: &self.gpio[2],
            pmg: &self.pmg,
            osc: &self.osc,
            clk: &self.clk,
            rtc1: &self.rtc1,
        }
    }
}

impl Default for RamPeripherals {
    fn default() -> Self {
        Self::new()
    }
}

/// LF crystal that reports stable `after` backoffs once enabled
pub struct CrystalStartup<'a> {
    osc: &'a OscRegisters,
    after: u32,
    backoffs: u32,
}

impl<'a> CrystalStartup<'a> {
    pub fn after(osc: &'a OscRegisters, after: u32) -> Self {
        Self {
            osc,
            after,
            backoffs: 0,
        }
    }

    pub fn backoffs(&self) -> u32 {
        self.backoffs
    }
}

impl Backoff for CrystalStartup<'_> {
    fn backoff(&mut self) {
        self.backoffs += 1;
        if self.backoffs >= self.after && self.osc.ctl.is_set(OscCtl::LFXTALEN) {
            self.osc.ctl.modify(OscCtl::LFXTALOK::SET);
        }
    }
}
