//! Hibernate blinker on ADuCM3029 (ADICUP3029)
//!
//! RTC1 runs from the 32.768 kHz crystal so it keeps counting while the
//! core hibernates, and raises its alarm once a second. The alarm interrupt
//! acknowledges RTC1, moves the alarm one period on and latches a flag;
//! after waking the main loop toggles DS3 and DS4 and hibernates again.

use bareboard_hal::{Backoff, LowPower, OutputPin};
use bareboard_hal_aducm3029::gpio::{self, AducPin, PinId};
use bareboard_hal_aducm3029::rtc::{self, RtcRegisters};
use bareboard_hal_aducm3029::{clock, Error, Peripherals};

use crate::event::EventLatch;

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub first_led: PinId,
    pub second_led: PinId,
    /// RTC1 counts at `32768 >> rtc_prescale_exp` Hz
    pub rtc_prescale_exp: u8,
    /// Counts between alarms
    pub alarm_period: u32,
    /// Checks of `LFXTALOK` and of each pending RTC write before giving up
    pub clock_budget: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_led: gpio::DS3,
            second_led: gpio::DS4,
            rtc_prescale_exp: rtc::MAX_PRESCALE_EXP,
            alarm_period: 1,
            clock_budget: bareboard_hal_aducm3029::DEFAULT_SPIN_BUDGET,
        }
    }
}

/// State shared with the RTC interrupt
pub struct Shared {
    pub alarm: EventLatch,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            alarm: EventLatch::new(),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Ungate GPIO, start the LF crystal, arm the periodic RTC1 alarm and make
/// both LED pins outputs
///
/// `backoff` runs between status checks of the crystal and RTC1.
pub fn setup<'a, B: Backoff>(
    p: &Peripherals<'a>,
    config: &Config,
    backoff: &mut B,
) -> Result<(AducPin<'a>, AducPin<'a>), Error> {
    clock::enable_gpio_clock(p.clk);
    clock::start_lfxtal(p.osc, config.clock_budget, backoff)?;
    rtc::configure_alarm_period(
        p.rtc1,
        config.rtc_prescale_exp,
        config.alarm_period,
        config.clock_budget,
        backoff,
    )?;
    rtc::enable_alarm_interrupt(p.rtc1);

    let first = AducPin::output(p, config.first_led);
    let second = AducPin::output(p, config.second_led);

    #[cfg(feature = "defmt")]
    defmt::info!(
        "hibernate_blink: alarm every {} counts at {} Hz",
        config.alarm_period,
        rtc::frequency_hz(config.rtc_prescale_exp)
    );
    Ok((first, second))
}

/// RTC1 interrupt
pub fn rtc_alarm_isr(rtc1: &RtcRegisters, period: u32, shared: &Shared) {
    rtc::acknowledge_alarm(rtc1, period);
    shared.alarm.set();
}

/// Main-loop side of the blinker
pub struct HibernateBlink<'a, A, B, S> {
    first: A,
    second: B,
    sleep: S,
    shared: &'a Shared,
}

impl<'a, A, B, S> HibernateBlink<'a, A, B, S>
where
    A: OutputPin,
    B: OutputPin,
    S: LowPower,
{
    pub fn new(first: A, second: B, sleep: S, shared: &'a Shared) -> Self {
        Self {
            first,
            second,
            sleep,
            shared,
        }
    }

    /// Toggle both LEDs if the alarm fired; returns whether it did
    pub fn on_wake(&mut self) -> bool {
        if !self.shared.alarm.take() {
            return false;
        }
        self.first.toggle();
        self.second.toggle();
        true
    }

    pub fn run(mut self) -> ! {
        loop {
            self.sleep.sleep();
            self.on_wake();
        }
    }
}
