//! Supply voltage monitor on nRF51, run entirely by PPI
//!
//! ```text
//! RTC1 TICK (8 Hz) --PPI ch0--> ADC START
//! ADC END          --PPI ch1--> GPIOTE OUT[0] (toggle LED1)
//! ```
//!
//! The ADC samples VDD/3 against the 1.2 V band gap at 8 bits. No interrupt
//! is enabled; the CPU only sleeps, and LED1 blinking at 4 Hz shows the
//! chain is alive. `on_wake` is there for boards that enable the ADC END
//! interrupt and want the last reading.

use bareboard_hal::{Backoff, LowPower};
use bareboard_hal_nrf::adc::{self, AdcConfig, AdcRegisters, Input, Reference, Resolution};
use bareboard_hal_nrf::clock::{self, LfclkSource};
use bareboard_hal_nrf::gpiote::{self, Polarity};
use bareboard_hal_nrf::ppi::Ppi;
use bareboard_hal_nrf::{gpio, rtc, Chip, Peripherals};

/// GPIOTE channel driving the LED
pub const GPIOTE_CHANNEL: u8 = 0;
/// PPI channel RTC TICK -> ADC START
pub const PPI_SAMPLE: u8 = 0;
/// PPI channel ADC END -> GPIOTE OUT
pub const PPI_BLINK: u8 = 1;

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub first_led: u8,
    pub last_led: u8,
    /// LED toggled by GPIOTE after every conversion
    pub blink_led: u8,
    pub lfclk_source: LfclkSource,
    /// RTC1 prescaler, 4095 gives an 8 Hz tick
    pub rtc_prescaler: u32,
    /// Reads of `EVENTS_LFCLKSTARTED` before giving up
    pub clock_budget: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_led: *gpio::NRF51_DK_LEDS.start(),
            last_led: *gpio::NRF51_DK_LEDS.end(),
            blink_led: *gpio::NRF51_DK_LEDS.start(),
            lfclk_source: LfclkSource::Rc,
            rtc_prescaler: rtc::MAX_PRESCALER,
            clock_budget: bareboard_hal_nrf::DEFAULT_SPIN_BUDGET,
        }
    }
}

/// ADC settings: 8 bits, VDD/3, band-gap reference
pub const ADC_CONFIG: AdcConfig = AdcConfig {
    resolution: Resolution::Bits8,
    input: Input::SupplyOneThird,
    reference: Reference::Vbg,
    analog_pins: 0,
};

/// Start LFCLK, wire RTC1, ADC, GPIOTE and PPI, then start RTC1
///
/// `backoff` runs between checks of `EVENTS_LFCLKSTARTED`.
pub fn setup<B: Backoff>(
    p: &Peripherals<'_>,
    config: &Config,
    backoff: &mut B,
) -> Result<(), bareboard_hal_nrf::Error> {
    clock::start_lfclk(p.clock, config.lfclk_source, config.clock_budget, backoff)?;
    gpio::configure_leds(p.gpio, config.first_led..=config.last_led);
    gpiote::configure_task(
        p.gpiote,
        Chip::Nrf51,
        GPIOTE_CHANNEL,
        config.blink_led,
        Polarity::Toggle,
        false,
    )?;
    rtc::configure_tick(p.rtc1, config.rtc_prescaler)?;
    adc::configure(p.adc, &ADC_CONFIG);

    let ppi = Ppi::new(p.ppi, Chip::Nrf51);
    ppi.connect(PPI_SAMPLE, &p.rtc1.events_tick, &p.adc.tasks_start)?;
    ppi.connect(
        PPI_BLINK,
        &p.adc.events_end,
        &p.gpiote.tasks_out[GPIOTE_CHANNEL as usize],
    )?;
    ppi.enable(ppi.channel_mask(PPI_SAMPLE)? | ppi.channel_mask(PPI_BLINK)?);

    rtc::start(p.rtc1);

    #[cfg(feature = "defmt")]
    defmt::info!(
        "vdd_monitor: sampling at {} Hz",
        rtc::frequency_hz(config.rtc_prescaler)
    );
    Ok(())
}

/// Last conversion as VDD in millivolts
pub fn on_wake(adc: &AdcRegisters) -> u32 {
    let vdd = adc::millivolts(&ADC_CONFIG, adc::result(adc));

    #[cfg(feature = "defmt")]
    defmt::debug!("vdd_monitor: VDD {} mV", vdd);
    vdd
}

/// Sleep forever; the peripherals do the rest
pub fn run<S: LowPower>(mut sleep: S) -> ! {
    loop {
        sleep.sleep();
    }
}
