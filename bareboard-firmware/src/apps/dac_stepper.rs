//! MCP4725 output stepper on nRF51
//!
//! At start-up the DAC is reset and woken through the general call and its
//! DAC and EEPROM contents are read back. TIMER0 then ticks every 500 ms and
//! steps the output through three levels, each written with a different
//! write command:
//!
//! | State | Output | Command |
//! |-------|--------|---------|
//! | 1 | 0 (LED on) | fast mode |
//! | 2 | 2048 | DAC register and EEPROM |
//! | 3 | 4095 (LED off, state 0) | DAC register |
//!
//! [`start`] resets to state 0, which does nothing, so the first level goes
//! out one tick after start; states past 3 reset to 0. The C firmware preset
//! state 1 and let `default:` fall through to it.

use bareboard_drivers::mcp4725::{self, DacReading, EepromReading, Mcp4725, PowerDown, WriteMode};
use bareboard_hal::gpio::Led;
use bareboard_hal::{I2cConfig, LowPower, OutputPin};
use bareboard_hal_nrf::timer::{self, BitMode, TimerRegisters};
use bareboard_hal_nrf::{gpio, twi, Peripherals};
use embedded_hal::i2c::I2c;

use crate::error::AppError;
use crate::event::StateCounter;

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub first_led: u8,
    pub last_led: u8,
    pub status_led: u8,
    pub scl_pin: u8,
    pub sda_pin: u8,
    pub i2c_frequency: u32,
    pub dac_address: mcp4725::Address,
    pub timer_prescaler: u32,
    pub tick_ms: u32,
    /// Output codes for states 1, 2 and 3
    pub levels: [u16; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_led: *gpio::NRF51_DK_LEDS.start(),
            last_led: *gpio::NRF51_DK_LEDS.end(),
            status_led: *gpio::NRF51_DK_LEDS.start(),
            scl_pin: I2cConfig::STANDARD.scl_pin,
            sda_pin: I2cConfig::STANDARD.sda_pin,
            i2c_frequency: I2cConfig::STANDARD.frequency,
            dac_address: mcp4725::Address::LOW,
            timer_prescaler: 9,
            tick_ms: 500,
            levels: [0, 2048, mcp4725::MAX_VALUE],
        }
    }
}

/// State shared with the TIMER0 interrupt
pub struct Shared {
    pub state: StateCounter,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            state: StateCounter::new(),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Program GPIO, TWI0 and TIMER0; the timer stays stopped until [`start`]
pub fn setup(p: &Peripherals<'_>, config: &Config) -> Result<(), bareboard_hal_nrf::Error> {
    gpio::configure_leds(p.gpio, config.first_led..=config.last_led);

    let i2c_config = I2cConfig {
        frequency: config.i2c_frequency,
        scl_pin: config.scl_pin,
        sda_pin: config.sda_pin,
    };
    twi::configure(p.twi0, &i2c_config)?;

    let cc0 = timer::ticks_for_ms(config.timer_prescaler, config.tick_ms)?;
    timer::configure_periodic(p.timer0, config.timer_prescaler, BitMode::Bits16, cc0)
}

/// Reset the state and start ticking
pub fn start(timer0: &TimerRegisters, shared: &Shared) {
    shared.state.reset();
    timer::start(timer0);
}

/// TIMER0 interrupt
pub fn timer_isr(timer0: &TimerRegisters, shared: &Shared) {
    timer::clear_compare(timer0);
    shared.state.advance();
}

/// What the DAC held at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Defaults {
    pub dac: DacReading,
    pub eeprom: EepromReading,
}

/// Main-loop side of the stepper
pub struct DacStepper<'a, I2C, P, S> {
    dac: Mcp4725<I2C>,
    led: Led<P>,
    sleep: S,
    shared: &'a Shared,
    levels: [u16; 3],
}

impl<'a, I2C, E, P, S> DacStepper<'a, I2C, P, S>
where
    I2C: I2c<Error = E>,
    P: OutputPin,
    S: LowPower,
{
    pub fn new(dac: Mcp4725<I2C>, led: Led<P>, sleep: S, shared: &'a Shared, config: &Config) -> Self {
        Self {
            dac,
            led,
            sleep,
            shared,
            levels: config.levels,
        }
    }

    /// Reset and wake the DAC, then read back the DAC and EEPROM contents
    pub fn start_up(&mut self) -> Result<Defaults, AppError<E>> {
        self.dac.reset()?;
        self.dac.wake_up()?;

        let defaults = Defaults {
            dac: self.dac.dac_data()?,
            eeprom: self.dac.eeprom_data()?,
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "dac_stepper: DAC {} EEPROM {}",
            defaults.dac.value,
            defaults.eeprom.value
        );
        Ok(defaults)
    }

    /// Write the output level for the current state
    pub fn on_wake(&mut self) -> Result<(), AppError<E>> {
        match self.shared.state.get() {
            0 => Ok(()),
            1 => {
                self.led.on();
                self.write(WriteMode::Fast, self.levels[0])
            }
            2 => self.write(WriteMode::WriteDacAndEeprom, self.levels[1]),
            3 => {
                let result = self.write(WriteMode::WriteDac, self.levels[2]);
                self.shared.state.reset();
                self.led.off();
                result
            }
            _ => {
                self.shared.state.reset();
                Ok(())
            }
        }
    }

    fn write(&mut self, mode: WriteMode, value: u16) -> Result<(), AppError<E>> {
        self.dac.set_value(mode, PowerDown::Normal, value)?;
        Ok(())
    }

    pub fn run(mut self) -> ! {
        loop {
            self.sleep.sleep();
            if self.on_wake().is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("dac_stepper: write failed");
            }
        }
    }

    pub fn release(self) -> (Mcp4725<I2C>, Led<P>, S) {
        (self.dac, self.led, self.sleep)
    }
}
