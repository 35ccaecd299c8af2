//! BH1750 light meter on nRF51
//!
//! TIMER0 fires once a second and advances the state:
//!
//! 1. trigger a one-time high-resolution measurement
//! 2. read the two result bytes
//! 3. LED on, send both bytes (MSB first) over UART0, sleep until the
//!    transmission is done, LED off, back to state 0
//!
//! so a new reading goes out every three seconds. State 0 does nothing and
//! any state past 3 resets to 0; the C firmware's `default:` fell through to
//! step 1 instead.

use bareboard_drivers::bh1750::{self, Bh1750};
use bareboard_hal::gpio::Led;
use bareboard_hal::uart::UartConfig;
use bareboard_hal::{I2cConfig, LowPower, OutputPin, UartTx};
use bareboard_hal_nrf::timer::{self, BitMode, TimerRegisters};
use bareboard_hal_nrf::uart::{self, UartPins};
use bareboard_hal_nrf::{gpio, twi, Peripherals};
use embedded_hal::i2c::I2c;

use crate::error::AppError;
use crate::event::StateCounter;
use crate::tx::TxBuffer;

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// LEDs configured as outputs (all off)
    pub first_led: u8,
    pub last_led: u8,
    /// LED lit while a reading is transmitted
    pub status_led: u8,
    pub txd_pin: u8,
    pub rxd_pin: u8,
    pub baudrate: u32,
    pub scl_pin: u8,
    pub sda_pin: u8,
    pub i2c_frequency: u32,
    pub sensor_address: bh1750::Address,
    /// TIMER0 prescaler (0..=9)
    pub timer_prescaler: u32,
    pub timer_bitmode: BitMode,
    /// Tick period
    pub tick_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_led: *gpio::NRF51_DK_LEDS.start(),
            last_led: *gpio::NRF51_DK_LEDS.end(),
            status_led: *gpio::NRF51_DK_LEDS.start(),
            txd_pin: UartPins::NRF51_DK.txd,
            rxd_pin: UartPins::NRF51_DK.rxd,
            baudrate: 115200,
            scl_pin: I2cConfig::STANDARD.scl_pin,
            sda_pin: I2cConfig::STANDARD.sda_pin,
            i2c_frequency: I2cConfig::STANDARD.frequency,
            sensor_address: bh1750::Address::Low,
            timer_prescaler: 9,
            timer_bitmode: BitMode::Bits16,
            tick_ms: 1000,
        }
    }
}

/// State shared with the interrupt handlers
pub struct Shared {
    pub state: StateCounter,
    pub tx: TxBuffer<2>,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            state: StateCounter::new(),
            tx: TxBuffer::new(),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Program GPIO, UART0, TWI0 and TIMER0, reset the state and start the timer
pub fn setup(
    p: &Peripherals<'_>,
    shared: &Shared,
    config: &Config,
) -> Result<(), bareboard_hal_nrf::Error> {
    gpio::configure_leds(p.gpio, config.first_led..=config.last_led);

    let pins = UartPins {
        txd: config.txd_pin,
        rxd: config.rxd_pin,
        rts: None,
        cts: None,
    };
    let uart_config = UartConfig {
        baudrate: config.baudrate,
        ..UartConfig::default()
    };
    uart::configure(p.uart0, &pins, &uart_config)?;

    let i2c_config = I2cConfig {
        frequency: config.i2c_frequency,
        scl_pin: config.scl_pin,
        sda_pin: config.sda_pin,
    };
    twi::configure(p.twi0, &i2c_config)?;

    let cc0 = timer::ticks_for_ms(config.timer_prescaler, config.tick_ms)?;
    timer::configure_periodic(p.timer0, config.timer_prescaler, config.timer_bitmode, cc0)?;

    shared.state.reset();
    timer::start(p.timer0);

    #[cfg(feature = "defmt")]
    defmt::info!("light_meter: tick every {} ms", config.tick_ms);
    Ok(())
}

/// TIMER0 interrupt
pub fn timer_isr(timer0: &TimerRegisters, shared: &Shared) {
    timer::clear_compare(timer0);
    shared.state.advance();
}

/// UART0 interrupt
pub fn uart_isr<U: UartTx>(uart: &mut U, shared: &Shared) -> Result<(), U::Error> {
    shared.tx.on_tx_ready(uart)
}

/// Main-loop side of the light meter
pub struct LightMeter<'a, I2C, P, U, S> {
    sensor: Bh1750<I2C>,
    led: Led<P>,
    uart: U,
    sleep: S,
    shared: &'a Shared,
    raw: [u8; 2],
}

impl<'a, I2C, E, P, U, S> LightMeter<'a, I2C, P, U, S>
where
    I2C: I2c<Error = E>,
    P: OutputPin,
    U: UartTx,
    S: LowPower,
{
    pub fn new(sensor: Bh1750<I2C>, led: Led<P>, uart: U, sleep: S, shared: &'a Shared) -> Self {
        Self {
            sensor,
            led,
            uart,
            sleep,
            shared,
            raw: [0; 2],
        }
    }

    /// Last raw result, MSB first
    pub fn raw(&self) -> [u8; 2] {
        self.raw
    }

    /// Act on the current state
    pub fn on_wake(&mut self) -> Result<(), AppError<E>> {
        match self.shared.state.get() {
            0 => {}
            1 => self.sensor.trigger_measurement(bh1750::Mode::OneTimeHighRes)?,
            2 => self.raw = self.sensor.read_raw_bytes()?,
            3 => {
                self.led.on();
                let result = self.transmit();
                self.led.off();
                self.shared.state.reset();
                result?;

                #[cfg(feature = "defmt")]
                defmt::trace!("light_meter: sent {:x}", self.raw);
            }
            // Ticks that arrived while transmitting
            _ => self.shared.state.reset(),
        }
        Ok(())
    }

    fn transmit(&mut self) -> Result<(), AppError<E>> {
        self.shared.tx.start(&mut self.uart, &self.raw)?;
        while self.shared.tx.is_busy() {
            self.sleep.sleep();
        }
        Ok(())
    }

    pub fn run(mut self) -> ! {
        loop {
            self.sleep.sleep();
            if self.on_wake().is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("light_meter: step failed, state {}", self.shared.state.get());
            }
        }
    }

    pub fn release(self) -> (Bh1750<I2C>, Led<P>, U, S) {
        (self.sensor, self.led, self.uart, self.sleep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{no_interrupts, FakePin, IsrSleep, MockI2c, MockUart, UartEvent};
    use bareboard_hal::gpio::Polarity;
    use bareboard_hal::mock::last_written;
    use bareboard_hal_nrf::mock::RamPeripherals;
    use bareboard_hal_nrf::Error;
    use tock_registers::interfaces::{Readable, Writeable};

    #[test]
    fn test_setup_programs_peripherals_and_starts_timer() {
        let ram = RamPeripherals::new();
        let p = ram.peripherals();
        let shared = Shared::new();
        shared.state.advance();

        setup(&p, &shared, &Config::default()).unwrap();

        assert_eq!(shared.state.get(), 0);
        // 31.25 kHz, one second
        assert_eq!(p.timer0.prescaler.get(), 9);
        assert_eq!(p.timer0.cc[0].get(), 31_250);
        assert_eq!(p.uart0.pseltxd.get(), 9);
        assert_eq!(p.twi0.pselscl.get(), 7);
        assert_eq!(p.twi0.pselsda.get(), 30);
        // LEDs off (active low) and outputs
        assert_eq!(p.gpio.outset.get(), 1 << 24);
        assert_eq!(p.gpio.pin_cnf[21].get(), 0b11);
        assert_eq!(last_written(&p.timer0.tasks_start), 1);
        assert_eq!(last_written(&p.timer1.tasks_start), 0);
    }

    #[test]
    fn test_setup_rejects_bad_baudrate() {
        let ram = RamPeripherals::new();
        let p = ram.peripherals();
        let config = Config {
            baudrate: 12345,
            ..Config::default()
        };

        assert_eq!(
            setup(&p, &Shared::new(), &config),
            Err(Error::UnsupportedBaudrate(12345))
        );
        assert_eq!(last_written(&p.timer0.tasks_start), 0);
    }

    #[test]
    fn test_tick_too_long_for_counter() {
        let ram = RamPeripherals::new();
        let p = ram.peripherals();
        let config = Config {
            tick_ms: 3000,
            ..Config::default()
        };

        assert_eq!(
            setup(&p, &Shared::new(), &config),
            Err(Error::CompareOutOfRange(93_750))
        );
        assert_eq!(p.timer0.cc[0].get(), 0);
        assert_eq!(last_written(&p.timer0.tasks_start), 0);

        let wide = Config {
            timer_bitmode: BitMode::Bits24,
            ..config
        };
        setup(&p, &Shared::new(), &wide).unwrap();
        assert_eq!(p.timer0.cc[0].get(), 93_750);
    }

    #[test]
    fn test_timer_isr_acknowledges_and_advances() {
        let ram = RamPeripherals::new();
        let timer0 = ram.peripherals().timer0;
        let shared = Shared::new();

        timer0.events_compare[0].set(1);
        timer_isr(timer0, &shared);
        timer0.events_compare[0].set(1);
        timer_isr(timer0, &shared);

        assert_eq!(shared.state.get(), 2);
        assert_eq!(timer0.events_compare[0].get(), 0);
    }

    #[test]
    fn test_full_cycle() {
        let shared = Shared::new();
        let bus = MockI2c::new();
        bus.respond(&[0x12, 0x34]);
        let led_pin = FakePin::new(true);
        let uart = MockUart::new();

        // Each sleep during transmission is woken by one TX-ready interrupt
        let mut isr_uart = uart.clone();
        let sleep = IsrSleep::new(|| {
            uart_isr(&mut isr_uart, &shared).unwrap();
        });

        let mut app = LightMeter::new(
            Bh1750::new(bus.clone(), bh1750::Address::Low),
            Led::new(led_pin.clone(), Polarity::ActiveLow),
            uart.clone(),
            sleep,
            &shared,
        );

        shared.state.advance();
        app.on_wake().unwrap();
        assert_eq!(bus.writes(), vec![(0x23, vec![0x20])]);

        shared.state.advance();
        app.on_wake().unwrap();
        assert_eq!(app.raw(), [0x12, 0x34]);

        shared.state.advance();
        app.on_wake().unwrap();

        assert_eq!(
            uart.events(),
            vec![UartEvent::Start(0x12), UartEvent::Byte(0x34), UartEvent::Stop]
        );
        assert!(!shared.tx.is_busy());
        assert_eq!(shared.state.get(), 0);
        // LED back off
        assert!(led_pin.level());
    }

    #[test]
    fn test_idle_state_touches_nothing() {
        let shared = Shared::new();
        let bus = MockI2c::new();
        let uart = MockUart::new();
        let mut app = LightMeter::new(
            Bh1750::new(bus.clone(), bh1750::Address::Low),
            Led::new(FakePin::new(true), Polarity::ActiveLow),
            uart.clone(),
            no_interrupts(),
            &shared,
        );

        app.on_wake().unwrap();

        assert!(bus.writes().is_empty());
        assert!(bus.reads().is_empty());
        assert!(uart.events().is_empty());
    }

    #[test]
    fn test_late_ticks_reset_state() {
        let shared = Shared::new();
        let mut app = LightMeter::new(
            Bh1750::new(MockI2c::new(), bh1750::Address::Low),
            Led::new(FakePin::new(true), Polarity::ActiveLow),
            MockUart::new(),
            no_interrupts(),
            &shared,
        );

        for _ in 0..5 {
            shared.state.advance();
        }
        app.on_wake().unwrap();

        assert_eq!(shared.state.get(), 0);
    }

    #[test]
    fn test_bus_error_propagates() {
        let shared = Shared::new();
        let bus = MockI2c::new();
        bus.fail();
        let mut app = LightMeter::new(
            Bh1750::new(bus, bh1750::Address::High),
            Led::new(FakePin::new(true), Polarity::ActiveLow),
            MockUart::new(),
            no_interrupts(),
            &shared,
        );

        shared.state.advance();
        assert!(matches!(app.on_wake(), Err(AppError::Bus(_))));
    }
}
