//! On-die temperature logger on nRF52
//!
//! RTC2 COMPARE0 fires once a second and, through PPI channel 0, starts a
//! TEMP measurement and clears the counter (fork) for the next period. The
//! TEMP interrupt latches the result; the main loop then formats
//! `"Temperature: <n> C\r\n"` and hands it to UART0, whose TX-ready
//! interrupt sends the rest while the CPU sleeps again.

use core::convert::Infallible;
use core::fmt::Write;

use bareboard_hal::gpio::Led;
use bareboard_hal::uart::UartConfig;
use bareboard_hal::{Backoff, LowPower, OutputPin, UartTx};
use bareboard_hal_nrf::clock::{self, LfclkSource};
use bareboard_hal_nrf::ppi::Ppi;
use bareboard_hal_nrf::temp::{self, TempRegisters};
use bareboard_hal_nrf::uart::{self, UartPins};
use bareboard_hal_nrf::{gpio, rtc, Chip, Peripherals};
use heapless::String;

use crate::error::AppError;
use crate::event::EventLatch;
use crate::tx::TxBuffer;

/// UART message buffer size
pub const TX_BUFF_SIZE: usize = 32;

/// PPI channel RTC2 COMPARE0 -> TEMP START (+ fork to RTC2 CLEAR)
pub const PPI_MEASURE: u8 = 0;

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub first_led: u8,
    pub last_led: u8,
    /// LED lit while a reading is handled
    pub status_led: u8,
    pub txd_pin: u8,
    pub rxd_pin: u8,
    pub baudrate: u32,
    pub lfclk_source: LfclkSource,
    /// RTC2 prescaler; 4095 counts at 8 Hz
    pub rtc_prescaler: u32,
    /// COMPARE0 value; 8 ticks at 8 Hz is one second
    pub rtc_compare: u32,
    /// Reads of each clock-started event before giving up
    pub clock_budget: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_led: *gpio::NRF52_DK_LEDS.start(),
            last_led: *gpio::NRF52_DK_LEDS.end(),
            status_led: *gpio::NRF52_DK_LEDS.start(),
            txd_pin: UartPins::NRF52_DK.txd,
            rxd_pin: UartPins::NRF52_DK.rxd,
            baudrate: 115200,
            lfclk_source: LfclkSource::Rc,
            rtc_prescaler: rtc::MAX_PRESCALER,
            rtc_compare: 8,
            clock_budget: bareboard_hal_nrf::DEFAULT_SPIN_BUDGET,
        }
    }
}

/// State shared with the TEMP and UART0 interrupts
pub struct Shared {
    pub measured: EventLatch,
    pub tx: TxBuffer<TX_BUFF_SIZE>,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            measured: EventLatch::new(),
            tx: TxBuffer::new(),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Start both clocks, program GPIO, UART0, PPI, RTC2 and TEMP, start RTC2
///
/// `backoff` runs between checks of each clock-started event.
pub fn setup<B: Backoff>(
    p: &Peripherals<'_>,
    shared: &Shared,
    config: &Config,
    backoff: &mut B,
) -> Result<(), bareboard_hal_nrf::Error> {
    clock::start_hfclk(p.clock, config.clock_budget, backoff)?;
    clock::start_lfclk(p.clock, config.lfclk_source, config.clock_budget, backoff)?;
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

    let ppi = Ppi::new(p.ppi, Chip::Nrf52);
    ppi.connect(PPI_MEASURE, &p.rtc2.events_compare[0], &p.temp.tasks_start)?;
    ppi.fork(PPI_MEASURE, &p.rtc2.tasks_clear)?;
    ppi.enable(ppi.channel_mask(PPI_MEASURE)?);

    rtc::configure_compare(p.rtc2, config.rtc_prescaler, config.rtc_compare, false)?;
    temp::configure_interrupt(p.temp);

    shared.measured.clear();
    rtc::start(p.rtc2);

    #[cfg(feature = "defmt")]
    defmt::info!("temp_logger: started, {} baud", config.baudrate);
    Ok(())
}

/// TEMP interrupt
pub fn temp_isr(temp: &TempRegisters, shared: &Shared) {
    temp::clear_data_ready(temp);
    shared.measured.set();
}

/// UART0 interrupt
pub fn uart_isr<U: UartTx>(uart: &mut U, shared: &Shared) -> Result<(), U::Error> {
    shared.tx.on_tx_ready(uart)
}

/// The line sent for one reading
pub fn format_message(degrees: i32) -> Result<String<TX_BUFF_SIZE>, core::fmt::Error> {
    let mut message = String::new();
    write!(message, "Temperature: {} C\r\n", degrees)?;
    Ok(message)
}

/// Main-loop side of the logger
pub struct TempLogger<'a, P, U, S> {
    temp: &'a TempRegisters,
    led: Led<P>,
    uart: U,
    sleep: S,
    shared: &'a Shared,
}

impl<'a, P, U, S> TempLogger<'a, P, U, S>
where
    P: OutputPin,
    U: UartTx,
    S: LowPower,
{
    pub fn new(temp: &'a TempRegisters, led: Led<P>, uart: U, sleep: S, shared: &'a Shared) -> Self {
        Self {
            temp,
            led,
            uart,
            sleep,
            shared,
        }
    }

    /// Send the latest reading if one was latched; returns it in whole °C
    pub fn on_wake(&mut self) -> Result<Option<i32>, AppError<Infallible>> {
        if !self.shared.measured.take() {
            return Ok(None);
        }

        self.led.on();
        let degrees = temp::whole_degrees(temp::read_raw(self.temp));
        let result = self.send(degrees);
        self.led.off();
        result?;

        #[cfg(feature = "defmt")]
        defmt::debug!("temp_logger: {} C", degrees);
        Ok(Some(degrees))
    }

    fn send(&mut self, degrees: i32) -> Result<(), AppError<Infallible>> {
        let message = format_message(degrees)?;
        self.shared.tx.start(&mut self.uart, message.as_bytes())?;
        Ok(())
    }

    pub fn run(mut self) -> ! {
        loop {
            self.sleep.sleep();
            if self.on_wake().is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("temp_logger: reading dropped");
            }
        }
    }
}
