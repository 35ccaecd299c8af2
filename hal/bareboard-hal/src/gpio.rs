//! GPIO pin abstractions
//!
//! Provides the digital output trait implemented by the chip HALs and a
//! small LED wrapper that hides the board's drive polarity.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&mut self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&mut self) -> bool {
        !self.is_set_high()
    }
}

/// LED drive polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// LED lights when the pin is high
    ActiveHigh,
    /// LED lights when the pin is low (nRF5x DK boards)
    #[default]
    ActiveLow,
}

/// LED on an output pin
pub struct Led<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> Led<P> {
    /// Wrap a pin, leaving its current level alone
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// Turn the LED on
    pub fn on(&mut self) {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_high(),
            Polarity::ActiveLow => self.pin.set_low(),
        }
    }

    /// Turn the LED off
    pub fn off(&mut self) {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_low(),
            Polarity::ActiveLow => self.pin.set_high(),
        }
    }

    /// Toggle the LED
    pub fn toggle(&mut self) {
        self.pin.toggle();
    }

    /// Check if the LED is lit
    pub fn is_on(&mut self) -> bool {
        let high = self.pin.is_set_high();
        match self.polarity {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }

    /// Give back the pin
    pub fn release(self) -> P {
        self.pin
    }
}
