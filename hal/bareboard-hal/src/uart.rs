//! UART serial transmit abstractions
//!
//! The firmware applications transmit from the TX-ready interrupt: the main loop
//! loads the first byte and the interrupt handler feeds the rest, one byte per
//! TX-ready event, while the CPU sleeps in between.

/// Interrupt-driven UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Start the transmitter and load the first byte
    fn start_tx(&mut self, first: u8) -> Result<(), Self::Error>;

    /// Load the next byte (called from the TX-ready interrupt)
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Stop the transmitter once the last byte went out
    fn stop_tx(&mut self) -> Result<(), Self::Error>;

    /// Acknowledge the TX-ready event (called at the top of the interrupt)
    fn clear_tx_ready(&mut self);
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity mode
    pub parity: Parity,
    /// RTS/CTS hardware flow control
    pub hardware_flow_control: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            parity: Parity::None,
            hardware_flow_control: false,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
}
