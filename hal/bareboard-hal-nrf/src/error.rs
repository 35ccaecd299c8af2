use bareboard_hal::Timeout;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// nRF peripheral configuration and transfer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A bounded wait for a peripheral event ran out of budget
    Timeout,
    /// TWI: address not acknowledged
    AddressNack,
    /// TWI: data byte not acknowledged
    DataNack,
    /// TWI: a received byte was lost
    Overrun,
    /// Channel index beyond what the chip has
    InvalidChannel(u8),
    /// Prescaler value beyond the register width
    InvalidPrescaler(u32),
    /// Compare value wider than the counter
    CompareOutOfRange(u64),
    /// Feature the selected chip does not have
    NotOnChip,
    /// Baud rate without a BAUDRATE register encoding
    UnsupportedBaudrate(u32),
    /// I2C clock without a FREQUENCY register encoding
    UnsupportedFrequency(u32),
}

impl From<Timeout> for Error {
    fn from(_: Timeout) -> Self {
        Error::Timeout
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::Overrun => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}
