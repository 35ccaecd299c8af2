//! Application error type
//!
//! Everything an `on_wake` step can run into, with the bus error of the
//! external device kept as `E`. Driver and HAL errors convert with `?`.

use bareboard_drivers::{bh1750, mcp4725};

use crate::tx::TxError;

/// Failure of one main-loop step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppError<E> {
    /// I2C/SPI transfer to the external device failed
    Bus(E),
    /// nRF peripheral configuration or bounded wait failed
    Nrf(bareboard_hal_nrf::Error),
    /// BH1750 MTreg outside 31..=254
    InvalidSensitivity(u8),
    /// MCP4725 code above 4095
    InvalidDacValue(u16),
    /// Previous UART message still going out
    TxBusy,
    /// Message does not fit the transmit buffer
    MessageTooLong(usize),
    /// UART refused to start
    Uart,
    /// Message formatting overflowed its buffer
    Format,
}

impl<E> From<bareboard_hal_nrf::Error> for AppError<E> {
    fn from(e: bareboard_hal_nrf::Error) -> Self {
        AppError::Nrf(e)
    }
}

impl<E> From<bh1750::Error<E>> for AppError<E> {
    fn from(e: bh1750::Error<E>) -> Self {
        match e {
            bh1750::Error::Bus(e) => AppError::Bus(e),
            bh1750::Error::InvalidSensitivity(mt) => AppError::InvalidSensitivity(mt),
        }
    }
}

impl<E> From<mcp4725::Error<E>> for AppError<E> {
    fn from(e: mcp4725::Error<E>) -> Self {
        match e {
            mcp4725::Error::Bus(e) => AppError::Bus(e),
            mcp4725::Error::InvalidValue(v) => AppError::InvalidDacValue(v),
        }
    }
}

impl<E, U> From<TxError<U>> for AppError<E> {
    fn from(e: TxError<U>) -> Self {
        match e {
            TxError::Busy => AppError::TxBusy,
            TxError::TooLong(len) => AppError::MessageTooLong(len),
            TxError::Uart(_) => AppError::Uart,
        }
    }
}

impl<E> From<core::fmt::Error> for AppError<E> {
    fn from(_: core::fmt::Error) -> Self {
        AppError::Format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::i2c::ErrorKind;

    #[test]
    fn test_driver_errors_keep_bus_error() {
        let e: AppError<ErrorKind> = bh1750::Error::Bus(ErrorKind::Bus).into();
        assert_eq!(e, AppError::Bus(ErrorKind::Bus));

        let e: AppError<ErrorKind> = mcp4725::Error::InvalidValue(5000).into();
        assert_eq!(e, AppError::InvalidDacValue(5000));
    }

    #[test]
    fn test_tx_and_hal_errors() {
        let e: AppError<ErrorKind> = TxError::<Infallible>::TooLong(40).into();
        assert_eq!(e, AppError::MessageTooLong(40));

        let e: AppError<ErrorKind> = bareboard_hal_nrf::Error::Timeout.into();
        assert_eq!(e, AppError::Nrf(bareboard_hal_nrf::Error::Timeout));
    }
}
