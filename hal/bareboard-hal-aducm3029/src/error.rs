use bareboard_hal::Timeout;

/// ADuCM3029 configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A bounded wait on a status bit ran out of budget
    Timeout,
    /// RTC prescaler exponent above 15
    InvalidPrescaler(u8),
    /// Alarm period of zero ticks
    ZeroPeriod,
}

impl From<Timeout> for Error {
    fn from(_: Timeout) -> Self {
        Error::Timeout
    }
}
