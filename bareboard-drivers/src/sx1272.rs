//! SX1272/73 LoRa transceiver (configuration registers)
//!
//! # SPI Protocol
//!
//! Every chip-select frame starts with one address byte: bit 7 set for a
//! write, clear for a read. Data bytes follow and the address increments
//! after each byte, so multi-byte registers (preamble, carrier frequency)
//! go out in a single frame, MSB first.
//!
//! Only the LoRa modem configuration is covered; packet FIFO handling and
//! the FSK/OOK modem are not.

use embedded_hal::spi::{Operation, SpiDevice};

/// Register addresses (LoRa page)
pub mod reg {
    /// Operating mode and LoRa/FSK selection
    pub const OP_MODE: u8 = 0x01;
    /// RF carrier frequency, 3 bytes MSB first
    pub const FRF_MSB: u8 = 0x06;
    pub const FRF_MID: u8 = 0x07;
    pub const FRF_LSB: u8 = 0x08;
    /// Bandwidth, coding rate, header mode, CRC, low data rate optimize
    pub const MODEM_CONFIG1: u8 = 0x1D;
    /// Spreading factor
    pub const MODEM_CONFIG2: u8 = 0x1E;
    pub const PREAMBLE_MSB: u8 = 0x20;
    pub const PREAMBLE_LSB: u8 = 0x21;
    /// Symbol periods between frequency hops
    pub const HOP_PERIOD: u8 = 0x24;
    /// Silicon revision
    pub const VERSION: u8 = 0x42;
}

const WRITE: u8 = 0x80;
const READ_MASK: u8 = 0x7F;

/// `RegVersion` on SX1272/73
pub const VERSION: u8 = 0x22;

/// Crystal oscillator frequency
pub const FXOSC_HZ: u64 = 32_000_000;

/// Shortest preamble the modem accepts, in symbols
pub const MIN_PREAMBLE_LENGTH: u16 = 6;

/// Bit masks
pub mod mask {
    pub const LONG_RANGE_MODE: u8 = 1 << 7;
    pub const MODE: u8 = 0b111;
    pub const BW: u8 = 0b11 << 6;
    pub const CODING_RATE: u8 = 0b111 << 3;
    pub const IMPLICIT_HEADER_MODE_ON: u8 = 1 << 2;
    pub const RX_PAYLOAD_CRC_ON: u8 = 1 << 1;
    pub const LOW_DATA_RATE_OPTIMIZE: u8 = 1 << 0;
    pub const SPREADING_FACTOR: u8 = 0b1111 << 4;
}

/// `RegOpMode.LongRangeMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LongRangeMode {
    #[default]
    FskOok = 0,
    LoRa = 1 << 7,
}

impl LongRangeMode {
    pub fn from_bits(reg: u8) -> Self {
        if reg & mask::LONG_RANGE_MODE != 0 {
            Self::LoRa
        } else {
            Self::FskOok
        }
    }
}

/// `RegOpMode.Mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceMode {
    Sleep = 0b000,
    #[default]
    Standby = 0b001,
    FsTx = 0b010,
    Tx = 0b011,
    FsRx = 0b100,
    RxContinuous = 0b101,
    RxSingle = 0b110,
    Cad = 0b111,
}

impl DeviceMode {
    pub fn from_bits(reg: u8) -> Self {
        match reg & mask::MODE {
            0b000 => Self::Sleep,
            0b001 => Self::Standby,
            0b010 => Self::FsTx,
            0b011 => Self::Tx,
            0b100 => Self::FsRx,
            0b101 => Self::RxContinuous,
            0b110 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// `RegModemConfig2.SpreadingFactor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpreadingFactor {
    Sf6 = 6 << 4,
    #[default]
    Sf7 = 7 << 4,
    Sf8 = 8 << 4,
    Sf9 = 9 << 4,
    Sf10 = 10 << 4,
    Sf11 = 11 << 4,
    Sf12 = 12 << 4,
}

impl SpreadingFactor {
    /// `None` for the reserved encodings
    pub fn from_bits(reg: u8) -> Option<Self> {
        match (reg & mask::SPREADING_FACTOR) >> 4 {
            6 => Some(Self::Sf6),
            7 => Some(Self::Sf7),
            8 => Some(Self::Sf8),
            9 => Some(Self::Sf9),
            10 => Some(Self::Sf10),
            11 => Some(Self::Sf11),
            12 => Some(Self::Sf12),
            _ => None,
        }
    }

    /// Chips per symbol exponent
    pub const fn value(self) -> u8 {
        self as u8 >> 4
    }
}

/// `RegModemConfig1.Bw`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Bandwidth {
    #[default]
    Khz125 = 0b00 << 6,
    Khz250 = 0b01 << 6,
    Khz500 = 0b10 << 6,
}

impl Bandwidth {
    /// `None` for the reserved encoding
    pub fn from_bits(reg: u8) -> Option<Self> {
        match (reg & mask::BW) >> 6 {
            0b00 => Some(Self::Khz125),
            0b01 => Some(Self::Khz250),
            0b10 => Some(Self::Khz500),
            _ => None,
        }
    }

    pub const fn hz(self) -> u32 {
        match self {
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

/// `RegModemConfig1.CodingRate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CodingRate {
    #[default]
    Cr4_5 = 0b001 << 3,
    Cr4_6 = 0b010 << 3,
    Cr4_7 = 0b011 << 3,
    Cr4_8 = 0b100 << 3,
}

impl CodingRate {
    /// `None` for the reserved encodings
    pub fn from_bits(reg: u8) -> Option<Self> {
        match (reg & mask::CODING_RATE) >> 3 {
            0b001 => Some(Self::Cr4_5),
            0b010 => Some(Self::Cr4_6),
            0b011 => Some(Self::Cr4_7),
            0b100 => Some(Self::Cr4_8),
            _ => None,
        }
    }
}

/// `RegModemConfig1.ImplicitHeaderModeOn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HeaderMode {
    #[default]
    Explicit = 0,
    Implicit = 1 << 2,
}

impl HeaderMode {
    pub fn from_bits(reg: u8) -> Self {
        if reg & mask::IMPLICIT_HEADER_MODE_ON != 0 {
            Self::Implicit
        } else {
            Self::Explicit
        }
    }
}

/// LoRa modem settings applied together by [`Sx1272::configure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoRaSettings {
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub header_mode: HeaderMode,
    pub payload_crc: bool,
    /// Symbols, at least [`MIN_PREAMBLE_LENGTH`]
    pub preamble_length: u16,
    pub low_data_rate_optimize: bool,
}

impl Default for LoRaSettings {
    /// Power-on register values
    fn default() -> Self {
        Self {
            spreading_factor: SpreadingFactor::Sf7,
            bandwidth: Bandwidth::Khz125,
            coding_rate: CodingRate::Cr4_5,
            header_mode: HeaderMode::Explicit,
            payload_crc: false,
            preamble_length: 8,
            low_data_rate_optimize: false,
        }
    }
}

impl LoRaSettings {
    /// Symbol time above 16 ms needs low data rate optimisation
    /// (SF11 and SF12 at 125 kHz)
    pub fn requires_low_data_rate_optimize(&self) -> bool {
        matches!(self.bandwidth, Bandwidth::Khz125)
            && matches!(
                self.spreading_factor,
                SpreadingFactor::Sf11 | SpreadingFactor::Sf12
            )
    }
}

/// SX1272/73 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// SPI transfer failed
    Bus(E),
    /// Preamble shorter than [`MIN_PREAMBLE_LENGTH`]
    InvalidPreamble(u16),
    /// A register field holds a reserved encoding
    InvalidRegisterValue(u8),
}

/// SX1272/73 driver
pub struct Sx1272<SPI> {
    spi: SPI,
}

impl<SPI, E> Sx1272<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    fn read_burst(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[register & READ_MASK]),
                Operation::Read(buffer),
            ])
            .map_err(Error::Bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut value = [0u8];
        self.read_burst(register, &mut value)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.spi
            .write(&[register | WRITE, value])
            .map_err(Error::Bus)
    }

    fn modify_register(&mut self, register: u8, mask: u8, bits: u8) -> Result<(), Error<E>> {
        let current = self.read_register(register)?;
        self.write_register(register, (current & !mask) | (bits & mask))
    }

    /// Switch between FSK/OOK and LoRa
    ///
    /// `LongRangeMode` can only change in sleep: the current device mode is
    /// saved, the chip is put to sleep if it is not already, and the mode
    /// bits are restored together with the new `LongRangeMode`.
    pub fn set_long_range_mode(&mut self, mode: LongRangeMode) -> Result<(), Error<E>> {
        let mut op_mode = self.read_register(reg::OP_MODE)?;
        let saved = op_mode & mask::MODE;

        if saved != DeviceMode::Sleep as u8 {
            op_mode = (op_mode & !mask::MODE) | DeviceMode::Sleep as u8;
            self.write_register(reg::OP_MODE, op_mode)?;
        }

        op_mode = (op_mode & !(mask::LONG_RANGE_MODE | mask::MODE)) | mode as u8 | saved;
        self.write_register(reg::OP_MODE, op_mode)
    }

    pub fn long_range_mode(&mut self) -> Result<LongRangeMode, Error<E>> {
        self.read_register(reg::OP_MODE)
            .map(LongRangeMode::from_bits)
    }

    pub fn set_device_mode(&mut self, mode: DeviceMode) -> Result<(), Error<E>> {
        self.modify_register(reg::OP_MODE, mask::MODE, mode as u8)
    }

    pub fn device_mode(&mut self) -> Result<DeviceMode, Error<E>> {
        self.read_register(reg::OP_MODE).map(DeviceMode::from_bits)
    }

    pub fn set_spreading_factor(&mut self, sf: SpreadingFactor) -> Result<(), Error<E>> {
        self.modify_register(reg::MODEM_CONFIG2, mask::SPREADING_FACTOR, sf as u8)
    }

    pub fn spreading_factor(&mut self) -> Result<SpreadingFactor, Error<E>> {
        let config = self.read_register(reg::MODEM_CONFIG2)?;
        SpreadingFactor::from_bits(config).ok_or(Error::InvalidRegisterValue(config))
    }

    pub fn set_coding_rate(&mut self, cr: CodingRate) -> Result<(), Error<E>> {
        self.modify_register(reg::MODEM_CONFIG1, mask::CODING_RATE, cr as u8)
    }

    pub fn coding_rate(&mut self) -> Result<CodingRate, Error<E>> {
        let config = self.read_register(reg::MODEM_CONFIG1)?;
        CodingRate::from_bits(config).ok_or(Error::InvalidRegisterValue(config))
    }

    pub fn set_bandwidth(&mut self, bw: Bandwidth) -> Result<(), Error<E>> {
        self.modify_register(reg::MODEM_CONFIG1, mask::BW, bw as u8)
    }

    pub fn bandwidth(&mut self) -> Result<Bandwidth, Error<E>> {
        let config = self.read_register(reg::MODEM_CONFIG1)?;
        Bandwidth::from_bits(config).ok_or(Error::InvalidRegisterValue(config))
    }

    /// Preamble length in symbols (6..=65535)
    pub fn set_preamble_length(&mut self, length: u16) -> Result<(), Error<E>> {
        if length < MIN_PREAMBLE_LENGTH {
            return Err(Error::InvalidPreamble(length));
        }
        let [msb, lsb] = length.to_be_bytes();
        self.spi
            .write(&[reg::PREAMBLE_MSB | WRITE, msb, lsb])
            .map_err(Error::Bus)
    }

    pub fn preamble_length(&mut self) -> Result<u16, Error<E>> {
        let mut bytes = [0u8; 2];
        self.read_burst(reg::PREAMBLE_MSB, &mut bytes)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn set_header_mode(&mut self, mode: HeaderMode) -> Result<(), Error<E>> {
        self.modify_register(reg::MODEM_CONFIG1, mask::IMPLICIT_HEADER_MODE_ON, mode as u8)
    }

    pub fn header_mode(&mut self) -> Result<HeaderMode, Error<E>> {
        self.read_register(reg::MODEM_CONFIG1)
            .map(HeaderMode::from_bits)
    }

    /// Check the payload CRC on reception
    pub fn set_payload_crc(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let bits = if enabled { mask::RX_PAYLOAD_CRC_ON } else { 0 };
        self.modify_register(reg::MODEM_CONFIG1, mask::RX_PAYLOAD_CRC_ON, bits)
    }

    pub fn payload_crc(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::MODEM_CONFIG1)? & mask::RX_PAYLOAD_CRC_ON != 0)
    }

    pub fn set_low_data_rate_optimize(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let bits = if enabled { mask::LOW_DATA_RATE_OPTIMIZE } else { 0 };
        self.modify_register(reg::MODEM_CONFIG1, mask::LOW_DATA_RATE_OPTIMIZE, bits)
    }

    pub fn low_data_rate_optimize(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::MODEM_CONFIG1)? & mask::LOW_DATA_RATE_OPTIMIZE != 0)
    }

    /// Symbol periods between frequency hops, 0 disables hopping
    pub fn set_hop_period(&mut self, period: u8) -> Result<(), Error<E>> {
        self.write_register(reg::HOP_PERIOD, period)
    }

    pub fn hop_period(&mut self) -> Result<u8, Error<E>> {
        self.read_register(reg::HOP_PERIOD)
    }

    /// Carrier frequency in Hz (61 Hz resolution)
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error<E>> {
        let frf = frequency_to_frf(hz);
        let [_, msb, mid, lsb] = frf.to_be_bytes();
        self.spi
            .write(&[reg::FRF_MSB | WRITE, msb, mid, lsb])
            .map_err(Error::Bus)
    }

    pub fn frequency(&mut self) -> Result<u32, Error<E>> {
        let mut bytes = [0u8; 3];
        self.read_burst(reg::FRF_MSB, &mut bytes)?;
        let frf = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
        Ok(frf_to_frequency(frf))
    }

    pub fn version(&mut self) -> Result<u8, Error<E>> {
        self.read_register(reg::VERSION)
    }

    /// Apply the modem settings: SF, bandwidth, coding rate, header mode,
    /// CRC, preamble, low data rate optimisation
    ///
    /// The preamble is validated first, so an invalid length leaves the
    /// chip untouched.
    pub fn configure(&mut self, settings: &LoRaSettings) -> Result<(), Error<E>> {
        if settings.preamble_length < MIN_PREAMBLE_LENGTH {
            return Err(Error::InvalidPreamble(settings.preamble_length));
        }

        self.set_spreading_factor(settings.spreading_factor)?;
        self.set_bandwidth(settings.bandwidth)?;
        self.set_coding_rate(settings.coding_rate)?;
        self.set_header_mode(settings.header_mode)?;
        self.set_payload_crc(settings.payload_crc)?;
        self.set_preamble_length(settings.preamble_length)?;
        self.set_low_data_rate_optimize(settings.low_data_rate_optimize)
    }
}

/// `Frf = f · 2^19 / FXOSC`
pub fn frequency_to_frf(hz: u32) -> u32 {
    (((hz as u64) << 19) / FXOSC_HZ) as u32
}

/// `f = Frf · FXOSC / 2^19`
pub fn frf_to_frequency(frf: u32) -> u32 {
    ((frf as u64 * FXOSC_HZ) >> 19) as u32
}
