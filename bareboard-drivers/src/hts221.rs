//! HTS221 capacitive humidity and temperature sensor
//!
//! # I2C Protocol
//!
//! Fixed slave address `0x5F`. A transfer starts with the register
//! sub-address; setting its bit 7 makes the sensor auto-increment, which is
//! how the 16-bit outputs and the calibration block are read in one go.
//!
//! # Conversion
//!
//! The sensor outputs raw ADC counts. Each part is factory-calibrated at two
//! points per quantity, stored in `CALIB_0..F`; readings are converted by
//! linear interpolation between those points.

use embedded_hal::i2c::I2c;

/// 7-bit slave address
pub const ADDRESS: u8 = 0b101_1111;

/// `WHO_AM_I` contents
pub const DEVICE_ID: u8 = 0xBC;

/// Register addresses
pub mod reg {
    /// Device identification
    pub const WHO_AM_I: u8 = 0x0F;
    /// Humidity and temperature resolution mode
    pub const AV_CONF: u8 = 0x10;
    pub const CTRL_REG1: u8 = 0x20;
    pub const CTRL_REG2: u8 = 0x21;
    pub const CTRL_REG3: u8 = 0x22;
    pub const STATUS_REG: u8 = 0x27;
    pub const HUMIDITY_OUT_L: u8 = 0x28;
    pub const HUMIDITY_OUT_H: u8 = 0x29;
    pub const TEMP_OUT_L: u8 = 0x2A;
    pub const TEMP_OUT_H: u8 = 0x2B;
    /// First of 16 calibration registers
    pub const CALIB_0: u8 = 0x30;
}

/// Sub-address flag enabling auto-increment
const AUTO_INCREMENT: u8 = 0x80;

/// Bit masks inside the control and status registers
pub mod mask {
    pub const AVGT: u8 = 0b111 << 3;
    pub const AVGH: u8 = 0b111;
    pub const PD: u8 = 1 << 7;
    pub const BDU: u8 = 1 << 2;
    pub const ODR: u8 = 0b11;
    pub const BOOT: u8 = 1 << 7;
    pub const HEATER: u8 = 1 << 1;
    pub const ONE_SHOT: u8 = 1 << 0;
    pub const DRDY_H_L: u8 = 1 << 7;
    pub const PP_OD: u8 = 1 << 6;
    pub const DRDY_EN: u8 = 1 << 2;
    pub const H_DA: u8 = 1 << 1;
    pub const T_DA: u8 = 1 << 0;
}

/// Temperature samples averaged per output (`AV_CONF.AVGT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TemperatureAverage {
    Avg2 = 0b000 << 3,
    Avg4 = 0b001 << 3,
    Avg8 = 0b010 << 3,
    #[default]
    Avg16 = 0b011 << 3,
    Avg32 = 0b100 << 3,
    Avg64 = 0b101 << 3,
    Avg128 = 0b110 << 3,
    Avg256 = 0b111 << 3,
}

impl TemperatureAverage {
    pub fn from_bits(reg: u8) -> Self {
        match (reg & mask::AVGT) >> 3 {
            0b000 => Self::Avg2,
            0b001 => Self::Avg4,
            0b010 => Self::Avg8,
            0b011 => Self::Avg16,
            0b100 => Self::Avg32,
            0b101 => Self::Avg64,
            0b110 => Self::Avg128,
            _ => Self::Avg256,
        }
    }
}

/// Humidity samples averaged per output (`AV_CONF.AVGH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HumidityAverage {
    Avg4 = 0b000,
    Avg8 = 0b001,
    Avg16 = 0b010,
    #[default]
    Avg32 = 0b011,
    Avg64 = 0b100,
    Avg128 = 0b101,
    Avg256 = 0b110,
    Avg512 = 0b111,
}

impl HumidityAverage {
    pub fn from_bits(reg: u8) -> Self {
        match reg & mask::AVGH {
            0b000 => Self::Avg4,
            0b001 => Self::Avg8,
            0b010 => Self::Avg16,
            0b011 => Self::Avg32,
            0b100 => Self::Avg64,
            0b101 => Self::Avg128,
            0b110 => Self::Avg256,
            _ => Self::Avg512,
        }
    }
}

/// `CTRL_REG1.PD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerMode {
    #[default]
    PowerDown = 0,
    Active = 1 << 7,
}

/// `CTRL_REG1.BDU`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlockDataUpdate {
    Continuous = 0,
    /// Output registers hold until both MSB and LSB were read
    #[default]
    UntilRead = 1 << 2,
}

impl BlockDataUpdate {
    pub fn from_bits(reg: u8) -> Self {
        if reg & mask::BDU != 0 {
            Self::UntilRead
        } else {
            Self::Continuous
        }
    }
}

/// `CTRL_REG1.ODR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputDataRate {
    #[default]
    OneShot = 0b00,
    Hz1 = 0b01,
    Hz7 = 0b10,
    Hz12_5 = 0b11,
}

impl OutputDataRate {
    pub fn from_bits(reg: u8) -> Self {
        match reg & mask::ODR {
            0b00 => Self::OneShot,
            0b01 => Self::Hz1,
            0b10 => Self::Hz7,
            _ => Self::Hz12_5,
        }
    }
}

/// `CTRL_REG3.DRDY_H_L`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataReadyLevel {
    #[default]
    ActiveHigh = 0,
    ActiveLow = 1 << 7,
}

/// `CTRL_REG3.PP_OD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataReadyPinMode {
    #[default]
    PushPull = 0,
    OpenDrain = 1 << 6,
}

/// Factory calibration block
///
/// Temperatures are kept in 1/8 °C and humidities in 1/2 %rH, the way the
/// sensor stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hts221Calibration {
    pub h0_rh_x2: u8,
    pub h1_rh_x2: u8,
    /// 10-bit, MSBs from `T1/T0 msb`
    pub t0_degc_x8: u16,
    pub t1_degc_x8: u16,
    pub h0_t0_out: i16,
    pub h1_t0_out: i16,
    pub t0_out: i16,
    pub t1_out: i16,
}

impl Hts221Calibration {
    /// Decode `CALIB_0..CALIB_F`
    pub fn from_registers(calib: &[u8; 16]) -> Self {
        let word = |lo: usize| i16::from_le_bytes([calib[lo], calib[lo + 1]]);
        let msb = calib[5];

        Self {
            h0_rh_x2: calib[0],
            h1_rh_x2: calib[1],
            t0_degc_x8: (((msb & 0b0011) as u16) << 8) | calib[2] as u16,
            t1_degc_x8: (((msb & 0b1100) as u16) << 6) | calib[3] as u16,
            h0_t0_out: word(6),
            h1_t0_out: word(10),
            t0_out: word(12),
            t1_out: word(14),
        }
    }

    pub fn h0_rh(&self) -> f32 {
        self.h0_rh_x2 as f32 / 2.0
    }

    pub fn h1_rh(&self) -> f32 {
        self.h1_rh_x2 as f32 / 2.0
    }

    pub fn t0_degc(&self) -> f32 {
        self.t0_degc_x8 as f32 / 8.0
    }

    pub fn t1_degc(&self) -> f32 {
        self.t1_degc_x8 as f32 / 8.0
    }

    /// Raw `TEMP_OUT` to °C
    pub fn temperature(&self, raw: i16) -> Option<f32> {
        let span = self.t1_out as i32 - self.t0_out as i32;
        if span == 0 {
            return None;
        }
        let offset = raw as i32 - self.t0_out as i32;
        Some(self.t0_degc() + offset as f32 * (self.t1_degc() - self.t0_degc()) / span as f32)
    }

    /// Raw `HUMIDITY_OUT` to %rH, clamped to 0..=100
    pub fn humidity(&self, raw: i16) -> Option<f32> {
        let span = self.h1_t0_out as i32 - self.h0_t0_out as i32;
        if span == 0 {
            return None;
        }
        let offset = raw as i32 - self.h0_t0_out as i32;
        let rh = self.h0_rh() + offset as f32 * (self.h1_rh() - self.h0_rh()) / span as f32;
        Some(rh.clamp(0.0, 100.0))
    }
}

/// HTS221 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transfer failed
    Bus(E),
    /// `WHO_AM_I` did not read [`DEVICE_ID`]
    InvalidDeviceId(u8),
    /// Both calibration points have the same raw output
    InvalidCalibration,
}

/// HTS221 driver
pub struct Hts221<I2C> {
    i2c: I2C,
}

impl<I2C, E> Hts221<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut value = [0u8];
        self.i2c
            .write_read(ADDRESS, &[register], &mut value)
            .map_err(Error::Bus)?;
        Ok(value[0])
    }

    fn read_burst(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c
            .write_read(ADDRESS, &[register | AUTO_INCREMENT], buffer)
            .map_err(Error::Bus)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(ADDRESS, &[register, value])
            .map_err(Error::Bus)
    }

    fn modify_register(&mut self, register: u8, mask: u8, bits: u8) -> Result<(), Error<E>> {
        let current = self.read_register(register)?;
        self.write_register(register, (current & !mask) | (bits & mask))
    }

    /// Read `WHO_AM_I`
    pub fn device_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(reg::WHO_AM_I)
    }

    /// Fail unless `WHO_AM_I` reads 0xBC
    pub fn verify_device_id(&mut self) -> Result<(), Error<E>> {
        match self.device_id()? {
            DEVICE_ID => Ok(()),
            other => Err(Error::InvalidDeviceId(other)),
        }
    }

    pub fn set_resolution(
        &mut self,
        temperature: TemperatureAverage,
        humidity: HumidityAverage,
    ) -> Result<(), Error<E>> {
        self.modify_register(
            reg::AV_CONF,
            mask::AVGT | mask::AVGH,
            temperature as u8 | humidity as u8,
        )
    }

    pub fn resolution(&mut self) -> Result<(TemperatureAverage, HumidityAverage), Error<E>> {
        let av_conf = self.read_register(reg::AV_CONF)?;
        Ok((
            TemperatureAverage::from_bits(av_conf),
            HumidityAverage::from_bits(av_conf),
        ))
    }

    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG1, mask::PD, mode as u8)
    }

    pub fn set_block_data_update(&mut self, bdu: BlockDataUpdate) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG1, mask::BDU, bdu as u8)
    }

    pub fn block_data_update(&mut self) -> Result<BlockDataUpdate, Error<E>> {
        self.read_register(reg::CTRL_REG1)
            .map(BlockDataUpdate::from_bits)
    }

    pub fn set_output_data_rate(&mut self, odr: OutputDataRate) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG1, mask::ODR, odr as u8)
    }

    pub fn output_data_rate(&mut self) -> Result<OutputDataRate, Error<E>> {
        self.read_register(reg::CTRL_REG1)
            .map(OutputDataRate::from_bits)
    }

    /// Reload the calibration block from flash; the bit clears itself
    pub fn set_boot(&mut self) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG2, mask::BOOT, mask::BOOT)
    }

    /// Whether a reboot is still in progress
    pub fn boot(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::CTRL_REG2)? & mask::BOOT != 0)
    }

    pub fn set_heater(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let bits = if enabled { mask::HEATER } else { 0 };
        self.modify_register(reg::CTRL_REG2, mask::HEATER, bits)
    }

    pub fn heater(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::CTRL_REG2)? & mask::HEATER != 0)
    }

    /// Start a single conversion (with [`OutputDataRate::OneShot`])
    pub fn set_one_shot(&mut self) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG2, mask::ONE_SHOT, mask::ONE_SHOT)
    }

    /// Whether the one-shot conversion is still running
    pub fn one_shot(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::CTRL_REG2)? & mask::ONE_SHOT != 0)
    }

    pub fn set_data_ready_level(&mut self, level: DataReadyLevel) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG3, mask::DRDY_H_L, level as u8)
    }

    pub fn set_data_ready_pin_mode(&mut self, mode: DataReadyPinMode) -> Result<(), Error<E>> {
        self.modify_register(reg::CTRL_REG3, mask::PP_OD, mode as u8)
    }

    /// Route data-ready to the DRDY pin
    pub fn set_data_ready_enable(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let bits = if enabled { mask::DRDY_EN } else { 0 };
        self.modify_register(reg::CTRL_REG3, mask::DRDY_EN, bits)
    }

    pub fn humidity_data_available(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::STATUS_REG)? & mask::H_DA != 0)
    }

    pub fn temperature_data_available(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(reg::STATUS_REG)? & mask::T_DA != 0)
    }

    pub fn raw_humidity(&mut self) -> Result<i16, Error<E>> {
        let mut bytes = [0u8; 2];
        self.read_burst(reg::HUMIDITY_OUT_L, &mut bytes)?;
        Ok(i16::from_le_bytes(bytes))
    }

    pub fn raw_temperature(&mut self) -> Result<i16, Error<E>> {
        let mut bytes = [0u8; 2];
        self.read_burst(reg::TEMP_OUT_L, &mut bytes)?;
        Ok(i16::from_le_bytes(bytes))
    }

    /// Read and decode the whole calibration block
    pub fn calibration(&mut self) -> Result<Hts221Calibration, Error<E>> {
        let mut calib = [0u8; 16];
        self.read_burst(reg::CALIB_0, &mut calib)?;
        Ok(Hts221Calibration::from_registers(&calib))
    }

    /// Current temperature in °C
    pub fn temperature(&mut self, calibration: &Hts221Calibration) -> Result<f32, Error<E>> {
        if calibration.t1_out == calibration.t0_out {
            return Err(Error::InvalidCalibration);
        }
        let raw = self.raw_temperature()?;
        calibration
            .temperature(raw)
            .ok_or(Error::InvalidCalibration)
    }

    /// Current relative humidity in %
    pub fn humidity(&mut self, calibration: &Hts221Calibration) -> Result<f32, Error<E>> {
        if calibration.h1_t0_out == calibration.h0_t0_out {
            return Err(Error::InvalidCalibration);
        }
        let raw = self.raw_humidity()?;
        calibration.humidity(raw).ok_or(Error::InvalidCalibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{I2cOp, MockI2c};
    use proptest::prelude::*;

    // CALIB_0..F as read from a sensor
    const CALIB: [u8; 16] = [
        0x42, 0x8C, 0xA8, 0x3B, 0x00, 0xC4, 0xF8, 0xFF, 0x00, 0x00, 0xBA, 0xD1, 0xFE, 0xFF,
        0xFA, 0x02,
    ];

    fn calibration() -> Hts221Calibration {
        Hts221Calibration::from_registers(&CALIB)
    }

    #[test]
    fn test_calibration_decoding() {
        let cal = calibration();
        assert_eq!(cal.h0_rh_x2, 0x42);
        assert_eq!(cal.h1_rh_x2, 0x8C);
        // T1/T0 msb 0xC4: T0 msb = 0b00, T1 msb = 0b01
        assert_eq!(cal.t0_degc_x8, 0x0A8);
        assert_eq!(cal.t1_degc_x8, 0x13B);
        assert_eq!(cal.h0_t0_out, -8);
        assert_eq!(cal.h1_t0_out, -11846);
        assert_eq!(cal.t0_out, -2);
        assert_eq!(cal.t1_out, 762);
        assert_eq!(cal.t0_degc(), 21.0);
        assert_eq!(cal.h0_rh(), 33.0);
    }

    #[test]
    fn test_temperature_interpolation() {
        let cal = calibration();
        assert_eq!(cal.temperature(cal.t0_out), Some(cal.t0_degc()));
        let t1 = cal.temperature(cal.t1_out).unwrap();
        assert!((t1 - cal.t1_degc()).abs() < 1e-4);
    }

    #[test]
    fn test_humidity_clamped() {
        let cal = Hts221Calibration {
            h0_rh_x2: 40,
            h1_rh_x2: 160,
            h0_t0_out: 0,
            h1_t0_out: 1000,
            ..Hts221Calibration::default()
        };
        assert_eq!(cal.humidity(500), Some(50.0));
        assert_eq!(cal.humidity(2000), Some(100.0));
        assert_eq!(cal.humidity(-1000), Some(0.0));
    }

    #[test]
    fn test_zero_span_rejected_before_bus_access() {
        let mut sensor = Hts221::new(MockI2c::new());
        let cal = Hts221Calibration::default();

        assert_eq!(sensor.temperature(&cal), Err(Error::InvalidCalibration));
        assert_eq!(sensor.humidity(&cal), Err(Error::InvalidCalibration));
        assert!(sensor.release().ops.is_empty());
    }

    #[test]
    fn test_temperature_reads_temp_out_with_auto_increment() {
        let i2c = MockI2c::new().respond(&762i16.to_le_bytes());
        let mut sensor = Hts221::new(i2c);

        let celsius = sensor.temperature(&calibration()).unwrap();
        assert!((celsius - calibration().t1_degc()).abs() < 1e-4);

        let i2c = sensor.release();
        assert_eq!(
            i2c.ops,
            vec![I2cOp::Write(ADDRESS, vec![0xAA]), I2cOp::Read(ADDRESS, 2)]
        );
    }

    #[test]
    fn test_calibration_burst() {
        let i2c = MockI2c::new().respond(&CALIB);
        let mut sensor = Hts221::new(i2c);

        assert_eq!(sensor.calibration().unwrap(), calibration());
        assert_eq!(sensor.release().written(), vec![vec![0xB0]]);
    }

    #[test]
    fn test_device_id() {
        let mut sensor = Hts221::new(MockI2c::new().respond(&[0xBC]).respond(&[0x33]));
        assert_eq!(sensor.verify_device_id(), Ok(()));
        assert_eq!(sensor.verify_device_id(), Err(Error::InvalidDeviceId(0x33)));
    }

    #[test]
    fn test_set_resolution_keeps_reserved_bits() {
        let i2c = MockI2c::new().respond(&[0b1100_0000 | 0x1B]);
        let mut sensor = Hts221::new(i2c);

        sensor
            .set_resolution(TemperatureAverage::Avg256, HumidityAverage::Avg4)
            .unwrap();

        let written = sensor.release().written();
        assert_eq!(written.last(), Some(&vec![reg::AV_CONF, 0b1111_1000]));
    }

    #[test]
    fn test_resolution_decoding() {
        let mut sensor = Hts221::new(MockI2c::new().respond(&[0x1B]));
        assert_eq!(
            sensor.resolution(),
            Ok((TemperatureAverage::Avg16, HumidityAverage::Avg32))
        );
    }

    #[test]
    fn test_power_mode_only_touches_pd() {
        let i2c = MockI2c::new().respond(&[0b0000_0101]);
        let mut sensor = Hts221::new(i2c);

        sensor.set_power_mode(PowerMode::Active).unwrap();
        assert_eq!(
            sensor.release().written().last(),
            Some(&vec![reg::CTRL_REG1, 0b1000_0101])
        );
    }

    #[test]
    fn test_control_flags() {
        let i2c = MockI2c::new()
            .respond(&[0b1000_0010])
            .respond(&[0b1000_0010])
            .respond(&[0b0000_0000]);
        let mut sensor = Hts221::new(i2c);

        assert_eq!(sensor.boot(), Ok(true));
        assert_eq!(sensor.heater(), Ok(true));
        assert_eq!(sensor.one_shot(), Ok(false));
    }

    #[test]
    fn test_data_ready_configuration() {
        let i2c = MockI2c::new()
            .respond(&[0x00])
            .respond(&[0x80])
            .respond(&[0xC0]);
        let mut sensor = Hts221::new(i2c);

        sensor.set_data_ready_level(DataReadyLevel::ActiveLow).unwrap();
        sensor
            .set_data_ready_pin_mode(DataReadyPinMode::OpenDrain)
            .unwrap();
        sensor.set_data_ready_enable(true).unwrap();

        let written = sensor.release().written();
        let writes: Vec<_> = written.iter().filter(|w| w.len() == 2).collect();
        assert_eq!(writes[0], &vec![reg::CTRL_REG3, 0x80]);
        assert_eq!(writes[1], &vec![reg::CTRL_REG3, 0xC0]);
        assert_eq!(writes[2], &vec![reg::CTRL_REG3, 0xC4]);
    }

    #[test]
    fn test_status_flags() {
        let i2c = MockI2c::new().respond(&[0b10]).respond(&[0b10]);
        let mut sensor = Hts221::new(i2c);
        assert_eq!(sensor.humidity_data_available(), Ok(true));
        assert_eq!(sensor.temperature_data_available(), Ok(false));
    }

    #[test]
    fn test_bus_error_propagates() {
        let mut sensor = Hts221::new(MockI2c::failing());
        assert!(matches!(sensor.raw_humidity(), Err(Error::Bus(_))));
    }

    proptest! {
        #[test]
        fn field_decoding_matches_mask(reg: u8) {
            prop_assert_eq!(TemperatureAverage::from_bits(reg) as u8, reg & mask::AVGT);
            prop_assert_eq!(HumidityAverage::from_bits(reg) as u8, reg & mask::AVGH);
            prop_assert_eq!(OutputDataRate::from_bits(reg) as u8, reg & mask::ODR);
            prop_assert_eq!(BlockDataUpdate::from_bits(reg) as u8, reg & mask::BDU);
        }

        #[test]
        fn humidity_always_in_range(raw: i16, h0 in 0u8..200, h1 in 0u8..200, out0: i16, out1: i16) {
            prop_assume!(out0 != out1);
            let cal = Hts221Calibration {
                h0_rh_x2: h0,
                h1_rh_x2: h1,
                h0_t0_out: out0,
                h1_t0_out: out1,
                ..Hts221Calibration::default()
            };
            let rh = cal.humidity(raw).unwrap();
            prop_assert!((0.0..=100.0).contains(&rh));
        }
    }
}
