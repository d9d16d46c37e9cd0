// src/driver/mpu9250/mod.rs

pub mod registers;

use crate::common::types::{
    AccelRange, AxisVector, GyroRange, MagMode, MagResolution, SensorConfiguration,
};
use crate::session::ImuDriver;
use core::fmt::Debug;
use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::{debug, info};

/// At-rest samples averaged by [`Mpu9250::calibrate`].
const CALIBRATION_SAMPLES: u16 = 32;
const CALIBRATION_INTERVAL_MS: u32 = 2;

/// Full-scale raw value of a signed 16-bit sample.
const RAW_FULL_SCALE: f32 = 32768.0;

#[derive(Debug, thiserror::Error)]
pub enum Mpu9250Error<E>
where
    E: Debug,
{
    #[error("i2c transfer failed: {0:?}")]
    Bus(E),

    #[error("unexpected WHO_AM_I {found:#04x} (expected 0x71 or 0x73)")]
    UnexpectedDevice { found: u8 },

    #[error("AK8963 not found behind bypass (WIA {found:#04x})")]
    MagnetometerMismatch { found: u8 },

    #[error("magnetometer data not ready")]
    MagnetometerNotReady,

    #[error("magnetometer overflow")]
    MagnetometerOverflow,
}

/// Reads WHO_AM_I from whatever answers at `address`.
///
/// Does not require the identity to match; used by the channel scan.
pub fn probe_who_am_i<I2C: I2c>(i2c: &mut I2C, address: u8) -> Result<u8, I2C::Error> {
    let mut id = [0u8; 1];
    i2c.write_read(address, &[registers::WHO_AM_I], &mut id)?;
    Ok(id[0])
}

/// MPU-9250 / MPU-9255 with its AK8963 magnetometer in bypass mode.
///
/// Accelerometer in g, gyroscope in degrees per second, magnetometer in
/// microtesla. Bias measured by [`calibrate`](ImuDriver::calibrate) is
/// subtracted from every accelerometer and gyroscope sample.
#[derive(Debug)]
pub struct Mpu9250<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    configuration: SensorConfiguration,
    accel_bias: [f32; 3],
    gyro_bias: [f32; 3],
    // Ranges currently programmed into the device; reset defaults until
    // configure() runs
    accel_range: AccelRange,
    gyro_range: GyroRange,
    mag_adjust: [f32; 3],
}

impl<I2C, D> Mpu9250<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Checks the identity at `address`, resets the device and wakes it.
    pub fn new(
        mut i2c: I2C,
        mut delay: D,
        address: u8,
        configuration: SensorConfiguration,
    ) -> Result<Self, Mpu9250Error<I2C::Error>> {
        let found = probe_who_am_i(&mut i2c, address).map_err(Mpu9250Error::Bus)?;
        if !registers::ACCEPTED_IDS.contains(&found) {
            return Err(Mpu9250Error::UnexpectedDevice { found });
        }
        debug!("MPU-9250 class device at {:#04x} (WHO_AM_I {:#04x})", address, found);

        i2c.write(address, &[registers::PWR_MGMT_1, registers::PWR_MGMT_1_H_RESET])
            .map_err(Mpu9250Error::Bus)?;
        delay.delay_ms(100);
        i2c.write(address, &[registers::PWR_MGMT_1, registers::PWR_MGMT_1_CLKSEL_AUTO])
            .map_err(Mpu9250Error::Bus)?;
        delay.delay_ms(10);

        Ok(Mpu9250 {
            i2c,
            delay,
            address,
            configuration,
            accel_bias: [0.0; 3],
            gyro_bias: [0.0; 3],
            accel_range: AccelRange::G2,
            gyro_range: GyroRange::Dps250,
            mag_adjust: [1.0; 3],
        })
    }

    pub fn configuration(&self) -> &SensorConfiguration {
        &self.configuration
    }

    pub fn accel_bias(&self) -> AxisVector {
        self.accel_bias.into()
    }

    pub fn gyro_bias(&self) -> AxisVector {
        self.gyro_bias.into()
    }

    /// Releases the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Mpu9250Error<I2C::Error>> {
        self.i2c
            .write(address, &[register, value])
            .map_err(Mpu9250Error::Bus)
    }

    fn read_registers(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), Mpu9250Error<I2C::Error>> {
        self.i2c
            .write_read(address, &[register], buf)
            .map_err(Mpu9250Error::Bus)
    }

    fn read_raw_be(&mut self, register: u8) -> Result<[i16; 3], Mpu9250Error<I2C::Error>> {
        let mut buf = [0u8; 6];
        self.read_registers(self.address, register, &mut buf)?;
        Ok([
            i16::from_be_bytes([buf[0], buf[1]]),
            i16::from_be_bytes([buf[2], buf[3]]),
            i16::from_be_bytes([buf[4], buf[5]]),
        ])
    }

    fn read_accel_unbiased(&mut self) -> Result<[f32; 3], Mpu9250Error<I2C::Error>> {
        let raw = self.read_raw_be(registers::ACCEL_XOUT_H)?;
        Ok(scale(raw, self.accel_range.full_scale_g()))
    }

    fn read_gyro_unbiased(&mut self) -> Result<[f32; 3], Mpu9250Error<I2C::Error>> {
        let raw = self.read_raw_be(registers::GYRO_XOUT_H)?;
        Ok(scale(raw, self.gyro_range.full_scale_dps()))
    }

    fn init_magnetometer(&mut self) -> Result<(), Mpu9250Error<I2C::Error>> {
        let ak = registers::AK8963_ADDRESS;

        let mut wia = [0u8; 1];
        self.read_registers(ak, registers::AK8963_WIA, &mut wia)?;
        if wia[0] != registers::AK8963_WIA_VALUE {
            return Err(Mpu9250Error::MagnetometerMismatch { found: wia[0] });
        }

        self.write_register(ak, registers::AK8963_CNTL2, registers::AK8963_CNTL2_SRST)?;
        self.delay.delay_ms(10);

        // Sensitivity adjustment: H_adj = H * ((ASA - 128) / 256 + 1)
        self.write_register(ak, registers::AK8963_CNTL1, registers::AK8963_MODE_FUSE_ROM)?;
        self.delay.delay_ms(10);
        let mut asa = [0u8; 3];
        self.read_registers(ak, registers::AK8963_ASAX, &mut asa)?;
        for (adjust, value) in self.mag_adjust.iter_mut().zip(asa) {
            *adjust = (value as f32 - 128.0) / 256.0 + 1.0;
        }

        // Mode changes must pass through power-down
        self.write_register(ak, registers::AK8963_CNTL1, registers::AK8963_MODE_POWER_DOWN)?;
        self.delay.delay_ms(10);
        let cntl1 = mag_mode_bits(self.configuration.mag_mode)
            | mag_resolution_bits(self.configuration.mag_resolution);
        self.write_register(ak, registers::AK8963_CNTL1, cntl1)?;
        self.delay.delay_ms(10);
        Ok(())
    }
}

impl<I2C, D> ImuDriver for Mpu9250<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Mpu9250Error<I2C::Error>;

    /// Averages at-rest samples into accelerometer and gyroscope bias. The
    /// device must be still and level; one g is removed from Z.
    fn calibrate(&mut self) -> Result<(), Self::Error> {
        let mut accel_sum = [0.0f32; 3];
        let mut gyro_sum = [0.0f32; 3];
        for _ in 0..CALIBRATION_SAMPLES {
            let accel = self.read_accel_unbiased()?;
            let gyro = self.read_gyro_unbiased()?;
            for axis in 0..3 {
                accel_sum[axis] += accel[axis];
                gyro_sum[axis] += gyro[axis];
            }
            self.delay.delay_ms(CALIBRATION_INTERVAL_MS);
        }

        let n = CALIBRATION_SAMPLES as f32;
        self.accel_bias = accel_sum.map(|sum| sum / n);
        self.gyro_bias = gyro_sum.map(|sum| sum / n);
        self.accel_bias[2] -= 1.0;
        debug!(
            "calibrated at {:#04x}: accel bias {} g, gyro bias {} dps",
            self.address,
            self.accel_bias(),
            self.gyro_bias()
        );
        Ok(())
    }

    fn configure(&mut self) -> Result<(), Self::Error> {
        let address = self.address;
        self.write_register(address, registers::CONFIG, registers::DLPF_CFG_41HZ)?;
        self.write_register(address, registers::GYRO_CONFIG, gyro_range_bits(self.configuration.gyro_range))?;
        self.gyro_range = self.configuration.gyro_range;
        self.write_register(address, registers::ACCEL_CONFIG, accel_range_bits(self.configuration.accel_range))?;
        self.accel_range = self.configuration.accel_range;

        self.write_register(address, registers::INT_PIN_CFG, registers::INT_PIN_CFG_BYPASS_EN)?;
        self.delay.delay_ms(10);
        self.init_magnetometer()?;

        info!(
            "MPU-9250 at {:#04x} configured: gyro {:?}, accel {:?}, mag {:?} {:?}",
            address,
            self.configuration.gyro_range,
            self.configuration.accel_range,
            self.configuration.mag_resolution,
            self.configuration.mag_mode
        );
        Ok(())
    }

    fn read_accelerometer(&mut self) -> Result<AxisVector, Self::Error> {
        let accel = self.read_accel_unbiased()?;
        Ok(subtract(accel, self.accel_bias))
    }

    fn read_gyroscope(&mut self) -> Result<AxisVector, Self::Error> {
        let gyro = self.read_gyro_unbiased()?;
        Ok(subtract(gyro, self.gyro_bias))
    }

    fn read_magnetometer(&mut self) -> Result<AxisVector, Self::Error> {
        let ak = registers::AK8963_ADDRESS;
        let mut st1 = [0u8; 1];
        self.read_registers(ak, registers::AK8963_ST1, &mut st1)?;
        if st1[0] & registers::AK8963_ST1_DRDY == 0 {
            return Err(Mpu9250Error::MagnetometerNotReady);
        }

        // HXL..HZH then ST2
        let mut buf = [0u8; 7];
        self.read_registers(ak, registers::AK8963_HXL, &mut buf)?;
        if buf[6] & registers::AK8963_ST2_HOFL != 0 {
            return Err(Mpu9250Error::MagnetometerOverflow);
        }

        let sensitivity = self.configuration.mag_resolution.microtesla_per_lsb();
        let mut field = [0.0f32; 3];
        for axis in 0..3 {
            let raw = i16::from_le_bytes([buf[2 * axis], buf[2 * axis + 1]]);
            field[axis] = raw as f32 * self.mag_adjust[axis] * sensitivity;
        }
        Ok(field.into())
    }
}

fn scale(raw: [i16; 3], full_scale: f32) -> [f32; 3] {
    raw.map(|value| value as f32 * full_scale / RAW_FULL_SCALE)
}

fn subtract(value: [f32; 3], bias: [f32; 3]) -> AxisVector {
    AxisVector::new(value[0] - bias[0], value[1] - bias[1], value[2] - bias[2])
}

fn gyro_range_bits(range: GyroRange) -> u8 {
    match range {
        GyroRange::Dps250 => registers::FS_SEL_0,
        GyroRange::Dps500 => registers::FS_SEL_1,
        GyroRange::Dps1000 => registers::FS_SEL_2,
        GyroRange::Dps2000 => registers::FS_SEL_3,
    }
}

fn accel_range_bits(range: AccelRange) -> u8 {
    match range {
        AccelRange::G2 => registers::FS_SEL_0,
        AccelRange::G4 => registers::FS_SEL_1,
        AccelRange::G8 => registers::FS_SEL_2,
        AccelRange::G16 => registers::FS_SEL_3,
    }
}

fn mag_mode_bits(mode: MagMode) -> u8 {
    match mode {
        MagMode::Continuous8Hz => registers::AK8963_MODE_CONTINUOUS_8HZ,
        MagMode::Continuous100Hz => registers::AK8963_MODE_CONTINUOUS_100HZ,
    }
}

fn mag_resolution_bits(resolution: MagResolution) -> u8 {
    match resolution {
        MagResolution::Bits14 => 0,
        MagResolution::Bits16 => registers::AK8963_BIT_16,
    }
}
