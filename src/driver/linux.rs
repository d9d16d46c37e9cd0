// src/driver/linux.rs

use super::mpu9250::{Mpu9250, Mpu9250Error};
use crate::common::types::SensorConfiguration;
use crate::session::DriverFactory;
use linux_embedded_hal::{Delay, I2CError, I2cdev};
use log::debug;
use std::path::{Path, PathBuf};

/// Driver bound to a Linux `/dev/i2c-N` character device.
pub type LinuxMpu9250 = Mpu9250<I2cdev, Delay>;

/// Opens a fresh `I2cdev` on the same bus for every session.
///
/// Each session keeps its own file handle; the multiplexer decides which
/// physical device the handle reaches at any instant.
#[derive(Debug, Clone)]
pub struct Mpu9250Factory {
    bus_path: PathBuf,
}

impl Mpu9250Factory {
    pub fn new(bus_path: impl Into<PathBuf>) -> Self {
        Mpu9250Factory {
            bus_path: bus_path.into(),
        }
    }

    pub fn bus_path(&self) -> &Path {
        &self.bus_path
    }
}

impl DriverFactory for Mpu9250Factory {
    type Driver = LinuxMpu9250;

    fn construct(
        &mut self,
        address: u8,
        configuration: &SensorConfiguration,
    ) -> Result<LinuxMpu9250, Mpu9250Error<I2CError>> {
        debug!("opening {} for device {:#04x}", self.bus_path.display(), address);
        let i2c = I2cdev::new(&self.bus_path).map_err(|e| Mpu9250Error::Bus(I2CError::from(e)))?;
        Mpu9250::new(i2c, Delay, address, *configuration)
    }
}
