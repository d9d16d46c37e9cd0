// src/session/driver.rs

use crate::common::types::{AxisVector, SensorConfiguration};
use core::fmt::Debug;

/// Register-level access to one IMU, as seen through a selected channel.
///
/// Implementations never touch the multiplexer. The caller guarantees the
/// right channel is selected before each call.
pub trait ImuDriver {
    type Error: Debug;

    /// Measures and stores the at-rest bias. Runs once per session.
    fn calibrate(&mut self) -> Result<(), Self::Error>;

    /// Applies the session's `SensorConfiguration`. Runs once, after
    /// calibration.
    fn configure(&mut self) -> Result<(), Self::Error>;

    /// Acceleration in g.
    fn read_accelerometer(&mut self) -> Result<AxisVector, Self::Error>;

    /// Angular rate in degrees per second.
    fn read_gyroscope(&mut self) -> Result<AxisVector, Self::Error>;

    /// Magnetic field in microtesla.
    fn read_magnetometer(&mut self) -> Result<AxisVector, Self::Error>;
}

/// Builds a driver bound to the shared device address.
pub trait DriverFactory {
    type Driver: ImuDriver;

    fn construct(
        &mut self,
        address: u8,
        configuration: &SensorConfiguration,
    ) -> Result<Self::Driver, <Self::Driver as ImuDriver>::Error>;
}
