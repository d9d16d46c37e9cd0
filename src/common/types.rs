// src/common/types.rs

use super::channel::Channel;
use arrayvec::ArrayString;
use core::fmt::{self, Write};

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

// --- Axis vectors ---

/// One of the three measurement categories read per session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    Accelerometer,
    Gyroscope,
    Magnetometer,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Accelerometer => write!(f, "accelerometer"),
            Axis::Gyroscope => write!(f, "gyroscope"),
            Axis::Magnetometer => write!(f, "magnetometer"),
        }
    }
}

/// A 3-component measurement (x, y, z) in the driver's engineering units.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AxisVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisVector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(f32, f32, f32)> for AxisVector {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for AxisVector {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Formats as a 3-component literal, e.g. `(1.0, 2.0, 3.0)`.
impl fmt::Display for AxisVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?}, {:?})", self.x, self.y, self.z)
    }
}

// --- Readings ---

/// Capacity of a formatted console line. Three vectors of worst-case `f32`
/// debug output plus labels fit comfortably.
pub const LINE_CAPACITY: usize = 256;

/// One complete read of one session. Produced per cycle, never stored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SensorReading {
    pub channel: Channel,
    pub accel: AxisVector,
    pub gyro: AxisVector,
    pub mag: AxisVector,
    /// Monotonic time in microseconds at which the axis reads completed.
    pub timestamp_us: u64,
}

impl SensorReading {
    pub fn axis(&self, axis: Axis) -> AxisVector {
        match axis {
            Axis::Accelerometer => self.accel,
            Axis::Gyroscope => self.gyro,
            Axis::Magnetometer => self.mag,
        }
    }

    /// Formats the console status line into a fixed buffer (no allocation).
    pub fn format_line(&self) -> Result<ArrayString<LINE_CAPACITY>, fmt::Error> {
        let mut line = ArrayString::new();
        write!(line, "{}", self)?;
        Ok(line)
    }
}

/// `Channel {ch} | Accel: {accel} | Gyro: {gyro} | Mag: {mag}`
impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Channel {} | Accel: {} | Gyro: {} | Mag: {}",
            self.channel, self.accel, self.gyro, self.mag
        )
    }
}

// --- Sensor configuration ---

/// Gyroscope full-scale range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum GyroRange {
    #[default]
    #[cfg_attr(feature = "config", serde(rename = "250dps"))]
    Dps250,
    #[cfg_attr(feature = "config", serde(rename = "500dps"))]
    Dps500,
    #[cfg_attr(feature = "config", serde(rename = "1000dps"))]
    Dps1000,
    #[cfg_attr(feature = "config", serde(rename = "2000dps"))]
    Dps2000,
}

impl GyroRange {
    /// Full-scale value in degrees per second.
    pub const fn full_scale_dps(&self) -> f32 {
        match self {
            GyroRange::Dps250 => 250.0,
            GyroRange::Dps500 => 500.0,
            GyroRange::Dps1000 => 1000.0,
            GyroRange::Dps2000 => 2000.0,
        }
    }
}

/// Accelerometer full-scale range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum AccelRange {
    #[default]
    #[cfg_attr(feature = "config", serde(rename = "2g"))]
    G2,
    #[cfg_attr(feature = "config", serde(rename = "4g"))]
    G4,
    #[cfg_attr(feature = "config", serde(rename = "8g"))]
    G8,
    #[cfg_attr(feature = "config", serde(rename = "16g"))]
    G16,
}

impl AccelRange {
    /// Full-scale value in g.
    pub const fn full_scale_g(&self) -> f32 {
        match self {
            AccelRange::G2 => 2.0,
            AccelRange::G4 => 4.0,
            AccelRange::G8 => 8.0,
            AccelRange::G16 => 16.0,
        }
    }
}

/// Magnetometer output resolution.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum MagResolution {
    #[cfg_attr(feature = "config", serde(rename = "14bit"))]
    Bits14,
    #[default]
    #[cfg_attr(feature = "config", serde(rename = "16bit"))]
    Bits16,
}

impl MagResolution {
    /// Sensitivity in microtesla per LSB.
    pub const fn microtesla_per_lsb(&self) -> f32 {
        match self {
            MagResolution::Bits14 => 0.6,
            MagResolution::Bits16 => 0.15,
        }
    }
}

/// Magnetometer sample-rate mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum MagMode {
    Continuous8Hz,
    #[default]
    Continuous100Hz,
}

/// Immutable per-session device settings. All sessions share one instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SensorConfiguration {
    pub gyro_range: GyroRange,
    pub accel_range: AccelRange,
    pub mag_resolution: MagResolution,
    pub mag_mode: MagMode,
    /// Shared 7-bit device address, identical on every channel.
    pub address: u8,
}

impl SensorConfiguration {
    /// MPU-9250 with AD0 pulled high.
    pub const DEFAULT_ADDRESS: u8 = 0x69;

    pub const fn new(address: u8) -> Self {
        Self {
            gyro_range: GyroRange::Dps250,
            accel_range: AccelRange::G2,
            mag_resolution: MagResolution::Bits16,
            mag_mode: MagMode::Continuous100Hz,
            address,
        }
    }
}

impl Default for SensorConfiguration {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ADDRESS)
    }
}
