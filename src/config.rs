// src/config.rs

//! Layered startup configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults,
//! 2. a TOML file (`tca-imu-mux.toml` unless another path is given),
//! 3. environment variables prefixed `IMU_MUX_`; nested keys use `__`.
//!
//! ```text
//! IMU_MUX_BUS=/dev/i2c-1
//! IMU_MUX_CHANNELS=[0,1,2]
//! IMU_MUX_SENSOR__ADDRESS=0x68
//! ```

use crate::common::{channel::Channel, timing, types::SensorConfiguration};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "tca-imu-mux.toml";
pub const ENV_PREFIX: &str = "IMU_MUX_";

const MAX_7BIT_ADDRESS: u8 = 0x7F;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] figment::Error),
    #[error("configuration validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxConfig {
    /// I2C character device the multiplexer and sensors hang off.
    pub bus: PathBuf,
    pub mux_address: u8,
    /// Multiplexer channels with a sensor attached.
    pub channels: Vec<u8>,
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_period: Duration,
    pub sensor: SensorConfiguration,
}

impl Default for MuxConfig {
    fn default() -> Self {
        MuxConfig {
            bus: PathBuf::from("/dev/i2c-7"),
            mux_address: 0x70,
            channels: vec![2, 3, 4],
            settle_delay: timing::SETTLE_DELAY,
            poll_period: timing::POLL_PERIOD,
            sensor: SensorConfiguration::default(),
        }
    }
}

impl MuxConfig {
    /// Loads and validates. `None` reads the default file if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::extract(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads without validating, so callers can layer overrides first.
    pub fn extract(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        Self::figment_with_prefix(path, ENV_PREFIX)
    }

    fn figment_with_prefix(path: Option<&Path>, prefix: &str) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(MuxConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(prefix).split("__"))
    }

    /// Checks:
    /// - at least one channel, each in 0-7, none repeated
    /// - both addresses fit in 7 bits and differ from each other
    /// - non-zero poll period
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::Validation("no channels configured".into()));
        }
        let mut seen = 0u8;
        for &index in &self.channels {
            let channel = Channel::new(index).map_err(|e| ConfigError::Validation(e.to_string()))?;
            if seen & channel.mask() != 0 {
                return Err(ConfigError::Validation(format!(
                    "channel {} is listed more than once",
                    index
                )));
            }
            seen |= channel.mask();
        }

        for (name, address) in [("mux_address", self.mux_address), ("sensor.address", self.sensor.address)] {
            if address > MAX_7BIT_ADDRESS {
                return Err(ConfigError::Validation(format!(
                    "{} {:#04x} is not a 7-bit I2C address",
                    name, address
                )));
            }
        }
        if self.mux_address == self.sensor.address {
            return Err(ConfigError::Validation(format!(
                "sensor address {:#04x} collides with the multiplexer address",
                self.sensor.address
            )));
        }

        if self.poll_period.is_zero() {
            return Err(ConfigError::Validation("poll_period must be non-zero".into()));
        }
        Ok(())
    }

    /// Configured channels, in file order.
    pub fn channel_list(&self) -> Result<Vec<Channel>, ConfigError> {
        self.channels
            .iter()
            .map(|&index| Channel::new(index).map_err(|e| ConfigError::Validation(e.to_string())))
            .collect()
    }

    pub fn sensor_configuration(&self) -> SensorConfiguration {
        self.sensor
    }
}
