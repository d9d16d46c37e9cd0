// src/driver/mod.rs

//! Concrete IMU drivers built on embedded-hal.

pub mod mpu9250;

#[cfg(feature = "linux")]
pub mod linux;

pub use mpu9250::{probe_who_am_i, Mpu9250, Mpu9250Error};

#[cfg(feature = "linux")]
pub use linux::{LinuxMpu9250, Mpu9250Factory};
