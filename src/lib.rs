// src/lib.rs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod common;
pub mod mux;
pub mod registry;
pub mod session;

#[cfg(feature = "impl-generic-hal")]
pub mod driver;

#[cfg(feature = "std")]
pub mod poll;

#[cfg(feature = "config")]
pub mod config;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use common::{
    AxisVector, Channel, ChannelError, InitError, MuxBus, MuxTimer, ReadError, RegistryInitError,
    SensorConfiguration, SensorReading,
};
pub use mux::ChannelSelector;
pub use registry::{ReadCycleResult, SessionRegistry};
pub use session::{DeviceSession, DriverFactory, ImuDriver};

#[cfg(feature = "impl-generic-hal")]
pub use common::{HalBus, HalTimer};

#[cfg(feature = "std")]
pub use common::StdTimer;
