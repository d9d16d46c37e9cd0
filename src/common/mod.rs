// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod channel;
pub mod error;
pub mod hal_traits;
pub mod timing;
pub mod types;

// --- Re-export key types/traits for easier access ---

// From channel.rs
pub use channel::Channel;

// From error.rs
pub use error::{ChannelError, InitError, ReadError, RegistryInitError};

// From hal_traits.rs
pub use hal_traits::{MuxBus, MuxTimer}; // Core traits

// From types.rs
pub use types::{
    AccelRange, Axis, AxisVector, GyroRange, MagMode, MagResolution, SensorConfiguration,
    SensorReading,
};

// From timing.rs (constants - users can access via common::timing::*)

// --- Feature-gated re-exports ---

// embedded-hal v1 adapters (from hal_traits.rs)
#[cfg(feature = "impl-generic-hal")]
pub use hal_traits::{HalBus, HalTimer};

// Hosted timer (from hal_traits.rs)
#[cfg(feature = "std")]
pub use hal_traits::StdTimer;
