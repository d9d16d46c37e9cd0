// src/common/error.rs

use super::channel::Channel;
use super::types::Axis;
use core::fmt::Debug;

/// Failure of a multiplexer channel select.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError<E = ()>
where
    E: Debug, // Debug is all a HAL error is guaranteed to offer
{
    /// Requested index is not in `0..=7`. No bus I/O was attempted.
    #[error("channel {0} out of range (valid channels are 0-7)")]
    OutOfRange(u8),

    /// The control byte write failed. The active channel is unknown until
    /// the next successful select.
    #[error("multiplexer bus write failed: {0:?}")]
    BusFailure(E),
}

/// Failure while bringing up one device session.
///
/// `E` is the bus transport error, `D` the driver error.
#[derive(Debug, thiserror::Error)]
pub enum InitError<E, D>
where
    E: Debug,
    D: Debug,
{
    #[error("channel select failed: {0}")]
    SelectFailed(ChannelError<E>),

    #[error("driver construction failed: {0:?}")]
    DriverConstructFailed(D),

    #[error("calibration failed: {0:?}")]
    CalibrationFailed(D),

    #[error("configuration failed: {0:?}")]
    ConfigurationFailed(D),
}

/// Failure of a single session read. The reading is all-or-nothing.
#[derive(Debug, thiserror::Error)]
pub enum ReadError<E, D>
where
    E: Debug,
    D: Debug,
{
    /// Select failed, so no driver I/O was attempted.
    #[error("channel select failed: {0}")]
    SelectFailed(ChannelError<E>),

    /// An axis read failed after a successful select.
    #[error("{axis} read failed: {error:?}")]
    AxisReadFailure { axis: Axis, error: D },
}

/// Startup failure of the whole sensor array. Always names the channel when
/// one is involved.
#[derive(Debug, thiserror::Error)]
pub enum RegistryInitError<E, D>
where
    E: Debug,
    D: Debug,
{
    #[error("initialization failed on channel {channel}: {error}")]
    Channel { channel: Channel, error: InitError<E, D> },

    #[error("no channels configured")]
    NoChannels,

    #[error("channel {0} is listed more than once")]
    DuplicateChannel(Channel),
}

impl<E: Debug, D: Debug> RegistryInitError<E, D> {
    /// The channel this error is about, if any.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            RegistryInitError::Channel { channel, .. } => Some(*channel),
            RegistryInitError::DuplicateChannel(channel) => Some(*channel),
            RegistryInitError::NoChannels => None,
        }
    }
}

// Allow `?` on a select inside init/read paths
impl<E: Debug, D: Debug> From<ChannelError<E>> for InitError<E, D> {
    fn from(e: ChannelError<E>) -> Self {
        InitError::SelectFailed(e)
    }
}

impl<E: Debug, D: Debug> From<ChannelError<E>> for ReadError<E, D> {
    fn from(e: ChannelError<E>) -> Self {
        ReadError::SelectFailed(e)
    }
}
