// src/registry/mod.rs

pub mod cycle;

pub use cycle::{ChannelOutcome, ReadCycleResult};

use crate::common::{
    channel::Channel,
    error::RegistryInitError,
    hal_traits::{MuxBus, MuxTimer},
    types::SensorConfiguration,
};
use crate::mux::ChannelSelector;
use crate::session::{DeviceSession, DriverFactory, ImuDriver};
use log::{debug, info, warn};

const CAPACITY: usize = Channel::COUNT as usize;

/// Every active session plus the selector they share.
///
/// Sessions are kept in ascending channel order regardless of the order
/// they were requested in.
#[derive(Debug)]
pub struct SessionRegistry<B, T, D>
where
    B: MuxBus,
    T: MuxTimer,
    D: ImuDriver,
{
    selector: ChannelSelector<B, T>,
    sessions: heapless::Vec<DeviceSession<D>, CAPACITY>,
}

impl<B, T, D> SessionRegistry<B, T, D>
where
    B: MuxBus,
    T: MuxTimer,
    D: ImuDriver,
{
    /// Brings up one session per channel, in the order given.
    ///
    /// Fail-fast: the first failure aborts startup and names its channel.
    /// Sessions created before it are dropped and no registry is produced.
    pub fn initialize_all<F>(
        mut selector: ChannelSelector<B, T>,
        factory: &mut F,
        channels: &[Channel],
        configuration: SensorConfiguration,
    ) -> Result<Self, RegistryInitError<B::Error, D::Error>>
    where
        F: DriverFactory<Driver = D>,
    {
        validate_channels::<B::Error, D::Error>(channels)?;

        let mut sessions: heapless::Vec<DeviceSession<D>, CAPACITY> = heapless::Vec::new();
        for &channel in channels {
            let session = DeviceSession::init(&mut selector, factory, channel, configuration)
                .map_err(|error| {
                    warn!("channel {}: initialization failed: {}", channel, error);
                    RegistryInitError::Channel { channel, error }
                })?;
            // Capacity is guaranteed by validate_channels
            let _ = sessions.push(session);
        }
        sessions.sort_unstable_by_key(|s| s.channel());

        info!("{} sensor session(s) initialized", sessions.len());
        Ok(SessionRegistry { selector, sessions })
    }

    /// Reads every session once, in ascending channel order.
    ///
    /// A failing channel is recorded and the rest are still read.
    pub fn read_all(&mut self) -> ReadCycleResult<B::Error, D::Error> {
        let mut result = ReadCycleResult::new();
        for session in self.sessions.iter_mut() {
            let outcome = session.read(&mut self.selector);
            result.record(session.channel(), outcome);
        }
        debug!(
            "read cycle: {} ok, {} failed",
            result.success_count(),
            result.failure_count()
        );
        result
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.sessions.iter().map(|s| s.channel())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn selector(&self) -> &ChannelSelector<B, T> {
        &self.selector
    }

    /// Drops every session and returns the selector.
    pub fn into_parts(self) -> ChannelSelector<B, T> {
        self.selector
    }
}

fn validate_channels<E, D>(channels: &[Channel]) -> Result<(), RegistryInitError<E, D>>
where
    E: core::fmt::Debug,
    D: core::fmt::Debug,
{
    if channels.is_empty() {
        return Err(RegistryInitError::NoChannels);
    }
    let mut seen = 0u8;
    for channel in channels {
        if seen & channel.mask() != 0 {
            return Err(RegistryInitError::DuplicateChannel(*channel));
        }
        seen |= channel.mask();
    }
    Ok(())
}
