// src/mux/mod.rs

pub mod scan;
pub mod sweep;

pub use scan::{ProbeOutcome, ScanEntry, ScanReport, MAX_SCAN_ADDRESSES};
pub use sweep::{AddressSet, AddressSweep, SweepEntry, SweepOutcome};

use crate::common::{
    channel::Channel,
    error::ChannelError,
    hal_traits::{MuxBus, MuxTimer},
    timing,
};
use core::time::Duration;
use log::{trace, warn};

/// Owns the multiplexer bus handle and performs every channel switch.
///
/// Holds no record of which channel is active. Callers select before every
/// access; the multiplexer is the only source of truth.
#[derive(Debug)]
pub struct ChannelSelector<B, T>
where
    B: MuxBus,
    T: MuxTimer,
{
    bus: B,
    timer: T,
    address: u8,
    settle: Duration,
}

impl<B, T> ChannelSelector<B, T>
where
    B: MuxBus,
    T: MuxTimer,
{
    /// TCA9548A with A0..A2 tied low.
    pub const DEFAULT_ADDRESS: u8 = 0x70;

    pub fn new(bus: B, timer: T) -> Self {
        Self::with_settings(bus, timer, Self::DEFAULT_ADDRESS, timing::SETTLE_DELAY)
    }

    pub fn with_settings(bus: B, timer: T, address: u8, settle: Duration) -> Self {
        ChannelSelector {
            bus,
            timer,
            address,
            settle,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle
    }

    /// Connects `channel` and disconnects every other one, then waits the
    /// settle delay. On a bus failure the active channel is unknown.
    pub fn select(&mut self, channel: Channel) -> Result<(), ChannelError<B::Error>> {
        let mask = channel.mask();
        trace!("mux {:#04x}: select channel {} (control {:#010b})", self.address, channel, mask);

        self.write_control(mask)?;
        self.timer.delay_us(timing::as_micros_u32(self.settle));
        Ok(())
    }

    /// Same as [`select`](Self::select) for an unchecked index. Indices
    /// outside `0..=7` fail with `OutOfRange` before any bus I/O.
    pub fn select_index(&mut self, index: u8) -> Result<(), ChannelError<B::Error>> {
        let channel = Channel::new(index).map_err(|_| ChannelError::OutOfRange(index))?;
        self.select(channel)
    }

    /// Disconnects all channels. Doubles as a presence probe: the multiplexer
    /// must acknowledge the write. No settle delay, nothing downstream is
    /// accessed afterwards.
    pub fn deselect_all(&mut self) -> Result<(), ChannelError<B::Error>> {
        trace!("mux {:#04x}: deselect all", self.address);
        self.write_control(timing::DESELECT_ALL)
    }

    /// Current time from the selector's timer, used to stamp readings.
    pub fn now_us(&self) -> u64 {
        self.timer.now_us()
    }

    /// Tears the selector down, handing back the bus and timer.
    pub fn release(self) -> (B, T) {
        (self.bus, self.timer)
    }

    fn write_control(&mut self, value: u8) -> Result<(), ChannelError<B::Error>> {
        self.bus.write_byte(self.address, value).map_err(|e| {
            warn!("mux {:#04x}: control write {:#04x} failed: {:?}", self.address, value, e);
            ChannelError::BusFailure(e)
        })
    }
}
