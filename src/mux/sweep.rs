// src/mux/sweep.rs

use super::ChannelSelector;
use crate::common::{
    channel::Channel,
    hal_traits::{MuxBus, MuxTimer},
};
use core::fmt;
use log::{debug, warn};

/// Lowest address tried by a sweep. 0x00-0x07 are reserved.
pub const SWEEP_FIRST: u8 = 0x08;
/// Highest address tried by a sweep. 0x78-0x7F are reserved.
pub const SWEEP_LAST: u8 = 0x77;

/// Set of 7-bit I2C addresses.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AddressSet(u128);

impl AddressSet {
    pub fn insert(&mut self, address: u8) {
        if address < 0x80 {
            self.0 |= 1u128 << address;
        }
    }

    pub fn contains(&self, address: u8) -> bool {
        address < 0x80 && self.0 & (1u128 << address) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Ascending.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..0x80u8).filter(move |address| self.contains(*address))
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no devices");
        }
        for (i, address) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:#04x}", address)?;
        }
        Ok(())
    }
}

/// What answered behind one channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SweepOutcome {
    Responding(AddressSet),
    SelectFailed,
}

impl fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepOutcome::Responding(found) => write!(f, "{}", found),
            SweepOutcome::SelectFailed => write!(f, "select failed"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SweepEntry {
    pub channel: Channel,
    pub outcome: SweepOutcome,
}

/// Result of [`ChannelSelector::sweep_addresses`], in channel order given.
#[derive(Debug, Clone, Default)]
pub struct AddressSweep {
    entries: heapless::Vec<SweepEntry, { Channel::COUNT as usize }>,
}

impl AddressSweep {
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn outcome(&self, channel: Channel) -> Option<SweepOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.channel == channel)
            .map(|entry| entry.outcome)
    }

    /// Addresses that acknowledged on `channel`; empty if it was not swept or
    /// could not be selected.
    pub fn responding(&self, channel: Channel) -> AddressSet {
        match self.outcome(channel) {
            Some(SweepOutcome::Responding(found)) => found,
            _ => AddressSet::default(),
        }
    }
}

impl<B, T> ChannelSelector<B, T>
where
    B: MuxBus,
    T: MuxTimer,
{
    /// Selects each channel and asks `ack` whether anything answers at every
    /// address from [`SWEEP_FIRST`] to [`SWEEP_LAST`].
    ///
    /// The multiplexer's own address is skipped. It answers on every channel.
    /// Ends with every channel disconnected.
    pub fn sweep_addresses<I, A>(&mut self, channels: I, mut ack: A) -> AddressSweep
    where
        I: IntoIterator<Item = Channel>,
        A: FnMut(Channel, u8) -> bool,
    {
        let mut sweep = AddressSweep::default();
        let own = self.address();

        for channel in channels.into_iter().take(Channel::COUNT as usize) {
            let outcome = match self.select(channel) {
                Err(_) => SweepOutcome::SelectFailed,
                Ok(()) => {
                    let mut found = AddressSet::default();
                    for address in (SWEEP_FIRST..=SWEEP_LAST).filter(|a| *a != own) {
                        if ack(channel, address) {
                            found.insert(address);
                        }
                    }
                    SweepOutcome::Responding(found)
                }
            };
            debug!("channel {}: {}", channel, outcome);
            let _ = sweep.entries.push(SweepEntry { channel, outcome });
        }

        if let Err(e) = self.deselect_all() {
            warn!("multiplexer not released after sweep: {}", e);
        }
        sweep
    }
}
