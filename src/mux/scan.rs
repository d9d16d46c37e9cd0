// src/mux/scan.rs

use super::ChannelSelector;
use crate::common::{
    channel::Channel,
    hal_traits::{MuxBus, MuxTimer},
};
use core::fmt::{self, Debug};
use log::{debug, warn};

/// What a probe found behind one channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProbeOutcome {
    /// The device answered with one of the expected identities.
    Detected(u8),
    /// Something answered, but with an unknown identity.
    Unexpected(u8),
    /// Channel selected, device did not answer.
    NoResponse,
    /// The multiplexer did not accept the select.
    SelectFailed,
}

impl ProbeOutcome {
    pub fn is_detected(&self) -> bool {
        matches!(self, ProbeOutcome::Detected(_))
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Detected(id) => write!(f, "detected ({:#04x})", id),
            ProbeOutcome::Unexpected(id) => write!(f, "unexpected id ({:#04x})", id),
            ProbeOutcome::NoResponse => write!(f, "no response"),
            ProbeOutcome::SelectFailed => write!(f, "select failed"),
        }
    }
}

/// Most device addresses one scan tries per channel.
pub const MAX_SCAN_ADDRESSES: usize = 4;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScanEntry {
    pub channel: Channel,
    pub address: u8,
    pub outcome: ProbeOutcome,
}

/// Per-channel, per-address outcomes of a scan, in the order the channels and
/// addresses were given.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    entries: heapless::Vec<ScanEntry, { Channel::COUNT as usize * MAX_SCAN_ADDRESSES }>,
}

impl ScanReport {
    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    pub fn outcome(&self, channel: Channel, address: u8) -> Option<ProbeOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.channel == channel && entry.address == address)
            .map(|entry| entry.outcome)
    }

    /// Channel and address of every detected device.
    pub fn detected(&self) -> impl Iterator<Item = (Channel, u8)> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_detected())
            .map(|entry| (entry.channel, entry.address))
    }

    /// True when every channel in `channels` was scanned at `address` and
    /// holds a detected device there.
    pub fn all_detected(&self, channels: &[Channel], address: u8) -> bool {
        channels
            .iter()
            .all(|channel| self.outcome(*channel, address).is_some_and(|o| o.is_detected()))
    }
}

impl<B, T> ChannelSelector<B, T>
where
    B: MuxBus,
    T: MuxTimer,
{
    /// Selects each channel in turn and runs `probe` at each of `addresses`.
    ///
    /// `probe` returns the identity byte read from the device. A select
    /// failure is recorded against every address of that channel and the
    /// scan moves on. At most [`MAX_SCAN_ADDRESSES`] addresses are tried. The
    /// multiplexer is left with every channel disconnected.
    pub fn scan<I, P, PE>(
        &mut self,
        channels: I,
        addresses: &[u8],
        expected_ids: &[u8],
        mut probe: P,
    ) -> ScanReport
    where
        I: IntoIterator<Item = Channel>,
        P: FnMut(Channel, u8) -> Result<u8, PE>,
        PE: Debug,
    {
        let mut report = ScanReport::default();
        let addresses = &addresses[..addresses.len().min(MAX_SCAN_ADDRESSES)];

        for channel in channels.into_iter().take(Channel::COUNT as usize) {
            let selected = self.select(channel).is_ok();
            for &address in addresses {
                let outcome = if !selected {
                    ProbeOutcome::SelectFailed
                } else {
                    match probe(channel, address) {
                        Ok(id) if expected_ids.contains(&id) => ProbeOutcome::Detected(id),
                        Ok(id) => ProbeOutcome::Unexpected(id),
                        Err(e) => {
                            debug!("channel {} at {:#04x}: probe failed: {:?}", channel, address, e);
                            ProbeOutcome::NoResponse
                        }
                    }
                };
                debug!("channel {} at {:#04x}: {}", channel, address, outcome);
                // Capacity matches the two bounds above
                let _ = report.entries.push(ScanEntry { channel, address, outcome });
            }
        }

        if let Err(e) = self.deselect_all() {
            warn!("multiplexer not released after scan: {}", e);
        }
        report
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    const MPU_IDS: [u8; 2] = [0x71, 0x73];

    #[test]
    fn test_scan_classifies_each_channel() {
        let harness = Harness::new();
        let mut selector = harness.selector();

        let report = selector.scan(Channel::all(), &[0x69], &MPU_IDS, |channel, _| {
            match channel.index() {
                2 => Ok(0x71),
                3 => Ok(0x73),
                5 => Ok(0x68),
                _ => Err("nack"),
            }
        });

        let at = |index: u8| report.outcome(Channel::new(index).unwrap(), 0x69);
        assert_eq!(report.entries().len(), 8);
        assert_eq!(at(2), Some(ProbeOutcome::Detected(0x71)));
        assert_eq!(at(3), Some(ProbeOutcome::Detected(0x73)));
        assert_eq!(at(5), Some(ProbeOutcome::Unexpected(0x68)));
        assert_eq!(at(0), Some(ProbeOutcome::NoResponse));

        let detected: Vec<u8> = report.detected().map(|(c, _)| c.index()).collect();
        assert_eq!(detected, vec![2, 3]);

        // Every channel selected once, then released
        assert_eq!(
            harness.mux_writes(),
            vec![0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x00]
        );
    }

    #[test]
    fn test_scan_tries_both_mpu_addresses() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let channels = [Channel::new(2).unwrap(), Channel::new(3).unwrap(), Channel::new(4).unwrap()];

        // Channel 3 was strapped with AD0 low
        let mut probed = Vec::new();
        let report = selector.scan(channels, &[0x68, 0x69], &MPU_IDS, |channel, address| {
            probed.push((channel.index(), address));
            match (channel.index(), address) {
                (3, 0x68) | (2, 0x69) | (4, 0x69) => Ok(0x71),
                _ => Err("nack"),
            }
        });

        assert_eq!(report.entries().len(), 6);
        assert_eq!(
            probed,
            vec![(2, 0x68), (2, 0x69), (3, 0x68), (3, 0x69), (4, 0x68), (4, 0x69)]
        );
        let detected: Vec<(u8, u8)> = report.detected().map(|(c, a)| (c.index(), a)).collect();
        assert_eq!(detected, vec![(2, 0x69), (3, 0x68), (4, 0x69)]);
        assert_eq!(report.outcome(channels[1], 0x69), Some(ProbeOutcome::NoResponse));
        assert!(!report.all_detected(&channels, 0x69));
        assert!(report.all_detected(&[channels[0], channels[2]], 0x69));
        // One select per channel regardless of address count
        assert_eq!(harness.mux_writes(), vec![0x04, 0x08, 0x10, 0x00]);
    }

    #[test]
    fn test_scan_continues_past_select_failure() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let channels = [Channel::new(2).unwrap(), Channel::new(3).unwrap(), Channel::new(4).unwrap()];

        harness.fail_next_mux_writes(1);
        let mut probed = Vec::new();
        let report = selector.scan(channels, &[0x68, 0x69], &MPU_IDS, |channel, _| {
            probed.push(channel.index());
            Ok::<u8, ()>(0x71)
        });

        assert_eq!(report.outcome(channels[0], 0x68), Some(ProbeOutcome::SelectFailed));
        assert_eq!(report.outcome(channels[0], 0x69), Some(ProbeOutcome::SelectFailed));
        assert_eq!(probed, vec![3, 3, 4, 4]);
        assert!(!report.all_detected(&channels, 0x69));
        assert!(report.all_detected(&channels[1..], 0x69));
        assert_eq!(harness.mux_writes(), vec![0x08, 0x10, 0x00]);
    }

    #[test]
    fn test_all_detected_requires_scanned_channel() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let report =
            selector.scan([Channel::new(1).unwrap()], &[0x69], &MPU_IDS, |_, _| Ok::<u8, ()>(0x71));
        assert!(report.all_detected(&[Channel::new(1).unwrap()], 0x69));
        assert!(!report.all_detected(&[Channel::new(1).unwrap()], 0x68));
        assert!(!report.all_detected(&[Channel::new(6).unwrap()], 0x69));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ProbeOutcome::Detected(0x71).to_string(), "detected (0x71)");
        assert_eq!(ProbeOutcome::Unexpected(0x0c).to_string(), "unexpected id (0x0c)");
        assert_eq!(ProbeOutcome::NoResponse.to_string(), "no response");
        assert_eq!(ProbeOutcome::SelectFailed.to_string(), "select failed");
    }
}
