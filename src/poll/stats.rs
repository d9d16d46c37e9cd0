// src/poll/stats.rs

use crate::common::channel::Channel;
use crate::registry::ReadCycleResult;
use core::fmt::{self, Debug};

/// Counters accumulated over one run of the poll loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Cycles fully read and emitted.
    pub cycles: u64,
    /// Cycles whose reads took longer than the period.
    pub overruns: u64,
    /// Successful per-channel readings.
    pub readings: u64,
    failures: [u64; Channel::COUNT as usize],
}

impl PollStats {
    pub(crate) fn record<E: Debug, D: Debug>(&mut self, cycle: &ReadCycleResult<E, D>) {
        self.cycles += 1;
        self.readings += cycle.success_count() as u64;
        for (channel, _) in cycle.failures() {
            self.failures[channel.index() as usize] += 1;
        }
    }

    pub fn failures_on(&self, channel: Channel) -> u64 {
        self.failures[channel.index() as usize]
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.iter().sum()
    }
}

impl fmt::Display for PollStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} readings, {} failed reads, {} overruns",
            self.cycles,
            self.readings,
            self.total_failures(),
            self.overruns
        )?;
        let mut first = true;
        for channel in Channel::all() {
            let count = self.failures_on(channel);
            if count == 0 {
                continue;
            }
            f.write_str(if first { " (" } else { ", " })?;
            write!(f, "channel {}: {}", channel, count)?;
            first = false;
        }
        if !first {
            f.write_str(")")?;
        }
        Ok(())
    }
}
