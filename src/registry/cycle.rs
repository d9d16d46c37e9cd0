// src/registry/cycle.rs

use crate::common::{channel::Channel, error::ReadError, types::SensorReading};
use core::fmt::Debug;

/// Outcome of reading one channel in a cycle.
pub type ChannelOutcome<E, D> = (Channel, Result<SensorReading, ReadError<E, D>>);

/// Per-channel outcomes of one `read_all` pass, in ascending channel order.
///
/// Holds exactly one entry per registered session, success or failure.
#[derive(Debug)]
pub struct ReadCycleResult<E, D>
where
    E: Debug,
    D: Debug,
{
    outcomes: heapless::Vec<ChannelOutcome<E, D>, { Channel::COUNT as usize }>,
}

impl<E, D> ReadCycleResult<E, D>
where
    E: Debug,
    D: Debug,
{
    pub(crate) fn new() -> Self {
        ReadCycleResult {
            outcomes: heapless::Vec::new(),
        }
    }

    // The registry never holds more sessions than there are channels
    pub(crate) fn record(&mut self, channel: Channel, outcome: Result<SensorReading, ReadError<E, D>>) {
        let _ = self.outcomes.push((channel, outcome));
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelOutcome<E, D>> {
        self.outcomes.iter()
    }

    pub fn get(&self, channel: Channel) -> Option<&Result<SensorReading, ReadError<E, D>>> {
        self.outcomes
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, outcome)| outcome)
    }

    pub fn readings(&self) -> impl Iterator<Item = &SensorReading> {
        self.outcomes.iter().filter_map(|(_, outcome)| outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Channel, &ReadError<E, D>)> {
        self.outcomes
            .iter()
            .filter_map(|(channel, outcome)| outcome.as_ref().err().map(|e| (*channel, e)))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.readings().count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Channels whose select went through, and so paid the settle delay.
    pub fn selected_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, Err(ReadError::SelectFailed(_))))
            .count()
    }
}
