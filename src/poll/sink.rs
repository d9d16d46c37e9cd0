// src/poll/sink.rs

use crate::registry::ReadCycleResult;
use core::fmt::Debug;
use log::warn;
use std::io::{self, Write};

/// Receives every completed read cycle from the poll loop.
pub trait CycleSink<E, D>
where
    E: Debug,
    D: Debug,
{
    fn emit(&mut self, cycle: &ReadCycleResult<E, D>);
}

impl<E, D, F> CycleSink<E, D> for F
where
    E: Debug,
    D: Debug,
    F: FnMut(&ReadCycleResult<E, D>),
{
    fn emit(&mut self, cycle: &ReadCycleResult<E, D>) {
        self(cycle)
    }
}

/// Prints one status line per channel per cycle.
///
/// ```text
/// Channel 2 | Accel: (0.01, -0.02, 0.99) | Gyro: (0.1, 0.0, -0.3) | Mag: (21.5, -4.2, 40.8)
/// Channel 3 | read failed: gyroscope read failed: Bus(NoAcknowledge(Data))
/// ```
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        ConsoleSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_cycle<E: Debug, D: Debug>(&mut self, cycle: &ReadCycleResult<E, D>) -> io::Result<()> {
        for (channel, outcome) in cycle.iter() {
            match outcome {
                Ok(reading) => {
                    let line = reading
                        .format_line()
                        .map_err(|_| io::Error::new(io::ErrorKind::Other, "status line overflow"))?;
                    writeln!(self.out, "{}", line)?;
                }
                Err(error) => {
                    warn!("channel {}: {}", channel, error);
                    writeln!(self.out, "Channel {} | read failed: {}", channel, error)?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W, E, D> CycleSink<E, D> for ConsoleSink<W>
where
    W: Write,
    E: Debug,
    D: Debug,
{
    fn emit(&mut self, cycle: &ReadCycleResult<E, D>) {
        if let Err(e) = self.write_cycle(cycle) {
            warn!("console output failed: {}", e);
        }
    }
}
