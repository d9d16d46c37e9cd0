// src/poll/mod.rs

pub mod sink;
pub mod stats;

pub use sink::{ConsoleSink, CycleSink};
pub use stats::PollStats;

use crate::common::{
    hal_traits::{MuxBus, MuxTimer},
    timing,
};
use crate::registry::SessionRegistry;
use crate::session::ImuDriver;
use core::time::Duration;
use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared stop flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives `read_all` on a fixed cadence until cancelled.
///
/// After each cycle the loop sleeps `period` minus the cycle's read overhead.
/// Read overhead is the time spent in driver I/O; the settle delay after each
/// channel select is channel-switch cost and is not charged against the
/// period. A cycle whose read overhead exceeds the period starts the next one
/// immediately; missed cycles are not made up.
#[derive(Debug)]
pub struct PollLoop<T: MuxTimer> {
    timer: T,
    period: Duration,
    max_cycles: Option<u64>,
    token: CancellationToken,
}

impl<T: MuxTimer> PollLoop<T> {
    pub fn new(timer: T, token: CancellationToken) -> Self {
        PollLoop {
            timer,
            period: timing::POLL_PERIOD,
            max_cycles: None,
            token,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Stop on its own after `cycles` cycles. Zero runs no cycle at all.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs until the token is cancelled or `max_cycles` is reached.
    ///
    /// Cancellation is honoured between cycles and between sleep slices; a
    /// cycle in progress is always completed and emitted.
    pub fn run<B, BT, D, S>(
        &mut self,
        registry: &mut SessionRegistry<B, BT, D>,
        sink: &mut S,
    ) -> PollStats
    where
        B: MuxBus,
        BT: MuxTimer,
        D: ImuDriver,
        S: CycleSink<B::Error, D::Error>,
    {
        let period_us = self.period.as_micros() as u64;
        let mut stats = PollStats::default();
        info!(
            "polling {} channel(s) every {:?}",
            registry.len(),
            self.period
        );

        while !self.token.is_cancelled() && !self.limit_reached(&stats) {
            let started = self.timer.now_us();
            let cycle = registry.read_all();
            sink.emit(&cycle);
            stats.record(&cycle);

            if self.limit_reached(&stats) {
                debug!("cycle limit reached");
                break;
            }

            let elapsed = self.timer.now_us().saturating_sub(started);
            let settle_us =
                registry.selector().settle_delay().as_micros() as u64 * cycle.selected_count() as u64;
            let overhead = elapsed.saturating_sub(settle_us);
            debug!(
                "cycle {} took {} us ({} us reading)",
                stats.cycles, elapsed, overhead
            );
            if overhead > period_us {
                stats.overruns += 1;
                debug!("cycle {} overran the period by {} us", stats.cycles, overhead - period_us);
                continue;
            }
            self.sleep_cancellable(period_us - overhead);
        }

        info!("poll loop stopped: {}", stats);
        stats
    }

    fn limit_reached(&self, stats: &PollStats) -> bool {
        self.max_cycles.is_some_and(|max| stats.cycles >= max)
    }

    // Sleeps in slices so a cancel request is seen within one slice.
    fn sleep_cancellable(&mut self, mut remaining_us: u64) {
        let slice_us = timing::CANCEL_CHECK_SLICE.as_micros() as u64;
        while remaining_us > 0 && !self.token.is_cancelled() {
            let step = remaining_us.min(slice_us);
            self.timer.delay_us(step as u32);
            remaining_us -= step;
        }
    }
}
