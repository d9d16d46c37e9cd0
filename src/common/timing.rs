// src/common/timing.rs

use core::time::Duration;

// Nominal values. The multiplexer datasheet gives no settle figure for the
// downstream device; 50 ms is the value the sensor array was validated with.

// === Multiplexer ===

/// Wait after a control byte write before touching the newly selected channel.
/// Lets the analog switch and the downstream bus lines stabilize.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Control byte that disconnects every downstream channel.
pub const DESELECT_ALL: u8 = 0x00;

// === Poll loop ===

/// Fixed period between the start of consecutive read cycles.
pub const POLL_PERIOD: Duration = Duration::from_millis(500);

/// Longest uninterrupted sleep inside the poll loop. Cancellation is checked
/// between slices, so shutdown latency stays well under one period.
pub const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(50);

/// Saturating conversion for HAL delay calls that take `u32` microseconds.
#[inline]
pub(crate) fn as_micros_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}
