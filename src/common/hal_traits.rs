// src/common/hal_traits.rs

use core::fmt::Debug;

/// Byte-level transport used to drive the multiplexer's control register.
///
/// Only [`ChannelSelector`](crate::mux::ChannelSelector) calls this; nothing
/// else in the crate writes to the multiplexer address.
pub trait MuxBus {
    /// Associated error type for transport errors.
    type Error: Debug;

    /// Writes a single byte to the 7-bit `address` (no register pointer).
    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error>;
}

/// Abstraction for timer/delay operations needed by the selector and the
/// poll loop.
///
/// Note: the delay half could be replaced by directly requiring
/// `embedded_hal::delay::DelayNs`; [`HalTimer`] adapts one for that case.
pub trait MuxTimer {
    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Monotonic time in microseconds. Only differences are meaningful.
    fn now_us(&self) -> u64;
}

/// Wraps any embedded-hal v1 I2C bus as a [`MuxBus`].
#[cfg(feature = "impl-generic-hal")]
#[derive(Debug)]
pub struct HalBus<I2C>(pub I2C);

#[cfg(feature = "impl-generic-hal")]
impl<I2C> MuxBus for HalBus<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = I2C::Error;

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.0.write(address, &[value])
    }
}

/// Wraps an embedded-hal v1 `DelayNs` plus a platform clock as a [`MuxTimer`].
///
/// embedded-hal has no clock trait, so the monotonic source is supplied as a
/// plain function (e.g. one reading the platform's microsecond timer).
#[cfg(feature = "impl-generic-hal")]
#[derive(Debug)]
pub struct HalTimer<D> {
    delay: D,
    clock: fn() -> u64,
}

#[cfg(feature = "impl-generic-hal")]
impl<D> HalTimer<D>
where
    D: embedded_hal::delay::DelayNs,
{
    pub fn new(delay: D, clock: fn() -> u64) -> Self {
        HalTimer { delay, clock }
    }

    pub fn into_inner(self) -> D {
        self.delay
    }
}

#[cfg(feature = "impl-generic-hal")]
impl<D> MuxTimer for HalTimer<D>
where
    D: embedded_hal::delay::DelayNs,
{
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn now_us(&self) -> u64 {
        (self.clock)()
    }
}

/// Blocking timer for hosted targets: `thread::sleep` and a monotonic
/// `Instant` captured at construction.
#[cfg(feature = "std")]
#[derive(Debug, Copy, Clone)]
pub struct StdTimer {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    pub fn new() -> Self {
        StdTimer {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl MuxTimer for StdTimer {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }

    fn now_us(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
