// src/common/channel.rs

use super::error::ChannelError;
use core::convert::TryFrom;
use core::fmt;

/// One downstream segment of a TCA9548A-class multiplexer.
///
/// Always holds an index in `0..=7`; out-of-range values are rejected at
/// construction and never clamped.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Channel(u8);

impl Channel {
    /// Number of channels on the multiplexer (3-bit select).
    pub const COUNT: u8 = 8;
    pub const FIRST: Channel = Channel(0);
    pub const LAST: Channel = Channel(Self::COUNT - 1);

    /// Creates a new `Channel` if `index` is in `0..=7`.
    /// Returns `Result<Self, ChannelError<()>>` because validation itself
    /// cannot cause a bus error.
    pub fn new(index: u8) -> Result<Self, ChannelError<()>> {
        if Self::is_valid_index(index) {
            Ok(Channel(index))
        } else {
            Err(ChannelError::OutOfRange(index))
        }
    }

    #[inline]
    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Control byte that connects this channel and disconnects every other one.
    #[inline]
    pub const fn mask(&self) -> u8 {
        1 << self.0
    }

    #[inline]
    pub const fn is_valid_index(index: u8) -> bool {
        index < Self::COUNT
    }

    /// All eight channels in ascending order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (0..Self::COUNT).map(Channel)
    }
}

impl TryFrom<u8> for Channel {
    type Error = ChannelError<()>;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Channel> for u8 {
    fn from(value: Channel) -> Self {
        value.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
