pub mod alternator;
pub mod balance;
pub mod engine;
pub mod playback;

pub use alternator::ChannelAlternator;
pub use balance::{BalancedSource, SharedGains};
pub use engine::{MediaEngine, PlaybackEngine};
pub use playback::{AudioOutput, AudioPlayback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub fn other(self) -> Self {
        match self {
            Channel::Left => Channel::Right,
            Channel::Right => Channel::Left,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Left => write!(f, "L"),
            Channel::Right => write!(f, "R"),
        }
    }
}

/// Left/right gain pair, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelGains {
    pub left: f32,
    pub right: f32,
}

impl ChannelGains {
    pub const UNITY: Self = Self { left: 1.0, right: 1.0 };

    pub fn new(left: f32, right: f32) -> Self {
        Self {
            left: left.clamp(0.0, 1.0),
            right: right.clamp(0.0, 1.0),
        }
    }

    /// Full gain on `channel`, silence on the other one.
    pub fn solo(channel: Channel) -> Self {
        match channel {
            Channel::Left => Self { left: 1.0, right: 0.0 },
            Channel::Right => Self { left: 0.0, right: 1.0 },
        }
    }

    pub fn for_channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }
}

impl Default for ChannelGains {
    fn default() -> Self {
        Self::UNITY
    }
}
