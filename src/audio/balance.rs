use rodio::source::SeekError;
use rodio::Source;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::ChannelGains;

/// Left/right gains shared between the control side and the audio thread.
///
/// Stored as `f32` bit patterns so the audio callback never blocks on a lock.
#[derive(Debug, Clone)]
pub struct SharedGains {
    left: Arc<AtomicU32>,
    right: Arc<AtomicU32>,
}

impl SharedGains {
    pub fn new(gains: ChannelGains) -> Self {
        Self {
            left: Arc::new(AtomicU32::new(gains.left.to_bits())),
            right: Arc::new(AtomicU32::new(gains.right.to_bits())),
        }
    }

    pub fn set(&self, gains: ChannelGains) {
        self.left.store(gains.left.to_bits(), Ordering::Relaxed);
        self.right.store(gains.right.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> ChannelGains {
        ChannelGains {
            left: f32::from_bits(self.left.load(Ordering::Relaxed)),
            right: f32::from_bits(self.right.load(Ordering::Relaxed)),
        }
    }
}

impl Default for SharedGains {
    fn default() -> Self {
        Self::new(ChannelGains::UNITY)
    }
}

/// Applies [`SharedGains`] to the first two channels of a source.
///
/// Mono input is duplicated onto a left/right pair so alternation stays
/// audible. Channels past the second are passed through untouched.
pub struct BalancedSource<S>
where
    S: Source<Item = f32>,
{
    input: S,
    gains: SharedGains,
    upmix: bool,
    /// Channel index of the next sample handed out.
    position: u16,
    /// Right half of an upmixed mono frame.
    pending: Option<f32>,
}

impl<S> BalancedSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(input: S, gains: SharedGains) -> Self {
        let upmix = input.channels() == 1;
        Self {
            input,
            gains,
            upmix,
            position: 0,
            pending: None,
        }
    }

    fn advance(&mut self) {
        self.position = (self.position + 1) % self.channels();
    }
}

impl<S> Iterator for BalancedSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(sample) = self.pending.take() {
            self.advance();
            return Some(sample * self.gains.get().right);
        }

        let sample = self.input.next()?;
        let gains = self.gains.get();

        let out = if self.upmix {
            self.pending = Some(sample);
            sample * gains.left
        } else {
            match self.position {
                0 => sample * gains.left,
                1 => sample * gains.right,
                _ => sample,
            }
        };
        self.advance();
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.input.size_hint();
        if self.upmix {
            let extra = usize::from(self.pending.is_some());
            (
                lower.saturating_mul(2).saturating_add(extra),
                upper.and_then(|n| n.checked_mul(2)).map(|n| n + extra),
            )
        } else {
            (lower, upper)
        }
    }
}

impl<S> Source for BalancedSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        if self.upmix {
            self.input
                .current_frame_len()
                .map(|len| len * 2 + usize::from(self.pending.is_some()))
        } else {
            self.input.current_frame_len()
        }
    }

    fn channels(&self) -> u16 {
        if self.upmix {
            2
        } else {
            self.input.channels()
        }
    }

    fn sample_rate(&self) -> u32 {
        self.input.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.input.try_seek(pos)?;
        self.pending = None;
        self.position = 0;
        Ok(())
    }
}
