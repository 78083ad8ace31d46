use anyhow::Result;
use std::time::Duration;

/// The slice of a playback engine the channel alternator depends on.
///
/// Implementations must be shareable across threads: the alternator keeps a
/// `Weak` handle and calls into it from a tokio task.
pub trait PlaybackEngine: Send + Sync {
    /// True only while audio is actively being rendered (not paused, not drained).
    fn is_playing(&self) -> bool;

    /// Set per-channel gain. Both values are expected in `0.0..=1.0`.
    fn set_channel_gains(&self, left: f32, right: f32);
}

/// Transport controls used by a playback session on top of [`PlaybackEngine`].
pub trait MediaEngine: PlaybackEngine {
    fn play(&self);
    fn pause(&self);
    fn seek(&self, position: Duration) -> Result<()>;
    fn set_volume(&self, volume: f32);
    fn volume(&self) -> f32;
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn is_finished(&self) -> bool;
}
