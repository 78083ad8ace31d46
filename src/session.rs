use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::audio::{ChannelAlternator, MediaEngine};
use crate::config::{parse_frequency, volume_from_percent, PlayerConfig};
use crate::error::AlternatorError;
use crate::status::{PlaybackState, PlaybackStatus};

/// One loaded file: owns the engine and the alternator bound to it.
///
/// The alternator only holds a weak handle, so dropping the session releases
/// both together.
pub struct PlaybackSession<E: MediaEngine + 'static> {
    engine: Arc<E>,
    alternator: ChannelAlternator<E>,
    state: PlaybackState,
}

impl<E: MediaEngine + 'static> PlaybackSession<E> {
    pub fn new(engine: E, config: &PlayerConfig) -> Result<Self, AlternatorError> {
        let engine = Arc::new(engine);
        engine.set_volume(config.volume);
        let alternator = ChannelAlternator::new(&engine, config.switch_frequency)?;

        Ok(Self {
            engine,
            alternator,
            state: PlaybackState::Stopped,
        })
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Playing {
            self.resume_alternation();
            return;
        }
        self.engine.play();
        self.alternator.start();
        self.state = PlaybackState::Playing;
    }

    /// Restart ticking after the alternator stopped itself on a drained engine
    /// that has since been refilled.
    fn resume_alternation(&self) {
        if self.state == PlaybackState::Playing && !self.alternator.is_running() {
            debug!("Resuming channel alternation");
            self.alternator.start();
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.engine.pause();
        self.alternator.stop();
        self.state = PlaybackState::Paused;
    }

    pub fn toggle_pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Halt playback, restore both channels and rewind to the start.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            self.engine.pause();
        }
        self.alternator.stop();
        self.state = PlaybackState::Stopped;
        self.engine.seek(Duration::ZERO)?;
        info!("Playback stopped");
        Ok(())
    }

    pub fn set_frequency(&mut self, hz: i64) -> Result<()> {
        let hz = parse_frequency(hz)?;
        self.alternator.set_frequency(hz)?;
        info!("Switch frequency set to {} Hz", hz);
        Ok(())
    }

    pub fn set_volume_percent(&mut self, percent: u8) -> Result<()> {
        let volume = volume_from_percent(percent)?;
        self.engine.set_volume(volume);
        Ok(())
    }

    /// Jump to `position`, clamped to the track length when it is known.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let target = match self.engine.duration() {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.engine.seek(target)?;
        self.resume_alternation();
        Ok(())
    }

    /// Periodic housekeeping: stop the session once the track has run out.
    pub fn poll(&mut self) -> PlaybackStatus {
        if self.state == PlaybackState::Playing && self.engine.is_finished() {
            info!("Playback finished");
            if let Err(e) = self.stop() {
                warn!("Failed to rewind after playback finished: {:#}", e);
            }
        } else if self.engine.is_playing() {
            self.resume_alternation();
        }
        self.status()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            position: self.engine.position(),
            duration: self.engine.duration(),
            frequency: self.alternator.frequency(),
            volume: self.engine.volume(),
            alternating: self.alternator.is_running(),
            channel: self.alternator.active_channel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::testing::MockEngine;
    use crate::audio::{Channel, PlaybackEngine};
    use tokio::time::sleep;

    fn session() -> PlaybackSession<MockEngine> {
        let engine = MockEngine::with_duration(Duration::from_secs(180));
        PlaybackSession::new(engine, &PlayerConfig::default()).unwrap()
    }

    async fn wait_ms(ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_applies_configured_volume() {
        let session = session();
        assert_eq!(session.engine().volume(), 0.7);
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.engine().gain_history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_starts_alternation() {
        let mut session = session();
        session.play();
        session.play();
        // 120 Hz -> 8ms: ticks at 0, 8, 16.
        wait_ms(20).await;

        assert!(session.engine().is_playing());
        assert_eq!(session.engine().toggle_count(), 3);
        let status = session.status();
        assert!(status.alternating);
        assert_eq!(status.channel, Some(Channel::Left));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_restores_both_channels() {
        let mut session = session();
        session.play();
        wait_ms(10).await;

        session.pause();
        assert_eq!(session.state(), PlaybackState::Paused);
        assert!(!session.engine().is_playing());
        assert_eq!(session.engine().last_gains(), Some((1.0, 1.0)));
        assert!(!session.status().alternating);

        let toggles = session.engine().toggle_count();
        wait_ms(50).await;
        assert_eq!(session.engine().toggle_count(), toggles);

        session.toggle_pause();
        wait_ms(1).await;
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.engine().toggle_count(), toggles + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_when_stopped_is_ignored() {
        let mut session = session();
        session.pause();
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.engine().gain_history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_rewinds_and_resets() {
        let mut session = session();
        session.play();
        session.seek(Duration::from_secs(42)).unwrap();
        wait_ms(10).await;

        session.stop().unwrap();
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert_eq!(session.engine().position(), Duration::ZERO);
        assert!(!session.engine().is_playing());
        assert_eq!(session.engine().last_gains(), Some((1.0, 1.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_track_stops_session() {
        let mut session = session();
        session.play();
        wait_ms(10).await;

        session.engine().set_finished(true);
        let status = session.poll();
        assert_eq!(status.state, PlaybackState::Stopped);
        assert!(!status.alternating);
        assert_eq!(session.engine().last_gains(), Some((1.0, 1.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frequency_changes_are_validated() {
        let mut session = session();
        assert!(session.set_frequency(0).is_err());
        assert!(session.set_frequency(-3).is_err());
        assert!(session.set_frequency(1001).is_err());
        assert_eq!(session.status().frequency, 120);

        session.set_frequency(10).unwrap();
        assert_eq!(session.status().frequency, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_does_not_touch_channel_gains() {
        let mut session = session();
        session.play();
        wait_ms(1).await;
        let before = session.engine().gain_history();

        session.set_volume_percent(30).unwrap();
        assert!((session.engine().volume() - 0.3).abs() < f32::EPSILON);
        assert_eq!(session.engine().gain_history(), before);
        assert!(session.set_volume_percent(101).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_is_clamped_to_duration() {
        let mut session = session();
        session.seek(Duration::from_secs(500)).unwrap();
        assert_eq!(session.engine().position(), Duration::from_secs(180));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_releases_engine() {
        let session = session();
        let weak = Arc::downgrade(session.engine());
        drop(session);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_after_drain_resumes_alternation() {
        let mut session = session();
        session.play();
        wait_ms(10).await;

        // Engine runs dry: the next tick stops the alternator on its own.
        session.engine().set_playing(false);
        wait_ms(20).await;
        assert!(!session.status().alternating);
        assert_eq!(session.state(), PlaybackState::Playing);
        let toggles = session.engine().toggle_count();

        // Seeking refills the engine; alternation has to come back with it.
        session.engine().set_playing(true);
        session.seek(Duration::from_secs(5)).unwrap();
        session.play();
        wait_ms(50).await;

        let status = session.poll();
        assert!(status.alternating);
        assert_eq!(status.state, PlaybackState::Playing);
        assert!(session.engine().toggle_count() > toggles + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_while_playing_restarts_dead_alternator() {
        let mut session = session();
        session.play();
        wait_ms(10).await;
        session.engine().set_playing(false);
        wait_ms(20).await;
        assert!(!session.status().alternating);

        session.engine().set_playing(true);
        session.play();
        wait_ms(20).await;

        assert!(session.status().alternating);
        let gains = session.engine().last_gains();
        assert!(gains == Some((1.0, 0.0)) || gains == Some((0.0, 1.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_resumes_alternation_when_engine_plays_again() {
        let mut session = session();
        session.play();
        wait_ms(10).await;
        session.engine().set_playing(false);
        wait_ms(20).await;
        assert!(!session.poll().alternating);

        session.engine().set_playing(true);
        assert!(session.poll().alternating);
        let toggles = session.engine().toggle_count();
        wait_ms(20).await;
        assert!(session.engine().toggle_count() > toggles);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_while_paused_keeps_alternation_off() {
        let mut session = session();
        session.play();
        wait_ms(10).await;
        session.pause();

        session.seek(Duration::from_secs(30)).unwrap();
        wait_ms(20).await;
        assert!(!session.status().alternating);
        assert_eq!(session.engine().last_gains(), Some((1.0, 1.0)));
    }
}
