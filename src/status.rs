use std::fmt;
use std::time::Duration;

use crate::audio::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "■ Stopped"),
            PlaybackState::Playing => write!(f, "▶ Playing"),
            PlaybackState::Paused => write!(f, "⏸ Paused"),
        }
    }
}

/// Snapshot of a session for the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub frequency: u32,
    pub volume: f32,
    pub alternating: bool,
    pub channel: Option<Channel>,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self
            .duration
            .map_or_else(|| "--:--".to_string(), format_time);
        let channel = match (self.alternating, self.channel) {
            (true, Some(channel)) => channel.to_string(),
            _ => "LR".to_string(),
        };

        write!(
            f,
            "[{}] {} / {} | {} Hz | vol {:.0}% | {}",
            self.state,
            format_time(self.position),
            duration,
            self.frequency,
            self.volume * 100.0,
            channel
        )
    }
}

/// `MM:SS`, minutes wrapping at an hour.
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let seconds = total % 60;
    let minutes = (total / 60) % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
