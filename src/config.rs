use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_SWITCH_FREQUENCY: u32 = 120;
pub const MIN_SWITCH_FREQUENCY: u32 = 1;
pub const MAX_SWITCH_FREQUENCY: u32 = 1000;
pub const DEFAULT_VOLUME: f32 = 0.7;
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 100;
pub const MIN_STATUS_INTERVAL_MS: u64 = 10;

/// Startup settings for the player.
///
/// Read from an optional JSON file, then overridden by command line flags.
/// Nothing is written back: settings changed during a session are not kept.
///
/// ```json
/// { "switch_frequency": 120, "volume": 0.7, "status_interval_ms": 100 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Channel switches per second.
    pub switch_frequency: u32,
    /// Master volume, 0.0-1.0.
    pub volume: f32,
    /// How often the position/status line is refreshed.
    pub status_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            switch_frequency: DEFAULT_SWITCH_FREQUENCY,
            volume: DEFAULT_VOLUME,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

impl PlayerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;

        info!("Loaded player config from {}", path.display());
        Ok(config)
    }

    /// Apply command line overrides on top of this config.
    pub fn with_overrides(
        mut self,
        switch_frequency: Option<i64>,
        volume_percent: Option<u8>,
    ) -> Result<Self, ConfigError> {
        if let Some(hz) = switch_frequency {
            self.switch_frequency = parse_frequency(hz)?;
        }
        if let Some(percent) = volume_percent {
            self.volume = volume_from_percent(percent)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_frequency(i64::from(self.switch_frequency))?;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::VolumeOutOfRange(self.volume));
        }
        if self.status_interval_ms < MIN_STATUS_INTERVAL_MS {
            return Err(ConfigError::StatusIntervalTooShort(self.status_interval_ms));
        }
        Ok(())
    }
}

/// Check a user supplied switch frequency against the selectable range.
pub fn parse_frequency(value: i64) -> Result<u32, ConfigError> {
    let out_of_range = || ConfigError::FrequencyOutOfRange {
        value,
        min: MIN_SWITCH_FREQUENCY,
        max: MAX_SWITCH_FREQUENCY,
    };
    let hz = u32::try_from(value).map_err(|_| out_of_range())?;
    if !(MIN_SWITCH_FREQUENCY..=MAX_SWITCH_FREQUENCY).contains(&hz) {
        return Err(out_of_range());
    }
    Ok(hz)
}

pub fn volume_from_percent(percent: u8) -> Result<f32, ConfigError> {
    let volume = f32::from(percent) / 100.0;
    if volume > 1.0 {
        return Err(ConfigError::VolumeOutOfRange(volume));
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, json: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("oneear-config-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_defaults_match_player_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.switch_frequency, 120);
        assert_eq!(config.volume, 0.7);
        assert_eq!(config.status_interval_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let path = write_config("partial", r#"{ "switch_frequency": 40 }"#);
        let config = PlayerConfig::load(&path).unwrap();
        assert_eq!(config.switch_frequency, 40);
        assert_eq!(config.volume, DEFAULT_VOLUME);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_rejects_zero_frequency() {
        let path = write_config("zero", r#"{ "switch_frequency": 0 }"#);
        let err = PlayerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FrequencyOutOfRange { value: 0, .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let path = write_config("broken", "{ switch_frequency: ");
        assert!(matches!(PlayerConfig::load(&path), Err(ConfigError::Parse { .. })));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            PlayerConfig::load("/no/such/oneear.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_frequency_range() {
        assert_eq!(parse_frequency(1).unwrap(), 1);
        assert_eq!(parse_frequency(1000).unwrap(), 1000);
        assert!(parse_frequency(0).is_err());
        assert!(parse_frequency(-5).is_err());
        assert!(parse_frequency(1001).is_err());
        assert!(parse_frequency(i64::MAX).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = PlayerConfig::default()
            .with_overrides(Some(300), Some(50))
            .unwrap();
        assert_eq!(config.switch_frequency, 300);
        assert_eq!(config.volume, 0.5);

        assert!(PlayerConfig::default().with_overrides(Some(-1), None).is_err());
        assert!(PlayerConfig::default().with_overrides(None, Some(150)).is_err());
    }

    #[test]
    fn test_status_interval_floor() {
        let config = PlayerConfig {
            status_interval_ms: 5,
            ..PlayerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StatusIntervalTooShort(5))
        ));
    }
}
