use thiserror::Error;

/// Misuse of the channel alternator. Pause, stop and a released engine are
/// normal runtime conditions and never show up here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlternatorError {
    #[error("switch frequency must be at least 1 Hz (got {0})")]
    InvalidFrequency(u32),

    #[error("channel alternator requires a running tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("switch frequency {value} Hz is outside {min}..={max} Hz")]
    FrequencyOutOfRange { value: i64, min: u32, max: u32 },

    #[error("volume {0} is outside 0.0..=1.0")]
    VolumeOutOfRange(f32),

    #[error("status interval {0}ms is below the 10ms minimum")]
    StatusIntervalTooShort(u64),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
