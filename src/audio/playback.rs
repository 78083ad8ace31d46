use anyhow::{Context, Result};
use log::{debug, info, warn};
use rodio::source::SamplesConverter;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BalancedSource, ChannelGains, MediaEngine, PlaybackEngine, SharedGains};

pub type FileSource = BalancedSource<SamplesConverter<Decoder<BufReader<File>>, f32>>;

/// Open an audio file and wrap it in the channel gain stage.
///
/// Returns the source together with the decoder's reported duration.
pub fn open_balanced(path: &Path, gains: SharedGains) -> Result<(FileSource, Option<Duration>)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open audio file: {:?}", path))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode audio file: {:?}", path))?;

    let duration = source.total_duration();
    let balanced = BalancedSource::new(source.convert_samples::<f32>(), gains);
    Ok((balanced, duration))
}

/// Owns the output device. Not `Send`: keep it on the thread that created it
/// and hand [`AudioPlayback`] handles to everything else.
pub struct AudioOutput {
    #[allow(dead_code)]
    stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to create audio output stream")?;

        Ok(Self {
            stream,
            stream_handle,
        })
    }

    /// Load `path` paused, ready for [`MediaEngine::play`].
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<AudioPlayback> {
        let sink = Sink::try_new(&self.stream_handle).context("Failed to create audio sink")?;
        AudioPlayback::with_sink(sink, path.as_ref())
    }
}

/// A loaded file on the output device: transport, master volume and the
/// per-channel gains the alternator drives.
pub struct AudioPlayback {
    sink: Sink,
    gains: SharedGains,
    duration: Option<Duration>,
    path: PathBuf,
}

impl AudioPlayback {
    /// Queue `path` on `sink` and leave it paused.
    pub fn with_sink(sink: Sink, path: &Path) -> Result<Self> {
        let gains = SharedGains::default();
        let (source, duration) = open_balanced(path, gains.clone())?;
        sink.append(source);
        sink.pause();

        info!(
            "Loaded audio file: {:?} ({})",
            path,
            duration.map_or_else(|| "unknown length".to_string(), |d| format!("{:.1}s", d.as_secs_f32()))
        );

        Ok(Self {
            sink,
            gains,
            duration,
            path: path.to_path_buf(),
        })
    }
}

impl PlaybackEngine for AudioPlayback {
    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn set_channel_gains(&self, left: f32, right: f32) {
        self.gains.set(ChannelGains::new(left, right));
    }
}

impl MediaEngine for AudioPlayback {
    fn play(&self) {
        self.sink.play();
        info!("Audio playback started");
    }

    fn pause(&self) {
        self.sink.pause();
        info!("Audio playback paused");
    }

    fn seek(&self, position: Duration) -> Result<()> {
        // A drained sink has dropped its source; queue the file again so the
        // track can be replayed after it finished.
        if self.sink.empty() {
            let (source, _) = open_balanced(&self.path, self.gains.clone())?;
            self.sink.append(source);
            debug!("Re-queued {:?}", self.path);
        }

        self.sink.try_seek(position).map_err(|e| {
            warn!("Seek to {:?} failed: {}", position, e);
            anyhow::anyhow!("Failed to seek to {:?}: {}", position, e)
        })
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
