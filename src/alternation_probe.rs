use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod audio;
mod error;

use audio::alternator::interval_for;
use audio::{Channel, ChannelAlternator, ChannelGains, PlaybackEngine};

/// Stand-in engine that timestamps every gain change instead of playing audio.
struct SimulatedEngine {
    playing: AtomicBool,
    started: Instant,
    changes: Mutex<Vec<(Duration, ChannelGains)>>,
}

impl SimulatedEngine {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(true),
            started: Instant::now(),
            changes: Mutex::new(Vec::new()),
        }
    }

    fn toggles(&self) -> Vec<(Duration, Channel)> {
        self.changes
            .lock()
            .iter()
            .filter_map(|(at, gains)| match (gains.left, gains.right) {
                (l, r) if l > 0.0 && r == 0.0 => Some((*at, Channel::Left)),
                (l, r) if l == 0.0 && r > 0.0 => Some((*at, Channel::Right)),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn set_channel_gains(&self, left: f32, right: f32) {
        let at = self.started.elapsed();
        self.changes.lock().push((at, ChannelGains::new(left, right)));
    }
}

#[derive(Parser)]
#[command(name = "alternation-probe")]
#[command(about = "Run the channel alternator against a simulated engine and report its timing")]
struct Args {
    /// Channel switches per second
    #[arg(short, long, default_value = "120")]
    frequency: u32,

    /// How long to let the alternator run
    #[arg(short, long, default_value = "1000")]
    duration_ms: u64,

    /// Switch to this frequency part way through
    #[arg(long)]
    change_to: Option<u32>,

    /// When to apply --change-to
    #[arg(long, default_value = "500")]
    change_at_ms: u64,

    /// Make the engine report "not playing" at this point
    #[arg(long)]
    pause_at_ms: Option<u64>,

    /// How many leading channels to print
    #[arg(long, default_value = "16")]
    show: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Alternation probe");
    info!(
        "Frequency: {} Hz ({}ms interval), run time: {}ms",
        args.frequency,
        interval_for(args.frequency).as_millis(),
        args.duration_ms
    );

    let engine = Arc::new(SimulatedEngine::new());
    let alternator = ChannelAlternator::new(&engine, args.frequency)?;

    let run = Duration::from_millis(args.duration_ms);
    let mut events: Vec<(Duration, Event)> = Vec::new();
    if let Some(hz) = args.change_to {
        events.push((Duration::from_millis(args.change_at_ms), Event::Frequency(hz)));
    }
    if let Some(at) = args.pause_at_ms {
        events.push((Duration::from_millis(at), Event::Pause));
    }
    events.retain(|(at, _)| *at < run);
    events.sort_by_key(|(at, _)| *at);

    alternator.start();
    let started = Instant::now();
    for (at, event) in events {
        tokio::time::sleep_until((started + at).into()).await;
        match event {
            Event::Frequency(hz) => {
                info!("{}ms: switching to {} Hz", at.as_millis(), hz);
                alternator.set_frequency(hz)?;
            }
            Event::Pause => {
                info!("{}ms: engine reports not playing", at.as_millis());
                engine.playing.store(false, Ordering::SeqCst);
            }
        }
    }
    tokio::time::sleep_until((started + run).into()).await;

    let self_stopped = !alternator.is_running();
    alternator.stop();

    report(&args, &engine.toggles(), self_stopped);
    Ok(())
}

enum Event {
    Frequency(u32),
    Pause,
}

fn report(args: &Args, toggles: &[(Duration, Channel)], self_stopped: bool) {
    let interval = interval_for(args.frequency);
    let expected = if args.change_to.is_none() && args.pause_at_ms.is_none() {
        Some(args.duration_ms.div_ceil(interval.as_millis() as u64))
    } else {
        None
    };

    info!("\n=== ALTERNATION RESULTS ===");
    info!("Toggles: {}", toggles.len());
    if let Some(expected) = expected {
        info!("Expected with a perfect clock: {}", expected);
    }
    info!("Self-stopped before the end: {}", self_stopped);

    let sequence: String = toggles
        .iter()
        .take(args.show)
        .map(|(_, channel)| channel.to_string())
        .collect::<Vec<_>>()
        .join(",");
    info!("Sequence: {}{}", sequence, if toggles.len() > args.show { ",..." } else { "" });

    let strict = toggles
        .windows(2)
        .all(|pair| pair[0].1 != pair[1].1);
    if !strict {
        warn!("Channels did not alternate strictly");
    }
    if let Some((_, first)) = toggles.first() {
        if *first != Channel::Left {
            warn!("First toggle was not Left");
        }
    }

    let gaps: Vec<Duration> = toggles
        .windows(2)
        .map(|pair| pair[1].0.saturating_sub(pair[0].0))
        .collect();
    if let (Some(min), Some(max)) = (gaps.iter().min(), gaps.iter().max()) {
        let mean = gaps.iter().sum::<Duration>() / gaps.len() as u32;
        info!(
            "Gap between toggles: min {:.2}ms, mean {:.2}ms, max {:.2}ms",
            min.as_secs_f64() * 1000.0,
            mean.as_secs_f64() * 1000.0,
            max.as_secs_f64() * 1000.0
        );
    }
}
