use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

mod audio;
mod command;
mod config;
mod error;
mod session;
mod status;

use audio::AudioOutput;
use command::{Command, HELP};
use config::PlayerConfig;
use session::PlaybackSession;

#[derive(Parser)]
#[command(name = "oneear-player")]
#[command(about = "Audio player that alternates output between the left and right channels")]
struct Args {
    /// Audio file to play (MP3, WAV, OGG, FLAC, M4A)
    #[arg()]
    audio_file: PathBuf,

    /// Channel switches per second (1-1000)
    #[arg(short, long, allow_negative_numbers = true)]
    frequency: Option<i64>,

    /// Volume in percent (0-100)
    #[arg(short, long)]
    volume: Option<u8>,

    /// JSON config file with startup defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load the file without starting playback
    #[arg(long)]
    paused: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting One Ear Player");

    let config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    }
    .with_overrides(args.frequency, args.volume)?;

    info!("Audio file: {}", args.audio_file.display());
    info!(
        "Switch frequency: {} Hz, volume: {:.0}%",
        config.switch_frequency,
        config.volume * 100.0
    );

    let output = AudioOutput::new()?;
    let playback = output
        .load(&args.audio_file)
        .with_context(|| format!("Could not load {}", args.audio_file.display()))?;
    let mut session = PlaybackSession::new(playback, &config)?;

    println!("{}", HELP);
    if !args.paused {
        session.play();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status_timer = tokio::time::interval(Duration::from_millis(config.status_interval_ms));
    let mut last_line = String::new();

    loop {
        tokio::select! {
            _ = status_timer.tick() => {
                let line = session.poll().to_string();
                if line != last_line {
                    print!("\r{}   ", line);
                    std::io::stdout().flush().ok();
                    last_line = line;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = apply(&mut session, command) {
                            warn!("{:#}", e);
                            println!("{:#}", e);
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.stop()?;
    println!();
    info!("One Ear Player exiting");
    Ok(())
}

fn apply(session: &mut PlaybackSession<audio::AudioPlayback>, command: Command) -> Result<()> {
    match command {
        Command::Play => session.play(),
        Command::Pause => session.pause(),
        Command::TogglePause => session.toggle_pause(),
        Command::Stop => session.stop()?,
        Command::Frequency(hz) => session.set_frequency(hz)?,
        Command::Volume(percent) => session.set_volume_percent(percent)?,
        Command::Seek(position) => session.seek(position)?,
        Command::Status => println!("\n{}", session.status()),
        Command::Help => println!("\n{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}
