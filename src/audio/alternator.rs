use log::{debug, info};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{Channel, ChannelGains, PlaybackEngine};
use crate::error::AlternatorError;

/// Lower bound for the tick interval. Frequencies above 1000 Hz would
/// otherwise truncate to a zero delay and spin.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Delay between ticks for `frequency` switches per second: `1000 / frequency`
/// milliseconds, truncated, never below [`MIN_INTERVAL`].
pub fn interval_for(frequency: u32) -> Duration {
    let millis = 1000 / u64::from(frequency.max(1));
    Duration::from_millis(millis).max(MIN_INTERVAL)
}

fn validate_frequency(frequency: u32) -> Result<(), AlternatorError> {
    if frequency == 0 {
        return Err(AlternatorError::InvalidFrequency(frequency));
    }
    Ok(())
}

struct AlternatorState {
    running: bool,
    frequency: u32,
    /// `None` until the first tick; the first tick makes Left audible.
    active: Option<Channel>,
    /// Bumped by every start/stop so a stale tick task can tell it was superseded.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl AlternatorState {
    fn toggle(&mut self) -> Channel {
        let next = match self.active {
            Some(channel) => channel.other(),
            None => Channel::Left,
        };
        self.active = Some(next);
        next
    }
}

/// Periodically swaps which output channel is audible while the engine plays.
///
/// The alternator holds only a `Weak` handle to its engine. Ticks run on a
/// tokio task; the check-and-apply part of every tick, `start` and `stop` all
/// run under one lock, so once `stop` returns no tick can touch the engine.
///
/// # State machine
/// - `Stopped --start()--> Running`
/// - `Running --stop()--> Stopped` (gains reset to unity)
/// - `Running --tick sees engine not playing or released--> Stopped`
/// - `start()` while running and `stop()` while stopped are no-ops
///   (the latter still resets gains).
///
/// # Frequency changes
/// `set_frequency` takes effect when the next tick reschedules. The tick that
/// is already armed keeps its old delay, so a change lands one tick late.
pub struct ChannelAlternator<E: PlaybackEngine + 'static> {
    engine: Weak<E>,
    state: Arc<Mutex<AlternatorState>>,
    runtime: Handle,
}

impl<E: PlaybackEngine + 'static> ChannelAlternator<E> {
    /// Bind to `engine` on the current tokio runtime.
    pub fn new(engine: &Arc<E>, frequency: u32) -> Result<Self, AlternatorError> {
        let runtime = Handle::try_current().map_err(|_| AlternatorError::NoRuntime)?;
        Self::with_runtime(engine, frequency, runtime)
    }

    pub fn with_runtime(
        engine: &Arc<E>,
        frequency: u32,
        runtime: Handle,
    ) -> Result<Self, AlternatorError> {
        validate_frequency(frequency)?;

        Ok(Self {
            engine: Arc::downgrade(engine),
            state: Arc::new(Mutex::new(AlternatorState {
                running: false,
                frequency,
                active: None,
                generation: 0,
                task: None,
            })),
            runtime,
        })
    }

    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.running {
            debug!("Channel alternator already running");
            return;
        }

        state.running = true;
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        info!(
            "Channel alternation started at {} Hz ({}ms interval)",
            state.frequency,
            interval_for(state.frequency).as_millis()
        );

        let task = self.runtime.spawn(run_ticks(
            Arc::clone(&self.state),
            self.engine.clone(),
            generation,
        ));
        state.task = Some(task);
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        let was_running = std::mem::replace(&mut state.running, false);
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.task.take() {
            task.abort();
        }

        if let Some(engine) = self.engine.upgrade() {
            let unity = ChannelGains::UNITY;
            engine.set_channel_gains(unity.left, unity.right);
        }

        if was_running {
            info!("Channel alternation stopped");
        }
    }

    pub fn set_frequency(&self, frequency: u32) -> Result<(), AlternatorError> {
        validate_frequency(frequency)?;
        let mut state = self.state.lock();
        if state.frequency != frequency {
            debug!("Switch frequency {} Hz -> {} Hz", state.frequency, frequency);
            state.frequency = frequency;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn frequency(&self) -> u32 {
        self.state.lock().frequency
    }

    pub fn interval(&self) -> Duration {
        interval_for(self.frequency())
    }

    pub fn active_channel(&self) -> Option<Channel> {
        self.state.lock().active
    }
}

impl<E: PlaybackEngine + 'static> Drop for ChannelAlternator<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks<E: PlaybackEngine + 'static>(
    shared: Arc<Mutex<AlternatorState>>,
    engine: Weak<E>,
    generation: u64,
) {
    let mut delay = Duration::ZERO;
    loop {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = shared.lock();
        if !state.running || state.generation != generation {
            return;
        }

        let playing_engine = engine.upgrade().filter(|engine| engine.is_playing());
        let Some(live) = playing_engine else {
            debug!("Engine not playing; channel alternation stops itself");
            state.running = false;
            state.task = None;
            return;
        };

        let gains = ChannelGains::solo(state.toggle());
        live.set_channel_gains(gains.left, gains.right);

        // Read after the tick so a frequency change lands on this reschedule.
        delay = interval_for(state.frequency);
    }
}
