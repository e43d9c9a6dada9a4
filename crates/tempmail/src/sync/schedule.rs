//! Repeating schedules that drive the poller
//!
//! A [`Schedule`] invokes a tick callback every interval until stopped.
//! Pausing keeps the time left until the next tick, so resuming does not
//! restart the countdown.

use log::debug;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Callback invoked on every tick
pub type Tick = Arc<dyn Fn() + Send + Sync>;

/// Handle to a repeating schedule
pub trait Schedule: Send {
    /// Run again after a pause; no-op while running or once stopped
    fn start(&mut self);
    /// Suspend ticks, keeping the time left until the next one
    fn pause(&mut self);
    /// Continue from where [`pause`](Schedule::pause) left off
    fn resume(&mut self);
    /// Cancel for good
    fn stop(&mut self);
}

/// Creates schedules; the returned schedule is already running
pub trait ScheduleFactory: Send + Sync {
    fn create(&self, tick: Tick, interval: Duration) -> Box<dyn Schedule>;
}

enum Command {
    Pause,
    Resume,
    Stop,
}

/// Schedule backed by a dedicated timer thread
///
/// Ticks run on the timer thread. [`stop`](Schedule::stop) does not wait
/// for a tick that is already running.
pub struct IntervalTimer {
    commands: Sender<Command>,
}

impl IntervalTimer {
    /// Spawn the timer thread; the first tick fires after `interval`
    pub fn spawn(tick: Tick, interval: Duration) -> Self {
        let (commands, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("mailbox-poll-timer".to_string())
            .spawn(move || run_timer(rx, tick, interval));
        if let Err(e) = spawned {
            log::error!("Failed to spawn poll timer thread: {}", e);
        }
        Self { commands }
    }

    fn send(&self, command: Command) {
        // The timer thread only exits after Stop, so a closed channel means
        // there is nothing left to control.
        let _ = self.commands.send(command);
    }
}

impl Schedule for IntervalTimer {
    fn start(&mut self) {
        self.send(Command::Resume);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn resume(&mut self) {
        self.send(Command::Resume);
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.send(Command::Stop);
    }
}

#[derive(Clone, Copy)]
enum TimerState {
    Running { next_tick: Instant },
    Paused { remaining: Duration },
}

fn run_timer(commands: Receiver<Command>, tick: Tick, interval: Duration) {
    let mut state = TimerState::Running {
        next_tick: Instant::now() + interval,
    };

    loop {
        let received = match state {
            TimerState::Running { next_tick } => {
                let now = Instant::now();
                if now >= next_tick {
                    tick();
                    state = TimerState::Running {
                        next_tick: Instant::now() + interval,
                    };
                    continue;
                }
                commands.recv_timeout(next_tick - now)
            }
            TimerState::Paused { .. } => commands
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        state = match (received, state) {
            (Ok(Command::Pause), TimerState::Running { next_tick }) => TimerState::Paused {
                remaining: next_tick.saturating_duration_since(Instant::now()),
            },
            (Ok(Command::Resume), TimerState::Paused { remaining }) => TimerState::Running {
                next_tick: Instant::now() + remaining,
            },
            (Ok(Command::Stop), _) | (Err(RecvTimeoutError::Disconnected), _) => break,
            (_, unchanged) => unchanged,
        };
    }

    debug!("Poll timer stopped");
}

/// Factory for [`IntervalTimer`]
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalScheduler;

impl ScheduleFactory for IntervalScheduler {
    fn create(&self, tick: Tick, interval: Duration) -> Box<dyn Schedule> {
        Box::new(IntervalTimer::spawn(tick, interval))
    }
}

#[derive(Default)]
struct ManualState {
    tick: Option<Tick>,
    interval: Option<Duration>,
    created: usize,
    paused: bool,
    stopped: bool,
}

/// Schedule factory whose ticks are fired by the caller
///
/// Used for testing and for embedding the poller in an external loop.
/// Only the most recently created schedule is driven.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one tick if the current schedule is running.
    /// Returns whether the callback ran.
    pub fn tick(&self) -> bool {
        let tick = {
            let state = self.lock();
            if state.paused || state.stopped {
                return false;
            }
            match &state.tick {
                Some(tick) => Arc::clone(tick),
                None => return false,
            }
        };
        tick();
        true
    }

    /// Number of schedules created so far
    pub fn created(&self) -> usize {
        self.lock().created
    }

    pub fn interval(&self) -> Option<Duration> {
        self.lock().interval
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ManualSchedule {
    state: Arc<Mutex<ManualState>>,
    generation: usize,
}

impl ManualSchedule {
    /// Apply `f` only if this is still the current schedule
    fn update(&self, f: impl FnOnce(&mut ManualState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.created == self.generation && !state.stopped {
            f(&mut state);
        }
    }
}

impl Schedule for ManualSchedule {
    fn start(&mut self) {
        self.update(|s| s.paused = false);
    }

    fn pause(&mut self) {
        self.update(|s| s.paused = true);
    }

    fn resume(&mut self) {
        self.update(|s| s.paused = false);
    }

    fn stop(&mut self) {
        self.update(|s| {
            s.stopped = true;
            s.tick = None;
        });
    }
}

impl ScheduleFactory for ManualScheduler {
    fn create(&self, tick: Tick, interval: Duration) -> Box<dyn Schedule> {
        let mut state = self.lock();
        state.created += 1;
        state.tick = Some(tick);
        state.interval = Some(interval);
        state.paused = false;
        state.stopped = false;
        Box::new(ManualSchedule {
            state: Arc::clone(&self.state),
            generation: state.created,
        })
    }
}
