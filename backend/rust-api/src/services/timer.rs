use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::models::timer::{TimeExpired, TimerEvent, TimerTick};
use crate::utils::time::format_remaining;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
    Stopped,
}

impl TimerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerState::Expired | TimerState::Stopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ticked { remaining: u32 },
    /// Returned once, on the tick (or start) that reaches zero.
    Expired,
    Ignored,
}

/// Countdown state machine, advanced one second per `tick`.
///
/// Knows nothing about wall-clock time; `GameTimer` drives it from a tokio interval.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    /// Negative durations are treated as zero.
    pub fn new(duration_seconds: i64) -> Self {
        let duration = clamp_seconds(duration_seconds);
        Self {
            duration,
            remaining: duration,
            state: TimerState::Idle,
        }
    }

    pub fn start(&mut self) -> TickOutcome {
        if self.state != TimerState::Idle {
            return TickOutcome::Ignored;
        }
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            return TickOutcome::Expired;
        }
        self.state = TimerState::Running;
        TickOutcome::Ticked {
            remaining: self.remaining,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked {
                remaining: self.remaining,
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
            true
        } else {
            false
        }
    }

    /// Halts the countdown before expiry. Expiry will never be reported afterwards.
    pub fn stop(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = TimerState::Stopped;
        true
    }

    pub fn reset(&mut self, duration_seconds: i64) {
        self.duration = clamp_seconds(duration_seconds);
        self.remaining = self.duration;
        self.state = TimerState::Idle;
    }

    /// Extends a live countdown, never beyond its configured duration.
    pub fn add_time(&mut self, seconds: u32) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.remaining = self.remaining.saturating_add(seconds).min(self.duration);
        true
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn formatted(&self) -> String {
        format_remaining(self.remaining)
    }

    /// Share of time left, 1.0 at start and 0.0 at expiry.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        self.remaining as f64 / self.duration as f64
    }

    pub fn is_running_low(&self) -> bool {
        self.progress() < 0.1
    }

    pub fn is_critical(&self) -> bool {
        self.progress() < 0.05
    }
}

fn clamp_seconds(seconds: i64) -> u32 {
    u32::try_from(seconds.max(0)).unwrap_or(u32::MAX)
}

pub fn tick_event(session_id: &str, countdown: &Countdown) -> TimerEvent {
    TimerEvent::TimerTick(TimerTick {
        session_id: session_id.to_string(),
        remaining_seconds: countdown.remaining(),
        elapsed_seconds: countdown.elapsed(),
        total_seconds: countdown.duration(),
        formatted: countdown.formatted(),
        timestamp: Utc::now(),
    })
}

pub fn expired_event(session_id: &str) -> TimerEvent {
    TimerEvent::TimeExpired(TimeExpired {
        session_id: session_id.to_string(),
        timestamp: Utc::now(),
        message: "Time limit exceeded".to_string(),
    })
}

/// Owned countdown driven by a tokio task.
///
/// The task is aborted on `stop` and when the timer is dropped, so an expiry
/// callback can never reach an owner that is gone.
pub struct GameTimer {
    session_id: String,
    countdown: Arc<Mutex<Countdown>>,
    tick_interval: Duration,
    events: broadcast::Sender<TimerEvent>,
    task: Option<JoinHandle<()>>,
}

impl GameTimer {
    pub fn new(session_id: impl Into<String>, tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            session_id: session_id.into(),
            countdown: Arc::new(Mutex::new(Countdown::new(0))),
            tick_interval,
            events,
            task: None,
        }
    }

    /// Starts counting down from `duration_seconds`; `on_expire` runs at most once.
    ///
    /// A zero or negative duration expires immediately, on the caller's task.
    pub fn start<F>(&mut self, duration_seconds: i64, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.abort_task();

        let outcome = {
            let mut countdown = lock(&self.countdown);
            countdown.reset(duration_seconds);
            countdown.start()
        };

        if outcome == TickOutcome::Expired {
            tracing::info!(session_id = %self.session_id, "timer started already expired");
            let _ = self.events.send(expired_event(&self.session_id));
            on_expire();
            return;
        }

        let _ = self
            .events
            .send(tick_event(&self.session_id, &lock(&self.countdown)));

        let countdown = Arc::clone(&self.countdown);
        let events = self.events.clone();
        let session_id = self.session_id.clone();
        let period = self.tick_interval.max(Duration::from_millis(1));

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let (outcome, event) = {
                    let mut countdown = lock(&countdown);
                    let outcome = countdown.tick();
                    (outcome, tick_event(&session_id, &countdown))
                };

                match outcome {
                    TickOutcome::Ticked { .. } => {
                        let _ = events.send(event);
                    }
                    TickOutcome::Expired => {
                        tracing::info!(session_id = %session_id, "timer expired");
                        let _ = events.send(event);
                        let _ = events.send(expired_event(&session_id));
                        on_expire();
                        break;
                    }
                    TickOutcome::Ignored => {
                        if lock(&countdown).state().is_terminal() {
                            break;
                        }
                    }
                }
            }
        }));
    }

    pub fn pause(&self) -> bool {
        lock(&self.countdown).pause()
    }

    pub fn resume(&self) -> bool {
        lock(&self.countdown).resume()
    }

    pub fn add_time(&self, seconds: u32) -> bool {
        lock(&self.countdown).add_time(seconds)
    }

    /// Halts ticking without firing the expiry callback.
    pub fn stop(&mut self) -> bool {
        let stopped = lock(&self.countdown).stop();
        self.abort_task();
        stopped
    }

    /// Back to idle with a fresh duration; a pending expiry is discarded.
    pub fn reset(&mut self, duration_seconds: i64) {
        self.abort_task();
        lock(&self.countdown).reset(duration_seconds);
    }

    pub fn snapshot(&self) -> Countdown {
        lock(&self.countdown).clone()
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.countdown).remaining()
    }

    pub fn state(&self) -> TimerState {
        lock(&self.countdown).state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event feed, for owners that hand out subscriptions later.
    pub fn events(&self) -> broadcast::Sender<TimerEvent> {
        self.events.clone()
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for GameTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}

fn lock(countdown: &Mutex<Countdown>) -> MutexGuard<'_, Countdown> {
    countdown.lock().unwrap_or_else(PoisonError::into_inner)
}
