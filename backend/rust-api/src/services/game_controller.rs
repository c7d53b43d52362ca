//! Session controller: one tokio task per attempt owning the timer, the claim
//! store and the verdict.
//!
//! Every mutation arrives as a message, so edits, timer expiry and submit are
//! serialized. The phase only moves forward, `Collecting -> Submitting`, and
//! the session settles by sending its result through a oneshot channel, so it
//! is delivered at most once. A settled session's task is gone: handle calls
//! answer `false` / `None` from then on.

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep, Sleep};
use uuid::Uuid;

use crate::config::GameSettings;
use crate::error::GameError;
use crate::metrics::{SESSION_VERDICTS_TOTAL, SUBMIT_TRIGGERS_TOTAL};
use crate::models::claim::{AggregateValidation, SessionResult, SubmitTrigger};
use crate::models::timer::TimerEvent;
use crate::models::LevelConfig;
use crate::services::claim_store::ClaimStore;
use crate::services::claim_validator::{
    decide_success, feedback_messages, submittable_claims, validate_all,
};
use crate::services::submission::{dispatch_claims, ClaimSink};
use crate::services::timer::GameTimer;
use crate::utils::time::format_remaining;

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub settle_delay: Duration,
    pub tick_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&GameSettings::default())
    }
}

impl From<&GameSettings> for ControllerSettings {
    fn from(settings: &GameSettings) -> Self {
        Self {
            settle_delay: settings.settle_delay(),
            tick_interval: settings.tick_interval(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionParams {
    pub session_id: String,
    pub player_name: String,
    pub level: &'static LevelConfig,
}

impl SessionParams {
    pub fn new(
        session_id: impl Into<String>,
        player_name: &str,
        level_id: u8,
    ) -> Result<Self, GameError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(GameError::EmptyPlayerName);
        }
        Ok(Self {
            session_id: session_id.into(),
            player_name: player_name.to_string(),
            level: LevelConfig::lookup(level_id)?,
        })
    }

    /// Same shape as server-assigned ids, for sessions played offline.
    pub fn generate_session_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("session_{}", &id[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Collecting,
    Submitting,
}

/// Everything a play screen renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub player_name: String,
    pub level_id: u8,
    pub required_claim_count: usize,
    pub phase: Phase,
    pub claims: Vec<String>,
    pub validation: Option<AggregateValidation>,
    pub feedback: Vec<String>,
    pub submitted: bool,
    pub time_remaining: u32,
    pub time_formatted: String,
    pub time_running_low: bool,
    pub filled_claims: usize,
    pub can_add_claim: bool,
}

enum Command {
    AddClaim(oneshot::Sender<Option<usize>>),
    UpdateClaim {
        index: usize,
        text: String,
        reply: oneshot::Sender<bool>,
    },
    RemoveClaim {
        index: usize,
        reply: oneshot::Sender<bool>,
    },
    Validate(oneshot::Sender<Option<AggregateValidation>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    PauseTimer(oneshot::Sender<bool>),
    AddTime {
        seconds: u32,
        reply: oneshot::Sender<bool>,
    },
    ResumeTimer(oneshot::Sender<bool>),
    Submit(oneshot::Sender<bool>),
    Teardown,
}

/// Cloneable front of a running session.
///
/// Every method is a no-op (`false` / `None`) once the session has settled or
/// been torn down.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::Sender<Command>,
    timer_events: broadcast::Sender<TimerEvent>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn timer_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.timer_events.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).await.ok()?;
        rx.await.ok()
    }

    pub async fn add_claim(&self) -> Option<usize> {
        self.request(Command::AddClaim).await.flatten()
    }

    pub async fn update_claim(&self, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        self.request(|reply| Command::UpdateClaim { index, text, reply })
            .await
            .unwrap_or(false)
    }

    pub async fn remove_claim(&self, index: usize) -> bool {
        self.request(|reply| Command::RemoveClaim { index, reply })
            .await
            .unwrap_or(false)
    }

    /// Validates the current claims while collecting; afterwards returns the submit-time results.
    pub async fn validate(&self) -> Option<AggregateValidation> {
        self.request(Command::Validate).await.flatten()
    }

    /// `None` once the session has settled or been torn down.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    pub async fn pause_timer(&self) -> bool {
        self.request(Command::PauseTimer).await.unwrap_or(false)
    }

    /// Extends the countdown, capped at the level's time limit.
    pub async fn add_time(&self, seconds: u32) -> bool {
        self.request(|reply| Command::AddTime { seconds, reply })
            .await
            .unwrap_or(false)
    }

    pub async fn resume_timer(&self) -> bool {
        self.request(Command::ResumeTimer).await.unwrap_or(false)
    }

    /// `true` only for the call that moved the session into submitting.
    pub async fn submit(&self) -> bool {
        self.request(Command::Submit).await.unwrap_or(false)
    }

    /// Cancels the session: the timer stops and no result is produced.
    pub async fn teardown(&self) {
        let _ = self.commands.send(Command::Teardown).await;
    }
}

/// Resolves to the terminal result, or `None` if the session was torn down.
pub struct SessionOutcome {
    rx: oneshot::Receiver<SessionResult>,
}

impl Future for SessionOutcome {
    type Output = Option<SessionResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

pub struct SessionController {
    params: SessionParams,
    settings: ControllerSettings,
    sink: Arc<dyn ClaimSink>,
    phase: Phase,
    store: ClaimStore,
    timer: GameTimer,
    validation: Option<AggregateValidation>,
    feedback: Vec<String>,
    pending: Option<SessionResult>,
}

impl SessionController {
    /// Starts the session task and its timer. Must be called inside a tokio runtime.
    pub fn spawn(
        params: SessionParams,
        sink: Arc<dyn ClaimSink>,
        settings: ControllerSettings,
    ) -> (SessionHandle, SessionOutcome) {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();

        let timer = GameTimer::new(params.session_id.clone(), settings.tick_interval);
        let handle = SessionHandle {
            session_id: params.session_id.clone(),
            commands: commands_tx,
            timer_events: timer.events(),
        };

        let controller = SessionController {
            params,
            settings,
            sink,
            phase: Phase::Collecting,
            store: ClaimStore::new(),
            timer,
            validation: None,
            feedback: Vec::new(),
            pending: None,
        };

        tokio::spawn(controller.run(commands_rx, expiry_tx, expiry_rx, result_tx));

        (handle, SessionOutcome { rx: result_rx })
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        expiry_tx: mpsc::UnboundedSender<()>,
        mut expiry: mpsc::UnboundedReceiver<()>,
        mut result_tx: oneshot::Sender<SessionResult>,
    ) {
        tracing::info!(
            session_id = %self.params.session_id,
            level_id = self.params.level.id,
            time_limit = self.params.level.time_limit_seconds,
            "session started"
        );

        self.timer
            .start(i64::from(self.params.level.time_limit_seconds), move || {
                let _ = expiry_tx.send(());
            });

        let mut settle: Option<Pin<Box<Sleep>>> = None;
        let mut commands_open = true;

        loop {
            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(Command::Teardown) => {
                        self.teardown("teardown requested");
                        return;
                    }
                    Some(command) => {
                        if self.handle(command) {
                            settle = Some(Box::pin(sleep(self.settings.settle_delay)));
                        }
                    }
                    // Handles are gone; keep going while someone awaits the outcome.
                    None => commands_open = false,
                },
                Some(()) = expiry.recv(), if self.phase == Phase::Collecting => {
                    if self.begin_submit(SubmitTrigger::TimerExpired) {
                        settle = Some(Box::pin(sleep(self.settings.settle_delay)));
                    }
                }
                () = wait_settle(&mut settle) => {
                    self.settle(result_tx);
                    return;
                }
                () = result_tx.closed() => {
                    self.teardown("outcome dropped");
                    return;
                }
            }
        }
    }

    /// Returns `true` when the command moved the session into submitting.
    fn handle(&mut self, command: Command) -> bool {
        let collecting = self.phase == Phase::Collecting;
        match command {
            Command::AddClaim(reply) => {
                let index = collecting.then(|| self.store.add_claim());
                self.log_rejected(collecting, "add_claim");
                let _ = reply.send(index);
            }
            Command::UpdateClaim { index, text, reply } => {
                let accepted = collecting && self.store.update_claim(index, text);
                self.log_rejected(collecting, "update_claim");
                let _ = reply.send(accepted);
            }
            Command::RemoveClaim { index, reply } => {
                let accepted = collecting && self.store.remove_claim(index);
                self.log_rejected(collecting, "remove_claim");
                let _ = reply.send(accepted);
            }
            Command::Validate(reply) => {
                if collecting {
                    self.validation = Some(validate_all(self.store.claims()));
                }
                let _ = reply.send(self.validation.clone());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::PauseTimer(reply) => {
                let _ = reply.send(collecting && self.timer.pause());
            }
            Command::ResumeTimer(reply) => {
                let _ = reply.send(collecting && self.timer.resume());
            }
            Command::AddTime { seconds, reply } => {
                let _ = reply.send(collecting && self.timer.add_time(seconds));
            }
            Command::Submit(reply) => {
                let started = self.begin_submit(SubmitTrigger::Manual);
                let _ = reply.send(started);
                return started;
            }
            Command::Teardown => {}
        }
        false
    }

    fn log_rejected(&self, collecting: bool, operation: &str) {
        if !collecting {
            tracing::debug!(
                session_id = %self.params.session_id,
                phase = ?self.phase,
                operation,
                "claim mutation ignored after submit"
            );
        }
    }

    fn begin_submit(&mut self, trigger: SubmitTrigger) -> bool {
        if self.phase != Phase::Collecting {
            tracing::debug!(
                session_id = %self.params.session_id,
                ?trigger,
                "duplicate submit ignored"
            );
            return false;
        }

        self.phase = Phase::Submitting;
        self.timer.stop();
        let elapsed_seconds = self.timer.snapshot().elapsed();

        let required = self.params.level.required_claim_count;
        let claims = self.store.to_vec();
        let validation = validate_all(&claims);
        let success = decide_success(&claims, required);
        let feedback = feedback_messages(&claims, required, &validation);

        let trigger_label = match trigger {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::TimerExpired => "timer_expired",
        };
        SUBMIT_TRIGGERS_TOTAL
            .with_label_values(&[trigger_label])
            .inc();
        SESSION_VERDICTS_TOTAL
            .with_label_values(&[if success { "success" } else { "failure" }])
            .inc();

        tracing::info!(
            session_id = %self.params.session_id,
            ?trigger,
            success,
            claims = claims.len(),
            "session submitted"
        );

        // Detached: the verdict is already fixed.
        let dispatched = dispatch_claims(
            Arc::clone(&self.sink),
            &self.params.session_id,
            submittable_claims(&claims),
        );
        tracing::debug!(session_id = %self.params.session_id, dispatched, "claims dispatched");

        self.validation = Some(validation.clone());
        self.feedback = feedback.clone();
        self.pending = Some(SessionResult {
            session_id: self.params.session_id.clone(),
            player_name: self.params.player_name.clone(),
            level_id: self.params.level.id,
            claims,
            success,
            validation: validation.results,
            feedback,
            trigger,
            elapsed_seconds,
        });
        true
    }

    fn settle(&mut self, result_tx: oneshot::Sender<SessionResult>) {
        if let Some(result) = self.pending.take() {
            if result_tx.send(result).is_err() {
                tracing::debug!(session_id = %self.params.session_id, "outcome receiver gone");
            }
        }
        tracing::info!(session_id = %self.params.session_id, "session settled");
    }

    fn teardown(&mut self, reason: &str) {
        self.timer.stop();
        tracing::info!(
            session_id = %self.params.session_id,
            phase = ?self.phase,
            reason,
            "session torn down"
        );
    }

    fn snapshot(&self) -> SessionSnapshot {
        let countdown = self.timer.snapshot();
        let filled_claims = self.store.filled_count();
        let required = self.params.level.required_claim_count;
        SessionSnapshot {
            session_id: self.params.session_id.clone(),
            player_name: self.params.player_name.clone(),
            level_id: self.params.level.id,
            required_claim_count: required,
            phase: self.phase,
            claims: self.store.to_vec(),
            validation: self.validation.clone(),
            feedback: self.feedback.clone(),
            submitted: self.phase != Phase::Collecting,
            time_remaining: countdown.remaining(),
            time_formatted: format_remaining(countdown.remaining()),
            time_running_low: countdown.is_running_low(),
            filled_claims,
            can_add_claim: self.phase == Phase::Collecting && filled_claims < required,
        }
    }
}

async fn wait_settle(settle: &mut Option<Pin<Box<Sleep>>>) {
    match settle {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}
