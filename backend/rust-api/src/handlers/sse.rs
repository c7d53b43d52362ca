use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    error::ApiError,
    metrics::SSE_CONNECTIONS_ACTIVE,
    models::timer::TimerEvent,
    services::{
        timer::{expired_event, tick_event, Countdown, TickOutcome},
        AppState,
    },
};

/// Timer events for a session
/// GET /api/game/session/{id}/stream
pub async fn session_stream(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.get_session(&session_id).await?;

    let elapsed = (chrono::Utc::now() - session.created_at)
        .num_seconds()
        .max(0);
    let remaining = i64::from(session.time_limit_seconds) - elapsed;
    let max_ticks = state.config.max_stream_seconds;
    let tick_interval = state.config.game.tick_interval();

    tracing::info!(
        session_id = %session_id,
        remaining,
        max_ticks,
        tick_interval_ms = tick_interval.as_millis() as u64,
        "Starting SSE stream"
    );

    let stream = timer_events(session_id, remaining, max_ticks, tick_interval).map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .event(event.event_name())
                .data(event.to_sse_data()),
        )
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Decrements the connection gauge when the stream is dropped.
struct ConnectionGuard;

impl ConnectionGuard {
    fn new() -> Self {
        SSE_CONNECTIONS_ACTIVE.inc();
        ConnectionGuard
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        SSE_CONNECTIONS_ACTIVE.dec();
    }
}

struct StreamState {
    session_id: String,
    countdown: Countdown,
    ticks_left: u32,
    started: bool,
    done: bool,
    _guard: ConnectionGuard,
}

/// One `timer-tick` per interval, then a single `time-expired`.
///
/// At most `max_ticks` ticks follow the opening event. A stream cut short by
/// that cap ends without `time-expired`, since the session still has time.
fn timer_events(
    session_id: String,
    seconds: i64,
    max_ticks: u32,
    tick_interval: Duration,
) -> impl Stream<Item = TimerEvent> {
    let state = StreamState {
        session_id,
        countdown: Countdown::new(seconds),
        ticks_left: max_ticks,
        started: false,
        done: false,
        _guard: ConnectionGuard::new(),
    };

    stream::unfold(state, move |mut st| async move {
        if st.done {
            return None;
        }

        let outcome = if st.started {
            if st.ticks_left == 0 {
                tracing::info!(session_id = %st.session_id, "SSE stream reached its duration cap");
                return None;
            }
            sleep(tick_interval).await;
            st.ticks_left -= 1;
            st.countdown.tick()
        } else {
            st.started = true;
            st.countdown.start()
        };

        let event = match outcome {
            TickOutcome::Expired => {
                tracing::info!(session_id = %st.session_id, "Timer expired");
                expired_event(&st.session_id)
            }
            _ => tick_event(&st.session_id, &st.countdown),
        };
        st.done = event.is_expiry();
        Some((event, st))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(events: &[TimerEvent]) -> Vec<&'static str> {
        events.iter().map(TimerEvent::event_name).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn stream_ticks_then_expires_once() {
        let events: Vec<_> = timer_events("session_abc".into(), 2, 3600, Duration::from_secs(1))
            .collect()
            .await;
        assert_eq!(kinds(&events), vec!["timer-tick", "timer-tick", "time-expired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn capped_stream_ends_without_expiry() {
        let events: Vec<_> = timer_events("session_abc".into(), 600, 2, Duration::from_secs(1))
            .collect()
            .await;
        assert_eq!(kinds(&events), vec!["timer-tick", "timer-tick", "timer-tick"]);
        match events.last() {
            Some(TimerEvent::TimerTick(tick)) => assert_eq!(tick.remaining_seconds, 598),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn exhausted_session_expires_immediately() {
        let events: Vec<_> = timer_events("session_abc".into(), -5, 3600, Duration::from_secs(1))
            .collect()
            .await;
        assert_eq!(kinds(&events), vec!["time-expired"]);
    }
}
