use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use claimgame_api::{
    config::Config,
    models::{
        claim::SessionResult, timer::TimerEvent, LevelConfig, SessionStatus, UpdateSessionRequest,
    },
    services::{
        claim_validator::{format_validation_result, validate_claim},
        game_api_client::GameApiClient,
        game_controller::{ControllerSettings, SessionController, SessionHandle, SessionParams},
        submission::{ClaimSink, NullSink},
    },
    utils::{logging, time::format_elapsed},
};

const HELP: &str = "\
명령어:
  N 내용     N번 청구항 작성 (1부터)
  :add       청구항 추가
  :rm N      N번 청구항 삭제
  :check     전체 검증
  :time      남은 시간
  :pause     타이머 일시정지
  :resume    타이머 재개
  :extend N  N초 연장 (제한시간까지)
  :submit    제출
  :quit      종료";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::init_tracing(config.log_format, "claimgame_api=info,claimgame_play=info");

    let mut args = std::env::args().skip(1);
    let player_name = args.next().unwrap_or_else(|| "player".to_string());
    let level_id: u8 = match args.next() {
        Some(raw) => raw.parse().context("level must be 1, 2 or 3")?,
        None => 1,
    };

    let client = GameApiClient::from_config(&config)?;
    let mut level = LevelConfig::lookup(level_id)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let (session_id, sink, online) = open_session(&client, &player_name, level).await;
        let params = SessionParams::new(session_id, &player_name, level.id)?;
        println!(
            "\n=== {} ({}) | 청구항 {}개 | 제한시간 {}분 ===",
            level.title,
            level.difficulty,
            level.required_claim_count,
            level.time_limit_seconds / 60
        );
        println!("{}", HELP);

        let (handle, outcome) =
            SessionController::spawn(params, sink, ControllerSettings::from(&config.game));
        let clock = tokio::spawn(print_time_warnings(handle.timer_events()));

        let result = tokio::select! {
            result = outcome => result,
            () = read_commands(&handle, &mut input) => {
                handle.teardown().await;
                None
            }
        };
        clock.abort();

        let Some(result) = result else {
            discard_session(&client, handle.session_id(), online).await;
            println!("게임을 종료합니다.");
            return Ok(());
        };

        print_result(&result);
        if online {
            let updates = UpdateSessionRequest {
                status: Some(SessionStatus::Completed),
                ..Default::default()
            };
            if let Err(e) = client.update_session(handle.session_id(), &updates).await {
                tracing::warn!("Failed to complete session {}: {}", handle.session_id(), e);
            }
        }

        let next_level = match (result.success, level.next()) {
            (true, Some(next)) => {
                println!("다음 레벨: {} (Enter로 시작, :quit 종료)", next.title);
                confirm(&mut input).await.then_some(next)
            }
            (true, None) => {
                println!("🏆 모든 레벨을 완료했습니다!");
                None
            }
            (false, _) => {
                println!("같은 레벨을 다시 시도합니다. (Enter로 시작, :quit 종료)");
                confirm(&mut input).await.then_some(level)
            }
        };

        // Leaving the result view ends the server session, whichever way the player goes.
        discard_session(&client, handle.session_id(), online).await;

        match next_level {
            Some(next) => level = next,
            None => {
                if online {
                    match client.active_sessions().await {
                        Ok(count) => tracing::debug!("Server still holds {} sessions", count),
                        Err(e) => tracing::debug!("Stats unavailable: {}", e),
                    }
                }
                return Ok(());
            }
        }
    }
}

async fn discard_session(client: &GameApiClient, session_id: &str, online: bool) {
    if !online {
        return;
    }
    if let Err(e) = client.delete_session(session_id).await {
        tracing::warn!("Failed to delete session {}: {}", session_id, e);
    }
}

/// Falls back to an offline session when the API is unreachable.
async fn open_session(
    client: &GameApiClient,
    player_name: &str,
    level: &'static LevelConfig,
) -> (String, Arc<dyn ClaimSink>, bool) {
    match client.levels().await {
        Ok(levels) if !levels.iter().any(|l| l.matches(level)) => {
            tracing::warn!("Server level table differs for level {}", level.id);
        }
        Ok(_) => {}
        Err(e) => tracing::debug!("Level table unavailable: {}", e),
    }

    match client.create_session(player_name, level.id).await {
        Ok(session) => {
            tracing::info!("Session {} opened at {}", session.session_id, client.base_url());
            let sink: Arc<dyn ClaimSink> = Arc::new(client.clone());
            (session.session_id, sink, true)
        }
        Err(e) => {
            tracing::warn!("API unavailable ({}), playing offline", e);
            let sink: Arc<dyn ClaimSink> = Arc::new(NullSink);
            (SessionParams::generate_session_id(), sink, false)
        }
    }
}

/// Returns when the player quits or stdin closes.
async fn read_commands(handle: &SessionHandle, input: &mut Lines<BufReader<Stdin>>) {
    loop {
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                return;
            }
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => return,
            (":add", _) => match handle.add_claim().await {
                Some(index) => println!("{}번 청구항이 추가되었습니다", index + 1),
                None => println!("제출 이후에는 수정할 수 없습니다"),
            },
            (":rm", n) => {
                let removed = match parse_index(n) {
                    Some(index) => handle.remove_claim(index).await,
                    None => false,
                };
                if removed {
                    println!("삭제되었습니다");
                } else {
                    println!("삭제할 수 없습니다");
                }
            }
            (":check", _) => {
                if let Some(validation) = handle.validate().await {
                    for result in &validation.results {
                        println!("  {}. {}", result.index + 1, result.message);
                    }
                }
            }
            (":time", _) => {
                if let Some(snapshot) = handle.snapshot().await {
                    println!(
                        "⏱ {} | 작성 {}/{}",
                        snapshot.time_formatted, snapshot.filled_claims, snapshot.required_claim_count
                    );
                }
            }
            (":pause", _) => {
                if handle.pause_timer().await {
                    println!("⏸ 일시정지");
                }
            }
            (":extend", n) => match n.trim().parse::<u32>() {
                Ok(seconds) if seconds > 0 => {
                    if handle.add_time(seconds).await {
                        println!("⏱ {}초 연장", seconds);
                    }
                }
                _ => println!("연장할 시간을 초 단위로 입력하세요"),
            },
            (":resume", _) => {
                if handle.resume_timer().await {
                    println!("▶ 재개");
                }
            }
            (":submit", _) => {
                if handle.submit().await {
                    println!("제출 중...");
                }
            }
            ("", _) => {}
            (n, text) => {
                let updated = match parse_index(n) {
                    Some(index) => handle.update_claim(index, text).await,
                    None => false,
                };
                if updated {
                    println!("  {}", format_validation_result(&validate_claim(text)));
                } else {
                    println!("알 수 없는 명령입니다.\n{}", HELP);
                }
            }
        }
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()?.checked_sub(1)
}

async fn print_time_warnings(mut events: broadcast::Receiver<TimerEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        };
        match event {
            TimerEvent::TimerTick(tick)
                if tick.remaining_seconds % 60 == 0 || tick.remaining_seconds <= 10 =>
            {
                println!("⏱ 남은 시간 {}", tick.formatted);
            }
            TimerEvent::TimeExpired(_) => {
                println!("⏰ 시간이 종료되었습니다. 자동 제출합니다.");
                return;
            }
            _ => {}
        }
    }
}

fn print_result(result: &SessionResult) {
    println!();
    println!(
        "{}",
        if result.success {
            "🎉 레벨 성공!"
        } else {
            "❌ 레벨 실패"
        }
    );
    println!("소요 시간: {}", format_elapsed(u64::from(result.elapsed_seconds)));
    for message in &result.feedback {
        println!("{}", message);
    }
    for validation in &result.validation {
        println!("  {}. {}", validation.index + 1, validation.message);
    }
}

async fn confirm(input: &mut Lines<BufReader<Stdin>>) -> bool {
    matches!(input.next_line().await, Ok(Some(line)) if line.trim() != ":quit")
}
