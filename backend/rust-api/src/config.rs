use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSettings {
    /// Pause between the verdict and the completion notification.
    pub settle_delay_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            tick_interval_ms: 1000,
        }
    }
}

impl GameSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub max_stream_seconds: u32,
    pub log_format: LogFormat,
    pub game: GameSettings,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, local .env as fallback
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml, then APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let api_base_url = settings
            .get_string("client.api_base_url")
            .or_else(|_| env::var("API_BASE_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = GameSettings::default();
        let game = GameSettings {
            settle_delay_ms: positive_u64(
                &settings,
                "game.settle_delay_ms",
                "SETTLE_DELAY_MS",
                defaults.settle_delay_ms,
            ),
            tick_interval_ms: positive_u64(
                &settings,
                "game.tick_interval_ms",
                "TICK_INTERVAL_MS",
                defaults.tick_interval_ms,
            ),
        };

        let request_timeout_ms = positive_u64(
            &settings,
            "client.request_timeout_ms",
            "REQUEST_TIMEOUT_MS",
            5000,
        );

        let max_stream_seconds = positive_u64(
            &settings,
            "stream.max_stream_seconds",
            "SSE_MAX_STREAM_SECONDS",
            3600,
        )
        .min(u32::MAX as u64) as u32;

        let log_format = match settings
            .get_string("log.format")
            .or_else(|_| env::var("LOG_FORMAT"))
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            bind_addr,
            api_base_url,
            request_timeout_ms,
            max_stream_seconds,
            log_format,
            game,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Reads `key` from the layered settings, then `fallback_env`; zero or garbage yields `default`.
fn positive_u64(settings: &config::Config, key: &str, fallback_env: &str, default: u64) -> u64 {
    settings
        .get_string(key)
        .or_else(|_| env::var(fallback_env))
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "APP__GAME__SETTLE_DELAY_MS",
        "TICK_INTERVAL_MS",
        "API_BASE_URL",
        "LOG_FORMAT",
        "SSE_MAX_STREAM_SECONDS",
        "SKIP_ROOT_ENV",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_overrides() {
        clear();
        env::set_var("SKIP_ROOT_ENV", "1");

        let config = Config::load().unwrap();
        assert_eq!(config.game.settle_delay_ms, 2000);
        assert_eq!(config.game.tick_interval_ms, 1000);
        assert_eq!(config.max_stream_seconds, 3600);

        clear();
    }

    #[test]
    #[serial]
    fn env_overrides_are_layered() {
        clear();
        env::set_var("SKIP_ROOT_ENV", "1");
        env::set_var("APP__GAME__SETTLE_DELAY_MS", "250");
        env::set_var("TICK_INTERVAL_MS", "0");
        env::set_var("API_BASE_URL", "http://scoring.local:9000/");
        env::set_var("LOG_FORMAT", "JSON");

        let config = Config::load().unwrap();
        assert_eq!(config.game.settle_delay_ms, 250);
        assert_eq!(config.game.tick_interval_ms, 1000);
        assert_eq!(config.api_base_url, "http://scoring.local:9000");
        assert_eq!(config.log_format, LogFormat::Json);

        clear();
    }
}
