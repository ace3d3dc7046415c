//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - Bot credentials and the admin identity
//! - Daily schedule (time zone, release/reminder times, hint pacing)
//! - Server binding settings
//! - Storage file locations

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// Messenger credentials and admin identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token (may be left empty and supplied via BOT_TOKEN)
    #[serde(default)]
    pub token: String,
    pub admin_id: String,
    pub api_base: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` on webhook calls
    /// (WEBHOOK_SECRET env var takes precedence)
    #[serde(default)]
    pub webhook_secret: String,
    /// Bearer token for the /admin API (ADMIN_API_TOKEN env var takes precedence)
    #[serde(default)]
    pub admin_token: String,
}

/// Daily timing parameters, all in the configured local time zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone name such as "Europe/Moscow"
    pub time_zone: String,
    /// Release time, "HH:MM"
    pub daily_quiz_time: String,
    /// Reminder time, "HH:MM"
    pub reminder_time: String,
    pub hint_interval_minutes: u32,
    pub max_hints: usize,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// JSON store locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub quizzes_path: PathBuf,
    pub users_path: PathBuf,
}

/// Validated schedule settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub tz: Tz,
    pub release: NaiveTime,
    pub reminder: NaiveTime,
    pub hint_interval_minutes: NonZeroU32,
    pub max_hints: usize,
}

impl Config {
    /// Load from RIDDLE_CONFIG or config.toml, falling back to the embedded defaults
    pub fn load() -> Result<Self> {
        let path = std::env::var("RIDDLE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(path)
    }

    /// Load from specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::parse(&content).context("Failed to parse config file")
        } else {
            Self::parse(DEFAULT_CONFIG).context("Failed to parse default config")
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.schedule()?;
        Ok(config)
    }

    /// Bot token (env var takes precedence, None if neither is set)
    pub fn bot_token(&self) -> Option<String> {
        secret_from_env("BOT_TOKEN", &self.bot.token)
    }

    /// Webhook secret (env var takes precedence, None if neither is set)
    pub fn webhook_secret(&self) -> Option<String> {
        secret_from_env("WEBHOOK_SECRET", &self.bot.webhook_secret)
    }

    /// Admin API token (env var takes precedence, None if neither is set)
    pub fn admin_token(&self) -> Option<String> {
        secret_from_env("ADMIN_API_TOKEN", &self.bot.admin_token)
    }

    /// Bind host and port, with RIDDLE_HOST / RIDDLE_PORT overrides
    pub fn bind_addr(&self) -> (String, u16) {
        let host = std::env::var("RIDDLE_HOST").unwrap_or_else(|_| self.server.host.clone());
        let port = std::env::var("RIDDLE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.server.port);
        (host, port)
    }

    pub fn schedule(&self) -> Result<Schedule> {
        self.schedule.resolve()
    }
}

impl ScheduleConfig {
    pub fn resolve(&self) -> Result<Schedule> {
        let tz: Tz = self
            .time_zone
            .parse()
            .map_err(|e| anyhow!("Invalid time_zone {:?}: {}", self.time_zone, e))?;
        let release = parse_clock_time(&self.daily_quiz_time).context("daily_quiz_time")?;
        let reminder = parse_clock_time(&self.reminder_time).context("reminder_time")?;

        let Some(hint_interval_minutes) = NonZeroU32::new(self.hint_interval_minutes) else {
            bail!("hint_interval_minutes must be positive");
        };

        Ok(Schedule {
            tz,
            release,
            reminder,
            hint_interval_minutes,
            max_hints: self.max_hints,
        })
    }
}

fn parse_clock_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .with_context(|| format!("Expected HH:MM, got {:?}", value))
}

fn secret_from_env(var: &str, configured: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ if configured.is_empty() => None,
        _ => Some(configured.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        let schedule = config.schedule().unwrap();
        assert_eq!(schedule.tz, chrono_tz::Europe::Moscow);
        assert_eq!(schedule.release, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(schedule.reminder, NaiveTime::from_hms_opt(9, 50, 0).unwrap());
        assert_eq!(schedule.hint_interval_minutes.get(), 30);
    }

    #[test]
    fn test_rejects_bad_schedule() {
        let bad_time = DEFAULT_CONFIG.replace("\"10:00\"", "\"25:00\"");
        assert!(Config::parse(&bad_time).is_err());

        let bad_zone = DEFAULT_CONFIG.replace("\"Europe/Moscow\"", "\"+03:00\"");
        assert!(Config::parse(&bad_zone).is_err());

        let zero_interval = DEFAULT_CONFIG.replace("= 30", "= 0");
        assert!(Config::parse(&zero_interval).is_err());
    }

    #[test]
    fn test_accepts_dst_zone() {
        let berlin = DEFAULT_CONFIG.replace("\"Europe/Moscow\"", "\"Europe/Berlin\"");
        let schedule = Config::parse(&berlin).unwrap().schedule().unwrap();
        assert_eq!(schedule.tz, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from("/nonexistent/riddle.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.users_path, PathBuf::from("users.json"));
    }
}
