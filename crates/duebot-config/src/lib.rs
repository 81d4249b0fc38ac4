use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Telegram bot token not configured (set BOT_TOKEN or telegram.bot_token)")]
    MissingToken,
}

/// Telegram connection and identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. The `BOT_TOKEN` environment variable takes
    /// precedence over this field.
    #[serde(default)]
    pub bot_token: String,
    /// Telegram user id allowed to run privileged commands.
    #[serde(default)]
    pub admin_id: i64,
    /// Chat that receives reminders and weekly summaries.
    #[serde(default)]
    pub broadcast_chat_id: i64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_id: 0,
            broadcast_chat_id: 0,
        }
    }
}

/// Weekly summary scheduling settings. The reminder tick itself is fixed
/// at one hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Weekday the summary is broadcast on (e.g. "sun", "monday").
    #[serde(default = "default_summary_weekday")]
    pub summary_weekday: String,
    /// Local hour (0-23) the summary is broadcast at.
    #[serde(default = "default_summary_hour")]
    pub summary_hour: u32,
}

fn default_summary_weekday() -> String {
    "sun".to_string()
}

fn default_summary_hour() -> u32 {
    18
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            summary_weekday: default_summary_weekday(),
            summary_hour: default_summary_hour(),
        }
    }
}

impl ReminderConfig {
    /// Parsed summary weekday, falling back to Sunday on an invalid value.
    pub fn weekday(&self) -> Weekday {
        self.summary_weekday.parse().unwrap_or_else(|_| {
            tracing::warn!(
                value = %self.summary_weekday,
                "Invalid summary_weekday, using sunday"
            );
            Weekday::Sun
        })
    }
}

/// Top-level duebot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DueBotConfig {
    /// Telegram connection settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Reminder/summary schedule settings.
    #[serde(default)]
    pub reminders: ReminderConfig,
}

impl DueBotConfig {
    /// Bot token with the `BOT_TOKEN` environment override applied.
    pub fn resolved_bot_token(&self) -> Result<String, ConfigError> {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if !token.is_empty() {
                return Ok(token);
            }
        }
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(self.telegram.bot_token.clone())
    }
}

/// Resolve the duebot config directory (~/.duebot/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".duebot"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.duebot/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Resolve the deadline database path (~/.duebot/deadlines.db).
pub fn db_path() -> Result<PathBuf, ConfigError> {
    Ok(ensure_config_dir()?.join("deadlines.db"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<DueBotConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<DueBotConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(DueBotConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: DueBotConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DueBotConfig::default();
        assert_eq!(config.telegram.admin_id, 0);
        assert_eq!(config.reminders.summary_weekday, "sun");
        assert_eq!(config.reminders.summary_hour, 18);
        assert_eq!(config.reminders.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r#"{
            telegram: {
                bot_token: "123:ABC",
                admin_id: 5909931243,
                broadcast_chat_id: -100123456,
            },
            reminders: { summary_weekday: "monday", summary_hour: 9 },
        }"#;
        let config: DueBotConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.telegram.bot_token, "123:ABC");
        assert_eq!(config.telegram.admin_id, 5909931243);
        assert_eq!(config.telegram.broadcast_chat_id, -100123456);
        assert_eq!(config.reminders.weekday(), Weekday::Mon);
        assert_eq!(config.reminders.summary_hour, 9);
    }

    #[test]
    fn test_json5_parse_partial() {
        let json5_str = r#"{ telegram: { admin_id: 42 } }"#;
        let config: DueBotConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.telegram.admin_id, 42);
        assert!(config.telegram.bot_token.is_empty());
        // Reminder schedule falls back to defaults
        assert_eq!(config.reminders.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_invalid_weekday_falls_back() {
        let reminders = ReminderConfig {
            summary_weekday: "someday".into(),
            summary_hour: 18,
        };
        assert_eq!(reminders.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_missing_token_rejected() {
        let config = DueBotConfig::default();
        // Only meaningful when BOT_TOKEN is not set in the environment
        if std::env::var("BOT_TOKEN").is_err() {
            assert!(matches!(
                config.resolved_bot_token(),
                Err(ConfigError::MissingToken)
            ));
        }
    }
}
