use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Per-section Telegram forum topic ids.
#[derive(Debug, Clone, Copy)]
pub struct Topics {
    pub hot: i64,
    pub latest: i64,
    pub updated: i64,
}

/// Runtime configuration, built once at startup and passed by reference
/// into the collaborators. Nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub topics: Topics,
    pub snapshot_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        const REQUIRED: [&str; 5] = [
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            "TELEGRAM_TOPIC_HOT",
            "TELEGRAM_TOPIC_LATEST",
            "TELEGRAM_TOPIC_UPDATED",
        ];

        let missing: Vec<&str> = REQUIRED
            .iter()
            .filter(|key| dotenv::var(key).map(|v| v.is_empty()).unwrap_or(true))
            .copied()
            .collect();
        if !missing.is_empty() {
            bail!("missing required environment variables: {}", missing.join(", "));
        }

        let snapshot_path = dotenv::var("SNAPSHOT_PATH")
            .unwrap_or_else(|_| "airdrops.json".to_string())
            .into();

        Ok(Self {
            bot_token: dotenv::var("TELEGRAM_BOT_TOKEN")?,
            chat_id: dotenv::var("TELEGRAM_CHAT_ID")?,
            topics: Topics {
                hot: parse_topic("TELEGRAM_TOPIC_HOT")?,
                latest: parse_topic("TELEGRAM_TOPIC_LATEST")?,
                updated: parse_topic("TELEGRAM_TOPIC_UPDATED")?,
            },
            snapshot_path,
        })
    }
}

fn parse_topic(key: &str) -> Result<i64> {
    dotenv::var(key)?
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{} must be a numeric topic id", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // dotenv::var falls through to std::env, so the env-backed paths are
    // exercised here. Runs serially by key choice to avoid cross-test races.
    #[test]
    fn test_missing_vars_reported_together() {
        for key in [
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            "TELEGRAM_TOPIC_HOT",
            "TELEGRAM_TOPIC_LATEST",
            "TELEGRAM_TOPIC_UPDATED",
        ] {
            std::env::remove_var(key);
        }
        let err = Config::from_env().unwrap_err().to_string();
        assert!(err.contains("TELEGRAM_BOT_TOKEN"));
        assert!(err.contains("TELEGRAM_TOPIC_UPDATED"));
    }

    #[test]
    fn test_parse_topic_rejects_garbage() {
        std::env::set_var("DROPWATCH_TEST_TOPIC", "not-a-number");
        assert!(parse_topic("DROPWATCH_TEST_TOPIC").is_err());
        std::env::set_var("DROPWATCH_TEST_TOPIC", " 42 ");
        assert_eq!(parse_topic("DROPWATCH_TEST_TOPIC").unwrap(), 42);
    }
}
