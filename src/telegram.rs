//! Outbound delivery to a Telegram group with per-section forum topics.
//!
//! Pure Bot API sends over HTTP; the bot never polls for updates.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::diff::ChangeSet;
use crate::model::{Airdrop, Section};

const MESSAGE_DELAY: Duration = Duration::from_secs(2);

/// Send/failure tally for one batch of messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    chat_id: String,
    topics: crate::config::Topics,
}

impl TelegramClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", config.bot_token),
            chat_id: config.chat_id.clone(),
            topics: config.topics,
        })
    }

    /// Verify the token by asking the API who the bot is.
    pub async fn check_connection(&self) -> Result<String> {
        let json = self.call("getMe", serde_json::json!({})).await?;
        let username = json["result"]["username"]
            .as_str()
            .unwrap_or("<unknown>")
            .to_string();
        info!(bot = %username, "Telegram bot connected");
        Ok(username)
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, method);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Telegram {} request failed", method))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {} response", method))?;
        if json["ok"].as_bool() != Some(true) {
            let description = json["description"].as_str().unwrap_or("unknown error");
            return Err(anyhow!("Telegram {} rejected: {}", method, description));
        }
        Ok(json)
    }

    async fn send_message(&self, text: &str, topic: i64) -> Result<()> {
        self.call(
            "sendMessage",
            serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "Markdown",
                "disable_web_page_preview": false,
                "message_thread_id": topic,
            }),
        )
        .await?;
        Ok(())
    }

    /// Send one formatted airdrop; a failure is logged, not propagated.
    pub async fn send_airdrop(&self, airdrop: &Airdrop, topic: i64, is_new: bool) -> bool {
        let message = format_airdrop(airdrop, is_new);
        match self.send_message(&message, topic).await {
            Ok(()) => true,
            Err(e) => {
                error!(title = %airdrop.title, error = %e, "failed to send airdrop");
                false
            }
        }
    }

    /// Send a batch with a fixed delay between messages so the Bot API
    /// rate limit is never hit. Per-message failures are tallied.
    pub async fn send_batch(&self, airdrops: &[Airdrop], topic: i64, is_new: bool) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (i, airdrop) in airdrops.iter().enumerate() {
            if self.send_airdrop(airdrop, topic, is_new).await {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }
            if i + 1 < airdrops.len() {
                tokio::time::sleep(MESSAGE_DELAY).await;
            }
        }
        outcome
    }

    pub async fn send_summary(
        &self,
        section: Section,
        new_count: usize,
        updated_count: usize,
    ) -> Result<()> {
        let message = format_summary(section, new_count, updated_count, chrono::Utc::now());
        self.send_message(&message, self.topic_for(section)).await
    }

    fn topic_for(&self, section: Section) -> i64 {
        match section {
            Section::Hottest => self.topics.hot,
            Section::Latest => self.topics.latest,
            Section::Updated => self.topics.updated,
        }
    }

    /// Push a change set out to the per-section topics.
    ///
    /// Hot and latest announce their new records only (changed records
    /// surface via the summary counts); the updated section announces
    /// everything it carries, flagged as updates.
    pub async fn deliver(&self, changes: &ChangeSet) -> Result<()> {
        self.check_connection().await?;

        if !changes.hottest.new.is_empty() {
            info!(count = changes.hottest.new.len(), "sending new hot airdrops");
            let outcome = self
                .send_batch(&changes.hottest.new, self.topics.hot, true)
                .await;
            log_outcome("hot", outcome);
        }

        if !changes.latest.new.is_empty() {
            info!(count = changes.latest.new.len(), "sending new latest airdrops");
            let outcome = self
                .send_batch(&changes.latest.new, self.topics.latest, true)
                .await;
            log_outcome("latest", outcome);
        }

        let all_updated: Vec<Airdrop> = changes
            .updated
            .new
            .iter()
            .chain(changes.updated.updated.iter())
            .cloned()
            .collect();
        if !all_updated.is_empty() {
            info!(count = all_updated.len(), "sending updated airdrops");
            let outcome = self.send_batch(&all_updated, self.topics.updated, false).await;
            log_outcome("updated", outcome);
        }

        for section in Section::ALL {
            let changed = changes.section(section);
            self.send_summary(section, changed.new.len(), changed.updated.len())
                .await?;
        }

        Ok(())
    }
}

fn log_outcome(section: &str, outcome: BatchOutcome) {
    if outcome.failed > 0 {
        warn!(section, sent = outcome.sent, failed = outcome.failed, "batch partially sent");
    } else {
        info!(section, sent = outcome.sent, "batch sent");
    }
}

/// Render one airdrop as a Markdown notification.
fn format_airdrop(airdrop: &Airdrop, is_new: bool) -> String {
    let status_emoji = if airdrop.is_confirmed { "✅" } else { "🔔" };
    let status = if is_new { "🆕 NEW" } else { "🔄 UPDATED" };
    let temp_emoji = if airdrop.temperature > 100 {
        "🔥"
    } else if airdrop.temperature > 50 {
        "🌡️"
    } else {
        "❄️"
    };

    let mut message = format!("{} {} AIRDROP\n\n", status_emoji, status);
    message.push_str(&format!("📌 **{}**\n", airdrop.title));
    message.push_str(&format!("{} Temperature: {}°\n", temp_emoji, airdrop.temperature));

    if !airdrop.actions.is_empty() {
        message.push_str(&format!("⚡ Actions: {}\n", airdrop.actions));
    }

    if !airdrop.categories.is_empty() {
        let tags: Vec<String> = airdrop.categories.iter().map(|c| format!("#{}", c)).collect();
        message.push_str(&format!("🏷️ Categories: {}\n", tags.join(" ")));
    }

    let mut requirements = Vec::new();
    for (name, label) in [
        ("twitter", "Twitter"),
        ("telegram", "Telegram"),
        ("email", "Email"),
        ("kyc", "⚠️ KYC"),
    ] {
        if airdrop.requirements.get(name).copied().unwrap_or(false) {
            requirements.push(label);
        }
    }
    if !requirements.is_empty() {
        message.push_str(&format!("📋 Requirements: {}\n", requirements.join(", ")));
    }

    message.push_str(&format!("\n🔗 [View Details]({})", airdrop.url));
    if !airdrop.claim_url.is_empty() && airdrop.claim_url != airdrop.url {
        message.push_str(&format!("\n🎁 [Claim Airdrop]({})", airdrop.claim_url));
    }

    message
}

fn format_summary(
    section: Section,
    new_count: usize,
    updated_count: usize,
    checked_at: chrono::DateTime<chrono::Utc>,
) -> String {
    let mut message = format!("📊 **{} AIRDROPS UPDATE**\n\n", section.label().to_uppercase());
    if new_count > 0 {
        message.push_str(&format!("🆕 New airdrops: {}\n", new_count));
    }
    if updated_count > 0 {
        message.push_str(&format!("🔄 Updated airdrops: {}\n", updated_count));
    }
    if new_count == 0 && updated_count == 0 {
        message.push_str("✅ No new updates\n");
    }
    message.push_str(&format!(
        "\n⏰ Checked at: {}",
        checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn airdrop() -> Airdrop {
        Airdrop {
            id: "airdrop-1".to_string(),
            title: "Mega Drop".to_string(),
            url: "https://airdrops.io/mega/".to_string(),
            thumbnail: String::new(),
            temperature: 120,
            published: String::new(),
            actions: "$90".to_string(),
            categories: vec!["defi".to_string(), "nft".to_string()],
            is_confirmed: true,
            claim_url: "https://claim.example/mega".to_string(),
            requirements: BTreeMap::from([
                ("twitter".to_string(), true),
                ("kyc".to_string(), true),
                ("reddit".to_string(), false),
            ]),
        }
    }

    #[test]
    fn test_format_new_airdrop() {
        let message = format_airdrop(&airdrop(), true);
        assert!(message.contains("🆕 NEW"));
        assert!(message.contains("**Mega Drop**"));
        assert!(message.contains("🔥 Temperature: 120°"));
        assert!(message.contains("#defi #nft"));
        assert!(message.contains("Twitter, ⚠️ KYC"));
        assert!(message.contains("[Claim Airdrop](https://claim.example/mega)"));
    }

    #[test]
    fn test_format_updated_airdrop() {
        let message = format_airdrop(&airdrop(), false);
        assert!(message.contains("🔄 UPDATED"));
        assert!(!message.contains("🆕 NEW"));
    }

    #[test]
    fn test_claim_link_suppressed_when_same_as_url() {
        let mut a = airdrop();
        a.claim_url = a.url.clone();
        let message = format_airdrop(&a, true);
        assert!(!message.contains("Claim Airdrop"));

        a.claim_url.clear();
        assert!(!format_airdrop(&a, true).contains("Claim Airdrop"));
    }

    #[test]
    fn test_optional_lines_omitted() {
        let mut a = airdrop();
        a.actions.clear();
        a.categories.clear();
        a.requirements.clear();
        let message = format_airdrop(&a, true);
        assert!(!message.contains("Actions:"));
        assert!(!message.contains("Categories:"));
        assert!(!message.contains("Requirements:"));
    }

    #[test]
    fn test_format_summary_counts() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-08-25T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let message = format_summary(Section::Hottest, 3, 1, at);
        assert!(message.contains("**HOT AIRDROPS UPDATE**"));
        assert!(message.contains("New airdrops: 3"));
        assert!(message.contains("Updated airdrops: 1"));

        let quiet = format_summary(Section::Latest, 0, 0, at);
        assert!(quiet.contains("No new updates"));
    }
}
