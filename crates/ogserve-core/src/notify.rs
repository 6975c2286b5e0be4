use crate::config::RuntimeConfig;
use crate::error::{OgError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;

/// Channel name operational alerts go to.
pub const WARNINGS_CHANNEL: &str = "warnings";

// ---------------------------------------------------------------------------
// NotifyLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Critical,
}

impl NotifyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyLevel::Info => "info",
            NotifyLevel::Warning => "warning",
            NotifyLevel::Critical => "critical",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            NotifyLevel::Info => ":incoming_envelope:",
            NotifyLevel::Warning => ":warning:",
            NotifyLevel::Critical => ":rotating_light:",
        }
    }

    /// Attachment bar color in the Slack message.
    pub fn color(self) -> &'static str {
        match self {
            NotifyLevel::Info => "#36a64f",
            NotifyLevel::Warning => "#F0D500",
            NotifyLevel::Critical => "#F32013",
        }
    }
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Pushes operational alerts to named Slack webhooks. Delivery failures are
/// surfaced as errors but callers on the request path fire-and-forget;
/// a broken webhook must never break card serving.
pub struct Notifier {
    client: reqwest::Client,
    user_tag: Option<String>,
    channels: HashMap<String, String>,
}

impl Notifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            user_tag: None,
            channels: HashMap::new(),
        }
    }

    /// Register the `warnings` channel when a webhook is configured.
    pub fn from_config(config: &RuntimeConfig, client: reqwest::Client) -> Self {
        let mut notifier = Self::new(client).with_user_tag(config.slack_user_tag.clone());
        if let Some(url) = &config.slack_webhook_url {
            notifier.register_slack(WARNINGS_CHANNEL, url.clone());
        }
        notifier
    }

    /// Slack member tag (for example `<@U0123>`) prepended to warning and
    /// critical messages so someone actually gets pinged.
    pub fn with_user_tag(mut self, tag: Option<String>) -> Self {
        self.user_tag = tag;
        self
    }

    pub fn register_slack(&mut self, name: impl Into<String>, webhook_url: impl Into<String>) {
        self.channels.insert(name.into(), webhook_url.into());
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub async fn send(
        &self,
        channel: &str,
        level: NotifyLevel,
        message: &str,
        details: Option<&str>,
    ) -> Result<()> {
        let webhook_url = self
            .channels
            .get(channel)
            .ok_or_else(|| OgError::ChannelNotRegistered(channel.to_string()))?;

        let payload = self.payload(level, message, details);
        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OgError::NotifyFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OgError::NotifyFailed(format!(
                "channel '{channel}' returned {status}"
            )));
        }
        tracing::debug!(channel, level = %level, "notification delivered");
        Ok(())
    }

    fn payload(
        &self,
        level: NotifyLevel,
        message: &str,
        details: Option<&str>,
    ) -> serde_json::Value {
        let mut text = format!("{} *{}*", level.emoji(), level.as_str().to_uppercase());
        if matches!(level, NotifyLevel::Warning | NotifyLevel::Critical) {
            if let Some(tag) = &self.user_tag {
                text.push_str(&format!("\n\n{tag}"));
            }
        }
        text.push_str(&format!("\n\n{message}"));
        if let Some(details) = details {
            text.push_str(&format!("\n```{details}```"));
        }

        json!({
            "attachments": [{
                "color": level.color(),
                "blocks": [{
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": text }
                }]
            }]
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
