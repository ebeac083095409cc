use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::item::Item;
use crate::notify::{NotifyError, NotifyOutcome, NotifyResult, Notifier, format_message};

const API_BASE: &str = "https://discord.com/api/v10";
/// Discord rejects message content longer than this.
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

/// Posts messages to a Discord channel through the bot REST API.
#[derive(Clone)]
pub struct DiscordNotifier {
    token: String,
    client: Client,
    api_base: String,
}

impl DiscordNotifier {
    pub fn new(token: impl Into<String>) -> NotifyResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(NotifyError::Configuration(
                "Discord bot token is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Build(e.to_string()))?;
        Ok(Self {
            token,
            client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Points the notifier at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!(
            "{}/channels/{}/messages",
            self.api_base.trim_end_matches('/'),
            channel_id
        )
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<(), String> {
        let rsp = self
            .client
            .post(self.messages_url(channel_id))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&CreateMessage { content })
            .send()
            .await
            .map_err(|e| format!("Discord request failed: {e}"))?;
        rsp.error_for_status()
            .map(|_| ())
            .map_err(|e| format!("Discord HTTP error: {e}"))
    }
}

fn truncate_content(message: &str) -> String {
    if message.chars().count() <= MAX_CONTENT_CHARS {
        return message.to_string();
    }
    let mut out: String = message.chars().take(MAX_CONTENT_CHARS - 1).collect();
    out.push('…');
    out
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, items: &[Item], target: &str) -> NotifyResult<NotifyOutcome> {
        let mut outcome = NotifyOutcome::default();

        for item in items {
            let content = truncate_content(&format_message(item));
            match self.send(target, &content).await {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    log::error!("Failed to notify about {:?}: {e}", item.title);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
