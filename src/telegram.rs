//! Telegram long-poll collaborator.
//!
//! Owns the connection to the Bot API and feeds incoming text messages to
//! the dispatch pool. The dispatcher core knows nothing about Telegram; it
//! only sees raw message text and a reply callback.
//!
//! Ordinary conversation is ignored: only messages containing a `[section]`
//! header are treated as action messages and dispatched. Everything
//! dispatched gets exactly one reply, success or failure.

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::pool::{DispatchPool, SharedTable};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause after a failed poll before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// One `getUpdates` entry. Channel posts are handled like direct messages.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Incoming>,
    #[serde(default)]
    pub channel_post: Option<Incoming>,
}

impl Update {
    /// The text payload and its reply destination, if this update has one.
    pub fn text_message(self) -> Option<(i64, String)> {
        let incoming = self.message.or(self.channel_post)?;
        let text = incoming.text?;
        Some((incoming.chat.id, text))
    }
}

#[derive(Debug, Deserialize)]
pub struct Incoming {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Blocking Telegram Bot API client.
pub struct TelegramClient {
    http: reqwest::blocking::Client,
    base: String,
    poll_timeout: u64,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_seconds: u64) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            // The long poll holds the request open for poll_timeout; give
            // the HTTP layer headroom beyond that.
            .timeout(Duration::from_secs(poll_timeout_seconds + 15))
            .build()
            .map_err(|e| RelayError::Telegram(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base: format!("https://api.telegram.org/bot{token}"),
            poll_timeout: poll_timeout_seconds,
        })
    }

    /// Long-poll for updates past `offset`.
    pub fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .http
            .get(format!("{}/getUpdates", self.base))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.poll_timeout.to_string()),
                (
                    "allowed_updates",
                    "[\"message\",\"channel_post\"]".to_string(),
                ),
            ])
            .send()
            .map_err(|e| RelayError::Telegram(format!("getUpdates: {e}")))?;

        let payload: ApiResponse<Vec<Update>> = response
            .json()
            .map_err(|e| RelayError::Telegram(format!("getUpdates decode: {e}")))?;
        if !payload.ok {
            return Err(RelayError::Telegram(format!(
                "getUpdates rejected: {}",
                payload.description.as_deref().unwrap_or("no description")
            )));
        }
        Ok(payload.result.unwrap_or_default())
    }

    /// Deliver one reply to a chat.
    pub fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&body)
            .send()
            .map_err(|e| RelayError::Telegram(format!("sendMessage: {e}")))?;

        let payload: ApiResponse<serde_json::Value> = response
            .json()
            .map_err(|e| RelayError::Telegram(format!("sendMessage decode: {e}")))?;
        if !payload.ok {
            return Err(RelayError::Telegram(format!(
                "sendMessage rejected: {}",
                payload.description.as_deref().unwrap_or("no description")
            )));
        }
        Ok(())
    }
}

/// Cheap pre-filter for action messages: at least one line that is a
/// `[section]` header. Plain chatter never reaches the dispatcher.
pub fn looks_like_action(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        line.len() > 2 && line.starts_with('[') && line.ends_with(']')
    })
}

/// Connect and dispatch incoming messages until the process is stopped.
pub fn run(config: &Config) -> Result<()> {
    let token = config.bot_token()?;
    let client = Arc::new(TelegramClient::new(
        token,
        config.settings.poll_timeout_seconds,
    )?);

    let table = SharedTable::new(config.action_table()?);
    let pool = DispatchPool::new(
        config.settings.max_parallel,
        config.settings.queue_depth,
        Arc::clone(&table),
        config.dispatch_limits(),
    )?;

    info!(
        actions = config.actions.len(),
        max_parallel = config.settings.max_parallel,
        "connected, polling for messages"
    );

    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset) {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "poll failed, backing off");
                std::thread::sleep(POLL_RETRY_DELAY);
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some((chat_id, text)) = update.text_message() else {
                continue;
            };
            let text = text.trim().to_string();
            if !looks_like_action(&text) {
                debug!(chat = chat_id, "ignoring non-action message");
                continue;
            }

            let client = Arc::clone(&client);
            pool.submit(text, move |reply| {
                if let Err(error) = client.send_message(chat_id, &reply) {
                    error!(chat = chat_id, %error, "failed to deliver reply");
                }
            })?;
        }
    }
}
