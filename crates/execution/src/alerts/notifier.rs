//! Notifiers for delivering alerts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    /// Value dropped across a position's lifetime.
    Loss,
    /// Periodic summary.
    PerformanceReport,
}

impl AlertLevel {
    /// Wire tag of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Loss => "LOSS",
            Self::PerformanceReport => "PERFORMANCE_REPORT",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Creates an alert stamped with the current time.
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Alert delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `alert`. Failures are logged, never returned.
    async fn notify(&self, alert: &Alert);

    /// Name of the channel, for logs.
    fn name(&self) -> &str;

    /// Builds and delivers an alert.
    async fn send(&self, level: AlertLevel, message: &str) {
        self.notify(&Alert::new(level, message)).await;
    }
}

/// Writes alerts to the tracing output.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, alert: &Alert) {
        match alert.level {
            AlertLevel::Info | AlertLevel::PerformanceReport => {
                info!(level = %alert.level, "{}", alert.message);
            }
            AlertLevel::Warning => warn!(level = %alert.level, "{}", alert.message),
            AlertLevel::Error | AlertLevel::Loss => {
                error!(level = %alert.level, "{}", alert.message);
            }
        }
    }

    fn name(&self) -> &str {
        "console"
    }
}

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Sends alerts to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier for `chat_id` using `bot_token`.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: TELEGRAM_API_URL.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, alert: &Alert) {
        let body = json!({
            "chat_id": self.chat_id,
            "text": alert.to_string(),
        });

        match self.client.post(self.endpoint()).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), "Telegram rejected alert");
            }
            Err(e) => {
                // The token is part of the URL; keep it out of the logs.
                warn!(error = %e.without_url(), "Failed to deliver Telegram alert");
            }
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// Delivers every alert to each of its notifiers in order.
#[derive(Default, Clone)]
pub struct MultiNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.
    #[must_use]
    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    async fn notify(&self, alert: &Alert) {
        for notifier in &self.notifiers {
            notifier.notify(alert).await;
        }
    }

    fn name(&self) -> &str {
        "multi"
    }
}
