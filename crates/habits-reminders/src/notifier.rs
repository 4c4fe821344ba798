use async_trait::async_trait;
use chrono::FixedOffset;
use tracing::{debug, warn};

use habits_types::models::Habit;

use crate::config::NotifierConfig;
use crate::error::ReminderError;
use crate::store::DueHabit;

/// Delivers one reminder. Implementations do not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, due: &DueHabit) -> Result<(), ReminderError>;
}

/// Reminder text, e.g. `приседания запланировано на сегодня на 08:00`.
pub fn format_message(habit: &Habit, offset: &FixedOffset) -> String {
    format!(
        "{} запланировано на сегодня на {}",
        habit.action,
        habit.time.with_timezone(offset).format("%H:%M")
    )
}

/// Sends reminders through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl TelegramNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self, ReminderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReminderError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn send_message_url(&self, token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, due: &DueHabit) -> Result<(), ReminderError> {
        let token = self
            .config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ReminderError::Configuration("bot token is not configured".into()))?;

        let chat_id = due
            .tg_chat_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ReminderError::Configuration(format!(
                    "owner of habit {} has no tg_chat_id",
                    due.habit.id
                ))
            })?;

        let text = format_message(&due.habit, &self.config.utc_offset);

        // The URL carries the bot token, keep it out of error messages.
        let resp = self
            .client
            .get(self.send_message_url(token))
            .query(&[("text", text.as_str()), ("chat_id", chat_id)])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    ReminderError::Delivery(format!("sendMessage timed out: {}", e))
                } else {
                    ReminderError::Delivery(format!("sendMessage failed: {}", e))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Telegram rejected reminder for habit {} ({}): {}", due.habit.id, status, body);
            return Err(ReminderError::Delivery(format!("provider returned {}", status)));
        }

        debug!("Reminder sent for habit {} to chat {}", due.habit.id, chat_id);
        Ok(())
    }
}
