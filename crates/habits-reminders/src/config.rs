use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Everything the Telegram notifier needs. Built once at startup and handed
/// to [`crate::TelegramNotifier::new`].
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Bot token. `None` makes every send a configuration error.
    pub bot_token: Option<String>,
    /// Provider base URL (defaults to `https://api.telegram.org`).
    pub api_base_url: String,
    /// Upper bound on one sendMessage round trip.
    pub timeout: Duration,
    /// Offset used when rendering the habit time as `HH:MM`.
    pub utc_offset: FixedOffset,
}

impl NotifierConfig {
    pub fn new(bot_token: Option<String>) -> Self {
        Self {
            bot_token,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }
}

/// What to do with a due habit whose notification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReschedulePolicy {
    /// Advance the habit anyway so a broken chat id cannot pin it in the due
    /// set forever.
    #[default]
    Always,
    /// Leave the habit due; it is retried on every tick until delivery works.
    OnSuccess,
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub interval: Duration,
    pub policy: ReschedulePolicy,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TICK_INTERVAL,
            policy: ReschedulePolicy::default(),
        }
    }
}
