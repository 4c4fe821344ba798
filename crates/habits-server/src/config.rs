use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::FixedOffset;

use habits_reminders::config::{DEFAULT_API_BASE_URL, DEFAULT_NOTIFY_TIMEOUT, DEFAULT_TICK_INTERVAL};
use habits_reminders::{NotifierConfig, ReminderConfig, ReschedulePolicy};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub notifier: NotifierConfig,
    pub reminders: ReminderConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("HABITS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HABITS_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = get("HABITS_PORT", "3000")
            .parse()
            .context("HABITS_PORT must be a port number")?;

        let timeout = match lookup("HABITS_NOTIFY_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().context("HABITS_NOTIFY_TIMEOUT_SECS must be seconds")?),
            None => DEFAULT_NOTIFY_TIMEOUT,
        };

        let interval = match lookup("HABITS_REMINDER_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(v.parse().context("HABITS_REMINDER_INTERVAL_SECS must be seconds")?),
            None => DEFAULT_TICK_INTERVAL,
        };
        if interval.is_zero() {
            bail!("HABITS_REMINDER_INTERVAL_SECS must be positive");
        }

        let utc_offset: FixedOffset = get("HABITS_UTC_OFFSET", "+00:00")
            .parse()
            .map_err(|e| anyhow::anyhow!("HABITS_UTC_OFFSET must look like +03:00: {}", e))?;

        let policy = match get("HABITS_RESCHEDULE_ON_FAILURE", "true").as_str() {
            "true" | "1" | "yes" => ReschedulePolicy::Always,
            "false" | "0" | "no" => ReschedulePolicy::OnSuccess,
            other => bail!("HABITS_RESCHEDULE_ON_FAILURE must be true or false, got '{}'", other),
        };

        let bot_token = lookup("HABITS_BOT_TOKEN").filter(|t| !t.trim().is_empty());

        let notifier = NotifierConfig::new(bot_token)
            .with_api_base_url(get("HABITS_BOT_API_URL", DEFAULT_API_BASE_URL))
            .with_timeout(timeout)
            .with_utc_offset(utc_offset);

        Ok(Self {
            host: get("HABITS_HOST", "0.0.0.0"),
            port,
            db_path: get("HABITS_DB_PATH", "habits.db").into(),
            jwt_secret,
            notifier,
            reminders: ReminderConfig { interval, policy },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("HABITS_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("habits.db"));
        assert!(cfg.notifier.bot_token.is_none());
        assert_eq!(cfg.notifier.api_base_url, "https://api.telegram.org");
        assert_eq!(cfg.notifier.timeout, Duration::from_secs(10));
        assert_eq!(cfg.reminders.interval, Duration::from_secs(60));
        assert_eq!(cfg.reminders.policy, ReschedulePolicy::Always);
    }

    #[test]
    fn placeholder_secret_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("HABITS_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn reads_reminder_settings() {
        let cfg = config(&[
            ("HABITS_JWT_SECRET", "s3cret"),
            ("HABITS_BOT_TOKEN", "123:abc"),
            ("HABITS_UTC_OFFSET", "+03:00"),
            ("HABITS_NOTIFY_TIMEOUT_SECS", "3"),
            ("HABITS_REMINDER_INTERVAL_SECS", "30"),
            ("HABITS_RESCHEDULE_ON_FAILURE", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.notifier.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(cfg.notifier.utc_offset.local_minus_utc(), 3 * 3600);
        assert_eq!(cfg.notifier.timeout, Duration::from_secs(3));
        assert_eq!(cfg.reminders.interval, Duration::from_secs(30));
        assert_eq!(cfg.reminders.policy, ReschedulePolicy::OnSuccess);
    }

    #[test]
    fn rejects_bad_values() {
        let base = ("HABITS_JWT_SECRET", "s3cret");
        assert!(config(&[base, ("HABITS_PORT", "http")]).is_err());
        assert!(config(&[base, ("HABITS_UTC_OFFSET", "Moscow")]).is_err());
        assert!(config(&[base, ("HABITS_REMINDER_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[base, ("HABITS_RESCHEDULE_ON_FAILURE", "maybe")]).is_err());
    }
}
