use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Telegram chat id. Users without one never receive reminders.
    pub tg_chat_id: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

/// A habit as stored: "I will <action> at <time> in <place>".
///
/// `time` is always the next firing instant. The reminder job advances it by
/// `frequency_number` units every time the habit fires. `frequency_unit` is
/// kept as raw text so that an unknown unit surfaces as an error when the
/// habit is rescheduled instead of being dropped at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place: String,
    pub time: DateTime<Utc>,
    pub action: String,
    pub is_pleasant: bool,
    pub frequency_number: u32,
    pub frequency_unit: String,
    pub reward: Option<String>,
    pub duration_secs: u32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    Days,
}

impl FrequencyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyUnit::Days => "days",
        }
    }

    /// Length of `count` units in days.
    pub fn days(&self, count: u32) -> i64 {
        match self {
            FrequencyUnit::Days => i64::from(count),
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency unit '{0}'")]
pub struct UnknownFrequencyUnit(pub String);

impl FromStr for FrequencyUnit {
    type Err = UnknownFrequencyUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(FrequencyUnit::Days),
            other => Err(UnknownFrequencyUnit(other.to_string())),
        }
    }
}
