use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Habit, User};

// -- JWT Claims --

/// JWT claims issued by the auth endpoints and checked by the API middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub tg_chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub tg_chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub tg_chat_id: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            tg_chat_id: user.tg_chat_id,
        }
    }
}

// -- Habits --

/// Duration as sent by clients: either a number of seconds (`120`, `"120"`)
/// or a clock string (`"00:02:00"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Seconds(u32),
    Text(String),
}

fn default_frequency_number() -> u32 {
    1
}

fn default_frequency_unit() -> String {
    "days".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHabitRequest {
    pub place: String,
    pub time: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub is_pleasant: bool,
    #[serde(default = "default_frequency_number")]
    pub frequency_number: u32,
    #[serde(default = "default_frequency_unit")]
    pub frequency_unit: String,
    #[serde(default)]
    pub reward: Option<String>,
    pub duration: DurationInput,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHabitRequest {
    pub place: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub is_pleasant: Option<bool>,
    pub frequency_number: Option<u32>,
    pub frequency_unit: Option<String>,
    pub reward: Option<String>,
    pub duration: Option<DurationInput>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HabitResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place: String,
    pub time: DateTime<Utc>,
    pub action: String,
    pub is_pleasant: bool,
    pub frequency_number: u32,
    pub frequency_unit: String,
    pub reward: Option<String>,
    pub duration: u32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Habit> for HabitResponse {
    fn from(h: Habit) -> Self {
        Self {
            id: h.id,
            user_id: h.user_id,
            place: h.place,
            time: h.time,
            action: h.action,
            is_pleasant: h.is_pleasant,
            frequency_number: h.frequency_number,
            frequency_unit: h.frequency_unit,
            reward: h.reward,
            duration: h.duration_secs,
            is_public: h.is_public,
            created_at: h.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}
