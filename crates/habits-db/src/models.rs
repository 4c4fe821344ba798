//! Database row types - these map directly to SQLite rows.
//! Distinct from habits-types models to keep the DB layer independent.

use anyhow::{Context, Result};
use habits_types::models::{Habit, User};

use crate::parse_time;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub tg_chat_id: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id.parse().with_context(|| format!("Corrupt user id '{}'", self.id))?,
            email: self.email,
            tg_chat_id: self.tg_chat_id,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

pub struct HabitRow {
    pub id: String,
    pub user_id: String,
    pub place: String,
    pub time: String,
    pub action: String,
    pub is_pleasant: bool,
    pub frequency_number: i64,
    pub frequency_unit: String,
    pub reward: Option<String>,
    pub duration: i64,
    pub is_public: bool,
    pub created_at: String,
}

impl HabitRow {
    pub fn into_habit(self) -> Result<Habit> {
        Ok(Habit {
            id: self.id.parse().with_context(|| format!("Corrupt habit id '{}'", self.id))?,
            user_id: self
                .user_id
                .parse()
                .with_context(|| format!("Corrupt user_id '{}' on habit '{}'", self.user_id, self.id))?,
            place: self.place,
            time: parse_time(&self.time)?,
            action: self.action,
            is_pleasant: self.is_pleasant,
            frequency_number: u32::try_from(self.frequency_number).with_context(|| {
                format!(
                    "Corrupt frequency_number {} on habit '{}'",
                    self.frequency_number, self.id
                )
            })?,
            frequency_unit: self.frequency_unit,
            reward: self.reward,
            duration_secs: u32::try_from(self.duration).with_context(|| {
                format!("Corrupt duration {} on habit '{}'", self.duration, self.id)
            })?,
            is_public: self.is_public,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

/// A due habit joined with its owner's notification address.
pub struct DueHabitRow {
    pub habit: HabitRow,
    pub tg_chat_id: Option<String>,
}
