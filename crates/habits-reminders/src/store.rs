use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use habits_db::Database;
use habits_types::models::Habit;

/// A habit that is due, together with where to send its reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct DueHabit {
    pub habit: Habit,
    pub tg_chat_id: Option<String>,
}

/// Storage seen by the reminder job.
///
/// Implementations must make `advance_time` atomic: the update only applies
/// while the stored time still equals `expected`.
pub trait HabitStore: Send + Sync {
    fn due_habits(&self, now: DateTime<Utc>) -> Result<Vec<DueHabit>>;

    /// Returns false if the habit no longer sits at `expected`.
    fn advance_time(&self, habit_id: Uuid, expected: DateTime<Utc>, next: DateTime<Utc>)
    -> Result<bool>;
}

impl HabitStore for Database {
    fn due_habits(&self, now: DateTime<Utc>) -> Result<Vec<DueHabit>> {
        let rows = Database::due_habits(self, &now)?;

        let mut due = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.habit.id.clone();
            match row.habit.into_habit() {
                Ok(habit) => due.push(DueHabit {
                    habit,
                    tg_chat_id: row.tg_chat_id,
                }),
                Err(e) => warn!("Skipping corrupt habit row '{}': {:#}", id, e),
            }
        }
        Ok(due)
    }

    fn advance_time(
        &self,
        habit_id: Uuid,
        expected: DateTime<Utc>,
        next: DateTime<Utc>,
    ) -> Result<bool> {
        self.advance_habit_time(&habit_id.to_string(), &expected, &next)
    }
}
