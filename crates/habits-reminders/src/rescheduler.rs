use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use habits_types::models::{FrequencyUnit, Habit};

use crate::error::ReminderError;
use crate::store::HabitStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Rescheduled {
    /// The habit now sits at its next occurrence.
    Advanced(Habit),
    /// The stored time had already moved away from the one we saw, so this
    /// occurrence was handled elsewhere. Nothing was written.
    Superseded,
}

/// `habit.time` plus one frequency period.
///
/// Computed from the habit's own time, never from the wall clock, so the
/// time of day never drifts.
pub fn next_occurrence(habit: &Habit) -> Result<DateTime<Utc>, ReminderError> {
    let unit: FrequencyUnit = habit.frequency_unit.parse().map_err(|e| {
        ReminderError::Configuration(format!("habit {}: {}", habit.id, e))
    })?;

    if habit.frequency_number == 0 {
        return Err(ReminderError::Configuration(format!(
            "habit {}: frequency_number must be positive",
            habit.id
        )));
    }

    habit
        .time
        .checked_add_signed(Duration::days(unit.days(habit.frequency_number)))
        .filter(habits_db::is_storable)
        .ok_or_else(|| {
            ReminderError::Configuration(format!(
                "habit {}: next occurrence after {} is out of range",
                habit.id, habit.time
            ))
        })
}

/// Advance `habit` to its next occurrence and persist it.
///
/// The write is conditional on the stored time still being `habit.time`, so
/// two ticks that both saw the same occurrence advance it only once. Feeding
/// the returned habit back in advances it again: each call is one period.
pub async fn reschedule(
    store: &Arc<dyn HabitStore>,
    habit: &Habit,
) -> Result<Rescheduled, ReminderError> {
    let next = next_occurrence(habit)?;

    let id = habit.id;
    let expected = habit.time;
    let s = store.clone();
    let advanced = tokio::task::spawn_blocking(move || s.advance_time(id, expected, next))
        .await
        .map_err(|e| ReminderError::Persistence(format!("spawn_blocking join error: {}", e)))?
        .map_err(ReminderError::persistence)?;

    if !advanced {
        debug!("Habit {} already moved past {}", id, expected);
        return Ok(Rescheduled::Superseded);
    }

    debug!("Habit {} rescheduled {} -> {}", id, expected, next);
    Ok(Rescheduled::Advanced(Habit {
        time: next,
        ..habit.clone()
    }))
}
