use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ReminderError;
use crate::store::{DueHabit, HabitStore};

/// Every habit whose `time <= now`, in no particular order.
pub async fn select_due(
    store: &Arc<dyn HabitStore>,
    now: DateTime<Utc>,
) -> Result<Vec<DueHabit>, ReminderError> {
    let store = store.clone();
    let due = tokio::task::spawn_blocking(move || store.due_habits(now))
        .await
        .map_err(|e| ReminderError::Persistence(format!("spawn_blocking join error: {}", e)))?
        .map_err(ReminderError::persistence)?;

    debug!("{} habit(s) due at {}", due.len(), now);
    Ok(due)
}
