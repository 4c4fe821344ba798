use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::ReschedulePolicy;
use crate::error::ReminderError;
use crate::notifier::Notifier;
use crate::rescheduler::{Rescheduled, reschedule};
use crate::selector::select_due;
use crate::store::{DueHabit, HabitStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Notify,
    Reschedule,
}

#[derive(Debug)]
pub struct HabitFailure {
    pub habit_id: Uuid,
    pub stage: FailureStage,
    pub error: ReminderError,
}

/// Outcome of one tick.
#[derive(Debug)]
pub struct TickReport {
    pub now: DateTime<Utc>,
    pub due: usize,
    pub notified: usize,
    pub rescheduled: usize,
    /// Due habits another tick advanced first.
    pub superseded: usize,
    /// Due habits left in place by [`ReschedulePolicy::OnSuccess`].
    pub held: usize,
    pub failures: Vec<HabitFailure>,
}

impl TickReport {
    fn new(now: DateTime<Utc>, due: usize) -> Self {
        Self {
            now,
            due,
            notified: 0,
            rescheduled: 0,
            superseded: 0,
            held: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, habit_id: Uuid, stage: FailureStage, error: ReminderError) {
        warn!("Habit {} failed at {:?}: {}", habit_id, stage, error);
        self.failures.push(HabitFailure {
            habit_id,
            stage,
            error,
        });
    }
}

/// Select, notify and reschedule every due habit.
///
/// Habits are handled one after another; for each one the notification
/// finishes before its reschedule starts.
pub struct ReminderJob {
    store: Arc<dyn HabitStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: ReschedulePolicy,
}

impl ReminderJob {
    pub fn new(
        store: Arc<dyn HabitStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            policy: ReschedulePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReschedulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one tick. Only a failed selection is returned as `Err`; per-habit
    /// failures are collected in the report.
    pub async fn tick(&self) -> Result<TickReport, ReminderError> {
        let now = self.clock.now();
        let due = select_due(&self.store, now).await?;

        let mut report = TickReport::new(now, due.len());
        for item in due {
            self.process(item, &mut report).await;
        }

        Ok(report)
    }

    async fn process(&self, due: DueHabit, report: &mut TickReport) {
        let habit_id = due.habit.id;

        let delivered = match self.notifier.notify(&due).await {
            Ok(()) => {
                report.notified += 1;
                true
            }
            Err(e) => {
                report.fail(habit_id, FailureStage::Notify, e);
                false
            }
        };

        if !delivered && self.policy == ReschedulePolicy::OnSuccess {
            report.held += 1;
            return;
        }

        match reschedule(&self.store, &due.habit).await {
            Ok(Rescheduled::Advanced(_)) => report.rescheduled += 1,
            Ok(Rescheduled::Superseded) => report.superseded += 1,
            Err(e) => report.fail(habit_id, FailureStage::Reschedule, e),
        }
    }
}

/// Background task that runs the reminder job on a fixed interval until
/// `shutdown` flips to true.
pub async fn run_reminder_loop(
    job: ReminderJob,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Reminder loop started (every {}s)", interval.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match job.tick().await {
            Ok(report) => {
                if report.due > 0 {
                    info!(
                        "Reminders: {} due, {} sent, {} rescheduled, {} superseded, {} held, {} failed",
                        report.due,
                        report.notified,
                        report.rescheduled,
                        report.superseded,
                        report.held,
                        report.failures.len()
                    );
                }
            }
            Err(e) => {
                error!("Reminder tick failed: {}", e);
            }
        }
    }

    info!("Reminder loop stopped");
}
