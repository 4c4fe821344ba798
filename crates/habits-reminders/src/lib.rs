//! Habit reminder job.
//!
//! One tick of the job:
//!
//! ```text
//! Clock::now ─► select_due ─► for each due habit:
//!                               Notifier::notify   (one Telegram sendMessage)
//!                               reschedule         (time += frequency, guarded)
//! ```
//!
//! The job keeps no state between ticks. Everything it needs lives in the
//! habit rows, so a tick aborted half way is finished by the next one.

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod notifier;
pub mod rescheduler;
pub mod selector;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{NotifierConfig, ReminderConfig, ReschedulePolicy};
pub use driver::{FailureStage, HabitFailure, ReminderJob, TickReport, run_reminder_loop};
pub use error::ReminderError;
pub use notifier::{Notifier, TelegramNotifier, format_message};
pub use rescheduler::{Rescheduled, next_occurrence, reschedule};
pub use selector::select_due;
pub use store::{DueHabit, HabitStore};
