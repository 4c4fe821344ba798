/// Stable codes for each failure kind, used in logs and tick reports.
pub mod codes {
    /// Missing bot token, missing chat id, unknown frequency unit.
    pub const CONFIGURATION: &str = "CONFIGURATION";

    /// The messaging provider rejected the message or could not be reached.
    pub const DELIVERY: &str = "DELIVERY";

    /// Reading or updating habit rows failed.
    pub const PERSISTENCE: &str = "PERSISTENCE";
}

/// Per-habit failures of a reminder tick. None of them stops the batch.
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    /// The habit or the service is set up so that it can never succeed as is.
    /// Not retried.
    #[error("[{}] {}", codes::CONFIGURATION, .0)]
    Configuration(String),

    /// Non-2xx answer, transport error or timeout from the provider.
    #[error("[{}] {}", codes::DELIVERY, .0)]
    Delivery(String),

    /// The storage layer failed. The habit stays due and is picked up again
    /// on the next tick.
    #[error("[{}] {}", codes::PERSISTENCE, .0)]
    Persistence(String),
}

impl ReminderError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReminderError::Configuration(_) => codes::CONFIGURATION,
            ReminderError::Delivery(_) => codes::DELIVERY,
            ReminderError::Persistence(_) => codes::PERSISTENCE,
        }
    }

    pub(crate) fn persistence(err: anyhow::Error) -> Self {
        ReminderError::Persistence(format!("{:#}", err))
    }
}
