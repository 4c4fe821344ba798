pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Habit times are stored as fixed-width UTC text so that `time <= ?` in SQL
/// compares chronologically.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

/// True when `err` comes from a UNIQUE or other constraint rejecting a write.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Whether `time` fits [`TIME_FORMAT`]'s four-digit year.
pub fn is_storable(time: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&time.year())
}

pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|e| anyhow::anyhow!("Corrupt timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn time_text_roundtrip_drops_subseconds() {
        let t = Utc.with_ymd_and_hms(2024, 8, 24, 8, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let text = format_time(&t);
        assert_eq!(text, "2024-08-24 08:00:00");
        assert_eq!(parse_time(&text).unwrap(), Utc.with_ymd_and_hms(2024, 8, 24, 8, 0, 0).unwrap());
    }

    #[test]
    fn time_text_orders_chronologically() {
        let early = format_time(&Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap());
        let late = format_time(&Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert!(early < late);
    }

    #[test]
    fn five_digit_years_are_not_storable() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(is_storable(&last));
        assert!(!is_storable(&(last + chrono::Duration::seconds(1))));
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_time("yesterday").is_err());
    }
}
