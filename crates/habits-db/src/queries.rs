use crate::models::{DueHabitRow, HabitRow, UserRow};
use crate::{Database, format_time};
use anyhow::Result;
use chrono::{DateTime, Utc};
use habits_types::models::Habit;
use rusqlite::{Connection, Row};
use tracing::warn;

const HABIT_COLUMNS: &str = "h.id, h.user_id, h.place, h.time, h.action, h.is_pleasant, \
     h.frequency_number, h.frequency_unit, h.reward, h.duration, h.is_public, h.created_at";

const USER_COLUMNS: &str =
    "id, email, password, tg_chat_id, is_active, is_staff, is_superuser, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        tg_chat_id: Option<&str>,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, tg_chat_id, is_staff, is_superuser)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, email, password_hash, tg_chat_id, is_staff, is_superuser],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Set or clear a user's Telegram chat id. Returns false if the user is gone.
    pub fn set_tg_chat_id(&self, user_id: &str, tg_chat_id: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET tg_chat_id = ?2 WHERE id = ?1",
                rusqlite::params![user_id, tg_chat_id],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Habits --

    pub fn insert_habit(&self, habit: &Habit) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO habits (id, user_id, place, time, action, is_pleasant,
                     frequency_number, frequency_unit, reward, duration, is_public, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    habit.id.to_string(),
                    habit.user_id.to_string(),
                    habit.place,
                    format_time(&habit.time),
                    habit.action,
                    habit.is_pleasant,
                    habit.frequency_number,
                    habit.frequency_unit,
                    habit.reward,
                    habit.duration_secs,
                    habit.is_public,
                    format_time(&habit.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_habit(&self, id: &str) -> Result<Option<HabitRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {HABIT_COLUMNS} FROM habits h WHERE h.id = ?1");
            conn.query_row(&sql, [id], habit_from_row).optional()
        })
    }

    /// Overwrite every mutable column of a habit owned by `habit.user_id`.
    /// Returns false if no such habit exists for that owner.
    pub fn update_habit(&self, habit: &Habit) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET place = ?3, time = ?4, action = ?5, is_pleasant = ?6,
                     frequency_number = ?7, frequency_unit = ?8, reward = ?9, duration = ?10,
                     is_public = ?11
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![
                    habit.id.to_string(),
                    habit.user_id.to_string(),
                    habit.place,
                    format_time(&habit.time),
                    habit.action,
                    habit.is_pleasant,
                    habit.frequency_number,
                    habit.frequency_unit,
                    habit.reward,
                    habit.duration_secs,
                    habit.is_public,
                ],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn delete_habit(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn list_user_habits(&self, user_id: &str, limit: u32, offset: u64) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HABIT_COLUMNS} FROM habits h
                 WHERE h.user_id = ?1
                 ORDER BY h.created_at, h.id
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit, sql_offset(offset)], habit_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_user_habits(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM habits WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn list_public_habits(&self, limit: u32, offset: u64) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HABIT_COLUMNS} FROM habits h
                 WHERE h.is_public = 1
                 ORDER BY h.created_at, h.id
                 LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![limit, sql_offset(offset)], habit_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_public_habits(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM habits WHERE is_public = 1", [], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
    }

    // -- Reminders --

    /// Every habit whose `time` is at or before `now`, with the owner's chat id.
    pub fn due_habits(&self, now: &DateTime<Utc>) -> Result<Vec<DueHabitRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {HABIT_COLUMNS}, u.tg_chat_id
                 FROM habits h
                 JOIN users u ON h.user_id = u.id
                 WHERE h.time <= ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([format_time(now)], |row| {
                Ok(DueHabitRow {
                    habit: habit_from_row(row)?,
                    tg_chat_id: row.get(12)?,
                })
            })?;

            // Undecodable rows are skipped, not fatal to the selection.
            let mut due = Vec::new();
            for row in rows {
                match row {
                    Ok(row) => due.push(row),
                    Err(e) => warn!("Skipping undecodable habit row: {}", e),
                }
            }
            Ok(due)
        })
    }

    /// Move a habit from `expected` to `next` in one conditional UPDATE.
    ///
    /// Returns false when the stored time is no longer `expected` (another
    /// tick, or the owner, moved it first) or the habit was deleted.
    pub fn advance_habit_time(
        &self,
        id: &str,
        expected: &DateTime<Utc>,
        next: &DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET time = ?3 WHERE id = ?1 AND time = ?2",
                rusqlite::params![id, format_time(expected), format_time(next)],
            )?;
            Ok(changed == 1)
        })
    }
}

fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            tg_chat_id: row.get(3)?,
            is_active: row.get(4)?,
            is_staff: row.get(5)?,
            is_superuser: row.get(6)?,
            created_at: row.get(7)?,
        })
    })
    .optional()
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        place: row.get(2)?,
        time: row.get(3)?,
        action: row.get(4)?,
        is_pleasant: row.get(5)?,
        frequency_number: row.get(6)?,
        frequency_unit: row.get(7)?,
        reward: row.get(8)?,
        duration: row.get(9)?,
        is_public: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
