use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Habits DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                tg_chat_id      TEXT,
                is_active       INTEGER NOT NULL DEFAULT 1,
                is_staff        INTEGER NOT NULL DEFAULT 0,
                is_superuser    INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE habits (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                place               TEXT NOT NULL,
                time                TEXT NOT NULL,
                action              TEXT NOT NULL,
                is_pleasant         INTEGER NOT NULL DEFAULT 0,
                frequency_number    INTEGER NOT NULL DEFAULT 1,
                frequency_unit      TEXT NOT NULL DEFAULT 'days',
                reward              TEXT,
                duration            INTEGER NOT NULL,
                is_public           INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_habits_time ON habits(time);
            CREATE INDEX idx_habits_user ON habits(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
