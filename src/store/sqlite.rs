use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};

use super::{SlotBackend, SlotError};
use crate::domain::timestamp::now_utc_rfc3339;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "kv_slot_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kv_slot (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#,
}];

/// Key-value slots in a local SQLite file.
pub struct SqliteSlots {
    conn: Connection,
}

impl SqliteSlots {
    pub fn open(path: &Path, quota_bytes: Option<u64>) -> Result<Self, SlotError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = open_connection(path, quota_bytes)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory(quota_bytes: Option<u64>) -> Result<Self, SlotError> {
        let mut conn = Connection::open_in_memory()?;
        apply_migrations(&mut conn)?;
        apply_quota(&conn, quota_bytes)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SlotBackend for SqliteSlots {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slot WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
INSERT INTO kv_slot (key, value, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
    value = excluded.value,
    updated_at = excluded.updated_at
"#,
            params![key, value, now_utc_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        self.conn
            .execute("DELETE FROM kv_slot WHERE key = ?1", params![key])?;
        Ok(())
    }
}

pub fn open_connection(path: &Path, quota_bytes: Option<u64>) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    apply_quota(&conn, quota_bytes)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

/// Caps the database file so a full store surfaces as SQLITE_FULL.
fn apply_quota(conn: &Connection, quota_bytes: Option<u64>) -> Result<()> {
    let Some(quota) = quota_bytes else {
        return Ok(());
    };
    let page_size: i64 = conn.query_row("PRAGMA page_size;", [], |row| row.get(0))?;
    let quota = i64::try_from(quota).unwrap_or(i64::MAX);
    let pages = (quota / page_size.max(1)).max(1);
    conn.pragma_update(None::<DatabaseName>, "max_page_count", pages)?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}
