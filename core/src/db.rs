use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    DietaryPreference, LogEntry, LogType, NewLogEntry, PhysicalLimitation, UserProfile,
    format_timestamp, validate_log_type,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    user_id INTEGER PRIMARY KEY,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    city TEXT NOT NULL,
                    dietary_preference TEXT NOT NULL,
                    medical_conditions TEXT NOT NULL DEFAULT '',
                    physical_limitations TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS logs (
                    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(user_id),
                    timestamp TEXT NOT NULL,
                    log_type TEXT NOT NULL CHECK (log_type IN ('mood', 'cgm', 'food')),
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_logs_user_time ON logs(user_id, timestamp);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn conversion_error(col: usize, msg: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            msg.into(),
        )
    }

    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
        let diet: String = row.get(4)?;
        let conditions: String = row.get(5)?;
        let limitation: String = row.get(6)?;
        Ok(UserProfile {
            user_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            city: row.get(3)?,
            dietary_preference: DietaryPreference::parse(&diet).ok_or_else(|| {
                Self::conversion_error(4, format!("unknown dietary preference '{diet}'"))
            })?,
            medical_conditions: conditions
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            physical_limitations: PhysicalLimitation::parse(&limitation).ok_or_else(|| {
                Self::conversion_error(6, format!("unknown physical limitation '{limitation}'"))
            })?,
        })
    }

    fn log_from_row(row: &rusqlite::Row) -> rusqlite::Result<LogEntry> {
        let log_type: String = row.get(3)?;
        Ok(LogEntry {
            log_id: row.get(0)?,
            user_id: row.get(1)?,
            timestamp: row.get(2)?,
            log_type: validate_log_type(&log_type)
                .map_err(|e| Self::conversion_error(3, e.to_string()))?,
            value: row.get(4)?,
        })
    }

    // --- Users ---

    pub fn insert_user(&self, user: &UserProfile) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO users (user_id, first_name, last_name, city, dietary_preference,
                                    medical_conditions, physical_limitations)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.user_id,
                    user.first_name,
                    user.last_name,
                    user.city,
                    user.dietary_preference.as_str(),
                    user.medical_conditions.join(", "),
                    user.physical_limitations.as_str(),
                ],
            )
            .with_context(|| format!("Failed to insert user {}", user.user_id))?;
        Ok(())
    }

    /// Insert all profiles in one transaction.
    pub fn insert_users(&self, users: &[UserProfile]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for user in users {
            self.insert_user(user)?;
        }
        tx.commit()?;
        Ok(users.len())
    }

    pub fn count_users(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, first_name, last_name, city, dietary_preference,
                        medical_conditions, physical_limitations
                 FROM users WHERE user_id = ?1",
                params![user_id],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    // --- Logs ---

    /// Append an entry. The user is not checked here; callers that accept
    /// outside input look the profile up first.
    pub fn insert_log(&self, entry: &NewLogEntry) -> Result<LogEntry> {
        let timestamp = format_timestamp(entry.timestamp.unwrap_or_else(Utc::now));
        self.conn
            .execute(
                "INSERT INTO logs (user_id, timestamp, log_type, value) VALUES (?1, ?2, ?3, ?4)",
                params![entry.user_id, timestamp, entry.log_type.as_str(), entry.value],
            )
            .context("Failed to insert log entry")?;
        let id = self.conn.last_insert_rowid();
        self.get_log(id)
    }

    pub fn get_log(&self, log_id: i64) -> Result<LogEntry> {
        self.conn
            .query_row(
                "SELECT log_id, user_id, timestamp, log_type, value FROM logs WHERE log_id = ?1",
                params![log_id],
                Self::log_from_row,
            )
            .with_context(|| format!("Log entry {log_id} not found"))
    }

    /// Entries for a user, most recent first. Entries sharing a timestamp come
    /// back in reverse insertion order.
    pub fn get_logs(
        &self,
        user_id: i64,
        log_type: Option<LogType>,
        limit: Option<i64>,
    ) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT log_id, user_id, timestamp, log_type, value
             FROM logs
             WHERE user_id = ?1 AND (?2 IS NULL OR log_type = ?2)
             ORDER BY timestamp DESC, log_id DESC
             LIMIT ?3",
        )?;
        // SQLite treats a negative LIMIT as no limit.
        let entries = stmt
            .query_map(
                params![user_id, log_type.map(LogType::as_str), limit.unwrap_or(-1)],
                Self::log_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn latest_log(&self, user_id: i64, log_type: LogType) -> Result<Option<LogEntry>> {
        Ok(self
            .get_logs(user_id, Some(log_type), Some(1))?
            .into_iter()
            .next())
    }
}
