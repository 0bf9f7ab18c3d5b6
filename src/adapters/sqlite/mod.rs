//! SQLite adapter: Implementation of `HistoryRecorder` and `AccountStore`.
//!
//! Provides local persistence for prediction history and user accounts.
//!
//! # Security
//!
//! Passwords are stored as Argon2id PHC strings, never in plain text.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex is reported
//! as `StorageError::LockPoisoned` instead of panicking.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::password::{self, PasswordError};
use crate::domain::{HistoryEntry, HistoryPage};
use crate::ports::{AccountStore, HistoryRecorder, Registration};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS history (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                symptoms TEXT NOT NULL,
                prediction TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_user_prediction
                ON history(username, prediction);

            CREATE INDEX IF NOT EXISTS idx_history_user_created
                ON history(username, created_at DESC);
            ",
        )?;

        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let symptoms_json: String = row.get(2)?;
        let disease: String = row.get(3)?;
        let created_at_str: String = row.get(4)?;

        let symptoms: Vec<String> = serde_json::from_str(&symptoms_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(HistoryEntry {
            id,
            user_id,
            symptoms,
            disease,
            created_at,
        })
    }
}

impl HistoryRecorder for SqliteStorage {
    type Error = StorageError;

    fn record(&self, entry: &HistoryEntry) -> Result<(), Self::Error> {
        let symptoms = serde_json::to_string(&entry.symptoms)?;
        let conn = self.lock()?;

        conn.execute(
            r"
            INSERT INTO history (id, username, symptoms, prediction, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                entry.id,
                entry.user_id,
                symptoms,
                entry.disease,
                entry.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved history entry {} to storage", entry.id);
        Ok(())
    }

    fn count_prior_matches(&self, user_id: &str, disease: &str) -> Result<usize, Self::Error> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM history WHERE username = ?1 AND prediction = ?2",
            params![user_id, disease],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn load_history_paginated(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<HistoryPage, Self::Error> {
        let conn = self.lock()?;

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM history WHERE username = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, username, symptoms, prediction, created_at
            FROM history
            WHERE username = ?1
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            ",
        )?;

        let entries = stmt
            .query_map(
                params![user_id, limit as i64, offset as i64],
                Self::row_to_entry,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HistoryPage::new(entries, total_count as usize, offset, limit))
    }
}

impl AccountStore for SqliteStorage {
    type Error = StorageError;

    fn register(&self, username: &str, password: &str) -> Result<Registration, Self::Error> {
        // Hash outside the lock; Argon2 is deliberately slow.
        let password_hash = password::hash_password(password)?;
        let conn = self.lock()?;

        let inserted = conn.execute(
            r"
            INSERT OR IGNORE INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            ",
            params![username, password_hash, chrono::Utc::now().to_rfc3339()],
        )?;

        if inserted == 0 {
            return Ok(Registration::AlreadyExists);
        }
        tracing::info!("Registered new account");
        Ok(Registration::Registered)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<bool, Self::Error> {
        let stored: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?
        };

        match stored {
            Some(hash) => Ok(password::verify_password(password, &hash)?),
            None => Ok(false),
        }
    }
}
