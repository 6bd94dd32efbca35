//! Persistent SQLite store for users, chat history, and file analyses.
//!
//! Three independent tables correlated only by chat_id; they are never
//! joined. The users table takes whole-row inserts plus a single
//! phone-number update; the history tables are append-only.

use crate::sentiment::SentimentLabel;
use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Registration progress, stored alongside the user row.
/// A missing row is the implicit Unregistered state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    PendingPhone,
    Registered,
}

impl RegistrationState {
    fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::PendingPhone => "pending_phone",
            RegistrationState::Registered => "registered",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "registered" => RegistrationState::Registered,
            _ => RegistrationState::PendingPhone,
        }
    }
}

/// A registered (or registering) user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub chat_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub state: RegistrationState,
}

/// One processed text message: input, reply, and sentiment tag.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub chat_id: i64,
    pub user_input: String,
    pub bot_response: String,
    pub sentiment: SentimentLabel,
}

#[derive(Debug)]
pub enum StoreError {
    Open { path: PathBuf, source: rusqlite::Error },
    Sql(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Open { path, source } => {
                write!(f, "failed to open database '{}': {}", path.display(), source)
            }
            StoreError::Sql(source) => write!(f, "database error: {}", source),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Open { source, .. } => Some(source),
            StoreError::Sql(source) => Some(source),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sql(e)
    }
}

/// SQLite-backed persistence gateway.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Open { path: path.to_path_buf(), source: e })?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        info!("Opened database at {:?}", path);
        Ok(store)
    }

    /// Create a new in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Open { path: PathBuf::from(":memory:"), source: e })?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                chat_id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                username TEXT,
                phone_number TEXT,
                state TEXT NOT NULL DEFAULT 'pending_phone',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                user_input TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_analysis (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                file_name TEXT NOT NULL,
                analysis TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_history_chat_id ON chat_history(chat_id);
            CREATE INDEX IF NOT EXISTS idx_file_analysis_chat_id ON file_analysis(chat_id);
            "#,
        )?;
        Ok(())
    }

    fn now() -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    // ==================== USERS ====================

    /// Look up a user by chat id.
    pub fn find_user(&self, chat_id: i64) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT chat_id, first_name, username, phone_number, state
                 FROM users WHERE chat_id = ?1",
                params![chat_id],
                |row| {
                    Ok(UserRecord {
                        chat_id: row.get(0)?,
                        first_name: row.get(1)?,
                        username: row.get(2)?,
                        phone_number: row.get(3)?,
                        state: RegistrationState::from_str(&row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Create a user row with no phone number, awaiting contact share.
    pub fn create_user(
        &self,
        chat_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (chat_id, first_name, username, phone_number, state, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5)",
            params![chat_id, first_name, username, RegistrationState::PendingPhone.as_str(), Self::now()],
        )?;
        info!("👤 Registered new user {} ({})", first_name, chat_id);
        Ok(())
    }

    /// Record the shared phone number and mark the user registered.
    pub fn record_phone(&self, chat_id: i64, phone_number: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET phone_number = ?2, state = ?3 WHERE chat_id = ?1",
            params![chat_id, phone_number, RegistrationState::Registered.as_str()],
        )?;
        Ok(())
    }

    // ==================== CHAT HISTORY ====================

    /// Append one chat turn. Turns are immutable once written.
    pub fn insert_chat_turn(&self, turn: &ChatTurn) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chat_history (chat_id, user_input, bot_response, sentiment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![turn.chat_id, turn.user_input, turn.bot_response, turn.sentiment.as_str(), Self::now()],
        )?;
        Ok(())
    }

    // ==================== FILE ANALYSIS ====================

    /// Append one file-analysis record. Records are immutable once written.
    pub fn insert_file_analysis(
        &self,
        chat_id: i64,
        file_name: &str,
        analysis: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO file_analysis (chat_id, file_name, analysis, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, file_name, analysis, Self::now()],
        )?;
        Ok(())
    }

    // ==================== COUNTS ====================

    pub fn user_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    pub fn chat_turn_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM chat_history", [], |row| row.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    pub fn file_analysis_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM file_analysis", [], |row| row.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find_user() {
        let store = Store::in_memory().unwrap();
        store.create_user(42, "Alice", Some("alice")).unwrap();

        let user = store.find_user(42).unwrap().expect("user should exist");
        assert_eq!(user.chat_id, 42);
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.phone_number, None);
        assert_eq!(user.state, RegistrationState::PendingPhone);
    }

    #[test]
    fn test_find_user_missing() {
        let store = Store::in_memory().unwrap();
        assert!(store.find_user(7).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_is_rejected() {
        let store = Store::in_memory().unwrap();
        store.create_user(42, "Alice", None).unwrap();
        // chat_id is the primary key; a second insert must fail, never clone the row
        assert!(store.create_user(42, "Alice", None).is_err());
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_record_phone_marks_registered() {
        let store = Store::in_memory().unwrap();
        store.create_user(42, "Alice", None).unwrap();
        store.record_phone(42, "+15551234").unwrap();

        let user = store.find_user(42).unwrap().unwrap();
        assert_eq!(user.phone_number.as_deref(), Some("+15551234"));
        assert_eq!(user.state, RegistrationState::Registered);
    }

    #[test]
    fn test_record_phone_without_row_is_noop() {
        let store = Store::in_memory().unwrap();
        store.record_phone(99, "+15550000").unwrap();
        assert!(store.find_user(99).unwrap().is_none());
    }

    #[test]
    fn test_chat_turns_append_only() {
        let store = Store::in_memory().unwrap();
        let turn = ChatTurn {
            chat_id: 42,
            user_input: "I love this!".to_string(),
            bot_response: "😊 That sounds great! Glad to hear it.".to_string(),
            sentiment: SentimentLabel::Positive,
        };
        store.insert_chat_turn(&turn).unwrap();
        store.insert_chat_turn(&turn).unwrap();
        assert_eq!(store.chat_turn_count(), 2);
    }

    #[test]
    fn test_chat_turn_without_user_row() {
        // tables are independent; no foreign-key integrity is enforced
        let store = Store::in_memory().unwrap();
        let turn = ChatTurn {
            chat_id: 1234,
            user_input: "hi".to_string(),
            bot_response: "hello".to_string(),
            sentiment: SentimentLabel::Neutral,
        };
        store.insert_chat_turn(&turn).unwrap();
        assert_eq!(store.chat_turn_count(), 1);
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_file_analysis_records() {
        let store = Store::in_memory().unwrap();
        store.insert_file_analysis(42, "report.pdf", "A quarterly report.").unwrap();
        store.insert_file_analysis(42, "archive.zip", "").unwrap();
        assert_eq!(store.file_analysis_count(), 2);
    }

    #[test]
    fn test_registration_state_round_trip() {
        for state in [RegistrationState::PendingPhone, RegistrationState::Registered] {
            assert_eq!(RegistrationState::from_str(state.as_str()), state);
        }
    }

    #[test]
    fn test_open_on_disk_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sagebot.db");
        {
            let store = Store::open(&path).unwrap();
            store.create_user(42, "Alice", None).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert!(store.find_user(42).unwrap().is_some());
    }
}
