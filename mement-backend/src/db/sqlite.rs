//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//!
//! All table operations are in the tables/ subdirectory.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// Main database wrapper. A single connection behind a Mutex is enough at
/// this scale; sqlite serializes writers anyway.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_path: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize all tables. Every related table keys on agents.subdomain.
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch("PRAGMA foreign_keys = ON")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agents (
                subdomain TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                titles TEXT,
                suggestions TEXT,
                prompt TEXT,
                workflow TEXT,
                image_cid TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS domains (
                domain TEXT PRIMARY KEY,
                subdomain TEXT,
                custom_script_path TEXT,
                FOREIGN KEY(subdomain) REFERENCES agents(subdomain) ON DELETE SET NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS links (
                subdomain TEXT,
                type TEXT,
                value TEXT,
                PRIMARY KEY (subdomain, type),
                FOREIGN KEY(subdomain) REFERENCES agents(subdomain) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS twitter_bots (
                subdomain TEXT PRIMARY KEY,
                oauth_token TEXT NOT NULL,
                oauth_token_secret TEXT NOT NULL,
                user_id TEXT NOT NULL,
                screen_name TEXT NOT NULL,
                FOREIGN KEY(subdomain) REFERENCES agents(subdomain) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS telegram_bots (
                subdomain TEXT PRIMARY KEY,
                bot_token TEXT NOT NULL,
                group_id TEXT NOT NULL,
                FOREIGN KEY(subdomain) REFERENCES agents(subdomain) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                subdomain TEXT NOT NULL,
                question TEXT NOT NULL,
                response TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                twitter_post_link TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS contexts (
                subdomain TEXT,
                question TEXT,
                context TEXT,
                PRIMARY KEY (subdomain, question),
                FOREIGN KEY(subdomain) REFERENCES agents(subdomain) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }
}
