//! Precomputed background snippets matched fuzzily against incoming questions.

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;

impl Database {
    /// Best-effort lookup: a context row matches when its stored question
    /// pattern occurs inside the asked question. Returns the first match.
    pub fn find_context(&self, subdomain: &str, question: &str) -> SqliteResult<Option<String>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT context FROM contexts
             WHERE subdomain = ?1 AND ?2 LIKE '%' || question || '%'
             LIMIT 1",
        )?;

        stmt.query_row(rusqlite::params![subdomain, question], |row| row.get(0))
            .optional()
    }

    pub fn upsert_context(&self, subdomain: &str, question: &str, context: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO contexts (subdomain, question, context) VALUES (?1, ?2, ?3)
             ON CONFLICT(subdomain, question) DO UPDATE SET context = excluded.context",
            rusqlite::params![subdomain, question, context],
        )?;
        Ok(())
    }
}
