//! Agent lookups. Writes happen only through the provisioning transaction.

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::Agent;

impl Database {
    pub fn get_agent(&self, subdomain: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT subdomain, name, titles, suggestions, prompt, workflow, image_cid
             FROM agents WHERE subdomain = ?1",
        )?;

        stmt.query_row([subdomain], |row| Self::row_to_agent(row))
            .optional()
    }

    pub fn delete_agent(&self, subdomain: &str) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM agents WHERE subdomain = ?1", [subdomain])
    }

    pub(crate) fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
        Ok(Agent {
            subdomain: row.get(0)?,
            name: row.get(1)?,
            titles: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            suggestions: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            prompt: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            workflow: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            image_cid: row.get(6)?,
        })
    }
}
