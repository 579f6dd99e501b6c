//! Chat record persistence. Rows are insert-only; the pipeline writes exactly
//! one per answered question and the share page reads them back by id.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::Chat;

impl Database {
    pub fn insert_chat(&self, chat: &Chat) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chats (id, subdomain, question, response, timestamp, twitter_post_link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &chat.id,
                &chat.subdomain,
                &chat.question,
                &chat.response,
                chat.timestamp.to_rfc3339(),
                chat.twitter_post_link,
            ],
        )?;
        Ok(())
    }

    pub fn get_chat(&self, id: &str) -> SqliteResult<Option<Chat>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, subdomain, question, response, timestamp, twitter_post_link
             FROM chats WHERE id = ?1",
        )?;

        stmt.query_row([id], |row| {
            let timestamp_str: String = row.get(4)?;
            Ok(Chat {
                id: row.get(0)?,
                subdomain: row.get(1)?,
                question: row.get(2)?,
                response: row.get(3)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                twitter_post_link: row.get(5)?,
            })
        })
        .optional()
    }

    pub fn count_chats(&self, subdomain: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM chats WHERE subdomain = ?1",
            [subdomain],
            |row| row.get(0),
        )
    }
}
