//! Channel credential lookups (one bot of each kind per agent).

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{TelegramBot, TwitterBot};

impl Database {
    pub fn get_twitter_bot(&self, subdomain: &str) -> SqliteResult<Option<TwitterBot>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT subdomain, oauth_token, oauth_token_secret, user_id, screen_name
             FROM twitter_bots WHERE subdomain = ?1",
        )?;

        stmt.query_row([subdomain], |row| {
            Ok(TwitterBot {
                subdomain: row.get(0)?,
                oauth_token: row.get(1)?,
                oauth_token_secret: row.get(2)?,
                user_id: row.get(3)?,
                screen_name: row.get(4)?,
            })
        })
        .optional()
    }

    pub fn get_telegram_bot(&self, subdomain: &str) -> SqliteResult<Option<TelegramBot>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT subdomain, bot_token, group_id FROM telegram_bots WHERE subdomain = ?1",
        )?;

        stmt.query_row([subdomain], |row| {
            Ok(TelegramBot {
                subdomain: row.get(0)?,
                bot_token: row.get(1)?,
                group_id: row.get(2)?,
            })
        })
        .optional()
    }
}
