//! All-or-nothing tenant upsert. One transaction covers the agent row and
//! every sub-resource; any failure rolls the whole call back so a partial
//! tenant is never visible.

use std::fmt;

use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{Agent, TelegramBot, TwitterBot};

/// Fully resolved payload handed to the transaction: subdomain derived,
/// list fields comma-joined, image already exchanged for a cid.
#[derive(Debug, Clone)]
pub struct ProvisionRecord {
    pub agent: Agent,
    pub domains: Vec<(String, Option<String>)>,
    pub links: Vec<(String, String)>,
    pub twitter_bot: Option<TwitterBot>,
    pub telegram_bot: Option<TelegramBot>,
}

#[derive(Debug)]
pub enum ProvisionWriteError {
    /// Payload failed an in-transaction validity check; nothing was committed.
    Invalid(String),
    Sql(rusqlite::Error),
}

impl fmt::Display for ProvisionWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionWriteError::Invalid(msg) => write!(f, "invalid payload: {}", msg),
            ProvisionWriteError::Sql(e) => write!(f, "database error: {}", e),
        }
    }
}

impl From<rusqlite::Error> for ProvisionWriteError {
    fn from(e: rusqlite::Error) -> Self {
        ProvisionWriteError::Sql(e)
    }
}

impl Database {
    /// Upsert an agent and its sub-resources atomically. Upserts key on
    /// agents.subdomain, domains.domain and links(subdomain, type), so a
    /// repeated call with the same subdomain updates in place.
    pub fn provision_tenant(&self, record: &ProvisionRecord) -> Result<Agent, ProvisionWriteError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let agent = &record.agent;
        if agent.subdomain.trim().is_empty() {
            return Err(ProvisionWriteError::Invalid("empty subdomain".to_string()));
        }
        if agent.name.trim().is_empty() {
            return Err(ProvisionWriteError::Invalid("empty agent name".to_string()));
        }

        tx.execute(
            "INSERT INTO agents (subdomain, name, titles, suggestions, prompt, workflow, image_cid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(subdomain) DO UPDATE SET
                name = excluded.name,
                titles = excluded.titles,
                suggestions = excluded.suggestions,
                prompt = excluded.prompt,
                workflow = excluded.workflow,
                image_cid = excluded.image_cid",
            rusqlite::params![
                &agent.subdomain,
                &agent.name,
                &agent.titles,
                &agent.suggestions,
                &agent.prompt,
                &agent.workflow,
                &agent.image_cid,
            ],
        )?;

        for (domain, custom_script_path) in &record.domains {
            if domain.trim().is_empty() {
                return Err(ProvisionWriteError::Invalid("empty domain".to_string()));
            }
            tx.execute(
                "INSERT INTO domains (domain, subdomain, custom_script_path) VALUES (?1, ?2, ?3)
                 ON CONFLICT(domain) DO UPDATE SET
                    subdomain = excluded.subdomain,
                    custom_script_path = excluded.custom_script_path",
                rusqlite::params![domain, &agent.subdomain, custom_script_path],
            )?;
        }

        for (link_type, value) in &record.links {
            if link_type.trim().is_empty() {
                return Err(ProvisionWriteError::Invalid("empty link type".to_string()));
            }
            tx.execute(
                "INSERT INTO links (subdomain, type, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(subdomain, type) DO UPDATE SET value = excluded.value",
                rusqlite::params![&agent.subdomain, link_type, value],
            )?;
        }

        if let Some(bot) = &record.twitter_bot {
            tx.execute(
                "INSERT INTO twitter_bots (subdomain, oauth_token, oauth_token_secret, user_id, screen_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(subdomain) DO UPDATE SET
                    oauth_token = excluded.oauth_token,
                    oauth_token_secret = excluded.oauth_token_secret,
                    user_id = excluded.user_id,
                    screen_name = excluded.screen_name",
                rusqlite::params![
                    &agent.subdomain,
                    &bot.oauth_token,
                    &bot.oauth_token_secret,
                    &bot.user_id,
                    &bot.screen_name,
                ],
            )?;
        }

        if let Some(bot) = &record.telegram_bot {
            tx.execute(
                "INSERT INTO telegram_bots (subdomain, bot_token, group_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(subdomain) DO UPDATE SET
                    bot_token = excluded.bot_token,
                    group_id = excluded.group_id",
                rusqlite::params![&agent.subdomain, &bot.bot_token, &bot.group_id],
            )?;
        }

        tx.commit()?;
        Ok(agent.clone())
    }

    /// Row counts across the five provisioned tables, used to verify that a
    /// failed transaction left nothing behind.
    pub fn tenant_row_counts(&self) -> SqliteResult<[i64; 5]> {
        let conn = self.conn.lock().unwrap();
        let mut counts = [0i64; 5];
        for (i, table) in ["agents", "domains", "links", "twitter_bots", "telegram_bots"]
            .iter()
            .enumerate()
        {
            counts[i] = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(name: &str) -> ProvisionRecord {
        ProvisionRecord {
            agent: Agent {
                subdomain: "oracle".to_string(),
                name: name.to_string(),
                titles: "Guide,Counselor".to_string(),
                suggestions: "Plant trees,Read widely".to_string(),
                prompt: "You are a patient oracle.".to_string(),
                workflow: String::new(),
                image_cid: None,
            },
            domains: vec![("oracle.example".to_string(), None)],
            links: vec![("twitter".to_string(), "https://twitter.com/oracle".to_string())],
            twitter_bot: Some(TwitterBot {
                subdomain: "oracle".to_string(),
                oauth_token: "tok".to_string(),
                oauth_token_secret: "sec".to_string(),
                user_id: "42".to_string(),
                screen_name: "oracle".to_string(),
            }),
            telegram_bot: Some(TelegramBot {
                subdomain: "oracle".to_string(),
                bot_token: "bot:token".to_string(),
                group_id: "555".to_string(),
            }),
        }
    }

    #[test]
    fn test_provision_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mement.sqlite");
        let db = Database::new(path.to_str().unwrap()).unwrap();

        db.provision_tenant(&sample_record("First Name")).unwrap();
        db.provision_tenant(&sample_record("Second Name")).unwrap();

        let counts = db.tenant_row_counts().unwrap();
        assert_eq!(counts, [1, 1, 1, 1, 1]);

        let agent = db.get_agent("oracle").unwrap().unwrap();
        assert_eq!(agent.name, "Second Name");
    }

    #[test]
    fn test_failed_provision_rolls_back_everything() {
        let db = Database::open_in_memory().unwrap();

        let mut record = sample_record("Oracle");
        record.domains.push((String::new(), None)); // second domain is invalid

        let err = db.provision_tenant(&record).unwrap_err();
        assert!(matches!(err, ProvisionWriteError::Invalid(_)));

        // Nothing from the earlier steps may survive the rollback.
        assert_eq!(db.tenant_row_counts().unwrap(), [0, 0, 0, 0, 0]);
        assert!(db.get_agent("oracle").unwrap().is_none());
    }

    #[test]
    fn test_provision_writes_bot_credentials() {
        let db = Database::open_in_memory().unwrap();
        db.provision_tenant(&sample_record("Oracle")).unwrap();

        let twitter = db.get_twitter_bot("oracle").unwrap().unwrap();
        assert_eq!(twitter.screen_name, "oracle");

        let telegram = db.get_telegram_bot("oracle").unwrap().unwrap();
        assert_eq!(telegram.group_id, "555");
    }
}
