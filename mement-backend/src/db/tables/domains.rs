//! Custom domain mappings and per-agent social links.

use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{Domain, Link};

impl Database {
    pub fn get_domain(&self, domain: &str) -> SqliteResult<Option<Domain>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT domain, subdomain, custom_script_path FROM domains WHERE domain = ?1",
        )?;

        stmt.query_row([domain], |row| {
            Ok(Domain {
                domain: row.get(0)?,
                subdomain: row.get(1)?,
                custom_script_path: row.get(2)?,
            })
        })
        .optional()
    }

    pub fn list_links(&self, subdomain: &str) -> SqliteResult<Vec<Link>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT subdomain, type, value FROM links WHERE subdomain = ?1 ORDER BY type",
        )?;

        let links = stmt
            .query_map([subdomain], |row| {
                Ok(Link {
                    subdomain: row.get(0)?,
                    link_type: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(links)
    }
}
