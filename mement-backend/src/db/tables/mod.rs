//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod agents;        // agents
mod bots;          // twitter_bots, telegram_bots
mod chats;         // chats
mod contexts;      // contexts
mod domains;       // domains, links
pub(crate) mod provision; // all-or-nothing tenant upsert transaction
