pub mod agent;
pub mod chat;

pub use agent::{Agent, Domain, Link, TelegramBot, TwitterBot};
pub use chat::Chat;
