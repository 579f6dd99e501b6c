//! Tenant provisioning: payload validation, image pinning, Telegram group
//! discovery and the single transactional write. Also backs the public
//! idea-to-agent creation flow.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::ai::AgentFields;
use crate::channels::TelegramGateway;
use crate::db::{Database, ProvisionRecord, ProvisionWriteError};
use crate::files::FileStorage;
use crate::ids;
use crate::models::{Agent, TelegramBot, TwitterBot};

const CID_MIN_LEN: usize = 59;
const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

#[derive(Debug, Deserialize)]
pub struct AgentPayload {
    pub subdomain: Option<String>,
    pub name: String,
    #[serde(default)]
    pub titles: String,
    #[serde(default)]
    pub suggestions: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub workflow: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DomainPayload {
    pub domain: String,
    pub custom_script_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkPayload {
    #[serde(rename = "type")]
    pub link_type: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct TwitterBotPayload {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub user_id: String,
    pub screen_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramBotPayload {
    pub bot_token: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionPayload {
    pub agent: AgentPayload,
    #[serde(default)]
    pub domains: Vec<DomainPayload>,
    #[serde(default)]
    pub links: Vec<LinkPayload>,
    #[serde(rename = "twitterBot")]
    pub twitter_bot: Option<TwitterBotPayload>,
    #[serde(rename = "telegramBot")]
    pub telegram_bot: Option<TelegramBotPayload>,
}

#[derive(Debug)]
pub enum ProvisionError {
    Unauthorized,
    Validation(String),
    MissingTelegramGroup,
    Upstream(String),
    Write(ProvisionWriteError),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::Unauthorized => write!(f, "invalid or missing bearer token"),
            ProvisionError::Validation(details) => write!(f, "invalid payload: {}", details),
            ProvisionError::MissingTelegramGroup => write!(
                f,
                "missing telegram bot group id and cannot be retrieved from updates"
            ),
            ProvisionError::Upstream(details) => write!(f, "upstream call failed: {}", details),
            ProvisionError::Write(err) => write!(f, "provisioning write failed: {}", err),
        }
    }
}

impl From<ProvisionWriteError> for ProvisionError {
    fn from(err: ProvisionWriteError) -> Self {
        ProvisionError::Write(err)
    }
}

fn is_cid(value: &str) -> bool {
    value.len() >= CID_MIN_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn is_image_path(value: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| value.ends_with(ext))
}

fn derived_subdomain(name: &str) -> String {
    format!("{}-{}", ids::slugify(name), ids::short_id(ids::AGENT_SUFFIX_LEN))
}

pub struct ProvisioningService {
    db: Arc<Database>,
    files: Arc<dyn FileStorage>,
    telegram: Arc<dyn TelegramGateway>,
    secret: String,
}

impl ProvisioningService {
    pub fn new(
        db: Arc<Database>,
        files: Arc<dyn FileStorage>,
        telegram: Arc<dyn TelegramGateway>,
        secret: &str,
    ) -> Self {
        Self {
            db,
            files,
            telegram,
            secret: secret.to_string(),
        }
    }

    /// Bearer check for the privileged endpoint.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<(), ProvisionError> {
        match authorization.and_then(|value| value.strip_prefix("Bearer ")) {
            Some(token) if token == self.secret => Ok(()),
            _ => Err(ProvisionError::Unauthorized),
        }
    }

    /// Accepts an already-pinned cid or a local image path to pin now.
    async fn resolve_image(&self, image: Option<&str>) -> Result<Option<String>, ProvisionError> {
        let image = match image {
            Some(image) => image,
            None => return Ok(None),
        };

        if is_cid(image) {
            return Ok(Some(image.to_string()));
        }
        if is_image_path(image) {
            let bytes = std::fs::read(image)
                .map_err(|e| ProvisionError::Upstream(format!("Failed to read image: {}", e)))?;
            let cid = self
                .files
                .upload(bytes, "agent-image.png")
                .await
                .map_err(ProvisionError::Upstream)?;
            return Ok(Some(cid));
        }
        Err(ProvisionError::Validation(
            "image should be a file path or cid".to_string(),
        ))
    }

    /// Missing group ids are discovered from the bot's pending updates. A bot
    /// that still has no group id fails the whole request before any write.
    async fn resolve_telegram(
        &self,
        subdomain: &str,
        payload: Option<&TelegramBotPayload>,
    ) -> Result<Option<TelegramBot>, ProvisionError> {
        let payload = match payload {
            Some(payload) => payload,
            None => return Ok(None),
        };

        let group_id = match payload.group_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Some(id.to_string()),
            None => self
                .telegram
                .first_chat_id(&payload.bot_token)
                .await
                .map_err(ProvisionError::Upstream)?,
        };

        match group_id {
            Some(group_id) => Ok(Some(TelegramBot {
                subdomain: subdomain.to_string(),
                bot_token: payload.bot_token.clone(),
                group_id,
            })),
            None => Err(ProvisionError::MissingTelegramGroup),
        }
    }

    pub async fn provision(&self, payload: ProvisionPayload) -> Result<Agent, ProvisionError> {
        if payload.agent.name.trim().is_empty() {
            return Err(ProvisionError::Validation("agent name is empty".to_string()));
        }

        let subdomain = payload
            .agent
            .subdomain
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| derived_subdomain(&payload.agent.name));

        let image_cid = self.resolve_image(payload.agent.image.as_deref()).await?;
        let telegram_bot = self
            .resolve_telegram(&subdomain, payload.telegram_bot.as_ref())
            .await?;

        let record = ProvisionRecord {
            agent: Agent {
                subdomain: subdomain.clone(),
                name: payload.agent.name,
                titles: payload.agent.titles,
                suggestions: payload.agent.suggestions,
                prompt: payload.agent.prompt,
                workflow: payload.agent.workflow,
                image_cid,
            },
            domains: payload
                .domains
                .into_iter()
                .map(|d| (d.domain, d.custom_script_path))
                .collect(),
            links: payload
                .links
                .into_iter()
                .map(|l| (l.link_type, l.value))
                .collect(),
            twitter_bot: payload.twitter_bot.map(|bot| TwitterBot {
                subdomain: subdomain.clone(),
                oauth_token: bot.oauth_token,
                oauth_token_secret: bot.oauth_token_secret,
                user_id: bot.user_id,
                screen_name: bot.screen_name,
            }),
            telegram_bot,
        };

        let agent = self.db.provision_tenant(&record)?;
        log::info!("[PROVISION] committed tenant '{}'", agent.subdomain);
        Ok(agent)
    }

    /// Public creation path: generated fields only, no channels or domains.
    pub fn create_from_fields(&self, fields: AgentFields) -> Result<Agent, ProvisionError> {
        if fields.name.trim().is_empty() {
            return Err(ProvisionError::Validation("agent name is empty".to_string()));
        }

        let record = ProvisionRecord {
            agent: Agent {
                subdomain: derived_subdomain(&fields.name),
                name: fields.name,
                titles: fields.titles.join(", "),
                suggestions: fields.suggestions.join(", "),
                prompt: fields.prompt,
                workflow: String::new(),
                image_cid: None,
            },
            domains: vec![],
            links: vec![],
            twitter_bot: None,
            telegram_bot: None,
        };

        let agent = self.db.provision_tenant(&record)?;
        log::info!("[PROVISION] created agent '{}' from idea", agent.subdomain);
        Ok(agent)
    }
}
