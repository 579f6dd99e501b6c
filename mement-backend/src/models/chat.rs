use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one answered question. Written exactly once per
/// successful ask, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub subdomain: String,
    pub question: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_post_link: Option<String>,
}
