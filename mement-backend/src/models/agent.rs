//! Tenant entities: an agent persona plus its domains, links and channel bots.
//!
//! Fields mirror the sqlite columns. `titles` and `suggestions` are stored
//! comma-joined and split on read for presentation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub subdomain: String,
    pub name: String,
    pub titles: String,
    pub suggestions: String,
    pub prompt: String,
    pub workflow: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_cid: Option<String>,
}

impl Agent {
    pub fn title_list(&self) -> Vec<String> {
        split_joined(&self.titles)
    }

    pub fn suggestion_list(&self) -> Vec<String> {
        split_joined(&self.suggestions)
    }

    /// Handle shown next to the persona name, e.g. "@MementOracle".
    pub fn tag(&self) -> String {
        format!("@{}", self.name.split_whitespace().collect::<String>())
    }
}

fn split_joined(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty())
        .collect()
}

/// Custom hostname mapped onto an agent. `subdomain` goes NULL when the
/// target agent is deleted, which must resolve as not-found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,
    pub subdomain: Option<String>,
    pub custom_script_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub subdomain: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterBot {
    pub subdomain: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub user_id: String,
    pub screen_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramBot {
    pub subdomain: String,
    pub bot_token: String,
    pub group_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_list_splits_and_trims() {
        let agent = Agent {
            subdomain: "oracle".to_string(),
            name: "Mement Oracle".to_string(),
            titles: "Guide, Counselor , Sage".to_string(),
            suggestions: String::new(),
            prompt: String::new(),
            workflow: String::new(),
            image_cid: None,
        };
        assert_eq!(agent.title_list(), vec!["Guide", "Counselor", "Sage"]);
        assert!(agent.suggestion_list().is_empty());
    }

    #[test]
    fn test_tag_strips_whitespace() {
        let agent = Agent {
            subdomain: "oracle".to_string(),
            name: "Mement  Oracle".to_string(),
            titles: String::new(),
            suggestions: String::new(),
            prompt: String::new(),
            workflow: String::new(),
            image_cid: None,
        };
        assert_eq!(agent.tag(), "@MementOracle");
    }
}
