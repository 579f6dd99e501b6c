//! Server-rendered HTML shell. Every page is the same skeleton: fonts,
//! stylesheet, an import map for the React runtime, a `window.serverData`
//! payload and the front-end bundle the resolver selected.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::db::Database;
use crate::files::FileStorage;
use crate::models::{Agent, Chat};

/// TTL for signed agent-image URLs embedded in pages.
pub const IMAGE_URL_TTL_SECS: u64 = 3600;

/// Bundle served on the bare root domain.
pub const CREATE_AGENT_BUNDLE: &str = "create-agent";

pub fn html_shell(bundle: &str, server_data: &Value) -> String {
    format!(
        r#"<html>
  <head>
    <style>
      @font-face {{
          font-family: "JetBrainsMono";
          src: url(/assets/JetBrainsMono.ttf) format("truetype");
          font-display: swap;
      }}
      @font-face {{
          font-family: "Geist";
          src: url(/assets/Geist.ttf) format("truetype");
          font-display: swap;
      }}
    </style>
    <link rel="stylesheet" href="/assets/style.css">
    <link rel="shortcut icon" href="/assets/favicon.ico" type="image/x-icon">
    <script type="importmap">
      {{
        "imports": {{
          "react": "https://esm.sh/react@19.0.0/?dev",
          "react-dom/client": "https://esm.sh/react-dom@19.0.0/client/?dev"
        }}
      }}
    </script>
  </head>
  <body>
    <div id="root"></div>
    <script type="module">
      window.serverData = {server_data};
    </script>
    <script type="module" src="/assets/{bundle}.js"></script>
  </body>
</html>
"#
    )
}

/// Text fields shipped inside URLs and script tags are percent-encoded, with
/// literal percent signs spelled out first so decoding stays unambiguous.
pub(crate) fn encode_display(text: &str) -> String {
    urlencoding::encode(&text.replace('%', "percent")).into_owned()
}

pub struct PageRenderer {
    db: Arc<Database>,
    files: Arc<dyn FileStorage>,
}

impl PageRenderer {
    pub fn new(db: Arc<Database>, files: Arc<dyn FileStorage>) -> Self {
        Self { db, files }
    }

    /// Payload the tenant front end boots from.
    pub async fn tenant_server_data(&self, agent: &Agent) -> Result<Value, String> {
        let links = self
            .db
            .list_links(&agent.subdomain)
            .map_err(|e| format!("Link lookup failed: {}", e))?;

        let mut social_media_links = Map::new();
        for link in &links {
            social_media_links.insert(link.link_type.clone(), json!(link.value));
        }
        let mint_address = links
            .iter()
            .find(|link| link.link_type == "pumpfun")
            .map(|link| link.value.clone());

        let suggestions = agent.suggestion_list();
        let mut reversed = suggestions.clone();
        reversed.reverse();

        let mut data = json!({
            "botName": agent.name,
            "alternativeBotTitles": agent.title_list(),
            "botTag": agent.tag(),
            "scrollItemsLeft": suggestions,
            "scrollItemsRight": reversed,
            "socialMediaLinks": Value::Object(social_media_links),
        });

        if let Some(mint_address) = mint_address {
            data["mintAddress"] = json!(mint_address);
        }
        if let Some(cid) = &agent.image_cid {
            let url = self.files.signed_url(cid, IMAGE_URL_TTL_SECS).await?;
            data["agentImage"] = json!(url);
        }

        Ok(data)
    }

    /// Tenant payload extended with one shared chat.
    pub async fn chat_server_data(&self, agent: &Agent, chat: &Chat) -> Result<Value, String> {
        let mut data = self.tenant_server_data(agent).await?;
        data["chatId"] = json!(chat.id);
        data["question"] = json!(encode_display(&chat.question));
        data["content"] = json!(encode_display(&chat.response));
        data["timestamp"] = json!(chat.timestamp.to_rfc3339());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProvisionRecord;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeStorage;

    #[async_trait]
    impl FileStorage for FakeStorage {
        async fn upload(&self, _bytes: Vec<u8>, _name: &str) -> Result<String, String> {
            Ok("cid".to_string())
        }

        async fn signed_url(&self, cid: &str, _ttl_secs: u64) -> Result<String, String> {
            Ok(format!("https://gw.test/{}?sig=1", cid))
        }
    }

    fn seeded_renderer() -> (PageRenderer, Agent) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let agent = db
            .provision_tenant(&ProvisionRecord {
                agent: Agent {
                    subdomain: "gardener".to_string(),
                    name: "Garden Guru".to_string(),
                    titles: "Guide, Botanist".to_string(),
                    suggestions: "roses, tulips, ferns".to_string(),
                    prompt: "You garden.".to_string(),
                    workflow: String::new(),
                    image_cid: Some("abc123".to_string()),
                },
                domains: vec![],
                links: vec![
                    ("pumpfun".to_string(), "MINT123".to_string()),
                    ("telegram".to_string(), "https://t.me/guru".to_string()),
                ],
                twitter_bot: None,
                telegram_bot: None,
            })
            .unwrap();
        (PageRenderer::new(db, Arc::new(FakeStorage)), agent)
    }

    #[tokio::test]
    async fn test_tenant_server_data_fields() {
        let (renderer, agent) = seeded_renderer();
        let data = renderer.tenant_server_data(&agent).await.unwrap();

        assert_eq!(data["botName"], "Garden Guru");
        assert_eq!(data["botTag"], "@GardenGuru");
        assert_eq!(data["alternativeBotTitles"][1], "Botanist");
        assert_eq!(data["scrollItemsLeft"][0], "roses");
        assert_eq!(data["scrollItemsRight"][0], "ferns");
        assert_eq!(data["socialMediaLinks"]["telegram"], "https://t.me/guru");
        assert_eq!(data["mintAddress"], "MINT123");
        assert_eq!(data["agentImage"], "https://gw.test/abc123?sig=1");
    }

    #[tokio::test]
    async fn test_tenant_server_data_without_image_or_mint() {
        let (renderer, mut agent) = seeded_renderer();
        agent.image_cid = None;
        agent.subdomain = "other".to_string();

        let data = renderer.tenant_server_data(&agent).await.unwrap();
        assert!(data.get("agentImage").is_none());
        assert!(data.get("mintAddress").is_none());
    }

    #[tokio::test]
    async fn test_chat_server_data_encodes_content() {
        let (renderer, agent) = seeded_renderer();
        let chat = Chat {
            id: "abcdefghij".to_string(),
            subdomain: agent.subdomain.clone(),
            question: "How much sun?".to_string(),
            response: "About 50% shade".to_string(),
            timestamp: Utc::now(),
            twitter_post_link: None,
        };

        let data = renderer.chat_server_data(&agent, &chat).await.unwrap();
        assert_eq!(data["chatId"], "abcdefghij");
        assert_eq!(data["content"], "About%2050percent%20shade");
        assert_eq!(data["question"], "How%20much%20sun%3F");
    }

    #[test]
    fn test_encode_display() {
        assert_eq!(encode_display("50% done"), "50percent%20done");
    }

    #[test]
    fn test_html_shell_embeds_bundle_and_data() {
        let shell = html_shell("ask-agent", &json!({ "botName": "Guru" }));
        assert!(shell.contains(r#"src="/assets/ask-agent.js""#));
        assert!(shell.contains(r#"window.serverData = {"botName":"Guru"};"#));
        assert!(shell.contains("importmap"));
    }
}
