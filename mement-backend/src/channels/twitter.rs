//! Tweet publishing with OAuth 1.0a user-context signing. Each agent carries
//! its own access token pair; the consumer key pair is service-wide.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{json, Value};
use sha1::Sha1;
use std::time::Duration;

use crate::ids;
use crate::models::TwitterBot;

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
const NONCE_LEN: usize = 32;

#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Publish `text` as the agent's account. Returns a public link to the post.
    async fn post(&self, bot: &TwitterBot, text: &str) -> Result<String, String>;
}

pub struct TwitterClient {
    client: Client,
    consumer_key: String,
    consumer_secret: String,
}

impl TwitterClient {
    pub fn new(consumer_key: &str, consumer_secret: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
        })
    }
}

fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// OAuth 1.0a Authorization header for a request with no query or form
/// parameters (the tweet body travels as JSON and is not signed).
pub(crate) fn oauth_header(
    consumer_key: &str,
    consumer_secret: &str,
    token: &str,
    token_secret: &str,
    method: &str,
    url: &str,
    timestamp: &str,
    nonce: &str,
) -> String {
    let mut params = vec![
        ("oauth_consumer_key", consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", token),
        ("oauth_version", "1.0"),
    ];
    params.sort();

    let parameter_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method,
        percent_encode(url),
        percent_encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(base_string.as_bytes());
    let signature = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    let mut header_params: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (*k, v.to_string()))
        .collect();
    header_params.push(("oauth_signature", signature));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

#[async_trait]
impl SocialPoster for TwitterClient {
    async fn post(&self, bot: &TwitterBot, text: &str) -> Result<String, String> {
        let timestamp = Utc::now().timestamp().to_string();
        let nonce = ids::short_id(NONCE_LEN);
        let authorization = oauth_header(
            &self.consumer_key,
            &self.consumer_secret,
            &bot.oauth_token,
            &bot.oauth_token_secret,
            "POST",
            TWEETS_URL,
            &timestamp,
            &nonce,
        );

        let response = self
            .client
            .post(TWEETS_URL)
            .header("Authorization", authorization)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| format!("Tweet request failed: {}", e))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid tweet response: {}", e))?;

        if !status.is_success() {
            let detail = payload["detail"].as_str().unwrap_or("unknown error");
            return Err(format!("Tweet endpoint returned {}: {}", status, detail));
        }

        let tweet_id = payload["data"]["id"]
            .as_str()
            .ok_or_else(|| "Tweet response missing id".to_string())?;

        Ok(format!(
            "https://twitter.com/{}/status/{}",
            bot.screen_name, tweet_id
        ))
    }
}
