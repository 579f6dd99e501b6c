//! File storage on Pinata plus a signed-URL cache. Agent images are pinned
//! once at provisioning time and served through short-lived gateway URLs, so
//! the cache keeps page renders from re-signing on every request.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use reqwest::{header, multipart, Client};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";
const SIGN_URL: &str = "https://api.pinata.cloud/v3/files/sign";

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Pin a file and return its content id.
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String, String>;

    /// Signed gateway URL for a pinned file, valid for `ttl_secs`.
    async fn signed_url(&self, cid: &str, ttl_secs: u64) -> Result<String, String>;
}

pub struct PinataClient {
    client: Client,
    gateway: String,
}

impl PinataClient {
    pub fn new(jwt: &str, gateway: &str) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", jwt))
            .map_err(|e| format!("Invalid storage token format: {}", e))?;
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            gateway: gateway.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FileStorage for PinataClient {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String, String> {
        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| format!("Invalid upload part: {}", e))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("network", "private");

        let response = self
            .client
            .post(UPLOAD_URL)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Upload request failed: {}", e))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid upload response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Upload endpoint returned {}", status));
        }

        payload["data"]["cid"]
            .as_str()
            .map(|cid| cid.to_string())
            .ok_or_else(|| "Upload response missing cid".to_string())
    }

    async fn signed_url(&self, cid: &str, ttl_secs: u64) -> Result<String, String> {
        let body = json!({
            "url": format!("https://{}/files/{}", self.gateway, cid),
            "date": Utc::now().timestamp(),
            "expires": ttl_secs,
            "method": "GET",
        });

        let response = self
            .client
            .post(SIGN_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Sign request failed: {}", e))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid sign response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Sign endpoint returned {}", status));
        }

        payload["data"]
            .as_str()
            .map(|url| url.to_string())
            .ok_or_else(|| "Sign response missing URL".to_string())
    }
}

struct CachedUrl {
    url: String,
    expires_at_ms: i64,
}

/// Expiry-on-read cache over any storage backend. Entries are only dropped
/// when a stale cid is requested again; there is no background eviction.
pub struct UrlCache {
    inner: Arc<dyn FileStorage>,
    entries: DashMap<String, CachedUrl>,
}

impl UrlCache {
    pub fn new(inner: Arc<dyn FileStorage>) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl FileStorage for UrlCache {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String, String> {
        self.inner.upload(bytes, name).await
    }

    async fn signed_url(&self, cid: &str, ttl_secs: u64) -> Result<String, String> {
        let now_ms = Utc::now().timestamp_millis();
        if let Some(cached) = self.entries.get(cid) {
            if cached.expires_at_ms > now_ms {
                return Ok(cached.url.clone());
            }
        }
        self.entries.remove(cid);

        let url = self.inner.signed_url(cid, ttl_secs).await?;
        self.entries.insert(
            cid.to_string(),
            CachedUrl {
                url: url.clone(),
                expires_at_ms: now_ms + (ttl_secs as i64) * 1000,
            },
        );
        Ok(url)
    }
}
