//! Gemini `generateContent` client.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::{CollaboratorError, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// `model` is a full identifier such as `models/gemini-flash-latest`.
    pub fn new(api_key: String, model: String) -> Result<Self, CollaboratorError> {
        if api_key.is_empty() {
            return Err(CollaboratorError::MissingKey);
        }
        Ok(Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollaboratorError::Transport {
                attempts: 0,
                source: e,
            })?;

        let url = format!("{}/v1beta/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            match client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        // HTTP error statuses are not retried
                        return Err(CollaboratorError::Api { status, body });
                    }
                    let json: serde_json::Value =
                        response
                            .json()
                            .await
                            .map_err(|e| CollaboratorError::Transport {
                                attempts: attempt,
                                source: e,
                            })?;
                    return extract_text(&json).ok_or(CollaboratorError::Empty);
                }
                Err(e) if attempt < ATTEMPTS => {
                    warn!(attempt, error = %e, "generateContent attempt failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(CollaboratorError::Transport {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

fn extract_text(json: &serde_json::Value) -> Option<String> {
    json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
}
