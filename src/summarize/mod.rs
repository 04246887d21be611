//! Narrative-summary collaborator: a narrow text-generation seam.
//!
//! The aggregation core knows nothing about any provider SDK — it hands a
//! compact prompt to a [`TextGenerator`] and gets text or a
//! [`CollaboratorError`] back. Failures become user-visible message strings,
//! never crashes.

mod gemini;

pub use gemini::GeminiClient;

use crate::analyzers::types::{ProducerDigest, ViewerDigest};
use async_trait::async_trait;
use thiserror::Error;

/// Known model identifiers offered to the user.
pub const GEMINI_MODELS: [&str; 4] = [
    "models/gemini-flash-latest",
    "models/gemini-2.5-flash",
    "models/gemini-pro-latest",
    "models/gemini-2.5-pro",
];

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("no API key supplied")]
    MissingKey,
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("API returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("response contained no generated text")]
    Empty,
}

/// Abstraction over a text-generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Runs the collaborator and folds any failure into a descriptive string,
/// so a broken summary never aborts the surrounding report.
pub async fn summarize<G: TextGenerator + ?Sized>(generator: &G, prompt: &str) -> String {
    match generator.generate(prompt).await {
        Ok(text) => text,
        Err(e) => format!("Summary unavailable: {e}"),
    }
}

pub fn viewer_prompt(country: &str, category: &str, digest: &ViewerDigest) -> String {
    format!(
        "Analyze the {country} ({category}) market:\n\
         Largest content source: {}\n\
         Most rank-1 weeks: {}\n\
         Give 3 insights.",
        digest.top_source.as_deref().unwrap_or("none"),
        digest.champion_source.as_deref().unwrap_or("none"),
    )
}

pub fn producer_prompt(country: &str, category: &str, digest: &ProducerDigest) -> String {
    format!(
        "Analyze the cultural exports of {country} ({category}):\n\
         Widest-traveling title: {}\n\
         Largest export market: {}\n\
         Give 3 export-strategy insights.",
        digest.top_title.as_deref().unwrap_or("none"),
        digest.top_market.as_deref().unwrap_or("none"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::Empty)
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test]
    async fn test_summarize_returns_text() {
        let text = summarize(&Echo, "hello").await;
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn test_summarize_folds_errors_into_message() {
        let text = summarize(&Failing, "hello").await;
        assert!(text.starts_with("Summary unavailable:"));
    }

    #[test]
    fn test_viewer_prompt_includes_digest() {
        let digest = ViewerDigest {
            top_source: Some("South Korea".to_string()),
            champion_source: None,
        };
        let prompt = viewer_prompt("Japan", "Films", &digest);
        assert!(prompt.contains("Japan (Films)"));
        assert!(prompt.contains("Largest content source: South Korea"));
        assert!(prompt.contains("Most rank-1 weeks: none"));
    }

    #[test]
    fn test_producer_prompt_includes_digest() {
        let digest = ProducerDigest {
            top_title: Some("Alpha".to_string()),
            top_market: Some("Japan".to_string()),
        };
        let prompt = producer_prompt("South Korea", "TV", &digest);
        assert!(prompt.contains("South Korea (TV)"));
        assert!(prompt.contains("Widest-traveling title: Alpha"));
        assert!(prompt.contains("Largest export market: Japan"));
    }
}
