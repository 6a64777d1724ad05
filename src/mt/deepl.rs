//! DeepL API provider for machine translation
//!
//! This module integrates with the DeepL v2 `translate` endpoint in HTML tag
//! handling mode.
//!
//! # Authentication
//!
//! The provider loads the API key from the `DEEPL_AUTH_KEY` environment
//! variable. Keys of the free plan end in `:fx` and are routed to the free
//! API host automatically.
//!
//! # Example
//!
//! ```ignore
//! use html_mt::mt::{DeepLProvider, HtmlOptions, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let result = provider
//!         .translate("<h1>Hello</h1>", "ru", &HtmlOptions::default())
//!         .await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{HtmlOptions, MachineTranslator, deepl_target_lang, validate_locale};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Endpoint for paid-plan keys
pub const DEEPL_PRO_URL: &str = "https://api.deepl.com/v2/translate";
/// Endpoint for free-plan keys (suffix `:fx`)
pub const DEEPL_FREE_URL: &str = "https://api-free.deepl.com/v2/translate";

/// Pick the endpoint that matches the key's plan
pub fn default_endpoint(api_key: &str) -> &'static str {
    if api_key.trim_end().ends_with(":fx") {
        DEEPL_FREE_URL
    } else {
        DEEPL_PRO_URL
    }
}

/// DeepL API v2 provider
#[derive(Clone)]
pub struct DeepLProvider {
    api_key: String,
    client: reqwest::Client,
    /// Full URL of the translate endpoint
    base_url: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
    tag_handling: &'static str,
    ignore_tags: &'a [String],
    splitting_tags: &'a [String],
    non_splitting_tags: &'a [String],
    preserve_formatting: bool,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

impl DeepLProvider {
    /// DeepL rejects request bodies larger than 128 KiB
    pub const MAX_REQUEST_BYTES: usize = 128 * 1024;

    /// Endpoint is picked from the key; an empty key is a `Config` error
    pub fn new(api_key: String) -> MtResult<Self> {
        let base_url = default_endpoint(&api_key).to_string();
        Self::with_base_url(api_key, base_url)
    }

    /// Create a provider that talks to a specific endpoint
    pub fn with_base_url(api_key: String, base_url: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }
        url::Url::parse(&base_url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            client,
            base_url,
        })
    }

    /// Reads `DEEPL_AUTH_KEY`, and `DEEPL_API_URL` when it is set
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("DEEPL_AUTH_KEY").map_err(|_| {
            MtError::Config("DEEPL_AUTH_KEY environment variable not set".to_string())
        })?;

        match std::env::var("DEEPL_API_URL") {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(api_key, url),
            _ => Self::new(api_key),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body<'a>(
        text: &'a str,
        target_locale: &str,
        options: &'a HtmlOptions,
    ) -> TranslateRequest<'a> {
        TranslateRequest {
            text: [text],
            target_lang: deepl_target_lang(target_locale),
            tag_handling: "html",
            ignore_tags: &options.ignore_tags,
            splitting_tags: &options.splitting_tags,
            non_splitting_tags: &options.non_splitting_tags,
            preserve_formatting: options.preserve_formatting,
        }
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for DeepLProvider {
    async fn translate(
        &self,
        text: &str,
        target_locale: &str,
        options: &HtmlOptions,
    ) -> MtResult<String> {
        validate_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.len() > Self::MAX_REQUEST_BYTES {
            return Err(MtError::Provider {
                status: 413,
                message: format!(
                    "Text exceeds maximum request size of {} bytes",
                    Self::MAX_REQUEST_BYTES
                ),
            });
        }

        let body = Self::request_body(text, target_locale, options);
        debug!(
            target_lang = %body.target_lang,
            chars = text.chars().count(),
            "Sending chunk to DeepL"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match status.as_u16() {
                403 => format!("Authorization failed: {}", error_text),
                429 => format!("Too many requests: {}", error_text),
                456 => format!("Quota exceeded: {}", error_text),
                _ => error_text,
            };
            return Err(MtError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| MtError::Provider {
            status: status.as_u16(),
            message: format!("Failed to parse API response: {}", e),
        })?;

        let translation = parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| MtError::Provider {
                status: status.as_u16(),
                message: "Invalid API response: empty 'translations' array".to_string(),
            })?;

        if let Some(source) = &translation.detected_source_language {
            debug!(source = %source, "DeepL detected source language");
        }
        Ok(translation.text)
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Construction

    #[test]
    fn test_new_with_valid_key() {
        let provider = DeepLProvider::new("test-api-key".to_string());
        assert!(provider.is_ok());
        let provider = provider.unwrap();
        assert_eq!(provider.provider_name(), "DeepL");
        assert_eq!(provider.base_url(), DEEPL_PRO_URL);
    }

    #[test]
    fn test_free_key_uses_free_endpoint() {
        let provider = DeepLProvider::new("0000-1111:fx".to_string()).unwrap();
        assert_eq!(provider.base_url(), DEEPL_FREE_URL);
    }

    #[test]
    fn test_new_with_empty_key() {
        let result = DeepLProvider::new("".to_string());
        match result {
            Err(MtError::Config(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_new_with_whitespace_key() {
        assert!(DeepLProvider::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = DeepLProvider::with_base_url("k".to_string(), "not a url".to_string());
        assert!(matches!(result, Err(MtError::Config(_))));
    }

    // Request bodies

    #[test]
    fn test_request_body_shape() {
        let options = HtmlOptions::default();
        let body = DeepLProvider::request_body("<p>Hi</p>", "zh-Hant", &options);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["text"], serde_json::json!(["<p>Hi</p>"]));
        assert_eq!(json["target_lang"], "ZH-HANT");
        assert_eq!(json["tag_handling"], "html");
        assert_eq!(json["ignore_tags"], serde_json::json!(["code", "pre"]));
        assert_eq!(json["splitting_tags"], serde_json::json!(["p", "li", "div"]));
        assert_eq!(
            json["non_splitting_tags"],
            serde_json::json!(["span", "strong", "em"])
        );
        assert_eq!(json["preserve_formatting"], true);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"translations":[{"detected_source_language":"EN","text":"<p>Salut</p>"}]}"#;
        let parsed: TranslateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.translations[0].text, "<p>Salut</p>");
        assert_eq!(
            parsed.translations[0].detected_source_language.as_deref(),
            Some("EN")
        );
    }

    // Input checks

    #[tokio::test]
    async fn test_translate_empty_text() {
        let provider = DeepLProvider::new("test-key".to_string()).unwrap();
        let result = provider
            .translate("", "fr", &HtmlOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_translate_invalid_target_locale() {
        let provider = DeepLProvider::new("test-key".to_string()).unwrap();
        let result = provider
            .translate("hello", "invalid#code", &HtmlOptions::default())
            .await;
        assert!(matches!(result, Err(MtError::InvalidLocale(_))));
    }

    #[tokio::test]
    async fn test_translate_text_too_long() {
        let provider = DeepLProvider::new("test-key".to_string()).unwrap();
        let long_text = "x".repeat(DeepLProvider::MAX_REQUEST_BYTES + 1);
        let result = provider
            .translate(&long_text, "fr", &HtmlOptions::default())
            .await;
        match result {
            Err(MtError::Provider { status, message }) => {
                assert_eq!(status, 413);
                assert!(message.contains("exceeds maximum"));
            }
            _ => panic!("Expected Provider error"),
        }
    }

    // Debug output

    #[test]
    fn test_debug_output() {
        let provider = DeepLProvider::new("test-key".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("test-key"));
    }

    // Real API, needs DEEPL_AUTH_KEY

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_api_html_translation() {
        if std::env::var("DEEPL_AUTH_KEY").is_err() {
            eprintln!("Skipping: DEEPL_AUTH_KEY not set");
            return;
        }

        let provider = DeepLProvider::from_env().unwrap();
        let result = provider
            .translate("<p>Hello <strong>world</strong></p>", "fr", &HtmlOptions::default())
            .await
            .unwrap();
        println!("Translation: {}", result);

        assert!(result.starts_with("<p>"));
        assert!(result.contains("<strong>"));
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_real_api_invalid_key() {
        let provider = DeepLProvider::new("invalid-key-xyz".to_string()).unwrap();
        let result = provider
            .translate("hello", "fr", &HtmlOptions::default())
            .await;

        match result {
            Err(MtError::Provider { status, .. }) => assert_eq!(status, 403),
            other => panic!("Expected provider error from invalid key, got {:?}", other),
        }
    }
}
