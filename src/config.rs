//! Runtime configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and environment variables (a `.env` file in the working
//! directory is loaded first).
//!
//! ```toml
//! strapi_base_url = "https://cms.example.com"
//! source_locale = "en"
//! max_chunk_len = 20000
//! max_concurrent_chunks = 2
//!
//! [links]
//! unwrap_external = true
//! trusted_hosts = ["example.com"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::html::LinkRules;
use crate::mt::deepl::default_endpoint;
use crate::mt::{
    ChunkedTranslator, DeepLProvider, MachineTranslator, MtError, MtResult, validate_locale,
};
use crate::store::{StrapiClient, validate_content_type};
use crate::store::strapi::DEFAULT_BASE_URL;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deepl_auth_key: Option<String>,
    /// Overrides the endpoint picked from the key's plan
    pub deepl_api_url: Option<String>,
    pub strapi_base_url: String,
    pub strapi_token: Option<String>,
    pub source_locale: String,
    /// Content type route name used when none is given
    pub content_type: String,
    /// Characters per provider request
    pub max_chunk_len: usize,
    /// Provider requests in flight per document
    pub max_concurrent_chunks: usize,
    /// Save translations as drafts instead of publishing them
    pub draft: bool,
    /// Link rewriting applied to source articles before translation
    pub links: LinkRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deepl_auth_key: None,
            deepl_api_url: None,
            strapi_base_url: DEFAULT_BASE_URL.to_string(),
            strapi_token: None,
            source_locale: "en".to_string(),
            content_type: "articles".to_string(),
            max_chunk_len: ChunkedTranslator::DEFAULT_MAX_CHUNK_LEN,
            max_concurrent_chunks: ChunkedTranslator::DEFAULT_MAX_CONCURRENT_CHUNKS,
            draft: true,
            links: LinkRules::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| "***");
        f.debug_struct("Config")
            .field("deepl_auth_key", &mask(&self.deepl_auth_key))
            .field("deepl_api_url", &self.deepl_api_url)
            .field("strapi_base_url", &self.strapi_base_url)
            .field("strapi_token", &mask(&self.strapi_token))
            .field("source_locale", &self.source_locale)
            .field("content_type", &self.content_type)
            .field("max_chunk_len", &self.max_chunk_len)
            .field("max_concurrent_chunks", &self.max_concurrent_chunks)
            .field("draft", &self.draft)
            .field("links", &self.links)
            .finish()
    }
}

impl Config {
    /// Defaults overridden by the environment
    pub fn from_env() -> MtResult<Self> {
        Self::load(None)
    }

    /// Optional TOML file overridden by the environment, then validated
    pub fn load(path: Option<&Path>) -> MtResult<Self> {
        load_dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        debug!(config = ?config, "Loaded configuration");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> MtResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MtError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> MtResult<Self> {
        toml::from_str(content).map_err(|e| MtError::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Apply environment overrides read through `var`
    ///
    /// Unset and empty variables leave the current value alone.
    pub fn apply_env<F>(&mut self, var: F) -> MtResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("DEEPL_AUTH_KEY") {
            self.deepl_auth_key = Some(key);
        }
        if let Some(url) = get("DEEPL_API_URL") {
            self.deepl_api_url = Some(url);
        }
        if let Some(url) = get("STRAPI_BASE_URL") {
            self.strapi_base_url = url;
        }
        if let Some(token) = get("STRAPI_API_TOKEN").or_else(|| get("STRAPI_JWT")) {
            self.strapi_token = Some(token);
        }
        if let Some(locale) = get("HTML_MT_SOURCE_LOCALE") {
            self.source_locale = locale;
        }
        if let Some(value) = get("HTML_MT_MAX_CHUNK_LEN") {
            self.max_chunk_len = parse_count("HTML_MT_MAX_CHUNK_LEN", &value)?;
        }
        if let Some(value) = get("HTML_MT_CONCURRENCY") {
            self.max_concurrent_chunks = parse_count("HTML_MT_CONCURRENCY", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> MtResult<()> {
        if self.max_chunk_len == 0 {
            return Err(MtError::Config("max_chunk_len must be greater than 0".to_string()));
        }
        if self.max_concurrent_chunks == 0 {
            return Err(MtError::Config(
                "max_concurrent_chunks must be greater than 0".to_string(),
            ));
        }
        validate_content_type(&self.content_type)
            .map_err(|e| MtError::Config(format!("content_type: {}", e)))?;
        validate_locale(&self.source_locale)
            .map_err(|e| MtError::Config(format!("source_locale: {}", e)))?;
        Ok(())
    }

    pub fn deepl_endpoint(&self) -> Option<String> {
        self.deepl_api_url.clone().or_else(|| {
            self.deepl_auth_key
                .as_deref()
                .map(|key| default_endpoint(key).to_string())
        })
    }

    pub fn deepl_provider(&self) -> MtResult<DeepLProvider> {
        let key = self
            .deepl_auth_key
            .clone()
            .ok_or_else(|| MtError::Config("DEEPL_AUTH_KEY environment variable not set".to_string()))?;
        match &self.deepl_api_url {
            Some(url) => DeepLProvider::with_base_url(key, url.clone()),
            None => DeepLProvider::new(key),
        }
    }

    /// Wrap a provider with this configuration's chunking limits
    pub fn chunked(&self, provider: Arc<dyn MachineTranslator>) -> ChunkedTranslator {
        ChunkedTranslator::new(provider)
            .with_max_chunk_len(self.max_chunk_len)
            .with_max_concurrent_chunks(self.max_concurrent_chunks)
    }

    pub fn strapi_client(&self) -> MtResult<StrapiClient> {
        let token = self.strapi_token.clone().ok_or_else(|| {
            MtError::Config("STRAPI_API_TOKEN environment variable not set".to_string())
        })?;
        StrapiClient::new(&self.strapi_base_url, token)
    }
}

fn parse_count(name: &str, value: &str) -> MtResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| MtError::Config(format!("{} must be a positive integer, got '{}'", name, value)))
}

fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}
