//! Strapi v5 REST client
//!
//! Authenticates with an API token sent as `Authorization: Bearer <token>`.
//! Reads always ask for `status=draft`, which in Strapi v5 returns the latest
//! version of a document whether or not it has been published.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::mt::{MtError, MtResult};
use crate::store::{ContentStore, Entry, TaxonomyEntry, validate_content_type};

pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

#[derive(Clone)]
pub struct StrapiClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LocaleInfo {
    code: String,
}

impl StrapiClient {
    pub fn new(base_url: &str, token: String) -> MtResult<Self> {
        if token.trim().is_empty() {
            return Err(MtError::Config("Strapi API token cannot be empty".to_string()));
        }

        // Keep any path prefix when joining relative API paths
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: token.trim().to_string(),
        })
    }

    /// Create a client from `STRAPI_BASE_URL` and `STRAPI_API_TOKEN`
    ///
    /// `STRAPI_JWT` is accepted in place of the token.
    pub fn from_env() -> MtResult<Self> {
        let base_url =
            std::env::var("STRAPI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("STRAPI_API_TOKEN")
            .or_else(|_| std::env::var("STRAPI_JWT"))
            .map_err(|_| {
                MtError::Config("STRAPI_API_TOKEN environment variable not set".to_string())
            })?;
        Self::new(&base_url, token)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `base/api/<segments...>?<query>`, each segment percent-encoded
    fn api_url(&self, segments: &[&str], query: &[(&str, &str)]) -> MtResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MtError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn document_url(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
        populate: Option<&str>,
    ) -> MtResult<Url> {
        validate_content_type(uid)?;
        let mut query = vec![("status", "draft"), ("locale", locale)];
        if let Some(populate) = populate {
            query.push(("populate", populate));
        }
        self.api_url(&[uid, document_id], &query)
    }

    fn slug_url(&self, uid: &str, slug: &str, locale: &str) -> MtResult<Url> {
        validate_content_type(uid)?;
        self.api_url(
            &[uid],
            &[
                ("status", "draft"),
                ("filters[slug][$eq]", slug),
                ("locale", locale),
                ("populate", "*"),
            ],
        )
    }

    fn publish_url(&self, uid: &str, document_id: &str, locale: &str, draft: bool) -> MtResult<Url> {
        validate_content_type(uid)?;
        let status = if draft { "draft" } else { "publish" };
        self.api_url(
            &[uid, document_id],
            &[("locale", locale), ("status", status)],
        )
    }

    /// GET `url`, mapping 404 to `None`
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> MtResult<Option<T>> {
        debug!(url = %url, "Strapi GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MtError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MtError::Store {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map(Some).map_err(|e| MtError::Store {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

impl std::fmt::Debug for StrapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrapiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl ContentStore for StrapiClient {
    async fn get_all_locales(&self) -> MtResult<Vec<String>> {
        let url = self.api_url(&["i18n", "locales"], &[])?;
        let locales: Vec<LocaleInfo> = self
            .fetch(url)
            .await?
            .ok_or_else(|| MtError::NotFound("i18n locales endpoint".to_string()))?;
        Ok(locales.into_iter().map(|l| l.code).collect())
    }

    async fn get_entry(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
    ) -> MtResult<Option<Entry>> {
        let url = self.document_url(uid, document_id, locale, Some("*"))?;
        let envelope: Option<DataEnvelope<Option<Entry>>> = self.fetch(url).await?;
        Ok(envelope.and_then(|e| e.data))
    }

    async fn get_entry_by_slug(
        &self,
        uid: &str,
        slug: &str,
        locale: &str,
    ) -> MtResult<Option<Entry>> {
        let url = self.slug_url(uid, slug, locale)?;
        let envelope: Option<DataEnvelope<Vec<Entry>>> = self.fetch(url).await?;
        Ok(envelope.and_then(|e| e.data.into_iter().next()))
    }

    async fn get_taxonomy(&self, uid: &str, document_id: &str) -> MtResult<Option<TaxonomyEntry>> {
        let url = self.document_url(uid, document_id, "*", Some("*"))?;
        let envelope: Option<DataEnvelope<Option<TaxonomyEntry>>> = self.fetch(url).await?;
        Ok(envelope.and_then(|e| e.data))
    }

    async fn publish_entry(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
        data: &serde_json::Value,
        draft: bool,
    ) -> MtResult<()> {
        let url = self.publish_url(uid, document_id, locale, draft)?;
        debug!(url = %url, "Strapi PUT");

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "data": data }))
            .send()
            .await
            .map_err(|e| MtError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MtError::Store {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    fn store_name(&self) -> &str {
        "Strapi"
    }
}
