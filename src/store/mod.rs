/// Content store access
///
/// The localization driver reads source entries from, and writes translated
/// entries back to, a headless CMS. `ContentStore` is the seam; `StrapiClient`
/// talks to a Strapi v5 REST API and `MemoryStore` keeps everything in
/// process for tests and dry runs.
pub mod memory;
pub mod strapi;

pub use memory::{MemoryStore, PublishRecord};
pub use strapi::StrapiClient;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::mt::{MtError, MtResult};

/// Content type route names are lowercase kebab-case (`articles`, `blog-posts`)
///
/// They become a path segment of store URLs, so anything else is refused.
pub fn validate_content_type(uid: &str) -> MtResult<()> {
    if uid.is_empty() {
        return Err(MtError::InvalidContentType(
            "Content type is empty".to_string(),
        ));
    }
    if !uid
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(MtError::InvalidContentType(format!(
            "{:?} is not a lowercase route name",
            uid
        )));
    }
    Ok(())
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to another document (category, tag)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub document_id: String,
}

/// Uploaded media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: u64,
}

/// An article as stored in one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub document_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub category: Option<Relation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Relation>,
    #[serde(default)]
    pub cover_picture: Option<Media>,
}

/// One existing locale version of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Localization {
    #[serde(default)]
    pub document_id: Option<String>,
    pub locale: String,
}

/// A category or tag together with the locales it already exists in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub document_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub localizations: Vec<Localization>,
}

impl TaxonomyEntry {
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locale.as_deref() == Some(locale)
            || self.localizations.iter().any(|l| l.locale == locale)
    }

    /// Targets this entry has no version for, in the order given
    pub fn missing_locales<'a>(&self, targets: &'a [String], source_locale: &str) -> Vec<&'a str> {
        targets
            .iter()
            .map(String::as_str)
            .filter(|locale| *locale != source_locale && !self.has_locale(locale))
            .collect()
    }
}

/// Strapi's relation syntax for attaching media: `{"connect": [{"id": 1}]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaConnect {
    pub connect: Vec<Media>,
}

impl MediaConnect {
    pub fn single(id: u64) -> Self {
        Self {
            connect: vec![Media { id }],
        }
    }
}

/// Body written for a translated article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePayload {
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub cover_picture: MediaConnect,
}

/// Body written for a translated category or tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyPayload {
    pub slug: String,
    pub name: String,
    pub description: String,
}

/// Read and write access to localized documents
///
/// `uid` is the plural route name of the content type, e.g. `articles`.
/// Lookups return `Ok(None)` when the document does not exist.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every locale code configured in the store
    async fn get_all_locales(&self) -> MtResult<Vec<String>>;

    /// Draft or published version of a document in one locale
    async fn get_entry(&self, uid: &str, document_id: &str, locale: &str)
    -> MtResult<Option<Entry>>;

    async fn get_entry_by_slug(&self, uid: &str, slug: &str, locale: &str)
    -> MtResult<Option<Entry>>;

    /// Category or tag including its localizations
    async fn get_taxonomy(&self, uid: &str, document_id: &str) -> MtResult<Option<TaxonomyEntry>>;

    /// Create or replace the `locale` version of a document
    async fn publish_entry(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
        data: &serde_json::Value,
        draft: bool,
    ) -> MtResult<()>;

    /// Used for logging
    fn store_name(&self) -> &str;
}
