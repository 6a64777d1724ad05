//! Entry localization driver
//!
//! Fetches an article in its source locale, makes sure its category and tags
//! exist in every target locale, then translates and writes the article into
//! each target locale. Locales are processed concurrently and fail
//! independently: one failing locale never affects the others.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::html::{LinkRules, prepare_source};
use crate::mt::{MtError, MtResult};
use crate::pipeline::{HtmlPipeline, TranslatedArticle};
use crate::store::{
    ArticlePayload, ContentStore, Entry, MediaConnect, Relation, TaxonomyPayload,
    validate_content_type,
};

/// Media id attached when the source article has no cover picture
pub const DEFAULT_COVER_PICTURE_ID: u64 = 1;
pub const CATEGORY_UID: &str = "categories";
pub const TAG_UID: &str = "tags";

/// How the source entry is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    DocumentId(String),
    Slug(String),
}

impl std::fmt::Display for EntryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRef::DocumentId(id) => write!(f, "id {}", id),
            EntryRef::Slug(slug) => write!(f, "slug {}", slug),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationRequest {
    /// Content type route name, e.g. `articles`
    pub uid: String,
    pub entry: EntryRef,
    /// Empty means every locale the store knows except the source
    pub target_locales: Vec<String>,
    /// Save translated articles as drafts instead of publishing them
    pub draft: bool,
}

impl LocalizationRequest {
    pub fn by_id(uid: &str, document_id: &str) -> Self {
        Self::new(uid, EntryRef::DocumentId(document_id.to_string()))
    }

    pub fn by_slug(uid: &str, slug: &str) -> Self {
        Self::new(uid, EntryRef::Slug(slug.to_string()))
    }

    fn new(uid: &str, entry: EntryRef) -> Self {
        Self {
            uid: uid.to_string(),
            entry,
            target_locales: Vec::new(),
            draft: true,
        }
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }
}

/// Result of localizing the article into one locale
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleOutcome {
    pub locale: String,
    /// Translated title on success
    pub result: MtResult<String>,
}

/// Result of creating one missing category or tag version
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyOutcome {
    pub uid: String,
    pub document_id: String,
    /// `None` when the taxonomy entry itself could not be read
    pub locale: Option<String>,
    pub result: MtResult<()>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalizationReport {
    pub document_id: String,
    pub source_locale: String,
    pub outcomes: Vec<LocaleOutcome>,
    pub taxonomy: Vec<TaxonomyOutcome>,
}

impl LocalizationReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &LocaleOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &LocaleOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Build the write body for a translated article
pub fn article_payload(entry: &Entry, article: &TranslatedArticle) -> ArticlePayload {
    ArticlePayload {
        slug: entry.slug.clone(),
        title: article.title.clone(),
        content: article.content.clone(),
        category: entry.category.as_ref().map(|c| c.document_id.clone()),
        tags: entry.tags.iter().map(|t| t.document_id.clone()).collect(),
        cover_picture: MediaConnect::single(
            entry
                .cover_picture
                .as_ref()
                .map_or(DEFAULT_COVER_PICTURE_ID, |m| m.id),
        ),
    }
}

fn to_json<T: Serialize>(payload: &T) -> MtResult<serde_json::Value> {
    serde_json::to_value(payload)
        .map_err(|e| MtError::Other(format!("Failed to encode payload: {}", e)))
}

pub struct EntryLocalizer {
    store: Arc<dyn ContentStore>,
    pipeline: HtmlPipeline,
    source_locale: String,
    links: LinkRules,
}

impl EntryLocalizer {
    pub const DEFAULT_SOURCE_LOCALE: &'static str = "en";

    pub fn new(store: Arc<dyn ContentStore>, pipeline: HtmlPipeline) -> Self {
        Self {
            store,
            pipeline,
            source_locale: Self::DEFAULT_SOURCE_LOCALE.to_string(),
            links: LinkRules::default(),
        }
    }

    /// Rewrite links in the source content before it is translated
    ///
    /// The source entry in the store is left untouched.
    pub fn with_link_rules(mut self, links: LinkRules) -> Self {
        self.links = links;
        self
    }

    pub fn with_source_locale(mut self, locale: &str) -> Self {
        self.source_locale = locale.to_string();
        self
    }

    pub fn source_locale(&self) -> &str {
        &self.source_locale
    }

    pub fn pipeline(&self) -> &HtmlPipeline {
        &self.pipeline
    }

    /// Translate one entry into every requested locale
    ///
    /// Only failures that concern all locales at once (the source entry or the
    /// locale list cannot be read) are returned as `Err`; everything else is
    /// reported per locale.
    pub async fn localize(&self, request: &LocalizationRequest) -> MtResult<LocalizationReport> {
        validate_content_type(&request.uid)?;
        let mut entry = self.fetch_source(request).await?;
        if !self.links.is_empty() {
            entry.content = prepare_source(&entry.content, &self.links);
        }
        let targets = self.target_locales(request).await?;
        info!(
            uid = %request.uid,
            document_id = %entry.document_id,
            store = self.store.store_name(),
            provider = self.pipeline.translator().provider_name(),
            locales = ?targets,
            "Localizing entry"
        );

        let taxonomy = self.complete_taxonomy(&entry, &targets).await;

        let source = &entry;
        let outcomes = join_all(targets.iter().map(|locale| async move {
            let result = self
                .localize_article(&request.uid, source, locale, request.draft)
                .await;
            if let Err(e) = &result {
                error!(locale = %locale, "Localization failed: {}", e);
            }
            LocaleOutcome {
                locale: locale.clone(),
                result,
            }
        }))
        .await;

        Ok(LocalizationReport {
            document_id: entry.document_id.clone(),
            source_locale: self.source_locale.clone(),
            outcomes,
            taxonomy,
        })
    }

    async fn fetch_source(&self, request: &LocalizationRequest) -> MtResult<Entry> {
        let found = match &request.entry {
            EntryRef::DocumentId(id) => {
                self.store
                    .get_entry(&request.uid, id, &self.source_locale)
                    .await?
            }
            EntryRef::Slug(slug) => {
                self.store
                    .get_entry_by_slug(&request.uid, slug, &self.source_locale)
                    .await?
            }
        };
        found.ok_or_else(|| {
            MtError::NotFound(format!(
                "{} entry with {} in locale {}",
                request.uid, request.entry, self.source_locale
            ))
        })
    }

    /// Requested locales, or all store locales, without the source and duplicates
    async fn target_locales(&self, request: &LocalizationRequest) -> MtResult<Vec<String>> {
        let candidates = if request.target_locales.is_empty() {
            self.store.get_all_locales().await?
        } else {
            request.target_locales.clone()
        };

        let mut targets: Vec<String> = Vec::with_capacity(candidates.len());
        for locale in candidates {
            if locale != self.source_locale && !targets.contains(&locale) {
                targets.push(locale);
            }
        }
        Ok(targets)
    }

    async fn localize_article(
        &self,
        uid: &str,
        entry: &Entry,
        locale: &str,
        draft: bool,
    ) -> MtResult<String> {
        let article = self
            .pipeline
            .translate_article(&entry.title, &entry.content, locale)
            .await?;
        let data = to_json(&article_payload(entry, &article))?;
        self.store
            .publish_entry(uid, &entry.document_id, locale, &data, draft)
            .await?;
        info!(locale, draft, title = %article.title, "Saved translation");
        Ok(article.title)
    }

    /// Create category and tag versions for target locales that lack them
    ///
    /// Categories are published right away, tags are saved as drafts.
    async fn complete_taxonomy(&self, entry: &Entry, targets: &[String]) -> Vec<TaxonomyOutcome> {
        let mut relations: Vec<(&str, &Relation, bool)> = Vec::new();
        if let Some(category) = &entry.category {
            relations.push((CATEGORY_UID, category, false));
        }
        relations.extend(entry.tags.iter().map(|tag| (TAG_UID, tag, true)));

        let mut outcomes = Vec::new();
        for (uid, relation, draft) in relations {
            outcomes.extend(self.complete_one(uid, relation, targets, draft).await);
        }
        outcomes
    }

    async fn complete_one(
        &self,
        uid: &str,
        relation: &Relation,
        targets: &[String],
        draft: bool,
    ) -> Vec<TaxonomyOutcome> {
        let outcome = |locale: Option<&str>, result: MtResult<()>| TaxonomyOutcome {
            uid: uid.to_string(),
            document_id: relation.document_id.clone(),
            locale: locale.map(str::to_string),
            result,
        };

        let taxonomy = match self.store.get_taxonomy(uid, &relation.document_id).await {
            Ok(Some(taxonomy)) => taxonomy,
            Ok(None) => {
                warn!(uid, document_id = %relation.document_id, "Linked taxonomy entry not found");
                let missing = MtError::NotFound(format!("{} {}", uid, relation.document_id));
                return vec![outcome(None, Err(missing))];
            }
            Err(e) => {
                warn!(uid, document_id = %relation.document_id, "Could not read taxonomy entry: {}", e);
                return vec![outcome(None, Err(e))];
            }
        };

        let mut outcomes = Vec::new();
        for locale in taxonomy.missing_locales(targets, &self.source_locale) {
            let result = async {
                let pair = self
                    .pipeline
                    .translate_pair(&taxonomy.name, &taxonomy.description, locale)
                    .await?;
                let data = to_json(&TaxonomyPayload {
                    slug: taxonomy.slug.clone(),
                    name: pair.name,
                    description: pair.description,
                })?;
                self.store
                    .publish_entry(uid, &taxonomy.document_id, locale, &data, draft)
                    .await
            }
            .await;

            match &result {
                Ok(()) => info!(uid, locale, name = %taxonomy.name, "Added taxonomy translation"),
                Err(e) => warn!(uid, locale, name = %taxonomy.name, "Taxonomy translation failed: {}", e),
            }
            outcomes.push(outcome(Some(locale), result));
        }
        outcomes
    }
}
