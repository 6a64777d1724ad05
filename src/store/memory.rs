//! In-process content store
//!
//! Holds entries in memory and records every publish so tests and `--mock`
//! runs can inspect what would have been written.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::mt::{MtError, MtResult};
use crate::store::{ContentStore, Entry, Localization, TaxonomyEntry};

/// A write received by [`MemoryStore::publish_entry`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRecord {
    pub uid: String,
    pub document_id: String,
    pub locale: String,
    pub data: serde_json::Value,
    pub draft: bool,
}

#[derive(Debug, Default)]
struct State {
    /// (uid, locale) → entries
    entries: HashMap<(String, String), Vec<Entry>>,
    /// (uid, document_id) → taxonomy entry
    taxonomies: HashMap<(String, String), TaxonomyEntry>,
    publishes: Vec<PublishRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    locales: Vec<String>,
    failing_locales: HashSet<String>,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(locales: &[&str]) -> Self {
        Self {
            locales: locales.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_entry(self, uid: &str, locale: &str, entry: Entry) -> Self {
        self.lock()
            .entries
            .entry((uid.to_string(), locale.to_string()))
            .or_default()
            .push(entry);
        self
    }

    pub fn with_taxonomy(self, uid: &str, taxonomy: TaxonomyEntry) -> Self {
        self.lock()
            .taxonomies
            .insert((uid.to_string(), taxonomy.document_id.clone()), taxonomy);
        self
    }

    /// Reject every publish into `locale` with a 500
    pub fn failing_locale(mut self, locale: &str) -> Self {
        self.failing_locales.insert(locale.to_string());
        self
    }

    /// All successful publishes, in the order they happened
    pub fn publishes(&self) -> Vec<PublishRecord> {
        self.lock().publishes.clone()
    }

    pub fn publishes_for(&self, uid: &str) -> Vec<PublishRecord> {
        self.lock()
            .publishes
            .iter()
            .filter(|p| p.uid == uid)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not hide the records of the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_all_locales(&self) -> MtResult<Vec<String>> {
        Ok(self.locales.clone())
    }

    async fn get_entry(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
    ) -> MtResult<Option<Entry>> {
        Ok(self
            .lock()
            .entries
            .get(&(uid.to_string(), locale.to_string()))
            .and_then(|entries| entries.iter().find(|e| e.document_id == document_id))
            .cloned())
    }

    async fn get_entry_by_slug(
        &self,
        uid: &str,
        slug: &str,
        locale: &str,
    ) -> MtResult<Option<Entry>> {
        Ok(self
            .lock()
            .entries
            .get(&(uid.to_string(), locale.to_string()))
            .and_then(|entries| entries.iter().find(|e| e.slug == slug))
            .cloned())
    }

    async fn get_taxonomy(&self, uid: &str, document_id: &str) -> MtResult<Option<TaxonomyEntry>> {
        Ok(self
            .lock()
            .taxonomies
            .get(&(uid.to_string(), document_id.to_string()))
            .cloned())
    }

    async fn publish_entry(
        &self,
        uid: &str,
        document_id: &str,
        locale: &str,
        data: &serde_json::Value,
        draft: bool,
    ) -> MtResult<()> {
        if self.failing_locales.contains(locale) {
            return Err(MtError::Store {
                status: 500,
                message: format!("Simulated failure for locale {}", locale),
            });
        }

        let mut state = self.lock();
        if let Some(taxonomy) = state
            .taxonomies
            .get_mut(&(uid.to_string(), document_id.to_string()))
        {
            if !taxonomy.has_locale(locale) {
                taxonomy.localizations.push(Localization {
                    document_id: Some(document_id.to_string()),
                    locale: locale.to_string(),
                });
            }
        }
        state.publishes.push(PublishRecord {
            uid: uid.to_string(),
            document_id: document_id.to_string(),
            locale: locale.to_string(),
            data: data.clone(),
            draft,
        });
        Ok(())
    }

    fn store_name(&self) -> &str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(document_id: &str, slug: &str) -> Entry {
        Entry {
            document_id: document_id.to_string(),
            locale: Some("en".to_string()),
            title: "Title".to_string(),
            content: "<p>Body</p>".to_string(),
            slug: slug.to_string(),
            category: None,
            tags: vec![],
            cover_picture: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_slug() {
        let store = MemoryStore::new(&["en", "fr"]).with_entry("articles", "en", entry("a1", "first"));

        assert!(store.get_entry("articles", "a1", "en").await.unwrap().is_some());
        assert!(store.get_entry("articles", "a1", "fr").await.unwrap().is_none());
        assert_eq!(
            store
                .get_entry_by_slug("articles", "first", "en")
                .await
                .unwrap()
                .map(|e| e.document_id),
            Some("a1".to_string())
        );
        assert_eq!(store.get_all_locales().await.unwrap(), vec!["en", "fr"]);
    }

    #[tokio::test]
    async fn test_publish_is_recorded() {
        let store = MemoryStore::new(&["en"]);
        let data = serde_json::json!({"title": "Bonjour"});
        store
            .publish_entry("articles", "a1", "fr", &data, true)
            .await
            .unwrap();

        let publishes = store.publishes();
        assert_eq!(publishes.len(), 1);
        assert_eq!(publishes[0].locale, "fr");
        assert!(publishes[0].draft);
        assert_eq!(publishes[0].data, data);
    }

    #[tokio::test]
    async fn test_publish_adds_taxonomy_localization() {
        let taxonomy = TaxonomyEntry {
            document_id: "c1".to_string(),
            locale: Some("en".to_string()),
            slug: "news".to_string(),
            name: "News".to_string(),
            description: String::new(),
            localizations: vec![],
        };
        let store = MemoryStore::new(&["en", "de"]).with_taxonomy("categories", taxonomy);
        store
            .publish_entry("categories", "c1", "de", &serde_json::json!({}), false)
            .await
            .unwrap();

        let updated = store.get_taxonomy("categories", "c1").await.unwrap().unwrap();
        assert!(updated.has_locale("de"));
    }

    #[tokio::test]
    async fn test_failing_locale() {
        let store = MemoryStore::new(&["en"]).failing_locale("ja");
        let result = store
            .publish_entry("articles", "a1", "ja", &serde_json::json!({}), true)
            .await;
        assert!(matches!(result, Err(MtError::Store { status: 500, .. })));
        assert!(store.publishes().is_empty());
    }
}
