//! End-to-end HTML translation
//!
//! Composes the stages of [`crate::html`] around a [`ChunkedTranslator`]:
//! decompose, translate the attribute-free markup, recompose, sanitize.
//! On top of that sit the two field-packing helpers used by the content
//! store: an article title travels inside an `<h1>` in front of the body, and
//! a taxonomy name travels in front of its description separated by `<br>`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::html::{decompose, recompose_with_report, sanitize};
use crate::mt::{ChunkedTranslator, MtError, MtResult};

const TITLE_OPEN: &str = "<h1>";
const TITLE_CLOSE: &str = "</h1>";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern"));
static PARAGRAPH_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?p>").expect("paragraph wrapper pattern"));

/// Title and body of a translated article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedArticle {
    pub title: String,
    pub content: String,
}

/// Name and description of a translated taxonomy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedPair {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct HtmlPipeline {
    translator: ChunkedTranslator,
}

impl HtmlPipeline {
    pub fn new(translator: ChunkedTranslator) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &ChunkedTranslator {
        &self.translator
    }

    /// Translate a markup fragment and normalize it for the content store
    ///
    /// Attributes never reach the provider. Tags the provider moved, added or
    /// dropped keep the markup the provider returned; this is logged, not an
    /// error.
    pub async fn translate_html(&self, html: &str, target_locale: &str) -> MtResult<String> {
        let decomposition = decompose(html);
        debug!(
            tags = decomposition.records.len(),
            attributed = decomposition.attributed_tag_count(),
            "Stripped attributes"
        );

        let translated = self
            .translator
            .translate(&decomposition.stripped, target_locale)
            .await?;

        let (restored, report) = recompose_with_report(&translated, &decomposition.records);
        if report.is_exact() {
            debug!(restored = report.restored, "Reattached all attributes");
        } else {
            warn!(
                target_locale,
                restored = report.restored,
                drifted = report.drifted,
                unconsumed = report.unconsumed,
                "Tag structure drifted during translation"
            );
        }

        Ok(sanitize(&restored))
    }

    /// Translate an article's title and body in a single provider pass
    pub async fn translate_article(
        &self,
        title: &str,
        content: &str,
        target_locale: &str,
    ) -> MtResult<TranslatedArticle> {
        let html = format!("{TITLE_OPEN}{title}{TITLE_CLOSE}{content}");
        let translated = self.translate_html(&html, target_locale).await?;
        split_article(&translated)
    }

    /// Translate a taxonomy name and description in a single provider pass
    ///
    /// Without a description the name is sent alone: providers tend to drop a
    /// trailing `<br>`, which would leave nothing to split on.
    pub async fn translate_pair(
        &self,
        name: &str,
        description: &str,
        target_locale: &str,
    ) -> MtResult<TranslatedPair> {
        if description.trim().is_empty() {
            let translated = self.translate_html(name, target_locale).await?;
            return Ok(TranslatedPair {
                name: unwrap_paragraphs(&translated),
                description: String::new(),
            });
        }

        let html = format!("{name}<br>{description}");
        let translated = self.translate_html(&html, target_locale).await?;
        split_pair(&translated)
    }
}

/// Split `<h1>title</h1>content` at the first `</h1>`
pub fn split_article(html: &str) -> MtResult<TranslatedArticle> {
    let close = html.find(TITLE_CLOSE).ok_or_else(|| {
        MtError::StructuralMismatch(format!("translated article has no {TITLE_CLOSE}"))
    })?;

    let title = html[..close]
        .trim_start()
        .strip_prefix(TITLE_OPEN)
        .ok_or_else(|| {
            MtError::StructuralMismatch(format!(
                "translated article does not start with {TITLE_OPEN}"
            ))
        })?;

    Ok(TranslatedArticle {
        title: title.to_string(),
        content: html[close + TITLE_CLOSE.len()..].to_string(),
    })
}

/// Split `name<br>description` at the first line break
pub fn split_pair(html: &str) -> MtResult<TranslatedPair> {
    let separator = LINE_BREAK.find(html).ok_or_else(|| {
        MtError::StructuralMismatch("translated name and description lost their <br>".to_string())
    })?;

    Ok(TranslatedPair {
        name: unwrap_paragraphs(&html[..separator.start()]),
        description: unwrap_paragraphs(&html[separator.end()..]),
    })
}

fn unwrap_paragraphs(part: &str) -> String {
    PARAGRAPH_WRAPPER.replace_all(part, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::{MockMode, MockTranslator};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn pipeline(mode: MockMode) -> HtmlPipeline {
        HtmlPipeline::new(ChunkedTranslator::new(Arc::new(MockTranslator::new(mode))))
    }

    #[tokio::test]
    async fn test_attributes_survive_translation() {
        let result = pipeline(MockMode::Suffix)
            .translate_html(r#"<p>See <a href="/docs" title="Docs">docs</a></p>"#, "fr")
            .await
            .unwrap();
        assert_eq!(
            result,
            r#"<p>See _fr<a href="/docs" title="Docs">docs_fr</a></p>"#
        );
    }

    #[tokio::test]
    async fn test_result_is_sanitized() {
        let result = pipeline(MockMode::NoOp)
            .translate_html(
                r#"<div class="x"><p id="a">Hi</p><figure><img src="i.png" /></figure></div><div> </div>"#,
                "de",
            )
            .await
            .unwrap();
        assert_eq!(result, "<div><p>Hi</p></div>");
    }

    #[tokio::test]
    async fn test_drift_keeps_provider_markup() {
        let result = pipeline(MockMode::InsertTag("span".to_string()))
            .translate_html(r#"<p>one <a href="/x">two</a></p>"#, "fr")
            .await
            .unwrap();
        assert_eq!(result, r#"<p><span>one </span><a href="/x">two</a></p>"#);
    }

    #[tokio::test]
    async fn test_attributes_survive_chunking() {
        let translator = ChunkedTranslator::new(Arc::new(MockTranslator::new(MockMode::Suffix)))
            .with_max_chunk_len(20);
        let result = HtmlPipeline::new(translator)
            .translate_html(
                r#"<p><a href="/1">a</a></p><p><a href="/2">b</a></p><p><a href="/3">c</a></p>"#,
                "it",
            )
            .await
            .unwrap();
        assert_eq!(
            result,
            r#"<p><a href="/1">a_it</a></p><p><a href="/2">b_it</a></p><p><a href="/3">c_it</a></p>"#
        );
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let result = pipeline(MockMode::Error("down".to_string()))
            .translate_html("<p>x</p>", "fr")
            .await;
        assert!(matches!(result, Err(MtError::Provider { .. })));
    }

    // ========== Article Tests ==========

    #[tokio::test]
    async fn test_translate_article() {
        let article = pipeline(MockMode::Suffix)
            .translate_article("Hello", r#"<p><img src="a.png" />Body</p>"#, "fr")
            .await
            .unwrap();
        assert_eq!(article.title, "Hello_fr");
        assert_eq!(article.content, r#"<p><img src="a.png" />Body_fr</p>"#);
    }

    #[tokio::test]
    async fn test_translate_article_lost_title_marker() {
        let result = pipeline(MockMode::DropTag("h1".to_string()))
            .translate_article("Hello", "<p>Body</p>", "fr")
            .await;
        assert!(matches!(result, Err(MtError::StructuralMismatch(_))));
    }

    #[test]
    fn test_split_article_splits_at_first_close() {
        let article = split_article("  <h1>T</h1><p>a</p><h1>x</h1>").unwrap();
        assert_eq!(article.title, "T");
        assert_eq!(article.content, "<p>a</p><h1>x</h1>");
    }

    #[test]
    fn test_split_article_requires_opening_marker() {
        assert!(matches!(
            split_article("<p>T</h1>body"),
            Err(MtError::StructuralMismatch(_))
        ));
    }

    // ========== Pair Tests ==========

    #[tokio::test]
    async fn test_translate_pair() {
        let pair = pipeline(MockMode::Suffix)
            .translate_pair("News", "Latest updates", "de")
            .await
            .unwrap();
        assert_eq!(pair.name, "News_de");
        assert_eq!(pair.description, "Latest updates_de");
    }

    #[tokio::test]
    async fn test_translate_pair_strips_paragraph_wrappers() {
        let mut map = HashMap::new();
        map.insert(
            ("News<br>Latest".to_string(), "de".to_string()),
            "<p>Nachrichten<br />Neuigkeiten</p>".to_string(),
        );
        let pair = pipeline(MockMode::Mappings(map))
            .translate_pair("News", "Latest", "de")
            .await
            .unwrap();
        assert_eq!(pair.name, "Nachrichten");
        assert_eq!(pair.description, "Neuigkeiten");
    }

    #[tokio::test]
    async fn test_translate_pair_empty_description() {
        let pair = pipeline(MockMode::Suffix)
            .translate_pair("News", "", "ja")
            .await
            .unwrap();
        assert_eq!(pair.name, "News_ja");
        assert_eq!(pair.description, "");
    }

    #[tokio::test]
    async fn test_empty_description_survives_dropped_line_break() {
        let pair = pipeline(MockMode::DropTag("br".to_string()))
            .translate_pair("News", " ", "ja")
            .await
            .unwrap();
        assert_eq!(pair.name, "News");
        assert_eq!(pair.description, "");
    }

    #[test]
    fn test_split_pair_missing_separator() {
        assert!(matches!(
            split_pair("Nachrichten Neuigkeiten"),
            Err(MtError::StructuralMismatch(_))
        ));
    }
}
