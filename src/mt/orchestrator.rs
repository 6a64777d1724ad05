//! Chunked translation of long markup
//!
//! Splits markup at paragraph boundaries, sends every chunk to the provider
//! with a bounded number of requests in flight, and joins the results in the
//! original chunk order regardless of which request finished first.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::html::chunker::chunk_html;
use crate::mt::error::MtResult;
use crate::mt::translator::{HtmlOptions, MachineTranslator};

/// Translates arbitrarily long HTML through a length-limited provider
#[derive(Clone)]
pub struct ChunkedTranslator {
    translator: Arc<dyn MachineTranslator>,
    options: HtmlOptions,
    max_chunk_len: usize,
    max_concurrent_chunks: usize,
}

impl ChunkedTranslator {
    /// Characters per request
    pub const DEFAULT_MAX_CHUNK_LEN: usize = 30_000;
    /// Requests in flight per document
    pub const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 4;

    pub fn new(translator: Arc<dyn MachineTranslator>) -> Self {
        Self {
            translator,
            options: HtmlOptions::default(),
            max_chunk_len: Self::DEFAULT_MAX_CHUNK_LEN,
            max_concurrent_chunks: Self::DEFAULT_MAX_CONCURRENT_CHUNKS,
        }
    }

    pub fn with_options(mut self, options: HtmlOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len.max(1);
        self
    }

    /// `1` sends chunks strictly one after another
    pub fn with_max_concurrent_chunks(mut self, max_concurrent_chunks: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent_chunks.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }

    /// Translate `html` into `target_locale`
    ///
    /// The first failing chunk aborts the whole document; requests still in
    /// flight are dropped and no partial result is returned.
    pub async fn translate(&self, html: &str, target_locale: &str) -> MtResult<String> {
        let chunks = chunk_html(html, self.max_chunk_len);
        let total = chunks.len();
        if total == 0 {
            return Ok(String::new());
        }

        debug!(
            provider = self.provider_name(),
            target_locale,
            chunks = total,
            "Translating document"
        );

        let translated: Vec<String> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                debug!(
                    chunk = index + 1,
                    total,
                    chars = chunk.chars().count(),
                    "Translating chunk"
                );
                self.translator
                    .translate(&chunk, target_locale, &self.options)
                    .await
                    .inspect_err(|e| {
                        warn!(chunk = index + 1, total, target_locale, "Chunk failed: {}", e)
                    })
            })
            .buffered(self.max_concurrent_chunks)
            .try_collect()
            .await?;

        Ok(translated.concat())
    }
}

impl std::fmt::Debug for ChunkedTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedTranslator")
            .field("provider", &self.provider_name())
            .field("options", &self.options)
            .field("max_chunk_len", &self.max_chunk_len)
            .field("max_concurrent_chunks", &self.max_concurrent_chunks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::MtError;
    use crate::mt::mock::{MockMode, MockTranslator};

    fn paragraphs(count: usize) -> String {
        (0..count).map(|i| format!("<p>p{}</p>", i)).collect()
    }

    #[tokio::test]
    async fn test_single_chunk() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone()));

        let result = translator.translate("<p>a</p><p>b</p>", "fr").await.unwrap();
        assert_eq!(result, "<p>a_fr</p><p>b_fr</p>");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_one_call_per_chunk() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone())).with_max_chunk_len(8);

        let result = translator.translate(&paragraphs(5), "de").await.unwrap();
        let expected: String = (0..5).map(|i| format!("<p>p{}_de</p>", i)).collect();
        assert_eq!(result, expected);
        assert_eq!(mock.call_count(), 5);
    }

    #[tokio::test]
    async fn test_order_preserved_when_completion_order_differs() {
        // Earlier calls sleep longer, so completion order is reversed
        let mock = MockTranslator::with_staggered_delay(MockMode::Suffix, 5);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone()))
            .with_max_chunk_len(8)
            .with_max_concurrent_chunks(8);

        let result = translator.translate(&paragraphs(6), "ja").await.unwrap();
        let expected: String = (0..6).map(|i| format!("<p>p{}_ja</p>", i)).collect();
        assert_eq!(result, expected);
        assert!(mock.max_concurrent_calls() > 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mock = MockTranslator::with_delay(MockMode::NoOp, 10);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone()))
            .with_max_chunk_len(8)
            .with_max_concurrent_chunks(2);

        translator.translate(&paragraphs(7), "fr").await.unwrap();
        assert_eq!(mock.call_count(), 7);
        assert!(mock.max_concurrent_calls() <= 2);
    }

    #[tokio::test]
    async fn test_sequential_when_concurrency_is_one() {
        let mock = MockTranslator::with_delay(MockMode::NoOp, 5);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone()))
            .with_max_chunk_len(8)
            .with_max_concurrent_chunks(0);

        translator.translate(&paragraphs(3), "fr").await.unwrap();
        assert_eq!(mock.max_concurrent_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_chunk_aborts_document() {
        let mock = MockTranslator::new(MockMode::FailOn("p2".to_string()));
        let translator = ChunkedTranslator::new(Arc::new(mock)).with_max_chunk_len(8);

        let result = translator.translate(&paragraphs(4), "fr").await;
        match result {
            Err(MtError::Provider { message, .. }) => assert!(message.contains("p2")),
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_document_makes_no_calls() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = ChunkedTranslator::new(Arc::new(mock.clone()));

        assert_eq!(translator.translate("", "fr").await.unwrap(), "");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_builder_clamps_zero_values() {
        let translator = ChunkedTranslator::new(Arc::new(MockTranslator::new(MockMode::NoOp)))
            .with_max_chunk_len(0)
            .with_max_concurrent_chunks(0);
        assert_eq!(translator.max_chunk_len(), 1);
        assert!(format!("{:?}", translator).contains("max_concurrent_chunks: 1"));
    }
}
