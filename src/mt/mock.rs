//! Deterministic stand-in for a translation provider
//!
//! Each mode imitates one behavior of a real engine: faithful translation,
//! added or dropped markup, failures, and latency. Counters shared between
//! clones let tests assert how many requests ran and how many overlapped.
//!
//! ```ignore
//! let mock = MockTranslator::new(MockMode::Suffix);
//! let html = mock.translate("<p>hello</p>", "fr", &HtmlOptions::default()).await?;
//! assert_eq!(html, "<p>hello_fr</p>");
//! ```

use crate::html::tokenizer::{Token, tokenize};
use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{HtmlOptions, MachineTranslator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Engine behaviors the mock can imitate
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the locale to every text run: `<p>hi</p>` → `<p>hi_fr</p>`
    /// Tags pass through untouched, like a well-behaved engine
    Suffix,

    /// Fixed answers keyed by (input, target_locale), falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Wrap the first text run in a new element, like an engine adding markup
    InsertTag(String),

    /// Remove every tag with this name but keep its content
    DropTag(String),

    /// Simulate API errors
    Error(String),

    /// Fail only for input containing the marker, otherwise behave like `NoOp`
    FailOn(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Clones share their call counters, so a clone handed to the pipeline can be
/// inspected afterwards.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    /// When set, earlier calls sleep longer than later ones
    stagger_ms: u64,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

/// Number of distinct delays used by staggered latency
const STAGGER_SLOTS: usize = 8;

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            stagger_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every call sleeps `delay_ms` before answering
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Create a MockTranslator whose calls finish in reverse start order
    ///
    /// The n-th call sleeps `step_ms * (8 - n % 8)` milliseconds, so with
    /// enough concurrency the first request completes last.
    pub fn with_staggered_delay(mode: MockMode, step_ms: u64) -> Self {
        Self {
            stagger_ms: step_ms,
            ..Self::new(mode)
        }
    }

    /// Number of `translate` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self, call_index: usize) {
        let stagger = self.stagger_ms * (STAGGER_SLOTS - call_index % STAGGER_SLOTS) as u64;
        let total = self.delay_ms + if self.stagger_ms > 0 { stagger } else { 0 };
        if total > 0 {
            tokio::time::sleep(Duration::from_millis(total)).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(suffix_text_runs(text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| suffix_text_runs(text, target)))
            }
            MockMode::InsertTag(name) => Ok(wrap_first_text_run(text, name)),
            MockMode::DropTag(name) => Ok(tokenize(text)
                .into_iter()
                .filter(|token| !matches!(token, Token::Tag(tag) if tag.name == name.as_str()))
                .map(|token| token.literal())
                .collect()),
            MockMode::Error(msg) => Err(MtError::Provider {
                status: 500,
                message: msg.clone(),
            }),
            MockMode::FailOn(marker) if text.contains(marker.as_str()) => Err(MtError::Provider {
                status: 500,
                message: format!("Refused input containing {}", marker),
            }),
            MockMode::FailOn(_) | MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

fn suffix_text_runs(text: &str, target: &str) -> String {
    tokenize(text)
        .into_iter()
        .map(|token| match token {
            Token::Text(run) if !run.trim().is_empty() => format!("{}_{}", run, target),
            other => other.literal().to_string(),
        })
        .collect()
}

fn wrap_first_text_run(text: &str, name: &str) -> String {
    let mut wrapped = false;
    tokenize(text)
        .into_iter()
        .map(|token| match token {
            Token::Text(run) if !wrapped && !run.trim().is_empty() => {
                wrapped = true;
                format!("<{name}>{run}</{name}>")
            }
            other => other.literal().to_string(),
        })
        .collect()
}

/// Decrements the in-flight counter even when the future is dropped
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        target_locale: &str,
        _options: &HtmlOptions,
    ) -> MtResult<String> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.apply_delay(call_index).await;
        self.apply_translation(text, target_locale)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(mock: &MockTranslator, text: &str, target: &str) -> MtResult<String> {
        mock.translate(text, target, &HtmlOptions::default()).await
    }

    // Suffix Mode

    #[tokio::test]
    async fn test_suffix_marks_text_runs() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = run(&mock, "<p>hello <b>world</b></p>", "fr").await.unwrap();
        assert_eq!(result, "<p>hello _fr<b>world_fr</b></p>");
    }

    #[tokio::test]
    async fn test_suffix_skips_whitespace_runs() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = run(&mock, "<p>a</p>\n<p>b</p>", "de").await.unwrap();
        assert_eq!(result, "<p>a_de</p>\n<p>b_de</p>");
    }

    // Mapping Mode

    #[tokio::test]
    async fn test_mappings_fall_back_to_suffix() {
        let mut map = HashMap::new();
        map.insert(
            ("<p>hello</p>".to_string(), "fr".to_string()),
            "<p>bonjour</p>".to_string(),
        );

        let mock = MockTranslator::new(MockMode::Mappings(map));
        assert_eq!(run(&mock, "<p>hello</p>", "fr").await.unwrap(), "<p>bonjour</p>");
        assert_eq!(run(&mock, "<p>bye</p>", "fr").await.unwrap(), "<p>bye_fr</p>");
    }

    // Drift Mode

    #[tokio::test]
    async fn test_insert_tag_wraps_first_text() {
        let mock = MockTranslator::new(MockMode::InsertTag("span".to_string()));
        let result = run(&mock, "<p>one</p><p>two</p>", "fr").await.unwrap();
        assert_eq!(result, "<p><span>one</span></p><p>two</p>");
    }

    #[tokio::test]
    async fn test_drop_tag_keeps_content() {
        let mock = MockTranslator::new(MockMode::DropTag("b".to_string()));
        let result = run(&mock, "<p>x <b>y</b></p>", "fr").await.unwrap();
        assert_eq!(result, "<p>x y</p>");
    }

    // Error Mode

    #[tokio::test]
    async fn test_error_mode_is_provider_error() {
        let mock = MockTranslator::new(MockMode::Error("API unavailable".to_string()));
        match run(&mock, "hello", "fr").await {
            Err(MtError::Provider { message, .. }) => assert_eq!(message, "API unavailable"),
            _ => panic!("Expected Provider error"),
        }
    }

    #[tokio::test]
    async fn test_fail_on_marker_only() {
        let mock = MockTranslator::new(MockMode::FailOn("BOOM".to_string()));
        assert_eq!(run(&mock, "<p>fine</p>", "fr").await.unwrap(), "<p>fine</p>");
        assert!(run(&mock, "<p>BOOM</p>", "fr").await.is_err());
    }

    // NoOp Mode

    #[tokio::test]
    async fn test_noop_keeps_attributes() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let text = "<p class=\"x\">Hello world</p>";
        assert_eq!(run(&mock, text, "fr").await.unwrap(), text);
    }

    // Delay

    #[tokio::test]
    async fn test_delay_adds_latency() {
        let mock = MockTranslator::with_delay(MockMode::NoOp, 50);
        let start = std::time::Instant::now();
        run(&mock, "hello", "fr").await.unwrap();
        assert!(start.elapsed().as_millis() >= 50);
    }

    #[tokio::test]
    async fn test_stagger_first_call_is_slowest() {
        let mock = MockTranslator::with_staggered_delay(MockMode::NoOp, 10);
        let start = std::time::Instant::now();
        run(&mock, "hello", "fr").await.unwrap();
        // First call sleeps 8 steps
        assert!(start.elapsed().as_millis() >= 80);
    }

    // Counter

    #[tokio::test]
    async fn test_counters_shared_between_clones() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let clone = mock.clone();
        run(&clone, "a", "fr").await.unwrap();
        run(&clone, "b", "fr").await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.max_concurrent_calls(), 1);
    }

    #[test]
    fn test_provider_name() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Translator");
    }
}
