/// Machine Translation Module
///
/// Provider abstraction and the chunked orchestration that lets documents of
/// any length pass through a length-limited translation API.
///
/// # Overview
///
/// 1. **MT Trait** - `MachineTranslator`, one async call per piece of markup
/// 2. **Providers** - `DeepLProvider` for real traffic, `MockTranslator` for tests
/// 3. **Orchestrator** - `ChunkedTranslator`, bounded-concurrency chunk fan-out
///    with results joined in document order
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use html_mt::mt::{ChunkedTranslator, DeepLProvider};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = DeepLProvider::from_env()?;
///     let translator = ChunkedTranslator::new(Arc::new(provider));
///     let html = translator.translate("<p>Hello</p><p>World</p>", "de").await?;
///     println!("{}", html);
///     Ok(())
/// }
/// ```
pub mod deepl;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod translator;

pub use deepl::{DEEPL_FREE_URL, DEEPL_PRO_URL, DeepLProvider};
pub use error::{MtError, MtResult};
pub use mock::{MockMode, MockTranslator};
pub use orchestrator::ChunkedTranslator;
pub use translator::{HtmlOptions, MachineTranslator, deepl_target_lang, validate_locale};
