//! Provider seam for machine translation
//!
//! The pipeline only knows [`MachineTranslator`]; DeepL and the test mock sit
//! behind it. Every call carries [`HtmlOptions`] so the provider treats the
//! payload as markup rather than plain text.
//!
//! ```ignore
//! use html_mt::mt::{DeepLProvider, HtmlOptions, MachineTranslator};
//!
//! let provider = DeepLProvider::from_env()?;
//! let html = provider
//!     .translate("<p>Hello, world!</p>", "fr", &HtmlOptions::default())
//!     .await?;
//! assert_eq!(html, "<p>Bonjour, le monde !</p>");
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How the provider should treat markup inside the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlOptions {
    /// Tags whose content is passed through verbatim, untranslated
    pub ignore_tags: Vec<String>,
    /// Tags that always start a new sentence
    pub splitting_tags: Vec<String>,
    /// Inline tags a sentence must never be split inside
    pub non_splitting_tags: Vec<String>,
    /// Keep whitespace and punctuation formatting exactly
    pub preserve_formatting: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        let tags = |names: &[&str]| -> Vec<String> { names.iter().map(|n| n.to_string()).collect() };
        HtmlOptions {
            ignore_tags: tags(&["code", "pre"]),
            splitting_tags: tags(&["p", "li", "div"]),
            non_splitting_tags: tags(&["span", "strong", "em"]),
            preserve_formatting: true,
        }
    }
}

/// A translation engine that accepts HTML
///
/// One call translates one piece of markup; chunking and ordering live in
/// [`crate::mt::ChunkedTranslator`].
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate one piece of HTML into `target_locale`
    ///
    /// The source language is detected by the provider.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated markup
    /// * `Err(MtError)` - Transport or provider failure; never retried here
    async fn translate(
        &self,
        text: &str,
        target_locale: &str,
        options: &HtmlOptions,
    ) -> MtResult<String>;

    /// Shown in logs and CLI output
    fn provider_name(&self) -> &str;
}

/// Target language variants that DeepL distinguishes by region or script
const REGIONAL_TARGETS: &[&str] = &["EN-GB", "EN-US", "ES-419", "PT-BR", "PT-PT", "ZH-HANS", "ZH-HANT"];

/// Map a content-store locale code to a DeepL `target_lang`
///
/// - `fr`, `fr-FR` → `FR`
/// - `en` → `EN-US`, `en-GB` → `EN-GB`
/// - `pt` → `PT-PT`, `pt-BR` → `PT-BR`
/// - `zh`, `zh-CN`, `zh-Hans` → `ZH-HANS`; `zh-TW`, `zh-HK`, `zh-Hant` → `ZH-HANT`
///
/// # Example
///
/// ```ignore
/// assert_eq!(deepl_target_lang("zh-Hant"), "ZH-HANT");
/// assert_eq!(deepl_target_lang("de-AT"), "DE");
/// ```
pub fn deepl_target_lang(locale: &str) -> String {
    let code = locale.replace('_', "-").to_uppercase();
    if REGIONAL_TARGETS.contains(&code.as_str()) {
        return code;
    }

    let base = code.split('-').next().unwrap_or(&code).to_string();
    match (base.as_str(), code.as_str()) {
        ("ZH", "ZH-TW" | "ZH-HK" | "ZH-MO") => "ZH-HANT".to_string(),
        ("ZH", _) => "ZH-HANS".to_string(),
        ("EN", _) => "EN-US".to_string(),
        ("PT", _) => "PT-PT".to_string(),
        _ => base,
    }
}

/// Reject locale codes that could not be a store locale or a DeepL target
///
/// Accepts ASCII letters, digits, `-` and `_` (`fr`, `pt-BR`, `zh-Hant`,
/// `es-419`). Anything else is refused before a request is built.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    match locale
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(bad) => Err(MtError::InvalidLocale(format!(
            "Unexpected character {:?} in locale code {}",
            bad, locale
        ))),
        None => Ok(()),
    }
}
