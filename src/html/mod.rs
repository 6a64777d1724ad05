/// HTML handling for machine translation
///
/// Translation providers are good at text and unreliable with markup: they
/// reorder attributes, drop them, or translate their values. This module keeps
/// attributes away from the provider entirely.
///
/// # Overview
///
/// 1. **Tokenizer** - flat text/tag token stream, no tree
/// 2. **Decomposer** - strips attributes into an ordered side list
/// 3. **Chunker** - splits stripped markup at paragraph boundaries
/// 4. **Recomposer** - reattaches attributes to tags that still line up
/// 5. **Sanitizer** - normalizes the result for the destination store
///
/// [`prepare`] cleans and rewrites links in source content before any of this.
///
/// # Example
///
/// ```ignore
/// use html_mt::html::{decompose, recompose, sanitize};
///
/// let d = decompose("<p class=\"lead\">Hello</p>");
/// assert_eq!(d.stripped, "<p>Hello</p>");
///
/// // ... send d.stripped to the translation provider ...
/// let translated = "<p>Bonjour</p>";
///
/// let restored = recompose(translated, &d.records);
/// assert_eq!(restored, "<p class=\"lead\">Bonjour</p>");
/// assert_eq!(sanitize(&restored), "<p>Bonjour</p>");
/// ```
pub mod chunker;
pub mod decompose;
pub mod prepare;
pub mod recompose;
pub mod sanitizer;
pub mod tokenizer;

pub use chunker::{BLOCK_DELIMITER, chunk_html, chunk_on};
pub use decompose::{AttributeRecord, Decomposition, decompose};
pub use prepare::{KeywordLink, LinkRules, prepare_source};
pub use recompose::{RecomposeReport, recompose, recompose_with_report};
pub use sanitizer::sanitize;
pub use tokenizer::{Attribute, TagToken, Token, tokenize};
