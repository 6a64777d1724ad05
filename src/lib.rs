//! Attribute-safe HTML machine translation
//!
//! Rich-text content is translated by an external engine that handles text
//! well and markup badly. This crate strips attributes before the engine sees
//! the markup, sends it in length-bounded chunks, puts the attributes back on
//! the tags that survived, and cleans the result for the destination CMS.
//!
//! ```ignore
//! use std::sync::Arc;
//! use html_mt::{ChunkedTranslator, HtmlPipeline, MockMode, MockTranslator};
//!
//! # async fn run() -> html_mt::MtResult<()> {
//! let translator = ChunkedTranslator::new(Arc::new(MockTranslator::new(MockMode::Suffix)));
//! let pipeline = HtmlPipeline::new(translator);
//! let html = pipeline
//!     .translate_html(r#"<p>See <a href="/docs">docs</a></p>"#, "fr")
//!     .await?;
//! assert_eq!(html, r#"<p>See _fr<a href="/docs">docs_fr</a></p>"#);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod html;
pub mod localize;
pub mod mt;
pub mod pipeline;
pub mod store;


pub use config::Config;
pub use html::{KeywordLink, LinkRules};
pub use localize::{
    DEFAULT_COVER_PICTURE_ID, EntryLocalizer, EntryRef, LocaleOutcome, LocalizationReport,
    LocalizationRequest, TaxonomyOutcome,
};
pub use mt::{
    ChunkedTranslator, DeepLProvider, HtmlOptions, MachineTranslator, MockMode, MockTranslator,
    MtError, MtResult,
};
pub use pipeline::{HtmlPipeline, TranslatedArticle, TranslatedPair};
pub use store::{ContentStore, Entry, MemoryStore, StrapiClient};
