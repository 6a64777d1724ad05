//! Attribute stripping
//!
//! Moves every tag's attribute text out of the markup and into an ordered side
//! list, so the translation engine only ever sees bare `<p>`, `</p>`, `<br />`.

use super::tokenizer::{TagToken, Token, tokenize};

/// The attribute payload of one original tag, kept for reinsertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub closing: bool,
    pub name: String,
    /// Attribute text, trimmed, without the self-closing slash
    pub raw_attributes: String,
    pub self_closing: bool,
    /// The tag exactly as written in the source markup
    pub source: String,
}

impl AttributeRecord {
    fn from_tag(tag: &TagToken<'_>) -> Self {
        AttributeRecord {
            closing: tag.closing,
            name: tag.name.to_string(),
            raw_attributes: tag.raw_attributes.to_string(),
            self_closing: tag.self_closing,
            source: tag.literal.to_string(),
        }
    }

    /// Whether a tag in translated markup is the element this record describes
    pub fn matches(&self, tag: &TagToken<'_>) -> bool {
        tag.same_identity(self.closing, &self.name)
    }
}

/// Attribute-free markup plus the records needed to restore it
///
/// `records[i]` belongs to the i-th tag of `stripped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub stripped: String,
    pub records: Vec<AttributeRecord>,
}

impl Decomposition {
    /// Number of tags that carried any attribute text
    pub fn attributed_tag_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.raw_attributes.is_empty())
            .count()
    }
}

/// Strip all attributes from `html`
///
/// # Example
///
/// ```ignore
/// let d = decompose("<p class=\"x\">Hi</p>");
/// assert_eq!(d.stripped, "<p>Hi</p>");
/// assert_eq!(d.records[0].raw_attributes, "class=\"x\"");
/// ```
pub fn decompose(html: &str) -> Decomposition {
    let mut stripped = String::with_capacity(html.len());
    let mut records = Vec::new();

    for token in tokenize(html) {
        match token {
            Token::Text(text) => stripped.push_str(text),
            Token::Tag(tag) => {
                stripped.push_str(&tag.canonical());
                records.push(AttributeRecord::from_tag(&tag));
            }
        }
    }

    Decomposition { stripped, records }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_with_class() {
        let d = decompose("<p class=\"x\">Hi</p>");
        assert_eq!(d.stripped, "<p>Hi</p>");
        assert_eq!(d.records.len(), 2);

        assert!(!d.records[0].closing);
        assert_eq!(d.records[0].name, "p");
        assert_eq!(d.records[0].raw_attributes, "class=\"x\"");
        assert!(!d.records[0].self_closing);

        assert!(d.records[1].closing);
        assert_eq!(d.records[1].name, "p");
        assert_eq!(d.records[1].raw_attributes, "");
    }

    #[test]
    fn test_self_closing_is_canonicalized() {
        let d = decompose("<p>a<br/>b<img src=\"x.png\" alt=\"X\" /></p>");
        assert_eq!(d.stripped, "<p>a<br />b<img /></p>");
        assert!(d.records[1].self_closing);
        assert!(d.records[2].self_closing);
        assert_eq!(d.records[2].raw_attributes, "src=\"x.png\" alt=\"X\"");
    }

    #[test]
    fn test_record_count_matches_stripped_tags() {
        let html = "<h1 id=\"t\">T</h1><div class=\"c\"><p>a <a href=\"/u\">l</a></p><hr/></div>";
        let d = decompose(html);
        let stripped_tags = tokenize(&d.stripped).iter().filter(|t| t.is_tag()).count();
        assert_eq!(d.records.len(), stripped_tags);
        assert_eq!(d.records.len(), 9);
        assert_eq!(d.attributed_tag_count(), 3);
    }

    #[test]
    fn test_text_is_untouched() {
        let html = "no tags here, only a < b and c > d";
        let d = decompose(html);
        assert_eq!(d.stripped, html);
        assert!(d.records.is_empty());
    }

    #[test]
    fn test_stripped_has_no_attribute_text() {
        let d = decompose("<a href=\"https://example.com/?q=1\" target=\"_blank\">go</a>");
        assert_eq!(d.stripped, "<a>go</a>");
        assert!(!d.stripped.contains("href"));
        assert_eq!(d.records[0].source, "<a href=\"https://example.com/?q=1\" target=\"_blank\">");
    }
}
