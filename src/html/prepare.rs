//! Source article preparation
//!
//! Runs on the source content before it is translated. Presentation attributes
//! and doubled `</p>` are cleaned the same way the sanitizer does, links that
//! leave the site are replaced by their text, and the first mention of each
//! configured keyword becomes a link.
//!
//! ```toml
//! [links]
//! unwrap_external = true
//! trusted_hosts = ["example.com"]
//!
//! [[links.keywords]]
//! keyword = "bitcoin"
//! url = "https://example.com/price/bitcoin"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::sanitizer::{collapse_duplicate_paragraph_close, strip_presentation_attributes};
use super::tokenizer::{TagToken, Token, tokenize};

/// Link rewriting applied to source content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRules {
    /// Replace absolute http(s) links to untrusted hosts by their content
    pub unwrap_external: bool,
    /// Hosts whose links are kept, subdomains included
    pub trusted_hosts: Vec<String>,
    /// Applied in order, each at most once per document
    pub keywords: Vec<KeywordLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLink {
    pub keyword: String,
    pub url: String,
}

impl LinkRules {
    pub fn is_empty(&self) -> bool {
        !self.unwrap_external && self.keywords.is_empty()
    }
}

/// Clean source markup and apply `rules`
///
/// # Example
///
/// ```ignore
/// let rules = LinkRules { unwrap_external: true, ..Default::default() };
/// assert_eq!(
///     prepare_source("<p class=\"x\">See <a href=\"https://other.org\">this</a></p></p>", &rules),
///     "<p>See this</p>"
/// );
/// ```
pub fn prepare_source(html: &str, rules: &LinkRules) -> String {
    let html = collapse_duplicate_paragraph_close(&strip_presentation_attributes(html));
    let html = if rules.unwrap_external {
        unwrap_external_links(&html, &rules.trusted_hosts)
    } else {
        html
    };
    link_keywords(&html, &rules.keywords)
}

/// Drop the `<a>` and `</a>` of links to untrusted hosts, keeping their content
///
/// Relative links, other schemes and links without `href` are kept.
pub fn unwrap_external_links(html: &str, trusted_hosts: &[String]) -> String {
    let mut output = String::with_capacity(html.len());
    // One entry per open <a>: true when its tags are dropped
    let mut anchors: Vec<bool> = Vec::new();

    for token in tokenize(html) {
        if let Token::Tag(tag) = &token {
            if is_anchor(tag) {
                let dropped = if tag.closing {
                    anchors.pop().unwrap_or(false)
                } else {
                    let external = href(tag).is_some_and(|href| is_external(href, trusted_hosts));
                    anchors.push(external);
                    external
                };
                if dropped {
                    continue;
                }
            }
        }
        output.push_str(token.literal());
    }
    output
}

/// Link the first mention of every keyword
///
/// Keywords match case-insensitively on word boundaries, in text only and
/// never inside an existing link. The matched text keeps its original case.
pub fn link_keywords(html: &str, keywords: &[KeywordLink]) -> String {
    keywords
        .iter()
        .fold(html.to_string(), |current, link| link_first_mention(&current, link))
}

fn link_first_mention(html: &str, link: &KeywordLink) -> String {
    let keyword = link.keyword.trim();
    if keyword.is_empty() {
        return html.to_string();
    }
    let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))) else {
        return html.to_string();
    };

    let mut output = String::with_capacity(html.len() + link.url.len() + 32);
    let mut anchor_depth = 0usize;
    let mut linked = false;

    for token in tokenize(html) {
        match &token {
            Token::Tag(tag) if is_anchor(tag) => {
                if tag.closing {
                    anchor_depth = anchor_depth.saturating_sub(1);
                } else {
                    anchor_depth += 1;
                }
            }
            Token::Text(text) if !linked && anchor_depth == 0 => {
                if let Some(found) = pattern.find(text) {
                    output.push_str(&text[..found.start()]);
                    output.push_str(&format!(
                        r#"<a href="{}" target="_blank">{}</a>"#,
                        link.url.replace('"', "&quot;"),
                        found.as_str()
                    ));
                    output.push_str(&text[found.end()..]);
                    linked = true;
                    continue;
                }
            }
            _ => {}
        }
        output.push_str(token.literal());
    }
    output
}

fn is_anchor(tag: &TagToken<'_>) -> bool {
    !tag.self_closing && tag.name.eq_ignore_ascii_case("a")
}

fn href<'a>(tag: &TagToken<'a>) -> Option<&'a str> {
    tag.attributes()
        .into_iter()
        .find(|a| a.name.eq_ignore_ascii_case("href"))
        .and_then(|a| a.value())
}

fn is_external(href: &str, trusted_hosts: &[String]) -> bool {
    let Ok(url) = Url::parse(href.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };

    !trusted_hosts.iter().any(|trusted| {
        let trusted = trusted.trim().to_ascii_lowercase();
        host == trusted || host.ends_with(&format!(".{}", trusted))
    })
}
