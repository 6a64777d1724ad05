//! Post-translation cleanup for the destination store
//!
//! Content pasted from web pages carries presentation hooks and embeds the
//! store's renderer cannot display. The passes run in a fixed order:
//!
//! 1. drop `class`, `id` and `data-*` attributes from every tag
//! 2. drop `<figure>` and `<svg>` elements with everything inside them
//! 3. drop `<div>` containers with nothing but whitespace inside
//! 4. collapse `</p></p>` into `</p>`
//!
//! Every pass only removes text, and the sequence is repeated until nothing
//! changes, so sanitizing sanitized markup is a no-op.

use std::sync::LazyLock;

use regex::Regex;

use super::tokenizer::{Attribute, Token, tokenize};

/// Elements removed together with their content
const REMOVED_ELEMENTS: &[&str] = &["figure", "svg"];

static EMPTY_DIV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<div\b[^>]*>\s*</div\s*>").expect("valid empty div pattern")
});

const DUPLICATE_PARAGRAPH_CLOSE: &str = "</p></p>";

/// Normalize translated markup for the destination store
///
/// # Example
///
/// ```ignore
/// assert_eq!(sanitize("<div></div><p data-x=\"1\">A</p></p>"), "<p>A</p>");
/// ```
pub fn sanitize(html: &str) -> String {
    // Every productive sweep shortens the markup, so this terminates
    let mut current = html.to_string();
    loop {
        let next = sweep(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One pass of every rule, in order
fn sweep(html: &str) -> String {
    let html = strip_presentation_attributes(html);
    let html = remove_unsupported_elements(&html);
    let html = remove_empty_divs(&html);
    collapse_duplicate_paragraph_close(&html)
}

/// Pass 1: attributes are matched by name, values are never inspected
pub fn strip_presentation_attributes(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    for token in tokenize(html) {
        match token {
            Token::Tag(tag)
                if !tag.closing && !tag.name.starts_with('!') && !tag.raw_attributes.is_empty() =>
            {
                output.push_str(&tag.retain_attributes(|a| !is_presentation_attribute(a)));
            }
            other => output.push_str(other.literal()),
        }
    }
    output
}

fn is_presentation_attribute(attribute: &Attribute<'_>) -> bool {
    let name = attribute.name;
    name.eq_ignore_ascii_case("class")
        || name.eq_ignore_ascii_case("id")
        || name.get(..5).is_some_and(|prefix| prefix.eq_ignore_ascii_case("data-"))
}

/// An element being skipped in pass 2
#[derive(Clone, Copy)]
struct Removal<'a> {
    name: &'a str,
    depth: usize,
    /// Byte offset of its start tag
    start: usize,
}

/// Pass 2: nested elements of the same name are counted, so the removal ends
/// at the matching close tag. An element that is never closed is kept as is.
pub fn remove_unsupported_elements(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut removing: Option<Removal<'_>> = None;
    let mut offset = 0;

    for token in tokenize(html) {
        let literal = token.literal();
        let start = offset;
        offset += literal.len();

        let Token::Tag(tag) = token else {
            if removing.is_none() {
                output.push_str(literal);
            }
            continue;
        };

        match removing {
            None if !tag.closing && is_removed_element(tag.name) => {
                if !tag.self_closing {
                    removing = Some(Removal {
                        name: tag.name,
                        depth: 1,
                        start,
                    });
                }
            }
            None => output.push_str(literal),
            Some(mut removal) => {
                if !tag.self_closing && tag.name.eq_ignore_ascii_case(removal.name) {
                    if tag.closing {
                        removal.depth -= 1;
                    } else {
                        removal.depth += 1;
                    }
                }
                removing = (removal.depth > 0).then_some(removal);
            }
        }
    }

    if let Some(removal) = removing {
        output.push_str(&html[removal.start..]);
    }
    output
}

fn is_removed_element(name: &str) -> bool {
    REMOVED_ELEMENTS
        .iter()
        .any(|removed| name.eq_ignore_ascii_case(removed))
}

/// Pass 3, nested matches only appear once the inner one is gone
pub fn remove_empty_divs(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = EMPTY_DIV.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Pass 4
pub fn collapse_duplicate_paragraph_close(html: &str) -> String {
    let mut current = html.to_string();
    while current.contains(DUPLICATE_PARAGRAPH_CLOSE) {
        current = current.replace(DUPLICATE_PARAGRAPH_CLOSE, "</p>");
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_example() {
        assert_eq!(sanitize("<div></div><p data-x=\"1\">A</p></p>"), "<p>A</p>");
    }

    #[test]
    fn test_presentation_attributes_removed() {
        let html = "<p class=\"lead\" id='intro' data-track-id=\"7\" style=\"color:red\">x</p>";
        assert_eq!(sanitize(html), "<p style=\"color:red\">x</p>");
    }

    #[test]
    fn test_unquoted_attribute_and_self_closing() {
        assert_eq!(sanitize("<img src=\"a.png\" class=hero/>"), "<img src=\"a.png\"/>");
        assert_eq!(sanitize("<img data-id=5 src=\"a.png\" />"), "<img src=\"a.png\" />");
    }

    #[test]
    fn test_similar_attribute_names_are_kept() {
        let html = "<a href=\"/x\" aria-describedby=\"n\" classname=\"k\" idx=\"1\">x</a>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_text_that_looks_like_attributes_is_kept() {
        let html = "<p>Use class=\"btn\" on the button</p>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_figure_and_svg_removed_with_content() {
        let html = "<p>a</p><figure class=\"f\"><img src=\"x\"/><figcaption>cap</figcaption></figure><p>b</p><svg viewBox=\"0 0 1 1\"><path d=\"M0\"/></svg>";
        assert_eq!(sanitize(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_attribute_values_are_never_cut() {
        let html = "<img alt=\"order id=42 shipped\" src=\"a.png\">";
        assert_eq!(sanitize(html), html);
        assert_eq!(
            sanitize("<a title='see class=\"x\"' class=\"btn\" href=\"/x\">x</a>"),
            "<a title='see class=\"x\"' href=\"/x\">x</a>"
        );
    }

    #[test]
    fn test_valueless_presentation_attributes_removed() {
        assert_eq!(sanitize("<p hidden id>x</p>"), "<p hidden>x</p>");
        assert_eq!(sanitize("<p data-x DATA-Y=\"1\">x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_comments_are_left_alone() {
        let html = "<!-- id=5 class=x --><p>x</p>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_nested_elements_removed_whole() {
        assert_eq!(
            sanitize("<p>a</p><svg><svg><rect/></svg><text>LEAK</text></svg><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
        assert_eq!(sanitize("<figure><figure>inner</figure>outer</figure><p>x</p>"), "<p>x</p>");
        assert_eq!(
            sanitize("<FIGURE><svg/><figure>a</figure>b</FIGURE>c"),
            "c"
        );
    }

    #[test]
    fn test_unclosed_element_kept() {
        let html = "<p>a</p><svg><text>b</text>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_self_closing_svg_removed() {
        assert_eq!(sanitize("<p>x<svg width=\"1\"/></p>"), "<p>x</p>");
    }

    #[test]
    fn test_element_names_need_a_boundary() {
        let html = "<figures>kept</figures>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_empty_divs_removed_recursively() {
        assert_eq!(sanitize("<div class=\"w\"><div> \n </div></div><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_non_empty_div_kept() {
        let html = "<div><p>x</p></div>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_duplicate_paragraph_close_collapsed() {
        assert_eq!(sanitize("<p>a</p></p></p>"), "<p>a</p>");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<div></div><p data-x=\"1\">A</p></p>",
            "<svg<div></div>>x</svg>",
            "<div><figure>z</figure></div></p></p>",
            "<p class='a'>b</p><div>\t</div></p><div>",
            "plain",
            "",
            "<figure><figure>inner</figure>outer</figure>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_empty_div_exposing_duplicate_close() {
        assert_eq!(sanitize("<p>a</p><div></div></p>"), "<p>a</p>");
    }
}
