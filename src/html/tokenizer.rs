//! Flat tag/text tokenizer
//!
//! Splits markup into an ordered run of text and tag tokens. This is a pattern
//! scanner, not an HTML parser: nesting and validity are never checked, and
//! anything that does not look like `< /? name attrs /? >` stays literal text.
//!
//! Every token borrows its literal from the input, and concatenating the
//! literals of all tokens reproduces the input exactly.

/// A `<...>` markup unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken<'a> {
    /// Leading `/` (`</p>`)
    pub closing: bool,
    /// First run of characters that are not whitespace, `/` or `>`
    pub name: &'a str,
    /// Everything after the name, trimmed, without a trailing self-closing `/`
    pub raw_attributes: &'a str,
    /// Trailing `/` before `>` (`<br/>`, `<img src="a" />`)
    pub self_closing: bool,
    /// The tag exactly as it appeared in the input
    pub literal: &'a str,
}

/// One attribute inside a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Empty for a stray `=value`
    pub name: &'a str,
    /// Leading whitespace, the name, and `=value` when present
    pub literal: &'a str,
}

impl<'a> Attribute<'a> {
    /// The value without its quotes; `None` for a bare attribute
    pub fn value(&self) -> Option<&'a str> {
        let (_, raw) = self.literal.split_once('=')?;
        let raw = raw.trim_start();
        for quote in ['"', '\''] {
            if let Some(inner) = raw.strip_prefix(quote) {
                return Some(inner.strip_suffix(quote).unwrap_or(inner));
            }
        }
        Some(raw)
    }
}

impl<'a> TagToken<'a> {
    /// The tag rendered with no attributes: `<name>`, `</name>` or `<name />`
    pub fn canonical(&self) -> String {
        format!(
            "<{}{}{}>",
            if self.closing { "/" } else { "" },
            self.name,
            if self.self_closing { " /" } else { "" }
        )
    }

    /// Same element identity: same name and same opening/closing role
    pub fn same_identity(&self, closing: bool, name: &str) -> bool {
        self.closing == closing && self.name == name
    }

    /// Attributes in source order; a quoted value is always consumed whole
    pub fn attributes(&self) -> Vec<Attribute<'a>> {
        let (start, end) = self.attribute_bounds();
        split_attributes(&self.literal[start..end])
    }

    /// The literal with only the attributes `keep` accepts
    ///
    /// Everything outside the attribute list is copied unchanged, so keeping
    /// every attribute reproduces the literal.
    pub fn retain_attributes(&self, keep: impl Fn(&Attribute<'a>) -> bool) -> String {
        let (start, end) = self.attribute_bounds();
        let mut output = String::with_capacity(self.literal.len());
        output.push_str(&self.literal[..start]);
        for attribute in split_attributes(&self.literal[start..end]) {
            if keep(&attribute) {
                output.push_str(attribute.literal);
            }
        }
        output.push_str(&self.literal[end..]);
        output
    }

    /// Byte range in `literal` from the end of the name to the end of
    /// `raw_attributes`
    fn attribute_bounds(&self) -> (usize, usize) {
        let inner = self.literal[..self.literal.len() - 1].trim_end();
        let inner = match inner.strip_suffix('/') {
            Some(rest) if self.self_closing => rest.trim_end(),
            _ => inner,
        };
        let end = inner.len();
        let start = self.literal[..end - self.raw_attributes.len()].trim_end().len();
        (start, end)
    }
}

/// Split attribute text into `Attribute`s, each owning the whitespace before it
fn split_attributes(text: &str) -> Vec<Attribute<'_>> {
    let bytes = text.as_bytes();
    let skip_whitespace = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    };

    let mut attributes = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let name_start = skip_whitespace(pos);
        if name_start == bytes.len() {
            break;
        }

        pos = name_start;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
            pos += 1;
        }
        let name_end = pos;

        let equals = skip_whitespace(pos);
        if bytes.get(equals) == Some(&b'=') {
            pos = skip_whitespace(equals + 1);
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    pos = text[pos + 1..]
                        .find(quote as char)
                        .map_or(bytes.len(), |offset| pos + offset + 2);
                }
                _ => {
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                }
            }
        }

        attributes.push(Attribute {
            name: &text[name_start..name_end],
            literal: &text[start..pos],
        });
    }
    attributes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Tag(TagToken<'a>),
}

impl<'a> Token<'a> {
    /// The input substring this token covers
    pub fn literal(&self) -> &'a str {
        match self {
            Token::Text(text) => text,
            Token::Tag(tag) => tag.literal,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Token::Tag(_))
    }
}

/// Split `html` into text and tag tokens
///
/// Never fails. Adjacent text is merged into a single text token, so a
/// rejected `<` (for example in `a < b`) simply becomes part of the
/// surrounding text.
///
/// # Example
///
/// ```ignore
/// let tokens = tokenize("<p class=\"x\">Hi</p>");
/// assert_eq!(tokens.len(), 3);
/// ```
pub fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let open = pos + offset;
        let Some(end_offset) = html[open + 1..].find(|c: char| c == '<' || c == '>') else {
            break;
        };
        let end = open + 1 + end_offset;

        // A second `<` before any `>` means the first one was plain text
        if html.as_bytes()[end] == b'<' {
            pos = end;
            continue;
        }

        if let Some(tag) = parse_tag(&html[open..=end]) {
            if text_start < open {
                tokens.push(Token::Text(&html[text_start..open]));
            }
            tokens.push(Token::Tag(tag));
            text_start = end + 1;
        }
        pos = end + 1;
    }

    if text_start < html.len() {
        tokens.push(Token::Text(&html[text_start..]));
    }
    tokens
}

/// Parse one `<...>` candidate; `None` when it has no tag name
fn parse_tag(literal: &str) -> Option<TagToken<'_>> {
    let body = literal[1..literal.len() - 1].trim_start();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(body.len());
    if name_end == 0 {
        return None;
    }

    let rest = body[name_end..].trim();
    let (raw_attributes, self_closing) = match rest.strip_suffix('/') {
        Some(attrs) => (attrs.trim_end(), true),
        None => (rest, false),
    };

    Some(TagToken {
        closing,
        name: &body[..name_end],
        raw_attributes,
        self_closing,
        literal,
    })
}
