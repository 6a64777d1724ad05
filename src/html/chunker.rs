//! Length-bounded splitting of markup for the translation provider
//!
//! Markup is cut only right after a block delimiter (`</p>` by default), never
//! inside a tag or a paragraph. Lengths are counted in characters, which is
//! how translation providers account request size.

/// The closing tag that ends a paragraph-like block
pub const BLOCK_DELIMITER: &str = "</p>";

/// Split `html` into chunks of at most `max_len` characters
///
/// Fragments end at [`BLOCK_DELIMITER`] and are packed greedily. A fragment
/// longer than `max_len` is emitted as its own oversized chunk rather than
/// being cut. The chunks concatenate back to `html` exactly, and none of them
/// is empty.
///
/// # Example
///
/// ```ignore
/// let chunks = chunk_html("<p>aaa</p><p>bbb</p>", 12);
/// assert_eq!(chunks, vec!["<p>aaa</p>", "<p>bbb</p>"]);
/// ```
pub fn chunk_html(html: &str, max_len: usize) -> Vec<String> {
    chunk_on(html, BLOCK_DELIMITER, max_len)
}

/// [`chunk_html`] with an explicit delimiter
pub fn chunk_on(html: &str, delimiter: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for fragment in fragments(html, delimiter) {
        let fragment_len = fragment.chars().count();
        if !buffer.is_empty() && buffer_len + fragment_len > max_len {
            chunks.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }
        buffer.push_str(fragment);
        buffer_len += fragment_len;
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }
    chunks
}

/// Pieces of `html`, each ending with `delimiter` except possibly the last
fn fragments<'a>(html: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> {
    let mut rest = html;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = match rest.find(delimiter) {
            Some(pos) if !delimiter.is_empty() => pos + delimiter.len(),
            _ => rest.len(),
        };
        let (fragment, tail) = rest.split_at(end);
        rest = tail;
        Some(fragment)
    })
}
