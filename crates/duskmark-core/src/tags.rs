//! Membership table for HTML tags that open a block at the document level.

/// Longest name in [`BLOCK_TAGS`]; probes longer than this cannot match.
const MAX_TAG_LEN: usize = 10;

/// Sorted list of block-level tag names, lowercase.
static BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "button",
    "canvas",
    "caption",
    "col",
    "colgroup",
    "dd",
    "del",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "embed",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "iframe",
    "ins",
    "li",
    "main",
    "map",
    "math",
    "menu",
    "nav",
    "noscript",
    "object",
    "ol",
    "output",
    "p",
    "pre",
    "progress",
    "script",
    "section",
    "style",
    "table",
    "tbody",
    "td",
    "textarea",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
    "video",
];

/// Looks up `name` (any case) in the block-tag table, returning the
/// canonical lowercase spelling on a hit.
pub fn find_block_tag(name: &[u8]) -> Option<&'static str> {
    if name.is_empty() || name.len() > MAX_TAG_LEN {
        return None;
    }
    let mut probe = [0u8; MAX_TAG_LEN];
    for (dst, &src) in probe.iter_mut().zip(name) {
        if !src.is_ascii_alphanumeric() {
            return None;
        }
        *dst = src.to_ascii_lowercase();
    }
    let probe = &probe[..name.len()];
    BLOCK_TAGS
        .binary_search_by(|tag| tag.as_bytes().cmp(probe))
        .ok()
        .map(|idx| BLOCK_TAGS[idx])
}

#[cfg(test)]
mod tests {
    use super::find_block_tag;

    #[test]
    fn case_insensitive_lookup() {
        assert_eq!(find_block_tag(b"blockquote"), Some("blockquote"));
        assert_eq!(find_block_tag(b"BLOCKQUOTE"), Some("blockquote"));
        assert_eq!(find_block_tag(b"TaBle"), Some("table"));
        assert_eq!(find_block_tag(b"h3"), Some("h3"));
    }

    #[test]
    fn rejects_inline_and_unknown_tags() {
        assert_eq!(find_block_tag(b"span"), None);
        assert_eq!(find_block_tag(b"em"), None);
        assert_eq!(find_block_tag(b"notatag"), None);
        assert_eq!(find_block_tag(b""), None);
        assert_eq!(find_block_tag(b"ridiculouslylongtagname"), None);
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        for pair in super::BLOCK_TAGS.windows(2) {
            assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
        }
    }
}
