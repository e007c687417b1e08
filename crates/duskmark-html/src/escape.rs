//! HTML and href escaping.

use duskmark_core::Buffer;
use std::fmt::Write;

/// Escaped output tends to run a little longer than its input.
fn escape_grow(x: usize) -> usize {
    x * 12 / 10
}

/// OWASP set: `&` `<` `>` `"` `'`, plus `/` in secure mode.
fn html_escape(c: u8) -> Option<&'static str> {
    match c {
        b'"' => Some("&quot;"),
        b'&' => Some("&amp;"),
        b'\'' => Some("&#39;"),
        b'/' => Some("&#47;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        _ => None,
    }
}

fn escape_html_inner(ob: &mut Buffer, src: &[u8], secure: bool) {
    let _ = ob.grow(ob.len() + escape_grow(src.len()));

    let mut i = 0;
    while i < src.len() {
        let org = i;
        let mut esc = None;
        while i < src.len() {
            esc = html_escape(src[i]);
            if esc.is_some() {
                break;
            }
            i += 1;
        }

        if i > org {
            ob.put(&src[org..i]);
        }
        if i >= src.len() {
            break;
        }

        // the forward slash is only escaped in secure mode
        if src[i] == b'/' && !secure {
            ob.put_char(b'/');
        } else if let Some(esc) = esc {
            ob.put_str(esc);
        }
        i += 1;
    }
}

/// Escapes text for element content and attribute values.
pub fn escape_html(ob: &mut Buffer, src: &[u8]) {
    escape_html_inner(ob, src, false);
}

/// Like [`escape_html`], but also escapes `/` so an entity cannot be
/// smuggled past a naive filter.
pub fn escape_html_secure(ob: &mut Buffer, src: &[u8]) {
    escape_html_inner(ob, src, true);
}

/// URL characters that pass through an href untouched: unreserved plus
/// reserved, minus the two that break out of an HTML attribute.
fn href_safe(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b'-'
                | b'.'
                | b'/'
                | b':'
                | b';'
                | b'='
                | b'?'
                | b'@'
                | b'_'
                | b'~'
        )
}

/// Escapes a URL for use inside an `href` attribute: `&` and `'` become
/// entities, anything else unsafe is percent-encoded.
pub fn escape_href(ob: &mut Buffer, src: &[u8]) {
    let _ = ob.grow(ob.len() + escape_grow(src.len()));

    let mut i = 0;
    while i < src.len() {
        let org = i;
        while i < src.len() && href_safe(src[i]) {
            i += 1;
        }
        if i > org {
            ob.put(&src[org..i]);
        }
        if i >= src.len() {
            break;
        }

        match src[i] {
            b'&' => ob.put_str("&amp;"),
            b'\'' => ob.put_str("&#x27;"),
            c => {
                let _ = write!(ob, "%{:02X}", c);
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(src: &[u8]) -> Vec<u8> {
        let mut ob = Buffer::new(64);
        escape_html(&mut ob, src);
        ob.into_vec()
    }

    fn href(src: &[u8]) -> Vec<u8> {
        let mut ob = Buffer::new(64);
        escape_href(&mut ob, src);
        ob.into_vec()
    }

    #[test]
    fn html_escapes_markup() {
        assert_eq!(html(b"a < b & c > d"), b"a &lt; b &amp; c &gt; d".to_vec());
        assert_eq!(html(b"\"quoted\" 'single'"), b"&quot;quoted&quot; &#39;single&#39;".to_vec());
        assert_eq!(html(b"a/b"), b"a/b".to_vec());
    }

    #[test]
    fn secure_mode_escapes_slash() {
        let mut ob = Buffer::new(64);
        escape_html_secure(&mut ob, b"a/b");
        assert_eq!(ob.as_slice(), b"a&#47;b");
    }

    #[test]
    fn href_passes_url_characters() {
        assert_eq!(
            href(b"http://example.com/a?b=c&d=e"),
            b"http://example.com/a?b=c&amp;d=e".to_vec()
        );
        assert_eq!(href(b"/x y"), b"/x%20y".to_vec());
        assert_eq!(href(b"it's"), b"it&#x27;s".to_vec());
    }
}
