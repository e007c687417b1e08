//! Scanner for bare URL, www and e-mail autolink candidates.
//!
//! The entry points are handed the full inline span plus the trigger
//! position. A successful match writes the link target into `link` and
//! reports how many bytes the match consumed forward (`len`) and how many
//! already-emitted bytes the caller must rewind from its output (`rewind`).

use crate::buffer::Buffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutolinkMatch {
    pub len: usize,
    pub rewind: usize,
}

/// Schemes considered safe to link to, plus relative references.
static SAFE_PREFIXES: &[&str] = &["/", "//", "http://", "https://", "ftp://", "mailto:"];

/// Returns true for a whitelisted scheme or a relative reference.
pub fn is_safe(link: &[u8]) -> bool {
    for prefix in SAFE_PREFIXES {
        let len = prefix.len();
        if link.len() > len
            && link[..len].eq_ignore_ascii_case(prefix.as_bytes())
            && link[len].is_ascii_alphanumeric()
        {
            return true;
        }
    }
    false
}

/// Matches `www.`-prefixed links. The trigger sits on the leading `w`, so
/// no rewind is ever needed.
pub fn www(link: &mut Buffer, data: &[u8], pos: usize) -> Option<AutolinkMatch> {
    let tail = &data[pos..];

    if pos > 0 {
        let prev = data[pos - 1];
        if !prev.is_ascii_punctuation() && !prev.is_ascii_whitespace() {
            return None;
        }
    }

    if tail.len() < 4 || &tail[..4] != b"www." {
        return None;
    }

    let mut link_end = check_domain(tail, false);
    if link_end == 0 {
        return None;
    }

    while link_end < tail.len() && !tail[link_end].is_ascii_whitespace() {
        link_end += 1;
    }

    let link_end = trim_delimiters(tail, link_end);
    if link_end == 0 {
        return None;
    }

    link.put(&tail[..link_end]);
    Some(AutolinkMatch {
        len: link_end,
        rewind: 0,
    })
}

/// Matches `scheme://host` links. The trigger sits on the `:`, so the
/// already-emitted scheme letters are reported as rewind.
pub fn url(link: &mut Buffer, data: &[u8], pos: usize) -> Option<AutolinkMatch> {
    let tail = &data[pos..];

    if tail.len() < 4 || tail[1] != b'/' || tail[2] != b'/' {
        return None;
    }

    let mut rewind = 0;
    while rewind < pos && data[pos - rewind - 1].is_ascii_alphabetic() {
        rewind += 1;
    }

    if !is_safe(&data[pos - rewind..]) {
        return None;
    }

    let mut link_end = 3;
    let domain_len = check_domain(&tail[link_end..], false);
    if domain_len == 0 {
        return None;
    }
    link_end += domain_len;

    while link_end < tail.len() && !tail[link_end].is_ascii_whitespace() {
        link_end += 1;
    }

    let link_end = trim_delimiters(tail, link_end);
    if link_end == 0 {
        return None;
    }

    link.put(&data[pos - rewind..pos + link_end]);
    Some(AutolinkMatch {
        len: link_end,
        rewind,
    })
}

/// Matches e-mail addresses around an `@` trigger. The local part has
/// already been emitted and is reported as rewind.
pub fn email(link: &mut Buffer, data: &[u8], pos: usize) -> Option<AutolinkMatch> {
    let tail = &data[pos..];

    let mut rewind = 0;
    while rewind < pos {
        let c = data[pos - rewind - 1];
        if c.is_ascii_alphanumeric() || matches!(c, b'.' | b'+' | b'-' | b'_') {
            rewind += 1;
        } else {
            break;
        }
    }
    if rewind == 0 {
        return None;
    }

    let mut at_signs = 0;
    let mut dots = 0;
    let mut link_end = 0;
    while link_end < tail.len() {
        let c = tail[link_end];
        if c.is_ascii_alphanumeric() {
        } else if c == b'@' {
            at_signs += 1;
        } else if c == b'.' && link_end + 1 < tail.len() {
            dots += 1;
        } else if c != b'-' && c != b'_' {
            break;
        }
        link_end += 1;
    }

    if link_end < 2 || at_signs != 1 || dots == 0 || !tail[link_end - 1].is_ascii_alphabetic() {
        return None;
    }

    let link_end = trim_delimiters(tail, link_end);
    if link_end == 0 {
        return None;
    }

    link.put(&data[pos - rewind..pos + link_end]);
    Some(AutolinkMatch {
        len: link_end,
        rewind,
    })
}

/// A plausible domain: alphanumeric lead-in, then alphanumerics, dashes
/// and dots. Unless `allow_short`, at least one dot is required.
fn check_domain(data: &[u8], allow_short: bool) -> usize {
    if data.is_empty() || !data[0].is_ascii_alphanumeric() {
        return 0;
    }

    let mut dots = 0;
    let mut i = 1;
    while i + 1 < data.len() {
        if data[i] == b'.' {
            dots += 1;
        } else if !data[i].is_ascii_alphanumeric() && data[i] != b'-' {
            break;
        }
        i += 1;
    }

    if allow_short || dots > 0 { i } else { 0 }
}

/// Trims trailing punctuation, entity tails and unbalanced close
/// brackets off a candidate link.
fn trim_delimiters(data: &[u8], mut link_end: usize) -> usize {
    for (i, &c) in data.iter().enumerate().take(link_end) {
        if c == b'<' {
            link_end = i;
            break;
        }
    }

    while link_end > 0 {
        let c = data[link_end - 1];
        if matches!(c, b'?' | b'!' | b'.' | b',') {
            link_end -= 1;
        } else if c == b';' {
            if link_end < 2 {
                link_end -= 1;
                continue;
            }
            // an `&xxx;` entity tail is cut whole
            let mut new_end = link_end - 2;
            while new_end > 0 && data[new_end].is_ascii_alphabetic() {
                new_end -= 1;
            }
            if new_end < link_end - 2 && data[new_end] == b'&' {
                link_end = new_end;
            } else {
                link_end -= 1;
            }
        } else {
            break;
        }
    }

    if link_end == 0 {
        return 0;
    }

    let close = data[link_end - 1];
    let open = match close {
        b'"' => b'"',
        b'\'' => b'\'',
        b')' => b'(',
        b']' => b'[',
        b'}' => b'{',
        _ => 0,
    };

    if open != 0 {
        // a close bracket stays only if it is balanced within the link
        let mut opening = 0;
        let mut closing = 0;
        for &c in &data[..link_end] {
            if c == open {
                opening += 1;
            } else if c == close {
                closing += 1;
            }
        }
        if closing != opening {
            link_end -= 1;
        }
    }

    link_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        f: fn(&mut Buffer, &[u8], usize) -> Option<AutolinkMatch>,
        data: &[u8],
        pos: usize,
    ) -> Option<(Vec<u8>, AutolinkMatch)> {
        let mut link = Buffer::new(64);
        f(&mut link, data, pos).map(|m| (link.into_vec(), m))
    }

    #[test]
    fn bare_url_with_scheme_rewind() {
        let data = b"see http://example.com/x now";
        let pos = data.iter().position(|&c| c == b':').unwrap();
        let (link, m) = run(url, data, pos).unwrap();
        assert_eq!(link, b"http://example.com/x");
        assert_eq!(m.rewind, 4);
        assert_eq!(m.len, "://example.com/x".len());
    }

    #[test]
    fn unsafe_scheme_is_refused() {
        let data = b"javascript://foo.bar/";
        let pos = data.iter().position(|&c| c == b':').unwrap();
        assert!(run(url, data, pos).is_none());
    }

    #[test]
    fn www_needs_boundary_and_domain() {
        let (link, m) = run(www, b"www.example.com rest", 0).unwrap();
        assert_eq!(link, b"www.example.com");
        assert_eq!(m.rewind, 0);
        assert!(run(www, b"awww.example.com", 1).is_none());
        assert!(run(www, b"www.nodotafter", 0).is_none());
    }

    #[test]
    fn email_rewinds_local_part() {
        let data = b"mail me@example.com please";
        let pos = data.iter().position(|&c| c == b'@').unwrap();
        let (link, m) = run(email, data, pos).unwrap();
        assert_eq!(link, b"me@example.com");
        assert_eq!(m.rewind, 2);
    }

    #[test]
    fn trailing_punctuation_is_trimmed() {
        let data = b"go to www.example.com.";
        let (link, _) = run(www, data, 6).unwrap();
        assert_eq!(link, b"www.example.com");
    }

    #[test]
    fn unbalanced_paren_is_dropped_balanced_kept() {
        let kept = b"http://e.com/x_(y)";
        let pos = 4;
        let (link, _) = run(url, kept, pos).unwrap();
        assert_eq!(link, b"http://e.com/x_(y)");

        let trimmed = b"http://e.com/xy)";
        let (link, _) = run(url, trimmed, pos).unwrap();
        assert_eq!(link, b"http://e.com/xy");
    }

    #[test]
    fn short_domains_only_when_allowed() {
        assert_eq!(check_domain(b"localhost/x", false), 0);
        assert!(check_domain(b"localhost/x", true) > 0);
    }

    #[test]
    fn safe_link_whitelist() {
        assert!(is_safe(b"http://example.com"));
        assert!(is_safe(b"HTTPS://example.com"));
        assert!(is_safe(b"/relative/path"));
        assert!(is_safe(b"//protocol.relative"));
        assert!(is_safe(b"mailto:a@b.c"));
        assert!(!is_safe(b"javascript:alert(1)"));
        assert!(!is_safe(b"data:text/html"));
    }
}
