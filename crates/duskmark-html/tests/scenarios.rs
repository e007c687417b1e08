use duskmark_core::Extensions;
use duskmark_html::{render_html, HtmlFlags};

fn render(doc: &str, extensions: Extensions) -> String {
    let out = render_html(doc.as_bytes(), extensions, HtmlFlags::empty()).unwrap();
    String::from_utf8(out).unwrap()
}

fn render_plain(doc: &str) -> String {
    render(doc, Extensions::empty())
}

#[test]
fn strong_emphasis_paragraph() {
    assert_eq!(render_plain("**hello**"), "<p><strong>hello</strong></p>\n");
}

#[test]
fn reference_link_with_title() {
    assert_eq!(
        render_plain("[x][y]\n\n[y]: http://e.com \"t\"\n"),
        "<p><a href=\"http://e.com\" title=\"t\">x</a></p>\n"
    );
}

#[test]
fn fenced_code_with_language() {
    assert_eq!(
        render("```c\nint x;\n```\n", Extensions::FENCED_CODE),
        "<pre><code class=\"c\">int x;\n</code></pre>\n"
    );
}

#[test]
fn ordered_list() {
    assert_eq!(
        render_plain("1. a\n2. b\n"),
        "<ol>\n<li>a</li>\n<li>b</li>\n</ol>\n"
    );
}

#[test]
fn block_quote_merges_lines() {
    assert_eq!(
        render_plain("> q1\n> q2\n"),
        "<blockquote>\n<p>q1\nq2</p>\n</blockquote>\n"
    );
}

#[test]
fn footnote_reference_and_trailer() {
    let out = render("see[^1]\n\n[^1]: note\n", Extensions::FOOTNOTES);
    assert!(
        out.contains("<sup id=\"fnref1\"><a href=\"#fn1\" rel=\"footnote\">1</a></sup>"),
        "{}",
        out
    );
    assert!(out.contains("<div class=\"footnotes\">"), "{}", out);
    assert!(out.contains("<li id=\"fn1\">"), "{}", out);
    assert!(out.contains("note"), "{}", out);
    assert!(out.contains("</ol>\n</div>\n"), "{}", out);
}

#[test]
fn reference_resolution_is_order_independent() {
    let before = render_plain("[y]: /url\n\n[x][y]\n");
    let after = render_plain("[x][y]\n\n[y]: /url\n");
    assert_eq!(before, after);
    assert_eq!(before, "<p><a href=\"/url\">x</a></p>\n");
}

#[test]
fn footnote_resolution_is_order_independent() {
    let before = render("[^n]: t\n\na[^n]\n", Extensions::FOOTNOTES);
    let after = render("a[^n]\n\n[^n]: t\n", Extensions::FOOTNOTES);
    assert_eq!(before, after);
}

#[test]
fn reference_labels_fold_case() {
    assert_eq!(
        render_plain("[x][ID]\n\n[id]: /url\n"),
        "<p><a href=\"/url\">x</a></p>\n"
    );
}

#[test]
fn unmatched_openers_stay_literal() {
    for (input, tag) in [
        ("*a\n", "<em>"),
        ("**a\n", "<strong>"),
        ("***a\n", "<em>"),
        ("`a\n", "<code>"),
        ("~~a\n", "<del>"),
    ] {
        let out = render(input, Extensions::STRIKETHROUGH);
        assert!(!out.contains(tag), "{:?} produced {}", input, out);
        assert!(out.contains(input.trim_end()), "{:?} produced {}", input, out);
    }
}

#[test]
fn indented_definition_is_not_a_definition() {
    // four spaces of indent turn the would-be definition into code, so
    // definition syntax cannot recur after pass 1 strips the real ones
    let out = render_plain("    [y]: /url\n");
    assert_eq!(out, "<pre><code>[y]: /url\n</code></pre>\n");
}

#[test]
fn tabs_expand_to_four_column_stops() {
    assert_eq!(render_plain("a\tb\n"), "<p>a   b</p>\n");
    assert_eq!(render_plain("ab\tc\n"), "<p>ab  c</p>\n");
}

#[test]
fn pipe_table_with_alignment() {
    let out = render("| x | y |\n|:--|--:|\n| 1 | 2 |\n", Extensions::TABLES);
    assert_eq!(
        out,
        "<table><thead>\n<tr>\n<th style=\"text-align: left\">x</th>\n\
         <th style=\"text-align: right\">y</th>\n</tr>\n</thead><tbody>\n\
         <tr>\n<td style=\"text-align: left\">1</td>\n\
         <td style=\"text-align: right\">2</td>\n</tr>\n</tbody></table>\n"
    );
}

#[test]
fn short_table_rows_pad_with_empty_cells() {
    let out = render("| x | y |\n|---|---|\n| 1 |\n", Extensions::TABLES);
    assert!(out.contains("<td>1</td>\n<td></td>\n"), "{}", out);
}

#[test]
fn bare_autolink_rewinds_scheme() {
    let out = render("visit http://example.com now\n", Extensions::AUTOLINK);
    assert_eq!(
        out,
        "<p>visit <a href=\"http://example.com\">http://example.com</a> now</p>\n"
    );
}

#[test]
fn www_autolink_gets_scheme_prefix() {
    let out = render("see www.example.com here\n", Extensions::AUTOLINK);
    assert_eq!(
        out,
        "<p>see <a href=\"http://www.example.com\">www.example.com</a> here</p>\n"
    );
}

#[test]
fn email_autolink_is_mailto() {
    let out = render("mail me@example.com\n", Extensions::AUTOLINK);
    assert_eq!(
        out,
        "<p>mail <a href=\"mailto:me@example.com\">me@example.com</a></p>\n"
    );
}

#[test]
fn autolinks_are_suppressed_inside_links() {
    let out = render("[http://a.com](/x)\n", Extensions::AUTOLINK);
    assert_eq!(out, "<p><a href=\"/x\">http://a.com</a></p>\n");
}

#[test]
fn angle_autolink_and_raw_tag() {
    assert_eq!(
        render_plain("<http://e.com>\n"),
        "<p><a href=\"http://e.com\">http://e.com</a></p>\n"
    );
    assert_eq!(
        render_plain("a <em>b</em>\n"),
        "<p>a <em>b</em></p>\n"
    );
}

#[test]
fn superscript_forms() {
    let out = render("a^2 and 2^(n 1)\n", Extensions::SUPERSCRIPT);
    assert_eq!(out, "<p>a<sup>2</sup> and 2<sup>n 1</sup></p>\n");
}

#[test]
fn intra_word_emphasis_is_configurable() {
    assert_eq!(
        render_plain("foo_bar_baz\n"),
        "<p>foo<em>bar</em>baz</p>\n"
    );
    assert_eq!(
        render("foo_bar_baz\n", Extensions::NO_INTRA_EMPHASIS),
        "<p>foo_bar_baz</p>\n"
    );
}

#[test]
fn insertion_marker() {
    assert_eq!(render("++new++\n", Extensions::INS), "<p><ins>new</ins></p>\n");
}

#[test]
fn hard_line_break_needs_two_spaces() {
    assert_eq!(render_plain("a  \nb\n"), "<p>a<br>\nb</p>\n");
    assert_eq!(render_plain("a \nb\n"), "<p>a \nb</p>\n");
}

#[test]
fn space_headers_gate_hash_runs() {
    assert_eq!(render_plain("#x\n"), "<h1>x</h1>\n");
    assert_eq!(
        render("#x\n", Extensions::SPACE_HEADERS),
        "<p>#x</p>\n"
    );
}

#[test]
fn lax_spacing_lets_a_fence_interrupt() {
    let tight = "para\n```\ncode\n```\n";
    let out = render(tight, Extensions::FENCED_CODE | Extensions::LAX_SPACING);
    assert!(out.contains("<pre><code>code\n</code></pre>"), "{}", out);

    let out = render(tight, Extensions::FENCED_CODE);
    assert!(!out.contains("<pre>"), "{}", out);
}

#[test]
fn entities_pass_through_and_lone_ampersands_escape() {
    assert_eq!(render_plain("&amp; &#55; & x\n"), "<p>&amp; &#55; &amp; x</p>\n");
}

#[test]
fn backslash_escapes() {
    assert_eq!(render_plain("\\*not em\\*\n"), "<p>*not em*</p>\n");
}

#[test]
fn deep_nesting_is_truncated_not_fatal() {
    let mut doc = String::new();
    for _ in 0..64 {
        doc.push_str("> ");
    }
    doc.push_str("deep\n");
    // must not panic or recurse unboundedly
    let out = render_plain(&doc);
    assert!(out.starts_with("<blockquote>"), "{}", out);
}

#[test]
fn random_inputs_do_not_panic() {
    const CASES: usize = 300;
    const MAX_LEN: usize = 256;
    const CHARSET: &[u8] =
        b"abcwxyz01 \n\t#*_`~^+-.!|&<>[]()\\:@/=\"'{}";

    let mut rng = Lcg::new(0x5bd1_e995_9d4c_7f31);
    let exts = Extensions::all();

    for case in 0..CASES {
        let len = rng.gen_range(MAX_LEN + 1);
        let mut doc = Vec::with_capacity(len);
        for _ in 0..len {
            doc.push(CHARSET[rng.gen_range(CHARSET.len())]);
        }

        let result = std::panic::catch_unwind(|| {
            render_html(&doc, exts, HtmlFlags::empty()).map(|out| out.len())
        });
        let Ok(rendered) = result else {
            panic!("render panicked for case {}: {:?}", case, doc);
        };
        if let Ok(out_len) = rendered {
            assert!(
                out_len <= doc.len() * 16 + 4096,
                "case {} output blew up: {} bytes from {}",
                case,
                out_len,
                doc.len()
            );
        }
    }
}

struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 16
    }

    fn gen_range(&mut self, bound: usize) -> usize {
        (self.next() as usize) % bound
    }
}
