//! Reference HTML renderer for duskmark-core, plus a renderer that
//! emits only a table of contents.

use std::fmt::Write;

use bitflags::bitflags;
use duskmark_core::{
    autolink, AutolinkKind, Buffer, Capabilities, Error, Extensions, ListFlags, Markdown, Renderer,
    TableFlags,
};

pub mod escape;

use escape::{escape_href, escape_html};

/// Nesting bound handed to the parser by the convenience entry points.
pub const DEFAULT_MAX_NESTING: usize = 16;

const OUTPUT_UNIT: usize = 64;

bitflags! {
    /// Behaviour switches for [`HtmlRenderer`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HtmlFlags: u32 {
        /// Drop raw HTML, inline and block.
        const SKIP_HTML = 1 << 0;
        /// Drop `<style>` tags.
        const SKIP_STYLE = 1 << 1;
        /// Drop images, Markdown and raw.
        const SKIP_IMAGES = 1 << 2;
        /// Drop links, Markdown and raw.
        const SKIP_LINKS = 1 << 3;
        /// Accepted for compatibility; the parser always expands tabs.
        const EXPAND_TABS = 1 << 4;
        /// Only link to whitelisted schemes and relative references.
        const SAFELINK = 1 << 5;
        /// Give headers `toc_N` anchors for a separate TOC render.
        const TOC = 1 << 6;
        /// Render every paragraph newline as a `<br>`.
        const HARD_WRAP = 1 << 7;
        /// Self-close void elements XHTML style.
        const USE_XHTML = 1 << 8;
        /// Escape all raw HTML; overrides the skip flags.
        const ESCAPE = 1 << 9;
        /// Wrap header-delimited regions in `<section>` elements.
        const OUTLINE = 1 << 10;
    }
}

/// Classification of a raw tag by [`is_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    NotFound,
    Open,
    Close,
}

/// Checks whether a raw tag opens or closes the element `name`.
pub fn is_tag(tag: &[u8], name: &str) -> TagState {
    if tag.len() < 3 || tag[0] != b'<' {
        return TagState::NotFound;
    }

    let mut i = 1;
    let mut closed = false;
    if tag[i] == b'/' {
        closed = true;
        i += 1;
    }

    let name = name.as_bytes();
    let mut t = 0;
    while i < tag.len() && t < name.len() {
        if tag[i] != name[t] {
            return TagState::NotFound;
        }
        i += 1;
        t += 1;
    }

    if i == tag.len() {
        return TagState::NotFound;
    }

    if tag[i].is_ascii_whitespace() || tag[i] == b'>' {
        return if closed { TagState::Close } else { TagState::Open };
    }
    TagState::NotFound
}

/// The reference HTML renderer.
#[derive(Debug)]
pub struct HtmlRenderer {
    flags: HtmlFlags,
    toc_count: u32,
    outline_level: u32,
    open_sections: u32,
}

impl HtmlRenderer {
    pub fn new(flags: HtmlFlags) -> Self {
        HtmlRenderer {
            flags,
            toc_count: 0,
            outline_level: 0,
            open_sections: 0,
        }
    }

    fn put_line_break(&self, ob: &mut Buffer) {
        ob.put_str(if self.flags.contains(HtmlFlags::USE_XHTML) {
            "<br/>\n"
        } else {
            "<br>\n"
        });
    }
}

impl Renderer for HtmlRenderer {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::all();
        if self.flags.contains(HtmlFlags::SKIP_IMAGES) {
            caps.remove(Capabilities::IMAGE);
        }
        if self.flags.contains(HtmlFlags::SKIP_LINKS) {
            caps.remove(Capabilities::LINK | Capabilities::AUTOLINK);
        }
        if self.flags.intersects(HtmlFlags::SKIP_HTML | HtmlFlags::ESCAPE) {
            caps.remove(Capabilities::BLOCK_HTML);
        }
        caps
    }

    fn block_code(&mut self, ob: &mut Buffer, text: &[u8], lang: Option<&[u8]>) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }

        match lang.filter(|l| !l.is_empty()) {
            Some(lang) => {
                ob.put_str("<pre><code class=\"");
                // whitespace-separated class tokens; a leading dot is
                // dropped so `{.c}` and `c` come out the same
                let mut i = 0;
                let mut cls = 0;
                while i < lang.len() {
                    while i < lang.len() && lang[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i < lang.len() {
                        let mut org = i;
                        while i < lang.len() && !lang[i].is_ascii_whitespace() {
                            i += 1;
                        }
                        if lang[org] == b'.' {
                            org += 1;
                        }
                        if cls > 0 {
                            ob.put_char(b' ');
                        }
                        escape_html(ob, &lang[org..i]);
                        cls += 1;
                    }
                }
                ob.put_str("\">");
            }
            None => ob.put_str("<pre><code>"),
        }

        escape_html(ob, text);
        ob.put_str("</code></pre>\n");
    }

    fn block_quote(&mut self, ob: &mut Buffer, content: &[u8]) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }
        ob.put_str("<blockquote>\n");
        ob.put(content);
        ob.put_str("</blockquote>\n");
    }

    fn block_html(&mut self, ob: &mut Buffer, text: &[u8]) {
        let mut sz = text.len();
        while sz > 0 && text[sz - 1] == b'\n' {
            sz -= 1;
        }
        let mut org = 0;
        while org < sz && text[org] == b'\n' {
            org += 1;
        }
        if org >= sz {
            return;
        }

        if !ob.is_empty() {
            ob.put_char(b'\n');
        }
        ob.put(&text[org..sz]);
        ob.put_char(b'\n');
    }

    fn header(&mut self, ob: &mut Buffer, content: &[u8], level: u32) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }

        if self.flags.contains(HtmlFlags::OUTLINE) {
            if self.outline_level >= level {
                ob.put_str("</section>");
                self.open_sections -= 1;
            }
            let _ = write!(ob, "<section class=\"section{}\">\n", level);
            self.open_sections += 1;
            self.outline_level = level;
        }

        if self.flags.contains(HtmlFlags::TOC) {
            let _ = write!(ob, "<h{} id=\"toc_{}\">", level, self.toc_count);
            self.toc_count += 1;
        } else {
            let _ = write!(ob, "<h{}>", level);
        }

        ob.put(content);
        let _ = write!(ob, "</h{}>\n", level);
    }

    fn hrule(&mut self, ob: &mut Buffer) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }
        ob.put_str(if self.flags.contains(HtmlFlags::USE_XHTML) {
            "<hr/>\n"
        } else {
            "<hr>\n"
        });
    }

    fn list(&mut self, ob: &mut Buffer, content: &[u8], flags: ListFlags) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }
        ob.put_str(if flags.contains(ListFlags::ORDERED) {
            "<ol>\n"
        } else {
            "<ul>\n"
        });
        ob.put(content);
        ob.put_str(if flags.contains(ListFlags::ORDERED) {
            "</ol>\n"
        } else {
            "</ul>\n"
        });
    }

    fn list_item(&mut self, ob: &mut Buffer, content: &[u8], _flags: ListFlags) {
        ob.put_str("<li>");
        let mut size = content.len();
        while size > 0 && content[size - 1] == b'\n' {
            size -= 1;
        }
        ob.put(&content[..size]);
        ob.put_str("</li>\n");
    }

    fn paragraph(&mut self, ob: &mut Buffer, text: &[u8]) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }

        let mut i = 0;
        while i < text.len() && text[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == text.len() {
            return;
        }

        ob.put_str("<p>");
        if self.flags.contains(HtmlFlags::HARD_WRAP) {
            while i < text.len() {
                let org = i;
                while i < text.len() && text[i] != b'\n' {
                    i += 1;
                }
                if i > org {
                    ob.put(&text[org..i]);
                }
                // the trailing newline of a paragraph is not a break
                if i >= text.len() - 1 {
                    break;
                }
                self.put_line_break(ob);
                i += 1;
            }
        } else {
            ob.put(&text[i..]);
        }
        ob.put_str("</p>\n");
    }

    fn table(&mut self, ob: &mut Buffer, header: &[u8], body: &[u8]) {
        if !ob.is_empty() {
            ob.put_char(b'\n');
        }
        ob.put_str("<table><thead>\n");
        ob.put(header);
        ob.put_str("</thead><tbody>\n");
        ob.put(body);
        ob.put_str("</tbody></table>\n");
    }

    fn table_row(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put_str("<tr>\n");
        ob.put(content);
        ob.put_str("</tr>\n");
    }

    fn table_cell(&mut self, ob: &mut Buffer, content: &[u8], flags: TableFlags) {
        if flags.contains(TableFlags::HEADER) {
            ob.put_str("<th");
        } else {
            ob.put_str("<td");
        }

        let align = flags.alignment();
        if align == TableFlags::ALIGN_CENTER {
            ob.put_str(" style=\"text-align: center\">");
        } else if align == TableFlags::ALIGN_LEFT {
            ob.put_str(" style=\"text-align: left\">");
        } else if align == TableFlags::ALIGN_RIGHT {
            ob.put_str(" style=\"text-align: right\">");
        } else {
            ob.put_char(b'>');
        }

        ob.put(content);

        if flags.contains(TableFlags::HEADER) {
            ob.put_str("</th>\n");
        } else {
            ob.put_str("</td>\n");
        }
    }

    fn footnotes(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put_str("<div class=\"footnotes\">\n<hr />\n<ol>\n");
        ob.put(content);
        ob.put_str("\n</ol>\n</div>\n");
    }

    fn footnote_def(&mut self, ob: &mut Buffer, content: &[u8], num: u32) {
        // the backref anchor goes at the end of the first paragraph
        let mut i = 0;
        let mut pfound = false;
        while i + 3 < content.len() {
            if content[i] == b'<'
                && content[i + 1] == b'/'
                && content[i + 2] == b'p'
                && content[i + 3] == b'>'
            {
                pfound = true;
                break;
            }
            i += 1;
        }

        let _ = write!(ob, "\n<li id=\"fn{}\">\n", num);
        if pfound {
            ob.put(&content[..i]);
            let _ = write!(
                ob,
                "&nbsp;<a href=\"#fnref{}\" rev=\"footnote\">&#8617;</a>",
                num
            );
            ob.put(&content[i..]);
        } else {
            ob.put(content);
        }
        ob.put_str("</li>\n");
    }

    fn autolink(&mut self, ob: &mut Buffer, link: &[u8], kind: AutolinkKind) -> bool {
        if link.is_empty() {
            return false;
        }
        if self.flags.contains(HtmlFlags::SAFELINK)
            && !autolink::is_safe(link)
            && kind != AutolinkKind::Email
        {
            return false;
        }

        ob.put_str("<a href=\"");
        if kind == AutolinkKind::Email {
            ob.put_str("mailto:");
        }
        escape_href(ob, link);
        ob.put_str("\">");

        // an explicit mailto: URI keeps only the address as its text
        if link.starts_with(b"mailto:") {
            escape_html(ob, &link[7..]);
        } else {
            escape_html(ob, link);
        }

        ob.put_str("</a>");
        true
    }

    fn code_span(&mut self, ob: &mut Buffer, text: &[u8]) -> bool {
        ob.put_str("<code>");
        escape_html(ob, text);
        ob.put_str("</code>");
        true
    }

    fn emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_emphasis(ob, content)
    }

    fn double_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_double_emphasis(ob, content)
    }

    fn triple_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_triple_emphasis(ob, content)
    }

    fn strikethrough(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_strikethrough(ob, content)
    }

    fn ins(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_ins(ob, content)
    }

    fn superscript(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_superscript(ob, content)
    }

    fn image(
        &mut self,
        ob: &mut Buffer,
        link: &[u8],
        title: Option<&[u8]>,
        alt: &[u8],
    ) -> bool {
        if link.is_empty() {
            return false;
        }

        ob.put_str("<img src=\"");
        escape_href(ob, link);
        ob.put_str("\" alt=\"");
        if !alt.is_empty() {
            escape_html(ob, alt);
        }
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            ob.put_str("\" title=\"");
            escape_html(ob, title);
        }
        ob.put_str(if self.flags.contains(HtmlFlags::USE_XHTML) {
            "\"/>"
        } else {
            "\">"
        });
        true
    }

    fn line_break(&mut self, ob: &mut Buffer) -> bool {
        self.put_line_break(ob);
        true
    }

    fn link(
        &mut self,
        ob: &mut Buffer,
        link: &[u8],
        title: Option<&[u8]>,
        content: &[u8],
    ) -> bool {
        if !link.is_empty()
            && self.flags.contains(HtmlFlags::SAFELINK)
            && !autolink::is_safe(link)
        {
            return false;
        }

        ob.put_str("<a href=\"");
        if !link.is_empty() {
            escape_href(ob, link);
        }
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            ob.put_str("\" title=\"");
            escape_html(ob, title);
        }
        ob.put_str("\">");
        ob.put(content);
        ob.put_str("</a>");
        true
    }

    fn raw_html_tag(&mut self, ob: &mut Buffer, tag: &[u8]) -> bool {
        // ESCAPE wins over every skip flag: everything is shown, escaped
        if self.flags.contains(HtmlFlags::ESCAPE) {
            escape_html(ob, tag);
            return true;
        }
        if self.flags.contains(HtmlFlags::SKIP_HTML) {
            return true;
        }
        if self.flags.contains(HtmlFlags::SKIP_STYLE)
            && is_tag(tag, "style") != TagState::NotFound
        {
            return true;
        }
        if self.flags.contains(HtmlFlags::SKIP_LINKS) && is_tag(tag, "a") != TagState::NotFound {
            return true;
        }
        if self.flags.contains(HtmlFlags::SKIP_IMAGES)
            && is_tag(tag, "img") != TagState::NotFound
        {
            return true;
        }

        ob.put(tag);
        true
    }

    fn footnote_ref(&mut self, ob: &mut Buffer, num: u32) -> bool {
        let _ = write!(
            ob,
            "<sup id=\"fnref{num}\"><a href=\"#fn{num}\" rel=\"footnote\">{num}</a></sup>"
        );
        true
    }

    fn normal_text(&mut self, ob: &mut Buffer, text: &[u8]) {
        escape_html(ob, text);
    }

    fn outline(&mut self, ob: &mut Buffer) {
        if self.flags.contains(HtmlFlags::OUTLINE) {
            for _ in 0..self.open_sections {
                ob.put_str("\n</section>\n");
            }
        }
    }
}

/// Renderer that reduces a document to its heading outline.
#[derive(Debug, Default)]
pub struct TocRenderer {
    toc_count: u32,
    current_level: i32,
    level_offset: i32,
}

impl TocRenderer {
    pub fn new() -> Self {
        TocRenderer::default()
    }
}

impl Renderer for TocRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::EMPHASIS
            | Capabilities::DOUBLE_EMPHASIS
            | Capabilities::TRIPLE_EMPHASIS
            | Capabilities::CODE_SPAN
            | Capabilities::LINK
            | Capabilities::STRIKETHROUGH
            | Capabilities::INS
            | Capabilities::SUPERSCRIPT
    }

    fn header(&mut self, ob: &mut Buffer, content: &[u8], level: u32) {
        // the first header seen anchors the outline's top level
        if self.current_level == 0 {
            self.level_offset = level as i32 - 1;
        }
        let level = level as i32 - self.level_offset;

        if level > self.current_level {
            while level > self.current_level {
                ob.put_str("<ul>\n<li>\n");
                self.current_level += 1;
            }
        } else if level < self.current_level {
            ob.put_str("</li>\n");
            while level < self.current_level {
                ob.put_str("</ul>\n</li>\n");
                self.current_level -= 1;
            }
            ob.put_str("<li>\n");
        } else {
            ob.put_str("</li>\n<li>\n");
        }

        let _ = write!(ob, "<a href=\"#toc_{}\">", self.toc_count);
        self.toc_count += 1;
        escape_html(ob, content);
        ob.put_str("</a>\n");
    }

    fn code_span(&mut self, ob: &mut Buffer, text: &[u8]) -> bool {
        ob.put_str("<code>");
        escape_html(ob, text);
        ob.put_str("</code>");
        true
    }

    fn emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_emphasis(ob, content)
    }

    fn double_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_double_emphasis(ob, content)
    }

    fn triple_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_triple_emphasis(ob, content)
    }

    fn strikethrough(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_strikethrough(ob, content)
    }

    fn ins(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_ins(ob, content)
    }

    fn superscript(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        put_superscript(ob, content)
    }

    fn link(
        &mut self,
        ob: &mut Buffer,
        _link: &[u8],
        _title: Option<&[u8]>,
        content: &[u8],
    ) -> bool {
        // links flatten to their text inside a TOC
        ob.put(content);
        true
    }

    fn doc_footer(&mut self, ob: &mut Buffer) {
        while self.current_level > 0 {
            ob.put_str("</li>\n</ul>\n");
            self.current_level -= 1;
        }
    }
}

fn put_emphasis(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<em>");
    ob.put(content);
    ob.put_str("</em>");
    true
}

fn put_double_emphasis(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<strong>");
    ob.put(content);
    ob.put_str("</strong>");
    true
}

fn put_triple_emphasis(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<strong><em>");
    ob.put(content);
    ob.put_str("</em></strong>");
    true
}

fn put_strikethrough(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<del>");
    ob.put(content);
    ob.put_str("</del>");
    true
}

fn put_ins(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<ins>");
    ob.put(content);
    ob.put_str("</ins>");
    true
}

fn put_superscript(ob: &mut Buffer, content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    ob.put_str("<sup>");
    ob.put(content);
    ob.put_str("</sup>");
    true
}

/// Renders `doc` to HTML with the reference renderer.
pub fn render_html(
    doc: &[u8],
    extensions: Extensions,
    flags: HtmlFlags,
) -> Result<Vec<u8>, Error> {
    let mut renderer = HtmlRenderer::new(flags);
    let mut md = Markdown::new(&mut renderer, extensions, DEFAULT_MAX_NESTING);
    let mut ob = Buffer::new(OUTPUT_UNIT);
    md.render(&mut ob, doc)?;
    Ok(ob.into_vec())
}

/// Renders only the heading outline of `doc`.
pub fn render_toc(doc: &[u8], extensions: Extensions) -> Result<Vec<u8>, Error> {
    let mut renderer = TocRenderer::new();
    let mut md = Markdown::new(&mut renderer, extensions, DEFAULT_MAX_NESTING);
    let mut ob = Buffer::new(OUTPUT_UNIT);
    md.render(&mut ob, doc)?;
    Ok(ob.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(doc: &str) -> String {
        String::from_utf8(render_html(doc.as_bytes(), Extensions::empty(), HtmlFlags::empty()).unwrap())
            .unwrap()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        assert_eq!(html("a\n\nb\n"), "<p>a</p>\n\n<p>b</p>\n");
    }

    #[test]
    fn atx_and_setext_headers() {
        assert_eq!(html("# Title\n"), "<h1>Title</h1>\n");
        assert_eq!(html("## Sub ##\n"), "<h2>Sub</h2>\n");
        assert_eq!(html("Title\n=====\n"), "<h1>Title</h1>\n");
        assert_eq!(html("Title\n-----\n"), "<h2>Title</h2>\n");
    }

    #[test]
    fn emphasis_variants() {
        assert_eq!(html("*a*\n"), "<p><em>a</em></p>\n");
        assert_eq!(html("__a__\n"), "<p><strong>a</strong></p>\n");
        assert_eq!(html("***a***\n"), "<p><strong><em>a</em></strong></p>\n");
    }

    #[test]
    fn unterminated_emphasis_stays_literal() {
        assert_eq!(html("*a\n"), "<p>*a</p>\n");
        assert_eq!(html("**a\n"), "<p>**a</p>\n");
    }

    #[test]
    fn code_span_trims_one_space() {
        assert_eq!(html("`` `x` ``\n"), "<p><code>`x`</code></p>\n");
        assert_eq!(html("`a < b`\n"), "<p><code>a &lt; b</code></p>\n");
    }

    #[test]
    fn normal_text_is_escaped() {
        assert_eq!(html("1 < 2 & 3\n"), "<p>1 &lt; 2 &amp; 3</p>\n");
    }

    #[test]
    fn safelink_refuses_bad_schemes() {
        let out = render_html(
            b"[x](javascript:alert\\(1\\))\n",
            Extensions::empty(),
            HtmlFlags::SAFELINK,
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(!out.contains("<a"), "{}", out);

        let out = render_html(b"[x](/ok)\n", Extensions::empty(), HtmlFlags::SAFELINK).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("<a href=\"/ok\">x</a>"));
    }

    #[test]
    fn xhtml_closers() {
        let out = render_html(b"---\n", Extensions::empty(), HtmlFlags::USE_XHTML).unwrap();
        assert_eq!(out, b"<hr/>\n");
    }

    #[test]
    fn hard_wrap_breaks_inner_newlines() {
        let out = render_html(b"a\nb\n", Extensions::empty(), HtmlFlags::HARD_WRAP).unwrap();
        assert_eq!(out, b"<p>a<br>\nb</p>\n");
    }

    #[test]
    fn skip_html_drops_raw_tags() {
        let out = render_html(b"a <em>b</em>\n", Extensions::empty(), HtmlFlags::SKIP_HTML)
            .unwrap();
        assert_eq!(out, b"<p>a b</p>\n");
    }

    #[test]
    fn escape_mode_shows_raw_tags_escaped() {
        let out = render_html(b"a <em>b</em>\n", Extensions::empty(), HtmlFlags::ESCAPE).unwrap();
        assert_eq!(out, b"<p>a &lt;em&gt;b&lt;/em&gt;</p>\n");
    }

    #[test]
    fn toc_renderer_builds_nested_outline() {
        let out = render_toc(b"# A\n\n## B\n\n# C\n", Extensions::empty()).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "<ul>\n<li>\n<a href=\"#toc_0\">A</a>\n<ul>\n<li>\n<a href=\"#toc_1\">B</a>\n\
             </li>\n</ul>\n</li>\n<li>\n<a href=\"#toc_2\">C</a>\n</li>\n</ul>\n"
        );
    }

    #[test]
    fn toc_anchors_match_header_ids() {
        let out = render_html(b"# A\n\n## B\n", Extensions::empty(), HtmlFlags::TOC).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("<h1 id=\"toc_0\">A</h1>"));
        assert!(out.contains("<h2 id=\"toc_1\">B</h2>"));
    }

    #[test]
    fn outline_wraps_sections() {
        let out = render_html(
            b"# A\n\ntext\n\n# B\n",
            Extensions::empty(),
            HtmlFlags::OUTLINE,
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("<section class=\"section1\">\n<h1>A</h1>\n"));
        assert!(out.contains("</section><section class=\"section1\">\n<h1>B</h1>\n"));
        assert!(out.ends_with("\n</section>\n"));
    }

    #[test]
    fn is_tag_classifies() {
        assert_eq!(is_tag(b"<style>", "style"), TagState::Open);
        assert_eq!(is_tag(b"</style>", "style"), TagState::Close);
        assert_eq!(is_tag(b"<styled>", "style"), TagState::NotFound);
        assert_eq!(is_tag(b"<a href=\"x\">", "a"), TagState::Open);
    }
}
