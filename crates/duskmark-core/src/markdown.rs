//! Two-pass Markdown parser.
//!
//! Pass 1 walks the raw document collecting link reference and footnote
//! definitions, expanding tabs and normalising line endings into an
//! intermediate buffer. Pass 2 runs the block recognisers over that
//! buffer; block bodies are handed to the inline tokeniser, which
//! dispatches on a 256-entry active-character map. All output goes
//! through the borrowed [`Renderer`].

use std::collections::HashMap;
use std::mem;

use memchr::memchr;

use crate::autolink;
use crate::buffer::{Buffer, BufferPool, Error};
use crate::render::{AutolinkKind, Capabilities, Extensions, ListFlags, Renderer, TableFlags};
use crate::tags::find_block_tag;

const BLOCK_UNIT: usize = 256;
const SPAN_UNIT: usize = 64;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Inline constructs a byte can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    None,
    Emphasis,
    CodeSpan,
    LineBreak,
    Link,
    LeftAngle,
    Escape,
    Entity,
    AutolinkUrl,
    AutolinkEmail,
    AutolinkWww,
    Superscript,
}

#[derive(Debug)]
struct LinkRef {
    link: Vec<u8>,
    title: Option<Vec<u8>>,
}

#[derive(Debug)]
struct FootnoteDef {
    used: bool,
    num: u32,
    contents: Vec<u8>,
}

struct Fence {
    end: usize,
    syntax: (usize, usize),
    ch: u8,
    width: usize,
}

/// One render's worth of parser state. Not reusable across threads; a
/// second concurrent render needs a second instance.
pub struct Markdown<'r, R: Renderer> {
    renderer: &'r mut R,
    exts: Extensions,
    caps: Capabilities,
    max_nesting: usize,
    active: [Trigger; 256],
    refs: HashMap<Vec<u8>, LinkRef>,
    footnotes: HashMap<Vec<u8>, FootnoteDef>,
    footnote_order: Vec<Vec<u8>>,
    footnote_count: u32,
    block_pool: BufferPool,
    span_pool: BufferPool,
    in_link_body: bool,
}

impl<'r, R: Renderer> Markdown<'r, R> {
    pub fn new(renderer: &'r mut R, extensions: Extensions, max_nesting: usize) -> Self {
        debug_assert!(max_nesting > 0);

        let caps = renderer.capabilities();
        let mut active = [Trigger::None; 256];

        if caps.intersects(
            Capabilities::EMPHASIS | Capabilities::DOUBLE_EMPHASIS | Capabilities::TRIPLE_EMPHASIS,
        ) {
            active[b'*' as usize] = Trigger::Emphasis;
            active[b'_' as usize] = Trigger::Emphasis;
            if extensions.contains(Extensions::STRIKETHROUGH) {
                active[b'~' as usize] = Trigger::Emphasis;
            }
            if extensions.contains(Extensions::INS) {
                active[b'+' as usize] = Trigger::Emphasis;
            }
        }

        if caps.contains(Capabilities::CODE_SPAN) {
            active[b'`' as usize] = Trigger::CodeSpan;
        }
        if caps.contains(Capabilities::LINE_BREAK) {
            active[b'\n' as usize] = Trigger::LineBreak;
        }
        if caps.intersects(Capabilities::LINK | Capabilities::IMAGE) {
            active[b'[' as usize] = Trigger::Link;
        }

        active[b'<' as usize] = Trigger::LeftAngle;
        active[b'\\' as usize] = Trigger::Escape;
        active[b'&' as usize] = Trigger::Entity;

        if extensions.contains(Extensions::AUTOLINK) {
            active[b':' as usize] = Trigger::AutolinkUrl;
            active[b'@' as usize] = Trigger::AutolinkEmail;
            active[b'w' as usize] = Trigger::AutolinkWww;
        }
        if extensions.contains(Extensions::SUPERSCRIPT) {
            active[b'^' as usize] = Trigger::Superscript;
        }

        Markdown {
            renderer,
            exts: extensions,
            caps,
            max_nesting,
            active,
            refs: HashMap::new(),
            footnotes: HashMap::new(),
            footnote_order: Vec::new(),
            footnote_count: 0,
            block_pool: BufferPool::new(BLOCK_UNIT),
            span_pool: BufferPool::new(SPAN_UNIT),
            in_link_body: false,
        }
    }

    /// Renders `doc` into `ob`. Fails only when a buffer would outgrow
    /// the allocation cap; malformed input never errors.
    pub fn render(&mut self, ob: &mut Buffer, doc: &[u8]) -> Result<(), Error> {
        self.refs.clear();
        self.footnotes.clear();
        self.footnote_order.clear();
        self.footnote_count = 0;
        self.in_link_body = false;

        let mut text = Buffer::new(SPAN_UNIT);
        text.grow(doc.len())?;

        let footnotes_enabled = self.exts.contains(Extensions::FOOTNOTES);

        // First pass: pull out definitions, push everything else through
        // tab expansion and newline normalisation.
        let mut beg = 0;
        if doc.len() >= 3 && &doc[..3] == UTF8_BOM {
            beg += 3;
        }

        while beg < doc.len() {
            if footnotes_enabled {
                if let Some(last) = self.scan_footnote_def(doc, beg) {
                    beg = last;
                    continue;
                }
            }
            if let Some(last) = self.scan_link_ref(doc, beg) {
                beg = last;
                continue;
            }

            let mut end = beg;
            while end < doc.len() && doc[end] != b'\n' && doc[end] != b'\r' {
                end += 1;
            }
            if end > beg {
                expand_tabs(&mut text, &doc[beg..end]);
            }
            while end < doc.len() && (doc[end] == b'\n' || doc[end] == b'\r') {
                // one LF per logical newline; the LF of a CRLF pair wins
                if doc[end] == b'\n' || (end + 1 < doc.len() && doc[end + 1] != b'\n') {
                    text.put_char(b'\n');
                }
                end += 1;
            }
            beg = end;
        }

        ob.grow(text.len() + text.len() / 2)?;

        // Second pass: actual rendering.
        self.renderer.doc_header(ob);

        if !text.is_empty() {
            if !matches!(text.last(), Some(&b'\n') | Some(&b'\r')) {
                text.put_char(b'\n');
            }
            self.parse_block(ob, text.as_slice());
        }

        if footnotes_enabled {
            self.render_footnotes(ob);
        }

        self.renderer.doc_footer(ob);
        self.renderer.outline(ob);

        debug_assert_eq!(self.span_pool.live(), 0);
        debug_assert_eq!(self.block_pool.live(), 0);
        Ok(())
    }

    /* Reference scanning (pass 1) */

    fn scan_link_ref(&mut self, data: &[u8], beg: usize) -> Option<usize> {
        let end = data.len();
        if beg + 3 >= end {
            return None;
        }

        // up to 3 optional leading spaces
        let mut i = 0;
        if data[beg] == b' ' {
            i = 1;
            if data[beg + 1] == b' ' {
                i = 2;
                if data[beg + 2] == b' ' {
                    i = 3;
                    if data[beg + 3] == b' ' {
                        return None;
                    }
                }
            }
        }
        i += beg;

        // id part: anything but a newline between brackets
        if data[i] != b'[' {
            return None;
        }
        i += 1;
        let id_offset = i;
        while i < end && data[i] != b'\n' && data[i] != b'\r' && data[i] != b']' {
            i += 1;
        }
        if i >= end || data[i] != b']' {
            return None;
        }
        let id_end = i;

        // spacer: colon (space)* newline? (space)*
        i += 1;
        if i >= end || data[i] != b':' {
            return None;
        }
        i += 1;
        while i < end && data[i] == b' ' {
            i += 1;
        }
        if i < end && (data[i] == b'\n' || data[i] == b'\r') {
            i += 1;
            if i < end && data[i] == b'\r' && data[i - 1] == b'\n' {
                i += 1;
            }
        }
        while i < end && data[i] == b' ' {
            i += 1;
        }
        if i >= end {
            return None;
        }

        // link: whitespace-free sequence, optionally between angle brackets
        if data[i] == b'<' {
            i += 1;
        }
        let link_offset = i;
        while i < end && data[i] != b' ' && data[i] != b'\n' && data[i] != b'\r' {
            i += 1;
        }
        let link_end = if data[i - 1] == b'>' { i - 1 } else { i };

        // optional spacer: (space)* (newline | quote | paren)
        while i < end && data[i] == b' ' {
            i += 1;
        }
        if i < end && !matches!(data[i], b'\n' | b'\r' | b'\'' | b'"' | b'(') {
            return None;
        }

        let mut line_end = 0;
        if i >= end || data[i] == b'\r' || data[i] == b'\n' {
            line_end = i;
        }
        if i + 1 < end && data[i] == b'\n' && data[i + 1] == b'\r' {
            line_end = i + 1;
        }

        if line_end > 0 {
            i = line_end + 1;
            while i < end && data[i] == b' ' {
                i += 1;
            }
        }

        // optional title, alone on its line, closed by a matching quote
        let mut title_offset = 0;
        let mut title_end = 0;
        if i + 1 < end && matches!(data[i], b'\'' | b'"' | b'(') {
            i += 1;
            title_offset = i;
            while i < end && data[i] != b'\n' && data[i] != b'\r' {
                i += 1;
            }
            title_end = if i + 1 < end && data[i] == b'\n' && data[i + 1] == b'\r' {
                i + 1
            } else {
                i
            };
            i -= 1;
            while i > title_offset && data[i] == b' ' {
                i -= 1;
            }
            if i > title_offset && matches!(data[i], b'\'' | b'"' | b')') {
                line_end = title_end;
                title_end = i;
            }
        }

        if line_end == 0 || link_end == link_offset {
            return None;
        }

        let title = if title_end > title_offset {
            Some(data[title_offset..title_end].to_vec())
        } else {
            None
        };
        self.refs.insert(
            fold_label(&data[id_offset..id_end]),
            LinkRef {
                link: data[link_offset..link_end].to_vec(),
                title,
            },
        );

        Some(line_end)
    }

    fn scan_footnote_def(&mut self, data: &[u8], beg: usize) -> Option<usize> {
        let end = data.len();
        if beg + 3 >= end {
            return None;
        }

        let mut i = 0;
        if data[beg] == b' ' {
            i = 1;
            if data[beg + 1] == b' ' {
                i = 2;
                if data[beg + 2] == b' ' {
                    i = 3;
                    if data[beg + 3] == b' ' {
                        return None;
                    }
                }
            }
        }
        i += beg;

        // id part: caret followed by anything between brackets
        if data[i] != b'[' {
            return None;
        }
        i += 1;
        if i >= end || data[i] != b'^' {
            return None;
        }
        i += 1;
        let id_offset = i;
        while i < end && data[i] != b'\n' && data[i] != b'\r' && data[i] != b']' {
            i += 1;
        }
        if i >= end || data[i] != b']' {
            return None;
        }
        let id_end = i;

        i += 1;
        if i >= end || data[i] != b':' {
            return None;
        }
        i += 1;
        while i < end && data[i] == b' ' {
            i += 1;
        }
        if i < end && (data[i] == b'\n' || data[i] == b'\r') {
            i += 1;
            if i < end && data[i] == b'\n' && data[i - 1] == b'\r' {
                i += 1;
            }
        }
        while i < end && data[i] == b' ' {
            i += 1;
        }
        if i >= end || data[i] == b'\n' || data[i] == b'\r' {
            return None;
        }

        // body: continuation lines join like a list item's
        let mut contents = Vec::with_capacity(64);
        let mut start = i;
        let mut in_empty = false;

        while i < end {
            while i < end && data[i] != b'\n' && data[i] != b'\r' {
                i += 1;
            }

            if is_empty(&data[start..i]) != 0 {
                in_empty = true;
                if i < end && (data[i] == b'\n' || data[i] == b'\r') {
                    i += 1;
                    if i < end && data[i] == b'\n' && data[i - 1] == b'\r' {
                        i += 1;
                    }
                }
                start = i;
                continue;
            }

            let mut ind = 0;
            while ind < 4 && start + ind < end && data[start + ind] == b' ' {
                ind += 1;
            }

            // after an empty line only indented content continues the body
            if in_empty && ind == 0 {
                break;
            } else if in_empty {
                contents.push(b'\n');
            }
            in_empty = false;

            contents.extend_from_slice(&data[start + ind..i]);
            if i < end {
                contents.push(b'\n');
                if data[i] == b'\n' || data[i] == b'\r' {
                    i += 1;
                    if i < end && data[i] == b'\n' && data[i - 1] == b'\r' {
                        i += 1;
                    }
                }
            }
            start = i;
        }

        self.footnotes
            .entry(fold_label(&data[id_offset..id_end]))
            .or_insert(FootnoteDef {
                used: false,
                num: 0,
                contents,
            });

        Some(start)
    }

    /* Block-level parsing (pass 2) */

    fn parse_block(&mut self, ob: &mut Buffer, data: &[u8]) {
        if self.span_pool.live() + self.block_pool.live() > self.max_nesting {
            return;
        }

        let size = data.len();
        let mut beg = 0;

        while beg < size {
            let txt = &data[beg..];

            if self.is_atx_header(txt) {
                beg += self.parse_atx_header(ob, txt);
                continue;
            }

            if txt[0] == b'<' && self.caps.contains(Capabilities::BLOCK_HTML) {
                let n = self.parse_html_block(ob, txt, true);
                if n > 0 {
                    beg += n;
                    continue;
                }
            }

            let n = is_empty(txt);
            if n > 0 {
                beg += n;
                continue;
            }

            if is_hrule(txt) {
                self.renderer.hrule(ob);
                while beg < size && data[beg] != b'\n' {
                    beg += 1;
                }
                beg += 1;
                continue;
            }

            if self.exts.contains(Extensions::FENCED_CODE) {
                let n = self.parse_fenced_code(ob, txt);
                if n > 0 {
                    beg += n;
                    continue;
                }
            }

            if self.exts.contains(Extensions::TABLES) {
                let n = self.parse_table(ob, txt);
                if n > 0 {
                    beg += n;
                    continue;
                }
            }

            if prefix_quote(txt) > 0 {
                beg += self.parse_block_quote(ob, txt);
            } else if prefix_code(txt) > 0 {
                beg += self.parse_block_code(ob, txt);
            } else if prefix_uli(txt) > 0 {
                beg += self.parse_list(ob, txt, ListFlags::empty());
            } else if prefix_oli(txt) > 0 {
                beg += self.parse_list(ob, txt, ListFlags::ORDERED);
            } else {
                beg += self.parse_paragraph(ob, txt);
            }
        }
    }

    fn is_atx_header(&self, data: &[u8]) -> bool {
        if data[0] != b'#' {
            return false;
        }
        if self.exts.contains(Extensions::SPACE_HEADERS) {
            let mut level = 0;
            while level < data.len() && level < 6 && data[level] == b'#' {
                level += 1;
            }
            if level < data.len() && data[level] != b' ' {
                return false;
            }
        }
        true
    }

    fn parse_atx_header(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut level = 0;
        while level < size && level < 6 && data[level] == b'#' {
            level += 1;
        }

        let mut i = level;
        while i < size && data[i] == b' ' {
            i += 1;
        }
        let mut end = i;
        while end < size && data[end] != b'\n' {
            end += 1;
        }
        let skip = end;

        while end > 0 && data[end - 1] == b'#' {
            end -= 1;
        }
        while end > 0 && data[end - 1] == b' ' {
            end -= 1;
        }

        if end > i {
            let mut work = self.span_pool.acquire();
            self.parse_inline(&mut work, &data[i..end]);
            self.renderer.header(ob, &work, level as u32);
            self.span_pool.release(work);
        }
        skip
    }

    fn parse_block_quote(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut out = self.block_pool.acquire();
        // prefix-stripped copy; local so quote depth stays one pool slot
        let mut work = Buffer::new(BLOCK_UNIT);

        let mut beg = 0;
        let mut end = 0;
        while beg < size {
            end = line_end(data, beg);

            let pre = prefix_quote(&data[beg..end]);
            if pre > 0 {
                beg += pre;
            } else if is_empty(&data[beg..end]) > 0
                && (end >= size
                    || (prefix_quote(&data[end..]) == 0 && is_empty(&data[end..]) == 0))
            {
                // empty line followed by a non-quote line ends the quote
                break;
            }

            if beg < end {
                work.put(&data[beg..end]);
            }
            beg = end;
        }

        self.parse_block(&mut out, work.as_slice());
        self.renderer.block_quote(ob, &out);
        self.block_pool.release(out);
        end
    }

    fn parse_paragraph(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut i = 0;
        let mut end = 0;
        let mut level = 0;

        while i < size {
            end = line_end(data, i);

            if is_empty(&data[i..]) > 0 {
                break;
            }
            level = is_headerline(&data[i..]);
            if level != 0 {
                break;
            }

            if self.is_atx_header(&data[i..])
                || is_hrule(&data[i..])
                || prefix_quote(&data[i..]) > 0
            {
                end = i;
                break;
            }

            if self.exts.contains(Extensions::LAX_SPACING) && !data[i].is_ascii_alphanumeric() {
                if prefix_oli(&data[i..]) > 0 || prefix_uli(&data[i..]) > 0 {
                    end = i;
                    break;
                }
                if data[i] == b'<'
                    && self.caps.contains(Capabilities::BLOCK_HTML)
                    && self.parse_html_block(ob, &data[i..], false) > 0
                {
                    end = i;
                    break;
                }
                if self.exts.contains(Extensions::FENCED_CODE) && is_codefence(&data[i..]).is_some()
                {
                    end = i;
                    break;
                }
            }

            i = end;
        }

        let mut work_size = i;
        while work_size > 0 && data[work_size - 1] == b'\n' {
            work_size -= 1;
        }

        if level == 0 {
            let mut tmp = self.block_pool.acquire();
            self.parse_inline(&mut tmp, &data[..work_size]);
            self.renderer.paragraph(ob, &tmp);
            self.block_pool.release(tmp);
        } else {
            // setext header: the final line becomes the header, anything
            // before it stays a paragraph
            let mut work_beg = 0;
            if work_size > 0 {
                i = work_size;
                work_size -= 1;
                while work_size > 0 && data[work_size] != b'\n' {
                    work_size -= 1;
                }
                let beg = work_size + 1;
                while work_size > 0 && data[work_size - 1] == b'\n' {
                    work_size -= 1;
                }

                if work_size > 0 {
                    let mut tmp = self.block_pool.acquire();
                    self.parse_inline(&mut tmp, &data[..work_size]);
                    self.renderer.paragraph(ob, &tmp);
                    self.block_pool.release(tmp);

                    work_beg = beg;
                    work_size = i - beg;
                } else {
                    work_size = i;
                }
            }

            let mut header_work = self.span_pool.acquire();
            self.parse_inline(&mut header_work, &data[work_beg..work_beg + work_size]);
            self.renderer.header(ob, &header_work, level);
            self.span_pool.release(header_work);
        }

        end
    }

    fn parse_fenced_code(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let opening = match is_codefence(data) {
            Some(f) => f,
            None => return 0,
        };

        let mut work = self.block_pool.acquire();
        let mut beg = opening.end;

        while beg < size {
            if let Some(closing) = is_codefence(&data[beg..]) {
                // the closer must match the opening fence and carry no
                // info string
                if closing.syntax.0 == closing.syntax.1
                    && closing.ch == opening.ch
                    && closing.width >= opening.width
                {
                    beg += closing.end;
                    break;
                }
            }

            let end = line_end(data, beg);
            if beg < end {
                if is_empty(&data[beg..end]) > 0 {
                    work.put_char(b'\n');
                } else {
                    work.put(&data[beg..end]);
                }
            }
            beg = end;
        }

        if !work.is_empty() && work[work.len() - 1] != b'\n' {
            work.put_char(b'\n');
        }

        let lang = &data[opening.syntax.0..opening.syntax.1];
        self.renderer
            .block_code(ob, &work, if lang.is_empty() { None } else { Some(lang) });
        self.block_pool.release(work);
        beg
    }

    fn parse_block_code(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut work = self.block_pool.acquire();

        let mut beg = 0;
        while beg < size {
            let end = line_end(data, beg);

            let pre = prefix_code(&data[beg..end]);
            if pre > 0 {
                beg += pre;
            } else if is_empty(&data[beg..end]) == 0 {
                // non-empty non-prefixed line breaks the block
                break;
            }

            if beg < end {
                if is_empty(&data[beg..end]) > 0 {
                    work.put_char(b'\n');
                } else {
                    work.put(&data[beg..end]);
                }
            }
            beg = end;
        }

        let mut len = work.len();
        while len > 0 && work[len - 1] == b'\n' {
            len -= 1;
        }
        work.truncate(len);
        work.put_char(b'\n');

        self.renderer.block_code(ob, &work, None);
        self.block_pool.release(work);
        beg
    }

    /// Parses one list item, the initial prefix already verified by the
    /// caller. `flags` picks up END/BLOCK bits as the item closes.
    fn parse_list_item(&mut self, ob: &mut Buffer, data: &[u8], flags: &mut ListFlags) -> usize {
        let size = data.len();

        let mut orgpre = 0;
        while orgpre < 3 && orgpre < size && data[orgpre] == b' ' {
            orgpre += 1;
        }

        let mut beg = prefix_uli(data);
        if beg == 0 {
            beg = prefix_oli(data);
        }
        if beg == 0 {
            return 0;
        }

        let mut end = line_end(data, beg);

        let mut work = self.span_pool.acquire();
        let mut inter = self.span_pool.acquire();

        work.put(&data[beg..end]);
        beg = end;

        let mut sublist = 0;
        let mut in_empty = false;
        let mut has_inside_empty = false;
        let mut in_fence = false;

        while beg < size {
            end = line_end(data, beg);

            if is_empty(&data[beg..end]) > 0 {
                in_empty = true;
                beg = end;
                continue;
            }

            let mut i = 0;
            while i < 4 && beg + i < end && data[beg + i] == b' ' {
                i += 1;
            }
            let pre = i;

            if self.exts.contains(Extensions::FENCED_CODE)
                && is_codefence(&data[beg + i..end]).is_some()
            {
                in_fence = !in_fence;
            }

            // no sub-item detection inside a fenced block
            let (has_next_uli, has_next_oli) = if in_fence {
                (0, 0)
            } else {
                (
                    prefix_uli(&data[beg + i..end]),
                    prefix_oli(&data[beg + i..end]),
                )
            };

            // ul/ol switch at the same indent closes the list
            if in_empty
                && ((flags.contains(ListFlags::ORDERED) && has_next_uli > 0)
                    || (!flags.contains(ListFlags::ORDERED) && has_next_oli > 0))
            {
                *flags |= ListFlags::END;
                break;
            }

            if (has_next_uli > 0 && !is_hrule(&data[beg + i..end])) || has_next_oli > 0 {
                if in_empty {
                    has_inside_empty = true;
                }
                if pre == orgpre {
                    // same indentation: a sibling item, not a sub-list
                    break;
                }
                if sublist == 0 {
                    sublist = work.len();
                }
            } else if in_empty && pre == 0 {
                *flags |= ListFlags::END;
                break;
            } else if in_empty {
                work.put_char(b'\n');
                has_inside_empty = true;
            }

            in_empty = false;
            work.put(&data[beg + i..end]);
            beg = end;
        }

        if has_inside_empty {
            *flags |= ListFlags::BLOCK;
        }

        if flags.contains(ListFlags::BLOCK) {
            if sublist > 0 && sublist < work.len() {
                self.parse_block(&mut inter, &work[..sublist]);
                self.parse_block(&mut inter, &work[sublist..]);
            } else {
                self.parse_block(&mut inter, work.as_slice());
            }
        } else if sublist > 0 && sublist < work.len() {
            self.parse_inline(&mut inter, &work[..sublist]);
            self.parse_block(&mut inter, &work[sublist..]);
        } else {
            self.parse_inline(&mut inter, work.as_slice());
        }

        self.renderer.list_item(ob, &inter, *flags);
        self.span_pool.release(inter);
        self.span_pool.release(work);
        beg
    }

    fn parse_list(&mut self, ob: &mut Buffer, data: &[u8], mut flags: ListFlags) -> usize {
        let mut work = self.block_pool.acquire();

        let mut i = 0;
        while i < data.len() {
            let j = self.parse_list_item(&mut work, &data[i..], &mut flags);
            i += j;
            if j == 0 || flags.contains(ListFlags::END) {
                break;
            }
        }

        self.renderer.list(ob, &work, flags);
        self.block_pool.release(work);
        i
    }

    fn parse_html_block(&mut self, ob: &mut Buffer, data: &[u8], do_render: bool) -> usize {
        let size = data.len();
        if size < 2 || data[0] != b'<' {
            return 0;
        }

        let mut i = 1;
        while i < size && data[i] != b'>' && data[i] != b' ' {
            i += 1;
        }
        let curtag = if i < size {
            find_block_tag(&data[1..i])
        } else {
            None
        };

        let Some(curtag) = curtag else {
            // HTML comment, laxist form
            if size > 5 && data[1] == b'!' && data[2] == b'-' && data[3] == b'-' {
                let mut i = 5;
                while i < size && !(data[i - 2] == b'-' && data[i - 1] == b'-' && data[i] == b'>') {
                    i += 1;
                }
                i += 1;
                if i < size {
                    let j = is_empty(&data[i..]);
                    if j > 0 {
                        if do_render {
                            self.renderer.block_html(ob, &data[..i + j]);
                        }
                        return i + j;
                    }
                }
            }

            // HR, the only self-closing block tag considered
            if size > 4
                && (data[1] == b'h' || data[1] == b'H')
                && (data[2] == b'r' || data[2] == b'R')
            {
                let mut i = 3;
                while i < size && data[i] != b'>' {
                    i += 1;
                }
                if i + 1 < size {
                    i += 1;
                    let j = is_empty(&data[i..]);
                    if j > 0 {
                        if do_render {
                            self.renderer.block_html(ob, &data[..i + j]);
                        }
                        return i + j;
                    }
                }
            }

            return 0;
        };

        // unindented matching close tag followed by a blank line; then a
        // relaxed pass allowing an indented close (not for ins/del)
        let mut tag_end = htmlblock_end(curtag, data, true);
        if tag_end == 0 && curtag != "ins" && curtag != "del" {
            tag_end = htmlblock_end(curtag, data, false);
        }
        if tag_end == 0 {
            return 0;
        }

        if do_render {
            self.renderer.block_html(ob, &data[..tag_end]);
        }
        tag_end
    }

    /* Tables */

    fn parse_table_row(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
        columns: usize,
        col_data: &[TableFlags],
        header_flag: TableFlags,
    ) {
        if !self.caps.contains(Capabilities::TABLES) {
            return;
        }

        let size = data.len();
        let mut row_work = self.span_pool.acquire();

        let mut i = 0;
        if i < size && data[i] == b'|' {
            i += 1;
        }

        let mut col = 0;
        while col < columns && i < size {
            let mut cell_work = self.span_pool.acquire();

            while i < size && is_md_space(data[i]) {
                i += 1;
            }
            let cell_start = i;
            while i < size && (data[i] != b'|' || (i > 0 && data[i - 1] == b'\\')) {
                i += 1;
            }
            let mut cell_end = i - 1;
            while cell_end > cell_start && is_md_space(data[cell_end]) {
                cell_end -= 1;
            }

            let len = cell_end + 1 - cell_start;
            self.parse_inline(&mut cell_work, &data[cell_start..cell_start + len]);
            self.renderer
                .table_cell(&mut row_work, &cell_work, col_data[col] | header_flag);
            self.span_pool.release(cell_work);

            i += 1;
            col += 1;
        }

        // missing cells render empty
        while col < columns {
            self.renderer
                .table_cell(&mut row_work, b"", col_data[col] | header_flag);
            col += 1;
        }

        self.renderer.table_row(ob, &row_work);
        self.span_pool.release(row_work);
    }

    fn parse_table_header(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
    ) -> Option<(usize, Vec<TableFlags>)> {
        let size = data.len();

        let mut pipes = 0i32;
        let mut i = 0;
        while i < size && data[i] != b'\n' {
            if data[i] == b'|' {
                pipes += 1;
            }
            i += 1;
        }
        if i == size || pipes == 0 {
            return None;
        }

        let mut header_end = i;
        while header_end > 0 && is_md_space(data[header_end - 1]) {
            header_end -= 1;
        }

        if data[0] == b'|' {
            pipes -= 1;
        }
        if header_end > 0 && data[header_end - 1] == b'|' {
            pipes -= 1;
        }

        let columns = (pipes + 1).max(0) as usize;
        let mut col_data = vec![TableFlags::empty(); columns];

        // the underline fixes column count and alignment
        i += 1;
        if i < size && data[i] == b'|' {
            i += 1;
        }

        let mut under_end = i;
        while under_end < size && data[under_end] != b'\n' {
            under_end += 1;
        }

        let mut col = 0;
        while col < columns && i < under_end {
            let mut dashes = 0;

            while i < under_end && data[i] == b' ' {
                i += 1;
            }

            if i < under_end && data[i] == b':' {
                i += 1;
                col_data[col] |= TableFlags::ALIGN_LEFT;
                dashes += 1;
            }

            while i < under_end && data[i] == b'-' {
                i += 1;
                dashes += 1;
            }

            if i < under_end && data[i] == b':' {
                i += 1;
                col_data[col] |= TableFlags::ALIGN_RIGHT;
                dashes += 1;
            }

            while i < under_end && data[i] == b' ' {
                i += 1;
            }

            if i < under_end && data[i] != b'|' {
                break;
            }
            if dashes < 3 {
                break;
            }

            i += 1;
            col += 1;
        }

        if col < columns {
            return None;
        }

        self.parse_table_row(ob, &data[..header_end], columns, &col_data, TableFlags::HEADER);

        Some((under_end + 1, col_data))
    }

    fn parse_table(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut header_work = self.span_pool.acquire();
        let mut body_work = self.block_pool.acquire();

        let mut i = 0;
        if let Some((consumed, col_data)) = self.parse_table_header(&mut header_work, data) {
            i = consumed;
            let columns = col_data.len();

            while i < size {
                let row_start = i;
                let mut pipes = 0;
                while i < size && data[i] != b'\n' {
                    if data[i] == b'|' {
                        pipes += 1;
                    }
                    i += 1;
                }

                if pipes == 0 || i == size {
                    i = row_start;
                    break;
                }

                self.parse_table_row(
                    &mut body_work,
                    &data[row_start..i],
                    columns,
                    &col_data,
                    TableFlags::empty(),
                );
                i += 1;
            }

            self.renderer.table(ob, &header_work, &body_work);
        }

        self.span_pool.release(header_work);
        self.block_pool.release(body_work);
        i
    }

    /* Footnotes */

    fn parse_footnote_def(&mut self, ob: &mut Buffer, num: u32, contents: &[u8]) {
        let mut work = self.span_pool.acquire();
        self.parse_block(&mut work, contents);
        self.renderer.footnote_def(ob, &work, num);
        self.span_pool.release(work);
    }

    fn render_footnotes(&mut self, ob: &mut Buffer) {
        if self.footnote_order.is_empty() {
            return;
        }

        let mut work = self.block_pool.acquire();
        let order = mem::take(&mut self.footnote_order);

        for label in &order {
            let Some(fr) = self.footnotes.get_mut(label) else {
                continue;
            };
            let num = fr.num;
            let contents = mem::take(&mut fr.contents);
            self.parse_footnote_def(&mut work, num, &contents);
        }

        self.renderer.footnotes(ob, &work);
        self.block_pool.release(work);
    }

    /* Inline parsing */

    fn parse_inline(&mut self, ob: &mut Buffer, data: &[u8]) {
        if self.span_pool.live() + self.block_pool.live() > self.max_nesting {
            return;
        }

        let size = data.len();
        let mut i = 0;
        let mut end = 0;

        while i < size {
            // copy inactive bytes into the output
            let mut action = Trigger::None;
            while end < size {
                action = self.active[data[end] as usize];
                if action != Trigger::None {
                    break;
                }
                end += 1;
            }

            self.renderer.normal_text(ob, &data[i..end]);

            if end >= size {
                break;
            }
            i = end;

            let consumed = match action {
                Trigger::Emphasis => self.char_emphasis(ob, data, i),
                Trigger::CodeSpan => self.char_codespan(ob, data, i),
                Trigger::LineBreak => self.char_linebreak(ob, data, i),
                Trigger::Link => self.char_link(ob, data, i),
                Trigger::LeftAngle => self.char_langle_tag(ob, data, i),
                Trigger::Escape => self.char_escape(ob, data, i),
                Trigger::Entity => self.char_entity(ob, data, i),
                Trigger::AutolinkUrl => self.char_autolink_url(ob, data, i),
                Trigger::AutolinkEmail => self.char_autolink_email(ob, data, i),
                Trigger::AutolinkWww => self.char_autolink_www(ob, data, i),
                Trigger::Superscript => self.char_superscript(ob, data, i),
                Trigger::None => 0,
            };

            if consumed == 0 {
                // no match: the trigger byte goes out as literal text
                end = i + 1;
            } else {
                i += consumed;
                end = i;
            }
        }
    }

    fn char_emphasis(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if self.exts.contains(Extensions::NO_INTRA_EMPHASIS)
            && pos > 0
            && !is_md_space(data[pos - 1])
            && data[pos - 1] != b'>'
        {
            return 0;
        }

        let d = &data[pos..];
        let size = d.len();
        let c = d[0];

        if size > 2 && d[1] != c {
            // whitespace cannot follow an opening marker; ins and
            // strike-through only take the double form
            if c == b'+' || c == b'~' || is_md_space(d[1]) {
                return 0;
            }
            let ret = self.parse_emph1(ob, d, 1, c);
            return if ret == 0 { 0 } else { ret + 1 };
        }

        if size > 3 && d[1] == c && d[2] != c {
            if is_md_space(d[2]) {
                return 0;
            }
            let ret = self.parse_emph2(ob, d, 2, c);
            return if ret == 0 { 0 } else { ret + 2 };
        }

        if size > 4 && d[1] == c && d[2] == c && d[3] != c {
            if c == b'+' || c == b'~' || is_md_space(d[3]) {
                return 0;
            }
            let ret = self.parse_emph3(ob, d, 3, c);
            return if ret == 0 { 0 } else { ret + 3 };
        }

        0
    }

    /// Single emphasis, closed by a marker not preceded by whitespace.
    fn parse_emph1(&mut self, ob: &mut Buffer, d: &[u8], from: usize, c: u8) -> usize {
        if !self.caps.contains(Capabilities::EMPHASIS) {
            return 0;
        }

        let data = &d[from..];
        let size = data.len();
        let mut i = 0;

        // skipping one symbol if coming from emph3
        if size > 1 && data[0] == c && data[1] == c {
            i = 1;
        }

        while i < size {
            let len = find_emph_char(&data[i..], c);
            if len == 0 {
                return 0;
            }
            i += len;
            if i >= size {
                return 0;
            }

            if data[i] == c && !is_md_space(data[i - 1]) {
                if self.exts.contains(Extensions::NO_INTRA_EMPHASIS)
                    && i + 1 < size
                    && data[i + 1].is_ascii_alphanumeric()
                {
                    continue;
                }

                let mut work = self.span_pool.acquire();
                self.parse_inline(&mut work, &data[..i]);
                let r = self.renderer.emphasis(ob, &work);
                self.span_pool.release(work);
                return if r { i + 1 } else { 0 };
            }
        }

        0
    }

    /// Double emphasis; `~` and `+` markers route to strike-through and
    /// insertion instead.
    fn parse_emph2(&mut self, ob: &mut Buffer, d: &[u8], from: usize, c: u8) -> usize {
        let cap = match c {
            b'~' => Capabilities::STRIKETHROUGH,
            b'+' => Capabilities::INS,
            _ => Capabilities::DOUBLE_EMPHASIS,
        };
        if !self.caps.contains(cap) {
            return 0;
        }

        let data = &d[from..];
        let size = data.len();
        let mut i = 0;

        while i < size {
            let len = find_emph_char(&data[i..], c);
            if len == 0 {
                return 0;
            }
            i += len;

            if i + 1 < size && data[i] == c && data[i + 1] == c && i > 0 && !is_md_space(data[i - 1])
            {
                let mut work = self.span_pool.acquire();
                self.parse_inline(&mut work, &data[..i]);
                let r = match c {
                    b'~' => self.renderer.strikethrough(ob, &work),
                    b'+' => self.renderer.ins(ob, &work),
                    _ => self.renderer.double_emphasis(ob, &work),
                };
                self.span_pool.release(work);
                return if r { i + 2 } else { 0 };
            }
            i += 1;
        }

        0
    }

    /// Triple emphasis; finds the first closer and hands shorter runs
    /// back to the other parsers.
    fn parse_emph3(&mut self, ob: &mut Buffer, d: &[u8], from: usize, c: u8) -> usize {
        let data = &d[from..];
        let size = data.len();
        let mut i = 0;

        while i < size {
            let len = find_emph_char(&data[i..], c);
            if len == 0 {
                return 0;
            }
            i += len;

            // skip whitespace-preceded markers
            if data[i] != c || is_md_space(data[i - 1]) {
                continue;
            }

            if i + 2 < size
                && data[i + 1] == c
                && data[i + 2] == c
                && self.caps.contains(Capabilities::TRIPLE_EMPHASIS)
            {
                let mut work = self.span_pool.acquire();
                self.parse_inline(&mut work, &data[..i]);
                let r = self.renderer.triple_emphasis(ob, &work);
                self.span_pool.release(work);
                return if r { i + 3 } else { 0 };
            } else if i + 1 < size && data[i + 1] == c {
                // double marker: hand over to emph1
                let len = self.parse_emph1(ob, d, from - 2, c);
                return if len == 0 { 0 } else { len - 2 };
            } else {
                // single marker: hand over to emph2
                let len = self.parse_emph2(ob, d, from - 1, c);
                return if len == 0 { 0 } else { len - 1 };
            }
        }

        0
    }

    fn char_codespan(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        let d = &data[pos..];
        let size = d.len();

        let mut nb = 0;
        while nb < size && d[nb] == b'`' {
            nb += 1;
        }

        // find the next delimiter of the same width
        let mut i = 0;
        let mut end = nb;
        while end < size && i < nb {
            if d[end] == b'`' {
                i += 1;
            } else {
                i = 0;
            }
            end += 1;
        }

        if i < nb && end >= size {
            return 0;
        }

        // trim surrounding spaces
        let mut f_begin = nb;
        while f_begin < end && d[f_begin] == b' ' {
            f_begin += 1;
        }
        let mut f_end = end - nb;
        while f_end > nb && d[f_end - 1] == b' ' {
            f_end -= 1;
        }

        let r = if f_begin < f_end {
            self.renderer.code_span(ob, &d[f_begin..f_end])
        } else {
            self.renderer.code_span(ob, b"")
        };

        if r { end } else { 0 }
    }

    fn char_linebreak(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if pos < 2 || data[pos - 1] != b' ' || data[pos - 2] != b' ' {
            return 0;
        }

        // remove the trailing spaces before rendering
        let mut len = ob.len();
        while len > 0 && ob[len - 1] == b' ' {
            len -= 1;
        }
        ob.truncate(len);

        if self.renderer.line_break(ob) { 1 } else { 0 }
    }

    fn char_escape(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        const ESCAPE_CHARS: &[u8] = b"\\`*_{}[]()#+-.!:|&<>^~$";

        let d = &data[pos..];
        if d.len() > 1 {
            if !ESCAPE_CHARS.contains(&d[1]) {
                return 0;
            }
            self.renderer.normal_text(ob, &d[1..2]);
        } else if d.len() == 1 {
            ob.put_char(d[0]);
        }
        2
    }

    /// `&` is passed through only when it opens a well-formed entity.
    fn char_entity(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        let d = &data[pos..];
        let size = d.len();

        let mut end = 1;
        if end < size && d[end] == b'#' {
            end += 1;
        }
        while end < size && d[end].is_ascii_alphanumeric() {
            end += 1;
        }
        if end < size && d[end] == b';' {
            end += 1;
        } else {
            return 0;
        }

        self.renderer.entity(ob, &d[..end]);
        end
    }

    fn char_langle_tag(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        let d = &data[pos..];
        let (end, kind) = tag_length(d);
        if end <= 2 {
            return 0;
        }

        let ret = match kind {
            Some(kind) if self.caps.contains(Capabilities::AUTOLINK) => {
                let mut u_link = self.span_pool.acquire();
                unscape_text(&mut u_link, &d[1..end - 1]);
                let r = self.renderer.autolink(ob, &u_link, kind);
                self.span_pool.release(u_link);
                r
            }
            _ => self.renderer.raw_html_tag(ob, &d[..end]),
        };

        if ret { end } else { 0 }
    }

    fn char_autolink_www(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if !self.caps.contains(Capabilities::LINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_pool.acquire();
        let mut link_len = 0;

        if let Some(m) = autolink::www(&mut link, data, pos) {
            link_len = m.len;

            let mut link_url = self.span_pool.acquire();
            link_url.put(b"http://");
            link_url.put(&link);

            // rewind only after the link buffers exist
            ob.truncate(ob.len().saturating_sub(m.rewind));

            let mut link_text = self.span_pool.acquire();
            self.renderer.normal_text(&mut link_text, &link);
            self.renderer.link(ob, &link_url, None, &link_text);
            self.span_pool.release(link_text);
            self.span_pool.release(link_url);
        }

        self.span_pool.release(link);
        link_len
    }

    fn char_autolink_email(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if !self.caps.contains(Capabilities::AUTOLINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_pool.acquire();
        let mut link_len = 0;

        if let Some(m) = autolink::email(&mut link, data, pos) {
            link_len = m.len;
            ob.truncate(ob.len().saturating_sub(m.rewind));
            self.renderer.autolink(ob, &link, AutolinkKind::Email);
        }

        self.span_pool.release(link);
        link_len
    }

    fn char_autolink_url(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if !self.caps.contains(Capabilities::AUTOLINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_pool.acquire();
        let mut link_len = 0;

        if let Some(m) = autolink::url(&mut link, data, pos) {
            link_len = m.len;
            ob.truncate(ob.len().saturating_sub(m.rewind));
            self.renderer.autolink(ob, &link, AutolinkKind::Normal);
        }

        self.span_pool.release(link);
        link_len
    }

    /// `[`: link, image or footnote reference.
    fn char_link(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        let is_img = pos > 0 && data[pos - 1] == b'!';
        let d = &data[pos..];
        let size = d.len();

        let mut id_work: Option<Buffer> = None;
        let mut content: Option<Buffer> = None;
        let mut u_link: Option<Buffer> = None;

        let mut ret = false;
        let mut i = 1;

        'parse: {
            if (is_img && !self.caps.contains(Capabilities::IMAGE))
                || (!is_img && !self.caps.contains(Capabilities::LINK))
            {
                break 'parse;
            }

            // matching closing bracket, tracking nesting and escapes
            let mut text_has_nl = false;
            let mut level = 1i32;
            while i < size {
                if d[i] == b'\n' {
                    text_has_nl = true;
                } else if d[i - 1] == b'\\' {
                } else if d[i] == b'[' {
                    level += 1;
                } else if d[i] == b']' {
                    level -= 1;
                    if level <= 0 {
                        break;
                    }
                }
                i += 1;
            }
            if i >= size {
                break 'parse;
            }

            let txt_e = i;
            i += 1;

            // footnote reference
            if self.exts.contains(Extensions::FOOTNOTES) && d[1] == b'^' {
                if txt_e < 3 {
                    break 'parse;
                }

                let label = fold_label(&d[2..txt_e]);
                let mut num = 0;
                if let Some(fr) = self.footnotes.get_mut(&label) {
                    if !fr.used {
                        fr.used = true;
                        self.footnote_count += 1;
                        fr.num = self.footnote_count;
                        self.footnote_order.push(label.clone());
                    }
                    num = fr.num;
                }

                if num > 0 {
                    ret = self.renderer.footnote_ref(ob, num);
                }
                break 'parse;
            }

            while i < size && is_md_space(d[i]) {
                i += 1;
            }

            let mut link_span: Option<(usize, usize)> = None;
            let mut title_span: Option<(usize, usize)> = None;
            let mut link_owned: Option<Vec<u8>> = None;
            let mut title_owned: Option<Vec<u8>> = None;

            if i < size && d[i] == b'(' {
                // inline style link
                i += 1;
                while i < size && is_md_space(d[i]) {
                    i += 1;
                }
                let mut link_b = i;

                while i < size {
                    if d[i] == b'\\' {
                        i += 2;
                    } else if d[i] == b')' {
                        break;
                    } else if i >= 1 && is_md_space(d[i - 1]) && (d[i] == b'\'' || d[i] == b'"') {
                        break;
                    } else {
                        i += 1;
                    }
                }
                if i >= size {
                    break 'parse;
                }
                let mut link_e = i;

                // optional title, either quote style
                let mut title_b = 0;
                let mut title_e = 0;
                if d[i] == b'\'' || d[i] == b'"' {
                    let qtype = d[i];
                    let mut in_title = true;
                    i += 1;
                    title_b = i;

                    while i < size {
                        if d[i] == b'\\' {
                            i += 2;
                        } else if d[i] == qtype {
                            in_title = false;
                            i += 1;
                        } else if d[i] == b')' && !in_title {
                            break;
                        } else {
                            i += 1;
                        }
                    }
                    if i >= size {
                        break 'parse;
                    }

                    title_e = i - 1;
                    while title_e > title_b && is_md_space(d[title_e]) {
                        title_e -= 1;
                    }
                    if d[title_e] != b'\'' && d[title_e] != b'"' {
                        title_b = 0;
                        title_e = 0;
                        link_e = i;
                    }
                }

                while link_e > link_b && is_md_space(d[link_e - 1]) {
                    link_e -= 1;
                }
                if d[link_b] == b'<' {
                    link_b += 1;
                }
                if d[link_e - 1] == b'>' {
                    link_e -= 1;
                }

                if link_e > link_b {
                    link_span = Some((link_b, link_e));
                }
                if title_e > title_b {
                    title_span = Some((title_b, title_e));
                }
                i += 1;
            } else if i < size && d[i] == b'[' {
                // reference style link
                i += 1;
                let link_b = i;
                while i < size && d[i] != b']' {
                    i += 1;
                }
                if i >= size {
                    break 'parse;
                }
                let link_e = i;

                let key = if link_b == link_e {
                    // empty id: the link text is the id
                    if text_has_nl {
                        let mut b = self.span_pool.acquire();
                        collapse_newlines(&mut b, &d[1..txt_e]);
                        let key = fold_label(&b);
                        id_work = Some(b);
                        key
                    } else {
                        fold_label(&d[1..txt_e])
                    }
                } else {
                    fold_label(&d[link_b..link_e])
                };

                let Some(lr) = self.refs.get(&key) else {
                    break 'parse;
                };
                link_owned = Some(lr.link.clone());
                title_owned = lr.title.clone();
                i += 1;
            } else {
                // shortcut reference style link
                let key = if text_has_nl {
                    let mut b = self.span_pool.acquire();
                    collapse_newlines(&mut b, &d[1..txt_e]);
                    let key = fold_label(&b);
                    id_work = Some(b);
                    key
                } else {
                    fold_label(&d[1..txt_e])
                };

                let Some(lr) = self.refs.get(&key) else {
                    break 'parse;
                };
                link_owned = Some(lr.link.clone());
                title_owned = lr.title.clone();
                i = txt_e + 1;
            }

            // content: image alt stays raw, link text is parsed inline
            if txt_e > 1 {
                let mut c_buf = self.span_pool.acquire();
                if is_img {
                    c_buf.put(&d[1..txt_e]);
                } else {
                    // no autolinking inside a link's visible text
                    self.in_link_body = true;
                    self.parse_inline(&mut c_buf, &d[1..txt_e]);
                    self.in_link_body = false;
                }
                content = Some(c_buf);
            }

            let link_bytes: Option<&[u8]> = match (&link_owned, link_span) {
                (Some(v), _) => Some(v.as_slice()),
                (None, Some((b, e))) => Some(&d[b..e]),
                _ => None,
            };
            if let Some(lb) = link_bytes {
                let mut u = self.span_pool.acquire();
                unscape_text(&mut u, lb);
                u_link = Some(u);
            }

            let title_bytes: Option<&[u8]> = match (&title_owned, title_span) {
                (Some(v), _) => Some(v.as_slice()),
                (None, Some((b, e))) => Some(&d[b..e]),
                _ => None,
            };

            let content_slice: &[u8] = content.as_ref().map(|b| b.as_slice()).unwrap_or(b"");
            let ulink_slice: &[u8] = u_link.as_ref().map(|b| b.as_slice()).unwrap_or(b"");

            if is_img {
                // the `!` was emitted as normal text just before us
                if !ob.is_empty() && ob[ob.len() - 1] == b'!' {
                    let len = ob.len() - 1;
                    ob.truncate(len);
                }
                ret = self.renderer.image(ob, ulink_slice, title_bytes, content_slice);
            } else {
                ret = self.renderer.link(ob, ulink_slice, title_bytes, content_slice);
            }
        }

        for buf in [u_link, content, id_work].into_iter().flatten() {
            self.span_pool.release(buf);
        }

        if ret { i } else { 0 }
    }

    fn char_superscript(&mut self, ob: &mut Buffer, data: &[u8], pos: usize) -> usize {
        if !self.caps.contains(Capabilities::SUPERSCRIPT) {
            return 0;
        }

        let d = &data[pos..];
        let size = d.len();
        if size < 2 {
            return 0;
        }

        let sup_start;
        let mut sup_len;

        if d[1] == b'(' {
            sup_start = 2;
            sup_len = 2;
            while sup_len < size && d[sup_len] != b')' && d[sup_len - 1] != b'\\' {
                sup_len += 1;
            }
            if sup_len == size {
                return 0;
            }
        } else {
            sup_start = 1;
            sup_len = 1;
            while sup_len < size && !is_md_space(d[sup_len]) {
                sup_len += 1;
            }
        }

        if sup_len - sup_start == 0 {
            return if sup_start == 2 { 3 } else { 0 };
        }

        let mut sup = self.span_pool.acquire();
        self.parse_inline(&mut sup, &d[sup_start..sup_len]);
        let _ = self.renderer.superscript(ob, &sup);
        self.span_pool.release(sup);

        if sup_start == 2 { sup_len + 1 } else { sup_len }
    }
}

/* Scanning helpers */

fn line_end(data: &[u8], beg: usize) -> usize {
    match memchr(b'\n', &data[beg..]) {
        Some(pos) => beg + pos + 1,
        None => data.len(),
    }
}

/// Tabs and carriage returns are stripped during preprocessing, so a
/// Markdown space is only an actual space or a newline.
fn is_md_space(c: u8) -> bool {
    c == b' ' || c == b'\n'
}

/// Returns the line length (newline included) when the line holds
/// nothing but spaces, 0 otherwise.
fn is_empty(data: &[u8]) -> usize {
    let mut i = 0;
    while i < data.len() && data[i] != b'\n' {
        if data[i] != b' ' {
            return 0;
        }
        i += 1;
    }
    i + 1
}

fn is_hrule(data: &[u8]) -> bool {
    let size = data.len();
    if size < 3 {
        return false;
    }

    let mut i = 0;
    if data[0] == b' ' {
        i += 1;
        if data[1] == b' ' {
            i += 1;
            if data[2] == b' ' {
                i += 1;
            }
        }
    }

    if i + 2 >= size || (data[i] != b'*' && data[i] != b'-' && data[i] != b'_') {
        return false;
    }
    let c = data[i];

    // the whole line must be the marker or spaces
    let mut n = 0;
    while i < size && data[i] != b'\n' {
        if data[i] == c {
            n += 1;
        } else if data[i] != b' ' {
            return false;
        }
        i += 1;
    }

    n >= 3
}

/// Setext underline: `=` runs mark level 1, `-` runs level 2.
fn is_headerline(data: &[u8]) -> u32 {
    let size = data.len();
    let mut i;

    if data[0] == b'=' {
        i = 1;
        while i < size && data[i] == b'=' {
            i += 1;
        }
        while i < size && data[i] == b' ' {
            i += 1;
        }
        return if i >= size || data[i] == b'\n' { 1 } else { 0 };
    }

    if data[0] == b'-' {
        i = 1;
        while i < size && data[i] == b'-' {
            i += 1;
        }
        while i < size && data[i] == b' ' {
            i += 1;
        }
        return if i >= size || data[i] == b'\n' { 2 } else { 0 };
    }

    0
}

fn is_next_headerline(data: &[u8]) -> bool {
    let size = data.len();
    let mut i = 0;
    while i < size && data[i] != b'\n' {
        i += 1;
    }
    i += 1;
    if i >= size {
        return false;
    }
    is_headerline(&data[i..]) != 0
}

fn prefix_quote(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    while i < 3 && i < size && data[i] == b' ' {
        i += 1;
    }

    if i < size && data[i] == b'>' {
        if i + 1 < size && data[i + 1] == b' ' {
            return i + 2;
        }
        return i + 1;
    }
    0
}

fn prefix_code(data: &[u8]) -> usize {
    if data.len() > 3 && data[0] == b' ' && data[1] == b' ' && data[2] == b' ' && data[3] == b' ' {
        return 4;
    }
    0
}

fn prefix_oli(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    while i < 3 && i < size && data[i] == b' ' {
        i += 1;
    }

    if i >= size || !data[i].is_ascii_digit() {
        return 0;
    }
    while i < size && data[i].is_ascii_digit() {
        i += 1;
    }

    if i + 1 >= size || data[i] != b'.' || data[i + 1] != b' ' {
        return 0;
    }
    if is_next_headerline(&data[i..]) {
        return 0;
    }
    i + 2
}

fn prefix_uli(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    while i < 3 && i < size && data[i] == b' ' {
        i += 1;
    }

    if i + 1 >= size
        || (data[i] != b'*' && data[i] != b'+' && data[i] != b'-')
        || data[i + 1] != b' '
    {
        return 0;
    }
    if is_next_headerline(&data[i..]) {
        return 0;
    }
    i + 2
}

fn is_codefence(data: &[u8]) -> Option<Fence> {
    let size = data.len();
    if size < 3 {
        return None;
    }

    let mut i = 0;
    if data[0] == b' ' {
        i += 1;
        if data[1] == b' ' {
            i += 1;
            if data[2] == b' ' {
                i += 1;
            }
        }
    }

    if i + 2 >= size || !(data[i] == b'~' || data[i] == b'`') {
        return None;
    }
    let ch = data[i];

    let mut width = 0;
    while i < size && data[i] == ch {
        width += 1;
        i += 1;
    }
    if width < 3 {
        return None;
    }

    while i < size && data[i] == b' ' {
        i += 1;
    }

    // language: either a `{...}` block or a bare token
    let mut syn_start = i;
    let mut syn_len = 0;
    if i < size && data[i] == b'{' {
        i += 1;
        syn_start += 1;
        while i < size && data[i] != b'}' && data[i] != b'\n' {
            syn_len += 1;
            i += 1;
        }
        if i == size || data[i] != b'}' {
            return None;
        }

        while syn_len > 0 && is_md_space(data[syn_start]) {
            syn_start += 1;
            syn_len -= 1;
        }
        while syn_len > 0 && is_md_space(data[syn_start + syn_len - 1]) {
            syn_len -= 1;
        }
        i += 1;
    } else {
        while i < size && !is_md_space(data[i]) {
            syn_len += 1;
            i += 1;
        }
    }

    // nothing but whitespace may follow on the fence line
    while i < size && data[i] != b'\n' {
        if !is_md_space(data[i]) {
            return None;
        }
        i += 1;
    }

    Some(Fence {
        end: i + 1,
        syntax: (syn_start, syn_start + syn_len),
        ch,
        width,
    })
}

fn htmlblock_end_tag(tag: &str, data: &[u8]) -> usize {
    let size = data.len();
    let tag_len = tag.len();

    if tag_len + 3 >= size
        || !data[2..2 + tag_len].eq_ignore_ascii_case(tag.as_bytes())
        || data[tag_len + 2] != b'>'
    {
        return 0;
    }

    // the close tag only counts when followed by blank lines
    let mut i = tag_len + 3;
    let mut w = 0;
    if i < size {
        w = is_empty(&data[i..]);
        if w == 0 {
            return 0;
        }
    }
    i += w;

    let mut w = 0;
    if i < size {
        w = is_empty(&data[i..]);
    }
    i + w
}

fn htmlblock_end(curtag: &str, data: &[u8], start_of_line: bool) -> usize {
    let size = data.len();
    let tag_size = curtag.len();
    let mut i = 1;
    let mut block_lines = 0;

    while i < size {
        i += 1;
        while i < size && !(data[i - 1] == b'<' && data[i] == b'/') {
            if data[i] == b'\n' {
                block_lines += 1;
            }
            i += 1;
        }

        // an indented close tag only counts on the opening line
        if start_of_line && block_lines > 0 && data[i - 2] != b'\n' {
            continue;
        }

        if i + 2 + tag_size >= size {
            break;
        }

        let end_tag = htmlblock_end_tag(curtag, &data[i - 1..]);
        if end_tag > 0 {
            return i + end_tag - 1;
        }
    }

    0
}

/// Finds the next occurrence of `c` usable as an emphasis closer,
/// skipping over code spans and link constructs.
fn find_emph_char(data: &[u8], c: u8) -> usize {
    let size = data.len();
    let mut i = 1;

    while i < size {
        while i < size && data[i] != c && data[i] != b'`' && data[i] != b'[' {
            i += 1;
        }
        if i == size {
            return 0;
        }
        if data[i] == c {
            return i;
        }

        // not counting escaped chars
        if i > 0 && data[i - 1] == b'\\' {
            i += 1;
            continue;
        }

        if data[i] == b'`' {
            let mut span_nb = 0;
            while i < size && data[i] == b'`' {
                i += 1;
                span_nb += 1;
            }
            if i >= size {
                return 0;
            }

            let mut bt = 0;
            let mut tmp_i = 0;
            while i < size && bt < span_nb {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                if data[i] == b'`' {
                    bt += 1;
                } else {
                    bt = 0;
                }
                i += 1;
            }
            if i >= size {
                return tmp_i;
            }
        } else if data[i] == b'[' {
            let mut tmp_i = 0;
            i += 1;
            while i < size && data[i] != b']' {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                i += 1;
            }
            i += 1;
            while i < size && (data[i] == b' ' || data[i] == b'\n') {
                i += 1;
            }
            if i >= size {
                return tmp_i;
            }

            let cc = match data[i] {
                b'[' => b']',
                b'(' => b')',
                _ => {
                    if tmp_i > 0 {
                        return tmp_i;
                    }
                    continue;
                }
            };

            i += 1;
            while i < size && data[i] != cc {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                i += 1;
            }
            if i >= size {
                return tmp_i;
            }
            i += 1;
        }
    }

    0
}

/// Length of a raw tag or angle autolink starting at a `<`, with the
/// autolink classification when the content looks like a URI or
/// address.
fn tag_length(data: &[u8]) -> (usize, Option<AutolinkKind>) {
    let size = data.len();

    // a valid tag can't be shorter than 3 chars
    if size < 3 || data[0] != b'<' {
        return (0, None);
    }

    let mut i = if data[1] == b'/' { 2 } else { 1 };
    if !data[i].is_ascii_alphanumeric() {
        return (0, None);
    }

    // scheme test
    while i < size
        && (data[i].is_ascii_alphanumeric() || data[i] == b'.' || data[i] == b'+' || data[i] == b'-')
    {
        i += 1;
    }

    if i > 1 && i < size && data[i] == b'@' {
        let j = is_mail_autolink(&data[i..]);
        if j > 0 {
            return (i + j, Some(AutolinkKind::Email));
        }
    }

    let mut autolink = false;
    if i > 2 && i < size && data[i] == b':' {
        autolink = true;
        i += 1;
    }

    if autolink && i < size {
        let j = i;
        while i < size {
            if data[i] == b'\\' {
                i += 2;
            } else if matches!(data[i], b'>' | b'\'' | b'"' | b' ' | b'\n') {
                break;
            } else {
                i += 1;
            }
        }
        if i >= size {
            return (0, None);
        }
        if i > j && data[i] == b'>' {
            return (i + 1, Some(AutolinkKind::Normal));
        }
        // a forbidden char was found: fall back to the raw tag scan
    }

    while i < size && data[i] != b'>' {
        i += 1;
    }
    if i >= size {
        return (0, None);
    }
    (i + 1, None)
}

/// The address part of a mail autolink up to the closing `>`; laxer
/// than the original Markdown matcher.
fn is_mail_autolink(data: &[u8]) -> usize {
    let mut nb = 0;
    for (i, &c) in data.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            continue;
        }
        match c {
            b'@' => nb += 1,
            b'-' | b'.' | b'_' => {}
            b'>' => return if nb == 1 { i + 1 } else { 0 },
            _ => return 0,
        }
    }
    0
}

fn unscape_text(ob: &mut Buffer, src: &[u8]) {
    let mut i = 0;
    while i < src.len() {
        let org = i;
        while i < src.len() && src[i] != b'\\' {
            i += 1;
        }
        if i > org {
            ob.put(&src[org..i]);
        }
        if i + 1 >= src.len() {
            break;
        }
        ob.put_char(src[i + 1]);
        i += 2;
    }
}

/// Link labels fold case before lookup; definition and use need not
/// agree on capitalisation.
fn fold_label(label: &[u8]) -> Vec<u8> {
    label.to_ascii_lowercase()
}

/// Newlines inside a multi-line link id collapse to single spaces.
fn collapse_newlines(ob: &mut Buffer, text: &[u8]) {
    for j in 0..text.len() {
        if text[j] != b'\n' {
            ob.put_char(text[j]);
        } else if j > 0 && text[j - 1] != b' ' {
            ob.put_char(b' ');
        }
    }
}

fn expand_tabs(ob: &mut Buffer, line: &[u8]) {
    let mut i = 0;
    let mut tab = 0;

    while i < line.len() {
        let org = i;
        while i < line.len() && line[i] != b'\t' {
            i += 1;
            tab += 1;
        }
        if i > org {
            ob.put(&line[org..i]);
        }
        if i >= line.len() {
            break;
        }
        loop {
            ob.put_char(b' ');
            tab += 1;
            if tab % 4 == 0 {
                break;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainText;

    impl Renderer for PlainText {
        fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
            ob.put(content);
            ob.put_char(b'\n');
        }
    }

    fn expand(line: &[u8]) -> Vec<u8> {
        let mut buf = Buffer::new(64);
        expand_tabs(&mut buf, line);
        buf.into_vec()
    }

    #[test]
    fn tabs_align_to_four_column_stops() {
        assert_eq!(expand(b"\tx"), b"    x");
        assert_eq!(expand(b"a\tb"), b"a   b");
        assert_eq!(expand(b"abc\td"), b"abc d");
        assert_eq!(expand(b"abcd\te"), b"abcd    e");
    }

    #[test]
    fn hrule_needs_three_markers() {
        assert!(is_hrule(b"***\n"));
        assert!(is_hrule(b" - - -\n"));
        assert!(is_hrule(b"___\n"));
        assert!(!is_hrule(b"**\n"));
        assert!(!is_hrule(b"--a\n"));
    }

    #[test]
    fn headerline_levels() {
        assert_eq!(is_headerline(b"===\n"), 1);
        assert_eq!(is_headerline(b"---  \n"), 2);
        assert_eq!(is_headerline(b"--- x\n"), 0);
        assert_eq!(is_headerline(b"abc\n"), 0);
    }

    #[test]
    fn list_prefixes() {
        assert_eq!(prefix_uli(b"* item\n"), 2);
        assert_eq!(prefix_uli(b"  - item\n"), 4);
        assert_eq!(prefix_uli(b"*item\n"), 0);
        assert_eq!(prefix_oli(b"12. item\n"), 4);
        assert_eq!(prefix_oli(b"12.item\n"), 0);
    }

    #[test]
    fn fence_recognition() {
        let f = is_codefence(b"```c\nint x;\n```\n").unwrap();
        assert_eq!(f.ch, b'`');
        assert_eq!(f.width, 3);
        assert_eq!(&b"```c\nint x;\n```\n"[f.syntax.0..f.syntax.1], b"c");

        let f = is_codefence(b"~~~ {.ruby}\n").unwrap();
        assert_eq!(&b"~~~ {.ruby}\n"[f.syntax.0..f.syntax.1], b".ruby");

        assert!(is_codefence(b"``\n").is_none());
        assert!(is_codefence(b"``` c d\n").is_none());
    }

    #[test]
    fn tag_length_classifies_autolinks() {
        let (len, kind) = tag_length(b"<http://x.com>");
        assert_eq!(len, 14);
        assert_eq!(kind, Some(AutolinkKind::Normal));

        let (len, kind) = tag_length(b"<a@b.com>");
        assert_eq!(len, 9);
        assert_eq!(kind, Some(AutolinkKind::Email));

        let (len, kind) = tag_length(b"<em>");
        assert_eq!(len, 4);
        assert_eq!(kind, None);

        assert_eq!(tag_length(b"<>").0, 0);
    }

    #[test]
    fn emphasis_char_skips_code_spans() {
        // the closing `*` inside the backticks must not close emphasis
        assert_eq!(find_emph_char(b"a `*` b* c", b'*'), 7);
        assert_eq!(find_emph_char(b"abc", b'*'), 0);
    }

    #[test]
    fn reference_scan_registers_and_strips() {
        let mut renderer = PlainText;
        let mut md = Markdown::new(&mut renderer, Extensions::empty(), 16);
        let mut ob = Buffer::new(64);
        md.render(&mut ob, b"[id]: http://x.com 'T'\nbody\n").unwrap();
        assert_eq!(ob.as_slice(), b"body\n");
        let lr = md.refs.get(b"id".as_slice()).unwrap();
        assert_eq!(lr.link, b"http://x.com");
        assert_eq!(lr.title.as_deref(), Some(b"T".as_ref()));
    }

    #[test]
    fn pools_drain_after_render() {
        let mut renderer = PlainText;
        let mut md = Markdown::new(&mut renderer, Extensions::all(), 16);
        let mut ob = Buffer::new(64);
        md.render(&mut ob, b"> quote\n\n* a\n* b\n\npara **x** `c`\n")
            .unwrap();
        assert_eq!(md.span_pool.live(), 0);
        assert_eq!(md.block_pool.live(), 0);
    }

    #[test]
    fn bom_is_skipped() {
        let mut renderer = PlainText;
        let mut md = Markdown::new(&mut renderer, Extensions::empty(), 16);
        let mut ob = Buffer::new(64);
        md.render(&mut ob, b"\xEF\xBB\xBFhello\n").unwrap();
        assert_eq!(ob.as_slice(), b"hello\n");
    }
}
