use crate::buffer::Buffer;
use bitflags::bitflags;

bitflags! {
    /// Syntax extensions. All are opt-in; the empty set is classical
    /// Markdown.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Extensions: u32 {
        /// Forbid emphasis inside words (`foo_bar_baz`).
        const NO_INTRA_EMPHASIS = 1 << 0;
        /// Pipe tables.
        const TABLES = 1 << 1;
        /// Backtick / tilde fenced code blocks.
        const FENCED_CODE = 1 << 2;
        /// Bare URL, www and e-mail detection.
        const AUTOLINK = 1 << 3;
        /// `~~text~~` strike-through.
        const STRIKETHROUGH = 1 << 4;
        /// `++text++` insertion.
        const INS = 1 << 5;
        /// Lists, HTML blocks and fences may interrupt a paragraph
        /// without a preceding blank line.
        const LAX_SPACING = 1 << 6;
        /// ATX headers require a space after the `#` run.
        const SPACE_HEADERS = 1 << 7;
        /// `^text` and `^(some text)` superscripts.
        const SUPERSCRIPT = 1 << 8;
        /// `[^id]` references and definitions.
        const FOOTNOTES = 1 << 9;
    }
}

bitflags! {
    /// The callbacks a renderer actually implements. Consulted once at
    /// parser construction: a missing capability leaves the matching
    /// active characters unarmed, or disables the construct outright.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const BLOCK_HTML = 1 << 0;
        const TABLES = 1 << 1;
        const EMPHASIS = 1 << 2;
        const DOUBLE_EMPHASIS = 1 << 3;
        const TRIPLE_EMPHASIS = 1 << 4;
        const CODE_SPAN = 1 << 5;
        const LINE_BREAK = 1 << 6;
        const LINK = 1 << 7;
        const IMAGE = 1 << 8;
        const AUTOLINK = 1 << 9;
        const STRIKETHROUGH = 1 << 10;
        const INS = 1 << 11;
        const SUPERSCRIPT = 1 << 12;
    }
}

bitflags! {
    /// Flags passed to the `list` and `list_item` callbacks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ListFlags: u32 {
        /// Numbered list.
        const ORDERED = 1 << 0;
        /// Item body contains block-level content.
        const BLOCK = 1 << 1;
        /// The item terminated its list.
        const END = 1 << 3;
    }
}

bitflags! {
    /// Flags passed to the `table_cell` callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TableFlags: u32 {
        const ALIGN_LEFT = 1 << 0;
        const ALIGN_RIGHT = 1 << 1;
        const ALIGN_CENTER = (1 << 0) | (1 << 1);
        const HEADER = 1 << 2;
    }
}

impl TableFlags {
    /// The alignment bits of a cell, with header/other bits masked off.
    pub fn alignment(self) -> TableFlags {
        self & TableFlags::ALIGN_CENTER
    }
}

/// Classification reported to the `autolink` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    Normal,
    Email,
}

/// Receiver for the parser's event stream.
///
/// Every method has a default: block callbacks default to emitting
/// nothing, inline callbacks default to refusing the construct (the
/// parser then re-emits the trigger as literal text), and the text
/// callbacks default to a verbatim copy. A renderer overrides the subset
/// it cares about and reports that subset through [`Renderer::capabilities`].
///
/// Inline callbacks return `false` to refuse a construct after the fact;
/// the parser backs up and treats the trigger byte as plain text.
pub trait Renderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn block_code(&mut self, _ob: &mut Buffer, _text: &[u8], _lang: Option<&[u8]>) {}

    fn block_quote(&mut self, _ob: &mut Buffer, _content: &[u8]) {}

    fn block_html(&mut self, _ob: &mut Buffer, _text: &[u8]) {}

    fn header(&mut self, _ob: &mut Buffer, _content: &[u8], _level: u32) {}

    fn hrule(&mut self, _ob: &mut Buffer) {}

    fn list(&mut self, _ob: &mut Buffer, _content: &[u8], _flags: ListFlags) {}

    fn list_item(&mut self, _ob: &mut Buffer, _content: &[u8], _flags: ListFlags) {}

    fn paragraph(&mut self, _ob: &mut Buffer, _content: &[u8]) {}

    fn table(&mut self, _ob: &mut Buffer, _header: &[u8], _body: &[u8]) {}

    fn table_row(&mut self, _ob: &mut Buffer, _content: &[u8]) {}

    fn table_cell(&mut self, _ob: &mut Buffer, _content: &[u8], _flags: TableFlags) {}

    fn footnotes(&mut self, _ob: &mut Buffer, _content: &[u8]) {}

    fn footnote_def(&mut self, _ob: &mut Buffer, _content: &[u8], _num: u32) {}

    fn autolink(&mut self, _ob: &mut Buffer, _link: &[u8], _kind: AutolinkKind) -> bool {
        false
    }

    fn code_span(&mut self, _ob: &mut Buffer, _text: &[u8]) -> bool {
        false
    }

    fn emphasis(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn double_emphasis(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn triple_emphasis(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn strikethrough(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn ins(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn superscript(&mut self, _ob: &mut Buffer, _content: &[u8]) -> bool {
        false
    }

    fn image(&mut self, _ob: &mut Buffer, _link: &[u8], _title: Option<&[u8]>, _alt: &[u8]) -> bool {
        false
    }

    fn line_break(&mut self, _ob: &mut Buffer) -> bool {
        false
    }

    fn link(&mut self, _ob: &mut Buffer, _link: &[u8], _title: Option<&[u8]>, _content: &[u8]) -> bool {
        false
    }

    fn raw_html_tag(&mut self, _ob: &mut Buffer, _tag: &[u8]) -> bool {
        false
    }

    fn footnote_ref(&mut self, _ob: &mut Buffer, _num: u32) -> bool {
        false
    }

    fn entity(&mut self, ob: &mut Buffer, text: &[u8]) {
        ob.put(text);
    }

    fn normal_text(&mut self, ob: &mut Buffer, text: &[u8]) {
        ob.put(text);
    }

    fn doc_header(&mut self, _ob: &mut Buffer) {}

    fn doc_footer(&mut self, _ob: &mut Buffer) {}

    /// Called last, after the footnote trailer and `doc_footer`; the
    /// HTML renderer uses it to close any open sections.
    fn outline(&mut self, _ob: &mut Buffer) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_alignment_masks_header_bit() {
        let flags = TableFlags::ALIGN_CENTER | TableFlags::HEADER;
        assert_eq!(flags.alignment(), TableFlags::ALIGN_CENTER);
        assert_eq!(TableFlags::HEADER.alignment(), TableFlags::empty());
    }

    #[test]
    fn default_renderer_refuses_inline_constructs() {
        struct Bare;
        impl Renderer for Bare {}

        let mut bare = Bare;
        let mut ob = Buffer::new(16);
        assert!(!bare.emphasis(&mut ob, b"x"));
        assert!(!bare.line_break(&mut ob));
        bare.normal_text(&mut ob, b"plain");
        assert_eq!(ob.as_slice(), b"plain");
    }
}
