use std::panic;

use duskmark_core::{Buffer, Extensions, Markdown, Renderer};

const CASES: usize = 400;
const MAX_LEN: usize = 384;
const CHARSET: &[u8] = b"abcdewxyz012 \n\t#@*_`$[](){}!<>:+-.^~|&\\/='\"";

/// Passes block content through untouched so output size tracks input
/// size.
struct Passthrough;

impl Renderer for Passthrough {
    fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put(content);
        ob.put_char(b'\n');
    }

    fn block_quote(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put(content);
    }

    fn list(&mut self, ob: &mut Buffer, content: &[u8], _flags: duskmark_core::ListFlags) {
        ob.put(content);
    }

    fn list_item(&mut self, ob: &mut Buffer, content: &[u8], _flags: duskmark_core::ListFlags) {
        ob.put(content);
    }

    fn header(&mut self, ob: &mut Buffer, content: &[u8], _level: u32) {
        ob.put(content);
        ob.put_char(b'\n');
    }

    fn block_code(&mut self, ob: &mut Buffer, text: &[u8], _lang: Option<&[u8]>) {
        ob.put(text);
    }
}

#[test]
fn parser_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x9e37_79b9_7f4a_7c15);

    for case in 0..CASES {
        let source = random_document(&mut rng);
        let result = panic::catch_unwind(|| {
            let mut passthrough = Passthrough;
            let mut md = Markdown::new(&mut passthrough, Extensions::all(), 16);
            let mut ob = Buffer::new(64);
            md.render(&mut ob, &source).map(|_| ob.len())
        });
        if result.is_err() {
            return Err(format!(
                "render panicked for case {}: {:?}",
                case,
                String::from_utf8_lossy(&source)
            )
            .into());
        }
    }
    Ok(())
}

#[test]
fn output_growth_stays_bounded() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x2545_f491_4f6c_dd1d);

    for case in 0..CASES {
        let source = random_document(&mut rng);
        let mut passthrough = Passthrough;
        let mut md = Markdown::new(&mut passthrough, Extensions::all(), 16);
        let mut ob = Buffer::new(64);
        md.render(&mut ob, &source)?;

        // tab expansion is the only legitimate amplifier for a renderer
        // that echoes its input
        if ob.len() > source.len() * 4 + 64 {
            return Err(format!(
                "case {}: {} input bytes became {} output bytes",
                case,
                source.len(),
                ob.len()
            )
            .into());
        }
    }
    Ok(())
}

#[test]
fn render_state_resets_between_documents() {
    let mut passthrough = Passthrough;
    let mut md = Markdown::new(&mut passthrough, Extensions::all(), 16);

    let doc = b"[a]: /one\n\n[x][a]\n\n> quoted\n";
    let mut first = Buffer::new(64);
    md.render(&mut first, doc).unwrap();
    let mut second = Buffer::new(64);
    md.render(&mut second, doc).unwrap();

    assert_eq!(first.as_slice(), second.as_slice());
}

fn random_document(rng: &mut Lcg) -> Vec<u8> {
    let len = rng.gen_range(MAX_LEN + 1);
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(CHARSET[rng.gen_range(CHARSET.len())]);
    }
    out
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
