use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use duskmark_core::Extensions;
use duskmark_html::{render_html, render_toc, HtmlFlags};

fn main() {
    let mut input: Option<String> = None;
    let mut extensions = Extensions::empty();
    let mut flags = HtmlFlags::empty();
    let mut toc_only = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--tables" => extensions |= Extensions::TABLES,
            "--fenced-code" => extensions |= Extensions::FENCED_CODE,
            "--autolink" => extensions |= Extensions::AUTOLINK,
            "--strikethrough" => extensions |= Extensions::STRIKETHROUGH,
            "--ins" => extensions |= Extensions::INS,
            "--lax-spacing" => extensions |= Extensions::LAX_SPACING,
            "--space-headers" => extensions |= Extensions::SPACE_HEADERS,
            "--superscript" => extensions |= Extensions::SUPERSCRIPT,
            "--footnotes" => extensions |= Extensions::FOOTNOTES,
            "--no-intra-emphasis" => extensions |= Extensions::NO_INTRA_EMPHASIS,
            "--all" => extensions = Extensions::all(),
            "--toc-render" => toc_only = true,
            "--toc" => flags |= HtmlFlags::TOC,
            "--safelink" => flags |= HtmlFlags::SAFELINK,
            "--hard-wrap" => flags |= HtmlFlags::HARD_WRAP,
            "--xhtml" => flags |= HtmlFlags::USE_XHTML,
            "--escape" => flags |= HtmlFlags::ESCAPE,
            "--outline" => flags |= HtmlFlags::OUTLINE,
            "--skip-html" => flags |= HtmlFlags::SKIP_HTML,
            "--skip-style" => flags |= HtmlFlags::SKIP_STYLE,
            "--skip-links" => flags |= HtmlFlags::SKIP_LINKS,
            "--skip-images" => flags |= HtmlFlags::SKIP_IMAGES,
            _ => {
                if arg.starts_with('-') {
                    eprintln!("unknown option: {}", arg);
                    print_usage();
                    process::exit(2);
                }
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let document = match input {
        Some(path) => fs::read(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer).unwrap_or_else(|err| {
                eprintln!("failed to read stdin: {}", err);
                process::exit(1);
            });
            buffer
        }
    };

    let rendered = if toc_only {
        render_toc(&document, extensions)
    } else {
        render_html(&document, extensions, flags)
    };

    let output = rendered.unwrap_or_else(|err| {
        eprintln!("render failed: {}", err);
        process::exit(1);
    });

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout.write_all(&output) {
        eprintln!("failed to write output: {}", err);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "Usage: duskmark [OPTIONS] [FILE]\n\
         Reads Markdown from FILE (or stdin) and writes HTML to stdout.\n\n\
         Extensions:\n\
         \x20 --tables --fenced-code --autolink --strikethrough --ins\n\
         \x20 --lax-spacing --space-headers --superscript --footnotes\n\
         \x20 --no-intra-emphasis --all\n\n\
         Rendering:\n\
         \x20 --toc-render        emit only the heading outline\n\
         \x20 --toc               give headers toc_N anchors\n\
         \x20 --safelink          drop links to unsafe schemes\n\
         \x20 --hard-wrap         render newlines as <br>\n\
         \x20 --xhtml             self-close void elements\n\
         \x20 --escape            escape all raw HTML\n\
         \x20 --outline           wrap header regions in <section>\n\
         \x20 --skip-html --skip-style --skip-links --skip-images"
    );
}
