use std::fs;
use std::path::{Path, PathBuf};

use duskmark_core::Extensions;
use duskmark_html::{render_html, HtmlFlags};

fn fixture_extensions() -> Extensions {
    Extensions::TABLES
        | Extensions::FENCED_CODE
        | Extensions::AUTOLINK
        | Extensions::STRIKETHROUGH
        | Extensions::SUPERSCRIPT
        | Extensions::FOOTNOTES
}

#[test]
fn golden_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let fixtures_dir = root.join("tests/fixtures");
    let expect_dir = root.join("tests/expect");

    let mut fixtures = collect_fixtures(&fixtures_dir)?;
    fixtures.sort();
    assert!(!fixtures.is_empty(), "no fixtures under {:?}", fixtures_dir);

    for fixture in fixtures {
        let name = fixture
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or("fixture without a name")?
            .to_string();
        let source = fs::read(&fixture)?;
        let html = render_html(&source, fixture_extensions(), HtmlFlags::empty())?;

        let expected_path = expect_dir.join(format!("{}.html", name));
        let expected = fs::read(&expected_path)?;
        assert_eq!(
            String::from_utf8_lossy(&html),
            String::from_utf8_lossy(&expected),
            "HTML mismatch for fixture {}",
            name
        );
    }

    Ok(())
}

fn collect_fixtures(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("text") {
            out.push(path);
        }
    }
    Ok(out)
}
