use std::fmt::Write as _;
use std::path::Path;

pub const ICONS_FIXTURE: &str = "tests/fixtures/icons.svg";
pub const SYMBOLS_FIXTURE: &str = "tests/fixtures/symbols.svg";

pub const CORE_FIXTURES: &[&str] = &[ICONS_FIXTURE, SYMBOLS_FIXTURE];

pub fn read_fixture(path: &str) -> Vec<u8> {
    std::fs::read(Path::new(path)).unwrap_or_else(|e| panic!("read {}: {}", path, e))
}

/// A flat document with `rows` groups of basic shapes, for budget checks.
pub fn synthetic_document(rows: usize) -> String {
    let mut out = String::with_capacity(rows * 320 + 128);
    out.push_str(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600" viewBox="0 0 400 300">"#,
    );
    for row in 0..rows {
        let y = (row % 30) as f64 * 10.0;
        let _ = write!(
            out,
            concat!(
                r#"<g id="row{row}" transform="translate(0 {y})" style="stroke: black; stroke-width: 0.5">"#,
                r#"<rect x="1" y="1" width="40" height="8" rx="2"/>"#,
                r#"<circle cx="50" cy="5" r="4" fill="url(#paint) none"/>"#,
                r#"<polyline points="60,1 70,9 80,1 90,9"/>"#,
                r#"<path d="M100 1 l10 8 h-10 z"/>"#,
                "</g>"
            ),
            row = row,
            y = y
        );
    }
    out.push_str("</svg>");
    out
}
