//! Terminal column accounting.
//!
//! Every padding computation in the renderer goes through [`display_width`],
//! so colored text and wide glyphs never push a border out of line.

use std::sync::OnceLock;

use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn ansi_regex() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        // CSI sequences, OSC sequences (BEL or ST terminated), then lone two-byte escapes.
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
            .expect("regex")
    })
}

/// Removes ANSI escape sequences, leaving only printable text.
pub fn strip_ansi(text: &str) -> String {
    if !text.contains('\x1b') {
        return text.to_string();
    }
    ansi_regex().replace_all(text, "").into_owned()
}

/// Rendered column width of `text`. Escape sequences count as zero.
pub fn display_width(text: &str) -> usize {
    if text.contains('\x1b') {
        UnicodeWidthStr::width(strip_ansi(text).as_str())
    } else {
        UnicodeWidthStr::width(text)
    }
}

pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Longest prefix of `text` whose width fits in `max_width`.
///
/// A wide glyph that would straddle the limit is dropped rather than split.
/// Expects plain text; strip escapes first when in doubt.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Right-pads `text` with spaces up to `width` columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let current = display_width(text);
    if current >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - current))
}
