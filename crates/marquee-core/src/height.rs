//! Row estimation for rendered text.
//!
//! A frame is erased by walking the cursor up over the rows it occupied, so
//! this count has to agree with how the terminal wrapped the text. Escape
//! sequences take no columns, wide glyphs take two and a tab advances to the
//! next tab stop.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthChar;

/// CSI, OSC and two-byte escape sequences.
static ESCAPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("escape pattern is valid")
});

/// Remove escape sequences, leaving printable text and line breaks.
pub fn strip_escapes(text: &str) -> Cow<'_, str> {
    ESCAPES.replace_all(text, "")
}

/// Distance between terminal tab stops.
const TAB_STOP: usize = 8;

/// Terminal columns taken by a single line of already-stripped text.
fn columns(plain: &str) -> usize {
    plain.chars().fold(0, |col, c| match c {
        '\t' => (col / TAB_STOP + 1) * TAB_STOP,
        ch if ch.is_control() => col,
        ch => col + ch.width().unwrap_or(0),
    })
}

/// Rows `text` occupies on a terminal `width` columns wide.
///
/// Every line segment takes at least one row, so an empty string is one row.
/// A width of zero is treated as one column.
pub fn rows(text: &str, width: u16) -> usize {
    let width = usize::from(width.max(1));
    strip_escapes(text)
        .split('\n')
        .map(|segment| columns(segment).div_ceil(width).max(1))
        .sum()
}

/// Rows taken by a block of lines written joined by line breaks.
///
/// Zero lines take zero rows.
pub fn block_rows(lines: &[String], width: u16) -> usize {
    lines.iter().map(|line| rows(line, width)).sum()
}
