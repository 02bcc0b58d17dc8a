//! Text normalisation applied to every page before the pages are joined.
//!
//! Extracted PDF text carries artefacts of the producing application that
//! add tokens without adding meaning: Windows line endings, zero-width
//! characters and soft hyphens, trailing spaces used for justification, and
//! long runs of empty lines where a figure used to be. Each rule is a pure
//! `&str → String` pass so it can be tested on its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the per-line rules see `\n` only;
//! blank-line collapsing runs after trailing whitespace is gone so lines made
//! only of spaces count as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalise one page of extracted text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 1
/// 5. Drop leading and trailing blank lines
///
/// The result never ends with a newline; the extractor adds the page
/// separator itself.
pub fn normalize_page(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    trim_blank_edges(&s).to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 5: Trim blank edges ─────────────────────────────────────────────────

fn trim_blank_edges(input: &str) -> &str {
    input.trim_matches('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible_chars() {
        assert_eq!(remove_invisible_chars("in\u{00AD}for\u{200B}ma\u{FEFF}tion"), "information");
    }

    #[test]
    fn test_trim_trailing_whitespace_keeps_indent() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld \t"),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn page_loses_trailing_newline() {
        assert_eq!(normalize_page("Cats are mammals.\n"), "Cats are mammals.");
    }

    #[test]
    fn whitespace_only_page_is_empty() {
        assert_eq!(normalize_page(" \r\n \u{200B}\n\t"), "");
    }

    #[test]
    fn full_pass() {
        let raw = "\n\nTitle  \r\n\r\n\r\n\r\nBody\u{00AD} text \n";
        assert_eq!(normalize_page(raw), "Title\n\nBody text");
    }
}
