use std::sync::LazyLock;

use regex::Regex;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    // Recognizer event tags such as <|zh|>, <|EMO_UNKNOWN|>, <|Speech|>.
    Regex::new(r"<\|[^|]*\|>").unwrap_or_else(|e| panic!("invalid markup pattern: {e}"))
});

/// Strips inline recognizer markup tags from transcript text and trims
/// the surrounding whitespace they leave behind.
pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").trim().to_string()
}
