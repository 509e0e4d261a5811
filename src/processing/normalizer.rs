//! Text normalization ahead of semantic comparison

use regex::Regex;

/// Conditions raw document text for embedding.
///
/// Lowercases, drops every character that is not a word character,
/// whitespace or hyphen, collapses whitespace runs (newlines included) to a
/// single space and trims the ends. Stripping happens before collapsing so
/// the output never contains a double space, which keeps the function
/// idempotent.
pub struct TextNormalizer {
    strip_regex: Regex,
    whitespace_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let strip_regex = Regex::new(r"[^\w\s\-]").expect("Invalid strip regex");
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        Self {
            strip_regex,
            whitespace_regex,
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let stripped = self.strip_regex.replace_all(&lowered, "");
        self.whitespace_regex
            .replace_all(&stripped, " ")
            .trim()
            .to_string()
    }
}
