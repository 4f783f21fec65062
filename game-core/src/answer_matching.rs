use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("static pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));

pub struct AnswerMatcher;

impl AnswerMatcher {
    /// Canonical comparison form of a guess or answer.
    ///
    /// Decomposes to NFD and drops combining marks, lowercases, removes
    /// everything outside `[a-z0-9]` and whitespace, then collapses runs of
    /// whitespace to a single space.
    pub fn normalize(text: &str) -> String {
        let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
        let lowered = stripped.to_lowercase();
        let cleaned = DISALLOWED.replace_all(&lowered, "");
        WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
    }

    /// Exact equality of the normalized forms.
    pub fn is_correct(guess: &str, answer: &str) -> bool {
        Self::normalize(guess) == Self::normalize(answer)
    }
}
