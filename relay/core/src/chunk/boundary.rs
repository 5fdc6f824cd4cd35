//! Sentence boundary recognition

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Terminal punctuation followed by a single ASCII whitespace character.
pub const SENTENCE_PATTERN: &str = r"[.:!?][\t\n\x0C\r ]";

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SENTENCE_PATTERN).expect("sentence pattern is valid"));

/// A compiled boundary recognizer
///
/// Wraps a [`Regex`] and keeps the source pattern around for debugging.
/// The default recognizer matches sentence terminators (`.`, `:`, `!`, `?`)
/// immediately followed by whitespace.
#[derive(Clone)]
pub struct Boundary {
    pattern: String,
    regex: Regex,
}

impl Boundary {
    /// The sentence terminator recognizer
    #[must_use]
    pub fn sentence() -> Self {
        Self {
            pattern: SENTENCE_PATTERN.to_string(),
            regex: SENTENCE.clone(),
        }
    }

    /// Compile a custom boundary pattern
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error if `pattern` is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    /// The source pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Byte offset just past the last boundary in `text`
    ///
    /// The whole text is scanned on every call.
    #[must_use]
    pub fn last_match_end(&self, text: &str) -> Option<usize> {
        self.regex.find_iter(text).last().map(|m| m.end())
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Self::sentence()
    }
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundary")
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}
