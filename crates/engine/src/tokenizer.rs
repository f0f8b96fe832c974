//! Document tokenization
//!
//! The index only needs a finite, per-document stream of normalized tokens;
//! the [`Tokenizer`] trait keeps the tokenizer pluggable.

use unicode_segmentation::UnicodeSegmentation;

/// Turns document text into a lazy stream of index terms.
pub trait Tokenizer: Send + Sync {
    /// Tokens of `text` in document order; the position in the stream is the
    /// token's offset.
    fn tokens<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;
}

/// UAX#29 word boundaries → remove non-alphanumerics → lowercase → length filter.
#[derive(Debug, Clone, Copy)]
pub struct SimpleTokenizer {
    min_len: usize,
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self { min_len: 1 }
    }
}

impl SimpleTokenizer {
    /// Tokenizer keeping every word.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop tokens shorter than `min_len` characters.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokens<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(
            text.unicode_words()
                .map(|w| {
                    w.chars()
                        .filter(|c| c.is_alphanumeric())
                        .flat_map(char::to_lowercase)
                        .collect::<String>()
                })
                .filter(move |s| !s.is_empty() && s.chars().count() >= self.min_len),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(text: &str) -> Vec<String> {
        SimpleTokenizer::new().tokens(text).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_single_letters_kept_by_default() {
        assert_eq!(tokenize("a b c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_min_len() {
        let tokens: Vec<String> = SimpleTokenizer::new()
            .with_min_len(2)
            .tokens("I am a test")
            .collect();
        assert_eq!(tokens, vec!["am", "test"]);
    }

    #[test]
    fn test_internal_apostrophe_removed() {
        assert_eq!(tokenize("don't stop"), vec!["dont", "stop"]);
    }

    #[test]
    fn test_numbers_and_punctuation() {
        assert_eq!(tokenize("test123 ...---..."), vec!["test123"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_delimiter_never_in_tokens() {
        assert_eq!(tokenize("a<b"), vec!["a", "b"]);
    }
}
