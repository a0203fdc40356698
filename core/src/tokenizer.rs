use crate::config::TokenizerOptions;
use crate::error::Result;
use crate::normalizer::normalize;
use crate::stemmer::Stemmer;
use std::time::{Duration, Instant};

/// Tokens shorter than this are never stemmed.
const MIN_STEM_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TokenizeStats {
    /// Words in the normalized text before filtering.
    pub original_count: usize,
    pub removed_count: usize,
    pub stemmed_count: usize,
    pub elapsed: Duration,
}

/// Turns raw text into index terms. One instance defines the tokenization contract for
/// an index; queries and every parallel worker must use an equivalent one.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    options: TokenizerOptions,
    stemmer: Stemmer,
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(TokenizerOptions::default()) }
}

fn is_numeric(token: &str) -> bool { token.chars().all(|c| c.is_ascii_digit()) }

impl Tokenizer {
    pub fn new(options: TokenizerOptions) -> Self {
        let stemmer = Stemmer::with_rules(&options.custom_stem_rules);
        Self { options, stemmer }
    }

    pub fn options(&self) -> &TokenizerOptions { &self.options }

    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        self.tokenize_with_stats(text, false).map(|(tokens, _)| tokens)
    }

    /// Tokenize text, keeping order and duplicates. Stats are all zero unless `want_stats`.
    pub fn tokenize_with_stats(
        &self,
        text: &str,
        want_stats: bool,
    ) -> Result<(Vec<String>, TokenizeStats)> {
        let start = Instant::now();
        let normalized = normalize(text)?;
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

        let tokens: Vec<String> = words
            .iter()
            .copied()
            .filter(|w| self.keep(w))
            .map(|w| {
                if self.options.stemming && w.chars().count() >= MIN_STEM_LENGTH {
                    self.stemmer.stem(w)
                } else {
                    w.to_string()
                }
            })
            // a custom rule may rewrite a token to nothing
            .filter(|t| !t.is_empty())
            .collect();

        if !want_stats {
            return Ok((tokens, TokenizeStats::default()));
        }
        let stats = TokenizeStats {
            original_count: words.len(),
            removed_count: words.len() - tokens.len(),
            stemmed_count: if self.options.stemming { tokens.len() } else { 0 },
            elapsed: start.elapsed(),
        };
        Ok((tokens, stats))
    }

    fn keep(&self, word: &str) -> bool {
        let long_enough = word.chars().count() >= self.options.min_length || is_numeric(word);
        long_enough && !self.options.stop_words.contains(word)
    }
}
