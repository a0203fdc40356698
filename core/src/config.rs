//! Engine options.
//!
//! Everything here deserializes from JSON with per-field defaults, so a config
//! file only needs to name the values it changes.

use crate::error::{Bm25Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// BM25 term frequency saturation.
pub const DEFAULT_K1: f64 = 1.5;
/// BM25 document length normalization.
pub const DEFAULT_B: f64 = 0.75;
/// Shortest non-numeric token kept by the tokenizer.
pub const DEFAULT_MIN_LENGTH: usize = 2;
pub const DEFAULT_TOP_K: usize = 10;

/// A caller-supplied stemming rule. `pattern` is a regular expression, `replacement`
/// may reference capture groups (`$1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemRule {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub min_measure: Option<usize>,
}

impl StemRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into(), min_measure: None }
    }

    pub fn with_min_measure(mut self, measure: usize) -> Self {
        self.min_measure = Some(measure);
        self
    }
}

/// Tokenization contract shared by indexing, querying and every parallel worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub min_length: usize,
    pub stop_words: HashSet<String>,
    pub stemming: bool,
    pub custom_stem_rules: Vec<StemRule>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            stop_words: HashSet::new(),
            stemming: false,
            custom_stem_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub k1: f64,
    pub b: f64,
    #[serde(flatten)]
    pub tokenizer: TokenizerOptions,
    pub field_boosts: HashMap<String, f64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            tokenizer: TokenizerOptions::default(),
            field_boosts: HashMap::new(),
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokenizer.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stemming(mut self, stemming: bool) -> Self {
        self.tokenizer.stemming = stemming;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.tokenizer.min_length = min_length;
        self
    }

    pub fn with_stem_rules(mut self, rules: Vec<StemRule>) -> Self {
        self.tokenizer.custom_stem_rules = rules;
        self
    }

    pub fn with_field_boost(mut self, field: impl Into<String>, boost: f64) -> Self {
        self.field_boosts.insert(field.into(), boost);
        self
    }

    pub fn with_params(mut self, k1: f64, b: f64) -> Self {
        self.k1 = k1;
        self.b = b;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let opts: SearchOptions =
            serde_json::from_str(json).map_err(|e| Bm25Error::InvalidConfig(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            let msg = format!("k1 must be a non-negative number, got {}", self.k1);
            return Err(Bm25Error::InvalidConfig(msg));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Bm25Error::InvalidConfig(format!("b must lie in [0, 1], got {}", self.b)));
        }
        for (field, boost) in &self.field_boosts {
            if !boost.is_finite() || *boost <= 0.0 {
                let msg = format!("boost for field '{field}' must be positive, got {boost}");
                return Err(Bm25Error::InvalidConfig(msg));
            }
        }
        Ok(())
    }
}
