//! Reduced Porter stemmer with caller-supplied override rules.
//!
//! Custom rules run first. If any of them fires the built-in steps are skipped
//! for that word, so custom rules replace the default algorithm rather than
//! feeding into it.

use crate::config::StemRule;
use regex::Regex;

/// Derivational suffixes and their replacements, first match wins.
const STEP3_SUFFIXES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Regex,
    replacement: String,
    min_measure: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Stemmer {
    rules: Vec<CompiledRule>,
}

impl Stemmer {
    pub fn new() -> Self { Self::default() }

    /// Build a stemmer with custom rules. Rules whose pattern fails to compile are
    /// logged and left out.
    pub fn with_rules(rules: &[StemRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(pattern) => Some(CompiledRule {
                    pattern,
                    replacement: rule.replacement.clone(),
                    min_measure: rule.min_measure,
                }),
                Err(err) => {
                    tracing::warn!(
                        pattern = %rule.pattern,
                        error = %err,
                        "discarding malformed stem rule"
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Number of custom rules that compiled.
    pub fn rule_count(&self) -> usize { self.rules.len() }

    pub fn stem(&self, word: &str) -> String {
        if let Some(custom) = self.apply_custom(word) {
            return custom;
        }
        let w = step1(word);
        let w = step2(&w);
        step3(&w)
    }

    fn apply_custom(&self, word: &str) -> Option<String> {
        let mut current = word.to_string();
        let mut fired = false;
        for rule in &self.rules {
            if !rule.pattern.is_match(&current) {
                continue;
            }
            if let Some(min) = rule.min_measure {
                if measure(&current) < min {
                    continue;
                }
            }
            current = rule.pattern.replace(&current, rule.replacement.as_str()).into_owned();
            fired = true;
        }
        fired.then_some(current)
    }
}

/// Consonant flag per character, computed in one forward pass. `y` is a consonant at
/// the start of a word or after a vowel, and a vowel after a consonant.
fn consonant_flags(word: &str) -> Vec<bool> {
    let mut flags: Vec<bool> = Vec::with_capacity(word.len());
    for c in word.chars() {
        let consonant = match c {
            'a' | 'e' | 'i' | 'o' | 'u' => false,
            'y' => flags.last().map_or(true, |&prev| !prev),
            _ => true,
        };
        flags.push(consonant);
    }
    flags
}

/// Number of vowel-sequence to consonant-sequence transitions, the `m` in
/// `[C](VC){m}[V]`.
pub fn measure(word: &str) -> usize {
    let mut m = 0;
    let mut prev_vowel = false;
    for consonant in consonant_flags(word) {
        if consonant && prev_vowel {
            m += 1;
        }
        prev_vowel = !consonant;
    }
    m
}

fn contains_vowel(word: &str) -> bool { consonant_flags(word).iter().any(|&c| !c) }

fn ends_double_consonant(word: &str) -> bool {
    let flags = consonant_flags(word);
    let mut rev = word.chars().rev();
    match (rev.next(), rev.next()) {
        (Some(last), Some(prev)) => last == prev && flags[flags.len() - 1],
        _ => false,
    }
}

/// consonant-vowel-consonant ending where the last consonant is not w, x or y
fn ends_cvc(word: &str) -> bool {
    let flags = consonant_flags(word);
    let n = flags.len();
    n >= 3
        && flags[n - 3]
        && !flags[n - 2]
        && flags[n - 1]
        && !matches!(word.chars().last(), Some('w' | 'x' | 'y'))
}

fn step1(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("sses") {
        format!("{stem}ss")
    } else if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}i")
    } else if let Some(stem) = word.strip_suffix('s') {
        if stem.ends_with('s') { word.to_string() } else { stem.to_string() }
    } else {
        word.to_string()
    }
}

fn step2(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("eed") {
        return if measure(stem) > 0 { format!("{stem}ee") } else { word.to_string() };
    }
    let stem = word.strip_suffix("ed").or_else(|| word.strip_suffix("ing"));
    match stem {
        Some(stem) if contains_vowel(stem) => cleanup(stem),
        _ => word.to_string(),
    }
}

fn cleanup(stem: &str) -> String {
    if stem.ends_with("at") || stem.ends_with("bl") || stem.ends_with("iz") {
        format!("{stem}e")
    } else if ends_double_consonant(stem) {
        let mut s = stem.to_string();
        s.pop();
        s
    } else if measure(stem) == 1 && ends_cvc(stem) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

fn step3(word: &str) -> String {
    for (suffix, replacement) in STEP3_SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            return if measure(stem) > 0 {
                format!("{stem}{replacement}")
            } else {
                word.to_string()
            };
        }
    }
    word.to_string()
}
