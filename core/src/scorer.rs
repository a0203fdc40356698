//! Okapi BM25 ranking over an [`Index`], plus exact phrase matching.

use crate::config::{SearchOptions, DEFAULT_B, DEFAULT_K1};
use crate::document::{DocId, SearchHit, TermId};
use crate::index::{is_positive, Index};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: DEFAULT_K1, b: DEFAULT_B } }
}

impl From<&SearchOptions> for Bm25Params {
    fn from(opts: &SearchOptions) -> Self { Self { k1: opts.k1, b: opts.b } }
}

/// `ln((N - df + 0.5) / (df + 0.5) + 1)`
pub fn idf(num_docs: usize, df: u32) -> f64 {
    let n = num_docs as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Saturated, length-normalized term frequency.
pub fn normalized_tf(tf: f64, doc_len: f64, avg_len: f64, params: Bm25Params) -> f64 {
    let avg_len = if avg_len > 0.0 { avg_len } else { 1.0 };
    let Bm25Params { k1, b } = params;
    tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * doc_len / avg_len))
}

fn contribution(index: &Index, params: Bm25Params, term: TermId, doc: DocId, term_idf: f64) -> f64 {
    let tf = index.term_frequency(term, doc);
    let doc_len = index.document_length(doc).unwrap_or(0.0);
    term_idf * normalized_tf(tf, doc_len, index.average_document_length(), params)
}

fn query_tokens(index: &Index, text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    index.tokenizer().tokenize(text).unwrap_or_default()
}

/// Keep positive scores, best first, ties by ascending document index.
fn rank(scores: impl IntoIterator<Item = (DocId, f64)>, top_k: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scores
        .into_iter()
        .filter(|&(_, score)| score > 0.0)
        .map(|(index, score)| SearchHit { index, score })
        .collect();
    hits.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.index.cmp(&b.index))
    });
    hits.truncate(top_k);
    hits
}

/// Rank documents against a free-text query. Unknown terms contribute nothing.
pub fn score(index: &Index, params: Bm25Params, query: &str, top_k: usize) -> Vec<SearchHit> {
    let tokens = query_tokens(index, query);
    if tokens.is_empty() || index.is_empty() {
        return Vec::new();
    }
    let n = index.document_count();
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for token in &tokens {
        let Some(term) = index.term_id(token) else { continue };
        let term_idf = idf(n, index.document_frequency(term));
        for (doc, _) in index.postings(term) {
            *scores.entry(doc).or_insert(0.0) += contribution(index, params, term, doc, term_idf);
        }
    }
    rank(scores, top_k)
}

/// Rank documents holding the phrase as a contiguous token run in at least one field.
/// Each matching field adds `boost * phrase_score`, where the phrase score sums the
/// document-level BM25 contribution of every phrase token.
pub fn score_phrase(
    index: &Index,
    params: Bm25Params,
    phrase: &str,
    top_k: usize,
) -> Vec<SearchHit> {
    let tokens = query_tokens(index, phrase);
    if tokens.is_empty() || index.is_empty() {
        return Vec::new();
    }
    let terms: Option<Vec<TermId>> = tokens.iter().map(|t| index.term_id(t)).collect();
    let Some(terms) = terms else {
        return Vec::new();
    };

    let mut candidates: BTreeSet<DocId> = index.postings(terms[0]).map(|(doc, _)| doc).collect();
    for &term in &terms[1..] {
        let docs: BTreeSet<DocId> = index.postings(term).map(|(doc, _)| doc).collect();
        candidates.retain(|doc| docs.contains(doc));
    }

    let n = index.document_count();
    let idfs: Vec<f64> = terms.iter().map(|&t| idf(n, index.document_frequency(t))).collect();
    let mut scores = Vec::new();
    for doc in candidates {
        let Ok(document) = index.document(doc as usize) else { continue };
        let phrase_score: f64 = terms
            .iter()
            .zip(&idfs)
            .map(|(&term, &term_idf)| contribution(index, params, term, doc, term_idf))
            .sum();
        let mut total = 0.0;
        let mut matched = false;
        for (field, text) in document.fields() {
            let boost = index.field_boost(field);
            if !is_positive(boost) {
                continue;
            }
            let field_tokens = index.field_tokens(text);
            if contains_run(&field_tokens, &tokens) {
                total += boost * phrase_score;
                matched = true;
            }
        }
        if matched {
            scores.push((doc, total));
        }
    }
    rank(scores, top_k)
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenizer::Tokenizer;

    fn build(texts: &[&str]) -> Index {
        let mut idx = Index::new(Tokenizer::default(), HashMap::new());
        idx.build_from(texts.iter().map(|t| Document::new().field("content", *t)).collect());
        idx
    }

    #[test]
    fn idf_decreases_with_df() {
        assert!(idf(10, 1) > idf(10, 5));
        assert!(idf(10, 10) > 0.0);
    }

    #[test]
    fn empty_query_or_index() {
        let idx = build(&["rust programming"]);
        assert!(score(&idx, Bm25Params::default(), "", 10).is_empty());
        let empty = build(&[]);
        assert!(score(&empty, Bm25Params::default(), "rust", 10).is_empty());
    }

    #[test]
    fn higher_tf_ranks_first() {
        let idx = build(&["rust rust rust", "rust programming"]);
        let hits = score(&idx, Bm25Params::default(), "rust", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
    }

    #[test]
    fn matches_formula() {
        let idx = build(&["cat dog", "dog bird fish"]);
        let hits = score(&idx, Bm25Params::default(), "cat", 10);
        assert_eq!(hits.len(), 1);
        let expected = idf(2, 1) * normalized_tf(1.0, 2.0, 2.5, Bm25Params::default());
        assert!((hits[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn truncates_and_skips_unknown_terms() {
        let idx = build(&["rust systems", "rust web", "rust embedded"]);
        assert_eq!(score(&idx, Bm25Params::default(), "rust", 2).len(), 2);
        assert!(score(&idx, Bm25Params::default(), "haskell", 10).is_empty());
        assert_eq!(score(&idx, Bm25Params::default(), "haskell web", 10).len(), 1);
    }

    #[test]
    fn ties_break_on_index() {
        let idx = build(&["same words", "same words", "same words"]);
        let hits = score(&idx, Bm25Params::default(), "words", 10);
        let order: Vec<DocId> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn phrase_requires_contiguous_run() {
        let idx = build(&["quick brown fox", "brown quick fox", "the quick brown dog"]);
        let hits = score_phrase(&idx, Bm25Params::default(), "quick brown", 10);
        let docs: Vec<DocId> = hits.iter().map(|h| h.index).collect();
        assert_eq!(docs.len(), 2);
        assert!(docs.contains(&0) && docs.contains(&2));
        assert!(!docs.contains(&1));
    }

    #[test]
    fn phrase_with_unknown_term_is_empty() {
        let idx = build(&["quick brown fox"]);
        assert!(score_phrase(&idx, Bm25Params::default(), "quick purple", 10).is_empty());
        assert!(score_phrase(&idx, Bm25Params::default(), "", 10).is_empty());
    }

    #[test]
    fn phrase_accumulates_over_fields() {
        let boosts = HashMap::from([("title".to_string(), 2.0)]);
        let mut idx = Index::new(Tokenizer::default(), boosts);
        idx.build_from(vec![
            Document::new().field("title", "red apple").field("body", "a red apple a day"),
            Document::new().field("title", "green pear").field("body", "red apple pie"),
        ]);
        let hits = score_phrase(&idx, Bm25Params::default(), "red apple", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
        let params = Bm25Params::default();
        let n = idx.document_count();
        let phrase_score: f64 = ["red", "apple"]
            .iter()
            .map(|t| {
                let id = idx.term_id(t).unwrap();
                idf(n, idx.document_frequency(id))
                    * normalized_tf(
                        idx.term_frequency(id, 0),
                        idx.document_length(0).unwrap(),
                        idx.average_document_length(),
                        params,
                    )
            })
            .sum();
        assert!((hits[0].score - 3.0 * phrase_score).abs() < 1e-9);
    }
}
