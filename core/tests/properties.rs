use okapi_core::normalizer::normalize;
use okapi_core::{
    Bm25Error, Document, Index, ParallelBuilder, TermId, Tokenizer, TokenizerOptions,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just("alpha"), Just("beta"), Just("gamma"), Just("delta"), Just("x"), Just("42"), Just("Ünï")], 0..8)
        .prop_map(|words| words.join(" "))
}

fn doc_strategy() -> impl Strategy<Value = Document> {
    (text_strategy(), text_strategy()).prop_map(|(title, body)| Document::new().field("title", title).field("body", body))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalization_is_idempotent(text in "\\PC{1,40}") {
        let once = normalize(&text).unwrap();
        if once.is_empty() {
            // nothing left to normalize a second time
            prop_assert_eq!(normalize(&once), Err(Bm25Error::InvalidInput));
        } else {
            prop_assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn filtering_laws_hold(words in prop::collection::vec("[a-z0-9]{1,6}", 1..20), min_length in 1usize..5) {
        let stop: Vec<String> = words.iter().step_by(3).cloned().collect();
        let t = Tokenizer::new(TokenizerOptions {
            min_length,
            stop_words: stop.iter().cloned().collect(),
            ..TokenizerOptions::default()
        });
        for token in t.tokenize(&words.join(" ")).unwrap() {
            prop_assert!(token.chars().count() >= min_length || token.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(!stop.contains(&token));
        }
    }

    #[test]
    fn merge_matches_sequential_for_any_partition(
        docs in prop::collection::vec(doc_strategy(), 1..12),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let boosts = HashMap::from([("title".to_string(), 3.0)]);
        let mut sequential = Index::new(Tokenizer::default(), boosts.clone());
        sequential.add_many(docs.clone());

        let mut points: Vec<usize> = cuts.iter().map(|c| c.index(docs.len() + 1)).collect();
        points.push(0);
        points.push(docs.len());
        points.sort();
        points.dedup();
        let slices: Vec<Vec<Document>> = points.windows(2).map(|w| docs[w[0]..w[1]].to_vec()).collect();

        let mut merged = Index::new(Tokenizer::default(), boosts);
        ParallelBuilder::new().build_slices(&mut merged, slices).unwrap();

        prop_assert_eq!(merged.vocabulary_size(), sequential.vocabulary_size());
        for t in 0..merged.vocabulary_size() as TermId {
            prop_assert_eq!(merged.document_frequency(t), sequential.document_frequency(t));
        }
        prop_assert!((merged.average_document_length() - sequential.average_document_length()).abs() < 1e-9);
        prop_assert_eq!(merged.into_partial(), sequential.into_partial());
    }
}
