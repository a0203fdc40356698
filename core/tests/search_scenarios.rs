use okapi_core::{Document, SearchEngine, SearchHit, SearchOptions};

fn corpus() -> Vec<Document> {
    vec![
        Document::from([("title", "The quick brown fox"), ("content", "jumps over the lazy dog")]),
        Document::from([("title", "The lazy brown dog"), ("content", "sleeps all day long")]),
        Document::from([("title", "Quick fox"), ("content", "quick brown jumping")]),
    ]
}

fn score_of(hits: &[SearchHit], index: u32) -> f64 {
    hits.iter().find(|h| h.index == index).map(|h| h.score).unwrap_or(0.0)
}

#[test]
fn brown_fox_ranks_quick_fox_above_lazy_dog() {
    let engine = SearchEngine::new(corpus(), SearchOptions::default()).unwrap();
    let hits = engine.search("brown fox", 2);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.score > 0.0));
    assert!(hits[0].score >= hits[1].score);

    let all = engine.search("brown fox", 3);
    assert!(score_of(&all, 2) > score_of(&all, 1));
}

#[test]
fn boosted_title_dominates() {
    let options = SearchOptions::default().with_field_boost("title", 100.0).with_field_boost("content", 1.0);
    let engine = SearchEngine::new(corpus(), options).unwrap();
    let hits = engine.search("quick", 3);
    let pos = |i: u32| hits.iter().position(|h| h.index == i).unwrap();
    assert!(pos(2) < pos(0));
}

#[test]
fn stop_word_query_finds_nothing() {
    let engine = SearchEngine::new(
        vec![Document::from([("content", "the quick brown fox")])],
        SearchOptions::default().with_stop_words(["the"]),
    )
    .unwrap();
    assert!(engine.search_default("the").is_empty());
    assert_eq!(engine.search_default("fox").len(), 1);
}

#[test]
fn every_indexed_term_finds_its_document() {
    let doc = Document::from([("title", "Ferris the crab"), ("body", "Rust 2021 edition")]);
    let engine = SearchEngine::new(vec![doc.clone()], SearchOptions::default()).unwrap();
    for (_, text) in doc.fields() {
        for token in engine.tokenize(text, false).unwrap().0 {
            let hits = engine.search(&token, 10);
            assert_eq!(hits.len(), 1, "no hit for {token}");
            assert!(hits[0].score > 0.0);
        }
    }
}

#[test]
fn repeated_searches_are_identical() {
    let engine = SearchEngine::new(corpus(), SearchOptions::default()).unwrap();
    assert_eq!(engine.search("brown dog fox", 10), engine.search("brown dog fox", 10));
    assert_eq!(engine.search_phrase("brown fox", 10), engine.search_phrase("brown fox", 10));
}

#[test]
fn phrase_search_needs_adjacent_terms() {
    let engine = SearchEngine::new(corpus(), SearchOptions::default()).unwrap();
    let hits = engine.search_phrase("brown fox", 10);
    assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), vec![0]);
    // "quick" and "brown" co-occur in doc 0 title and doc 2 content
    let hits = engine.search_phrase("quick brown", 10);
    let mut docs: Vec<u32> = hits.iter().map(|h| h.index).collect();
    docs.sort();
    assert_eq!(docs, vec![0, 2]);
    assert!(engine.search_phrase("fox brown", 10).is_empty());
}

#[test]
fn incremental_adds_extend_results() {
    let mut engine = SearchEngine::with_options(SearchOptions::default()).unwrap();
    engine.add_documents(corpus());
    engine.add_document(Document::from([("title", "Arctic fox"), ("content", "white fur")]));
    assert_eq!(engine.document_count(), 4);
    let hits = engine.search("arctic", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 3);
    assert!(engine.document(4).is_err());
}

#[test]
fn stemmed_query_matches_inflected_text() {
    let engine = SearchEngine::new(
        vec![Document::from([("content", "the dogs were running")]), Document::from([("content", "cats sleep")])],
        SearchOptions::default().with_stemming(true),
    )
    .unwrap();
    let hits = engine.search("run dog", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 0);
}
