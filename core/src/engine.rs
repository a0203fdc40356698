use crate::config::{SearchOptions, DEFAULT_TOP_K};
use crate::document::{Document, SearchHit};
use crate::error::Result;
use crate::index::Index;
use crate::parallel::{ParallelBuilder, SliceExecutor};
use crate::scorer::{self, Bm25Params};
use crate::tokenizer::{TokenizeStats, Tokenizer};
use serde_json::Value;

/// BM25 search over an append-only, field-boosted document collection.
///
/// Reads (`search`, `search_phrase`) take `&self`; every mutation takes `&mut self`.
/// Wrap the engine in a lock to share it between threads.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    params: Bm25Params,
    index: Index,
}

impl SearchEngine {
    /// Validate options and index the initial documents, if any.
    pub fn new(documents: Vec<Document>, options: SearchOptions) -> Result<Self> {
        options.validate()?;
        let params = Bm25Params::from(&options);
        let tokenizer = Tokenizer::new(options.tokenizer);
        let mut index = Index::new(tokenizer, options.field_boosts);
        index.build_from(documents);
        Ok(Self { params, index })
    }

    pub fn with_options(options: SearchOptions) -> Result<Self> { Self::new(Vec::new(), options) }

    pub fn add_document(&mut self, document: Document) {
        self.index.add_one(document);
    }

    /// Add a document given as JSON; `null` is rejected with `NullDocument`.
    pub fn add_document_value(&mut self, value: &Value) -> Result<()> {
        let document = Document::from_json(value)?;
        self.index.add_one(document);
        Ok(())
    }

    pub fn add_documents(&mut self, documents: Vec<Document>) {
        self.index.add_many(documents);
    }

    pub fn add_documents_parallel(&mut self, documents: Vec<Document>) -> Result<()> {
        self.add_documents_parallel_with(&ParallelBuilder::new(), documents)
    }

    pub fn add_documents_parallel_with<E: SliceExecutor>(
        &mut self,
        builder: &ParallelBuilder<E>,
        documents: Vec<Document>,
    ) -> Result<()> {
        builder.build(&mut self.index, documents)
    }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        scorer::score(&self.index, self.params, query, top_k)
    }

    pub fn search_default(&self, query: &str) -> Vec<SearchHit> {
        self.search(query, DEFAULT_TOP_K)
    }

    pub fn search_phrase(&self, phrase: &str, top_k: usize) -> Vec<SearchHit> {
        scorer::score_phrase(&self.index, self.params, phrase, top_k)
    }

    pub fn tokenize(&self, text: &str, want_stats: bool) -> Result<(Vec<String>, TokenizeStats)> {
        self.index.tokenizer().tokenize_with_stats(text, want_stats)
    }

    pub fn document(&self, index: usize) -> Result<&Document> { self.index.document(index) }

    pub fn clear_documents(&mut self) {
        self.index.clear();
    }

    pub fn document_count(&self) -> usize { self.index.document_count() }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn index(&self) -> &Index { &self.index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Bm25Error;
    use serde_json::json;

    #[test]
    fn rejects_invalid_options() {
        let options = SearchOptions::default().with_params(1.2, 2.0);
        let err = SearchEngine::with_options(options).unwrap_err();
        assert!(matches!(err, Bm25Error::InvalidConfig(_)));
    }

    #[test]
    fn null_document_rejected_and_state_kept() {
        let mut engine = SearchEngine::with_options(SearchOptions::default()).unwrap();
        engine.add_document_value(&json!({"content": "kept"})).unwrap();
        assert_eq!(engine.add_document_value(&Value::Null), Err(Bm25Error::NullDocument));
        assert_eq!(engine.document_count(), 1);
    }

    #[test]
    fn clear_then_reuse() {
        let docs = vec![Document::from([("content", "rust")])];
        let mut engine = SearchEngine::new(docs, SearchOptions::default()).unwrap();
        assert_eq!(engine.search_default("rust").len(), 1);
        engine.clear_documents();
        assert_eq!(engine.document_count(), 0);
        assert!(engine.search_default("rust").is_empty());
    }
}
