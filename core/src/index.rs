use crate::document::{DocId, Document, TermId};
use crate::error::{Bm25Error, Result};
use crate::tokenizer::Tokenizer;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Statistics of an independently built slice of documents, ids local to the slice.
/// Produced by parallel workers and folded into an [`Index`] with
/// [`Index::merge_partials`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialIndex {
    /// local term id -> term
    pub terms: Vec<String>,
    /// local term id -> (local doc id -> boosted frequency)
    pub frequencies: Vec<BTreeMap<DocId, f64>>,
    pub doc_lengths: Vec<f64>,
    pub documents: Vec<Document>,
}

impl PartialIndex {
    pub fn document_count(&self) -> usize { self.documents.len() }

    fn check(&self) -> Result<()> {
        if self.frequencies.len() != self.terms.len() {
            return Err(Bm25Error::WorkerFailure(format!(
                "partial index has {} terms but {} frequency rows",
                self.terms.len(),
                self.frequencies.len()
            )));
        }
        if self.doc_lengths.len() != self.documents.len() {
            return Err(Bm25Error::WorkerFailure(format!(
                "partial index has {} documents but {} lengths",
                self.documents.len(),
                self.doc_lengths.len()
            )));
        }
        let count = self.documents.len() as DocId;
        if self.frequencies.iter().flat_map(|row| row.keys()).any(|&doc| doc >= count) {
            let msg = "partial index references a document outside its slice";
            return Err(Bm25Error::WorkerFailure(msg.into()));
        }
        if self.frequencies.iter().flat_map(|row| row.values()).any(|&freq| !is_positive(freq)) {
            let msg = "partial index holds a non-positive term frequency";
            return Err(Bm25Error::WorkerFailure(msg.into()));
        }
        Ok(())
    }
}

pub(crate) fn is_positive(value: f64) -> bool { value.is_finite() && value > 0.0 }

/// Document statistics for BM25: vocabulary, per-term document frequency,
/// per-(term, document) boosted frequency, per-document length.
///
/// Documents and terms are append-only; ids are dense and never reused.
/// No internal locking: callers sharing an index across threads must serialize writers.
#[derive(Debug, Clone)]
pub struct Index {
    tokenizer: Tokenizer,
    field_boosts: HashMap<String, f64>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    df: Vec<u32>,
    tf: Vec<BTreeMap<DocId, f64>>, // indexed by term id
    doc_lengths: Vec<f64>,
    docs: Vec<Document>,
    avg_doc_length: f64,
}

impl Index {
    /// Fields whose boost is not a positive number are left out of the statistics.
    pub fn new(tokenizer: Tokenizer, field_boosts: HashMap<String, f64>) -> Self {
        for (field, boost) in &field_boosts {
            if !is_positive(*boost) {
                tracing::warn!(
                    field = %field,
                    boost,
                    "field boost is not positive, field will not be indexed"
                );
            }
        }
        Self {
            tokenizer,
            field_boosts,
            dictionary: HashMap::new(),
            terms: Vec::new(),
            df: Vec::new(),
            tf: Vec::new(),
            doc_lengths: Vec::new(),
            docs: Vec::new(),
            avg_doc_length: 0.0,
        }
    }

    /// Index a batch, computing document frequencies once at the end.
    pub fn build_from(&mut self, documents: Vec<Document>) {
        let count = documents.len();
        for doc in documents {
            self.index_document(doc);
        }
        self.recompute_df();
        self.recompute_average();
        tracing::debug!(
            added = count,
            num_docs = self.docs.len(),
            num_terms = self.terms.len(),
            "built index"
        );
    }

    pub fn add_one(&mut self, document: Document) {
        let touched = self.index_document(document);
        for tid in touched {
            self.df[tid as usize] += 1;
        }
        self.recompute_average();
    }

    pub fn add_many(&mut self, documents: Vec<Document>) {
        for doc in documents {
            self.add_one(doc);
        }
    }

    /// Fold independently built slices into this index, in slice order. Local document
    /// ids are shifted past every document already present, local term ids are
    /// translated into this index's vocabulary, then document frequencies and the
    /// average length are recomputed from scratch. The result equals adding the
    /// slices' documents one by one.
    ///
    /// Every partial is checked before anything is touched, so a malformed one leaves
    /// the index unchanged.
    pub fn merge_partials(&mut self, partials: Vec<PartialIndex>) -> Result<()> {
        for partial in &partials {
            partial.check()?;
        }
        let mut offset = self.docs.len() as DocId;
        let slices = partials.len();
        for partial in partials {
            let mapping: Vec<TermId> = partial.terms.iter().map(|t| self.intern(t)).collect();
            for (local, row) in partial.frequencies.into_iter().enumerate() {
                let postings = &mut self.tf[mapping[local] as usize];
                for (local_doc, freq) in row {
                    *postings.entry(offset + local_doc).or_insert(0.0) += freq;
                }
            }
            offset += partial.documents.len() as DocId;
            self.doc_lengths.extend(partial.doc_lengths);
            self.docs.extend(partial.documents);
        }
        self.recompute_df();
        self.recompute_average();
        tracing::debug!(
            slices,
            num_docs = self.docs.len(),
            num_terms = self.terms.len(),
            "merged partial indexes"
        );
        Ok(())
    }

    /// Move this index's statistics out as a slice-local snapshot.
    pub fn into_partial(self) -> PartialIndex {
        PartialIndex {
            terms: self.terms,
            frequencies: self.tf,
            doc_lengths: self.doc_lengths,
            documents: self.docs,
        }
    }

    /// An empty index with the same tokenizer and boosts.
    pub fn empty_like(&self) -> Self {
        Self::new(self.tokenizer.clone(), self.field_boosts.clone())
    }

    pub fn clear(&mut self) {
        self.dictionary.clear();
        self.terms.clear();
        self.df.clear();
        self.tf.clear();
        self.doc_lengths.clear();
        self.docs.clear();
        self.avg_doc_length = 0.0;
    }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    pub fn field_boosts(&self) -> &HashMap<String, f64> { &self.field_boosts }

    pub fn field_boost(&self, field: &str) -> f64 {
        self.field_boosts.get(field).copied().unwrap_or(1.0)
    }

    pub fn document_count(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn vocabulary_size(&self) -> usize { self.terms.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn document_frequency(&self, id: TermId) -> u32 {
        self.df.get(id as usize).copied().unwrap_or(0)
    }

    pub fn term_frequency(&self, id: TermId, doc: DocId) -> f64 {
        self.tf.get(id as usize).and_then(|row| row.get(&doc)).copied().unwrap_or(0.0)
    }

    /// `(document, boosted frequency)` pairs for a term, in document order.
    pub fn postings(&self, id: TermId) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.tf.get(id as usize).into_iter().flat_map(|row| row.iter().map(|(&d, &f)| (d, f)))
    }

    pub fn document_length(&self, doc: DocId) -> Option<f64> {
        self.doc_lengths.get(doc as usize).copied()
    }

    pub fn doc_lengths(&self) -> &[f64] { &self.doc_lengths }

    pub fn average_document_length(&self) -> f64 { self.avg_doc_length }

    pub fn document(&self, doc: usize) -> Result<&Document> {
        self.docs.get(doc).ok_or(Bm25Error::IndexOutOfBounds { index: doc, count: self.docs.len() })
    }

    pub fn documents(&self) -> &[Document] { &self.docs }

    /// Tokens of one field; empty text yields no tokens.
    pub(crate) fn field_tokens(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.tokenizer.tokenize(text).unwrap_or_default()
    }

    /// Append one document's length and term frequencies. Returns the distinct terms
    /// it contains; document frequencies are left to the caller.
    fn index_document(&mut self, doc: Document) -> HashSet<TermId> {
        let doc_id = self.docs.len() as DocId;
        let mut length = 0.0;
        let mut touched = HashSet::new();
        for (name, text) in doc.fields() {
            let boost = self.field_boost(name);
            if !is_positive(boost) {
                continue;
            }
            let tokens = self.field_tokens(text);
            length += tokens.len() as f64 * boost;

            // first-occurrence order decides term ids
            let mut counts: IndexMap<&str, usize> = IndexMap::new();
            for token in &tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, count) in counts {
                let tid = self.intern(term);
                *self.tf[tid as usize].entry(doc_id).or_insert(0.0) += count as f64 * boost;
                touched.insert(tid);
            }
        }
        self.doc_lengths.push(length);
        self.docs.push(doc);
        touched
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.terms.len() as TermId;
        self.dictionary.insert(term.to_string(), tid);
        self.terms.push(term.to_string());
        self.df.push(0);
        self.tf.push(BTreeMap::new());
        tid
    }

    fn recompute_df(&mut self) {
        self.df = self.tf.iter().map(|row| row.len() as u32).collect();
    }

    fn recompute_average(&mut self) {
        self.avg_doc_length = if self.doc_lengths.is_empty() {
            0.0
        } else {
            self.doc_lengths.iter().sum::<f64>() / self.doc_lengths.len() as f64
        };
    }
}
