//! In-process BM25 text ranking over field-boosted documents.
//!
//! Raw text goes through [`normalizer`] and [`tokenizer`] (with an optional reduced
//! Porter [`stemmer`]), [`index::Index`] accumulates document statistics, and
//! [`scorer`] ranks documents against free-text or phrase queries. Batches can be
//! indexed on several threads with [`parallel::ParallelBuilder`].

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod parallel;
pub mod scorer;
pub mod stemmer;
pub mod tokenizer;

pub use config::{SearchOptions, StemRule, TokenizerOptions};
pub use document::{DocId, Document, SearchHit, TermId};
pub use engine::SearchEngine;
pub use error::{Bm25Error, Result};
pub use index::{Index, PartialIndex};
pub use parallel::{LocalExecutor, ParallelBuilder, SliceExecutor, WorkerConfig};
pub use tokenizer::{TokenizeStats, Tokenizer};
