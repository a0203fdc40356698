use thiserror::Error;

pub type Result<T> = std::result::Result<T, Bm25Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Bm25Error {
    /// Empty text handed to the normalizer or tokenizer.
    #[error("invalid input: text must be a non-empty string")]
    InvalidInput,
    #[error("document must not be null")]
    NullDocument,
    #[error("document index {index} out of bounds (document count {count})")]
    IndexOutOfBounds { index: usize, count: usize },
    /// A parallel-build slice failed; nothing was merged.
    #[error("parallel build worker failed: {0}")]
    WorkerFailure(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
