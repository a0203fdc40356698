//! Parallel index construction.
//!
//! A batch is cut into contiguous slices, each slice is indexed from scratch on its own
//! worker with an owned copy of the tokenizer and boosts, and the partial results are
//! merged back in slice order. Workers share nothing mutable; the caller's index is
//! only touched once every worker has succeeded.

use crate::document::Document;
use crate::error::{Bm25Error, Result};
use crate::index::{Index, PartialIndex};
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Everything a worker needs to index a slice the same way the target index would.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub tokenizer: Tokenizer,
    pub field_boosts: HashMap<String, f64>,
}

impl WorkerConfig {
    pub fn from_index(index: &Index) -> Self {
        Self { tokenizer: index.tokenizer().clone(), field_boosts: index.field_boosts().clone() }
    }
}

/// Turns one slice into a self-contained [`PartialIndex`]. Called once per slice,
/// possibly from several threads at once.
pub trait SliceExecutor: Send + Sync {
    fn dispatch(&self, slice: Vec<Document>, config: &WorkerConfig) -> Result<PartialIndex>;
}

/// Builds each slice in-process with [`Index::build_from`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl SliceExecutor for LocalExecutor {
    fn dispatch(&self, slice: Vec<Document>, config: &WorkerConfig) -> Result<PartialIndex> {
        let mut index = Index::new(config.tokenizer.clone(), config.field_boosts.clone());
        index.build_from(slice);
        Ok(index.into_partial())
    }
}

pub const MIN_WORKERS: usize = 2;

pub struct ParallelBuilder<E = LocalExecutor> {
    executor: E,
    workers: usize,
}

impl ParallelBuilder<LocalExecutor> {
    pub fn new() -> Self { Self::with_executor(LocalExecutor) }
}

impl Default for ParallelBuilder<LocalExecutor> {
    fn default() -> Self { Self::new() }
}

impl<E: SliceExecutor> ParallelBuilder<E> {
    /// Worker count defaults to the available parallelism, never below two.
    pub fn with_executor(executor: E) -> Self {
        Self { executor, workers: rayon::current_num_threads().max(MIN_WORKERS) }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(MIN_WORKERS);
        self
    }

    pub fn worker_count(&self) -> usize { self.workers }

    /// Index `documents` in parallel and merge them into `index`. No-op for an empty batch.
    pub fn build(&self, index: &mut Index, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let slices = partition(documents, self.workers);
        self.build_slices(index, slices)
    }

    /// Index pre-cut slices, one worker each, and merge them in the given order.
    pub fn build_slices(&self, index: &mut Index, slices: Vec<Vec<Document>>) -> Result<()> {
        let slices: Vec<Vec<Document>> = slices.into_iter().filter(|s| !s.is_empty()).collect();
        if slices.is_empty() {
            return Ok(());
        }
        let num_docs: usize = slices.iter().map(Vec::len).sum();
        let config = WorkerConfig::from_index(index);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(slices.len())
            .thread_name(|i| format!("okapi-worker-{i}"))
            .build()
            .map_err(|e| Bm25Error::WorkerFailure(format!("could not start workers: {e}")))?;
        tracing::info!(workers = slices.len(), num_docs, "starting parallel build");

        // collect every outcome first so no worker is still running when we bail out
        let outcomes: Vec<Result<PartialIndex>> = pool.install(|| {
            slices
                .into_par_iter()
                .enumerate()
                .map(|(slot, slice)| {
                    let config = config.clone();
                    let run = AssertUnwindSafe(|| self.executor.dispatch(slice, &config));
                    catch_unwind(run).unwrap_or_else(|panic| {
                        let msg = panic_message(panic.as_ref());
                        Err(Bm25Error::WorkerFailure(format!("worker {slot} panicked: {msg}")))
                    })
                })
                .collect()
        });
        drop(pool);

        let partials = outcomes.into_iter().collect::<Result<Vec<_>>>().map_err(|err| {
            tracing::warn!(error = %err, "parallel build failed, index left unchanged");
            err
        })?;
        index.merge_partials(partials)
    }
}

/// Split into at most `workers` contiguous slices of near-equal size, order kept.
pub fn partition(documents: Vec<Document>, workers: usize) -> Vec<Vec<Document>> {
    let size = documents.len().div_ceil(workers.max(1)).max(1);
    let mut slices = Vec::with_capacity(workers);
    let mut docs = documents.into_iter().peekable();
    while docs.peek().is_some() {
        slices.push(docs.by_ref().take(size).collect());
    }
    slices
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
