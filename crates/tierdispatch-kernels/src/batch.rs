//! Batch drivers that resolve once and fan the selected kernel out.
//!
//! With the `parallel` feature, work above a size threshold is split across
//! rayon worker threads; otherwise everything runs on the calling thread.

use crate::global::{increment_kernel, slice_kernel};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration for batch execution.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Minimum number of elements to trigger parallel execution
    pub min_len_for_parallel: usize,
    /// Elements per parallel task (None = let rayon split)
    pub chunk_size: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            min_len_for_parallel: 4096,
            chunk_size: None,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum length for parallel execution.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len_for_parallel = min_len;
        self
    }

    /// Set the chunk size for parallel iterations.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Check if parallel execution should be used for `len` elements.
    pub fn should_parallelize(&self, len: usize) -> bool {
        cfg!(feature = "parallel") && len >= self.min_len_for_parallel
    }
}

/// Apply `increment` to every vector of `batch`.
pub fn increment_batch(batch: &mut [[f32; 4]]) {
    increment_batch_with(batch, &ParallelConfig::default());
}

/// Apply `increment` to every vector of `batch` under `config`.
pub fn increment_batch_with(batch: &mut [[f32; 4]], config: &ParallelConfig) {
    let kernel = increment_kernel().kernel();

    #[cfg(feature = "parallel")]
    {
        if config.should_parallelize(batch.len()) {
            match config.chunk_size {
                Some(size) => batch
                    .par_chunks_mut(size)
                    .for_each(|chunk| chunk.iter_mut().for_each(kernel)),
                None => batch.par_iter_mut().for_each(kernel),
            }
            return;
        }
    }

    #[cfg(not(feature = "parallel"))]
    let _ = config;

    batch.iter_mut().for_each(kernel);
}

/// Apply `increment_slice` to `data`, split into chunks across threads when
/// `data` is large enough.
pub fn increment_slice_par(data: &mut [f32], config: &ParallelConfig) {
    let kernel = slice_kernel().kernel();

    #[cfg(feature = "parallel")]
    {
        if config.should_parallelize(data.len()) {
            let chunk = config
                .chunk_size
                .unwrap_or_else(|| default_chunk(data.len()));
            data.par_chunks_mut(chunk).for_each(kernel);
            return;
        }
    }

    #[cfg(not(feature = "parallel"))]
    let _ = config;

    kernel(data);
}

/// One chunk per worker, rounded up to a multiple of 16 lanes so every chunk
/// but the last stays on the widest vector path.
#[cfg(feature = "parallel")]
fn default_chunk(len: usize) -> usize {
    let per_thread = len.div_ceil(rayon::current_num_threads().max(1));
    per_thread.next_multiple_of(16).max(16)
}
