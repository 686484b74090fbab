//! # Threading Configuration
//!
//! Rayon pool construction. The permutation engine runs inside
//! `pool.install`, so every parallel iterator it spawns uses this pool.

use rayon::ThreadPool;

use crate::error::{EnrichError, Result};

/// Clamp a requested thread count to `[1, available cores]`.
pub fn clamp_threads(requested: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.clamp(1, cores)
}

/// Create a configured thread pool.
pub fn build_thread_pool(n_threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(clamp_threads(n_threads))
        .thread_name(|i| format!("snpenrich-worker-{}", i))
        .build()
        .map_err(|e| EnrichError::config(format!("Failed to create thread pool: {}", e)))
}
