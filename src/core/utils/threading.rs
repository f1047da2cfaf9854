//! Threading utilities built on Rayon.
//!
//! Two partitioning disciplines are used by the trainer:
//! - static: per-instance loops are cut into one equal block per worker,
//!   since every instance costs the same;
//! - dynamic: per-field scans are handed out one field at a time, since a
//!   field's cost depends on how many instances are still active in it.

use crate::core::error::{GbdtError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Resolve a configured thread count, where 0 means all available cores.
pub fn effective_num_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads
    }
}

/// Build a fixed-size worker pool for one fit or batch-inference call.
pub fn build_thread_pool(num_threads: usize) -> Result<ThreadPool> {
    let num_threads = effective_num_threads(num_threads);
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("gbdt-worker-{}", i))
        .build()
        .map_err(|e| GbdtError::threading(format!("failed to build thread pool: {}", e)))
}

/// Block size for static scheduling of `cnt` uniform work items over
/// `num_threads` workers. Always at least `min_cnt_per_block` (and at least 1).
pub fn static_block_size(cnt: usize, num_threads: usize, min_cnt_per_block: usize) -> usize {
    let min_cnt_per_block = min_cnt_per_block.max(1);
    let num_threads = num_threads.max(1);
    let n_block = num_threads.min((cnt + min_cnt_per_block - 1) / min_cnt_per_block);
    if n_block > 1 {
        (cnt + n_block - 1) / n_block
    } else {
        cnt.max(1)
    }
}

/// Static block size for the pool the caller is currently running in.
pub fn current_static_block_size(cnt: usize) -> usize {
    static_block_size(cnt, rayon::current_num_threads(), MIN_INSTANCES_PER_BLOCK)
}

/// Per-instance loops below this size are not worth splitting further.
pub const MIN_INSTANCES_PER_BLOCK: usize = 1024;
