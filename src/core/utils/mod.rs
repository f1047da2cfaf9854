//! Shared utilities.

/// Thread pool construction and work partitioning
pub mod threading;
