//! Dataset container and loading.
//!
//! The trainer consumes an immutable [`Problem`]; [`ProblemLoader`] builds
//! one from dense/sparse text files.

pub mod loader;
pub mod problem;

pub use loader::{LoaderConfig, ProblemLoader};
pub use problem::{DenseNode, Problem};
