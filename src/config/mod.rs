//! Configuration management for exact-gbdt.
//!
//! Configuration is fixed at construction time and may come from code
//! (via [`ConfigBuilder`]), from a `.json`/`.toml` file, or from `GBDT_*`
//! environment variables.

pub mod core;

pub use self::core::{Config, ConfigBuilder};
