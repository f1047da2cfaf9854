//! Core infrastructure module for exact-gbdt.
//!
//! - [`types`]: numeric aliases and small enumerations
//! - [`constants`]: configuration defaults and numeric thresholds
//! - [`error`]: the crate error type
//! - [`utils`]: thread pool and work partitioning helpers

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

pub use constants::*;
pub use error::{GbdtError, Result};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static CORE_INIT: Once = Once::new();
static CORE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize process-wide facilities (currently the logger).
///
/// Safe to call any number of times; only the first call has an effect.
pub fn initialize_core() -> Result<()> {
    CORE_INIT.call_once(|| {
        initialize_logging();
        CORE_INITIALIZED.store(true, Ordering::SeqCst);
        log::debug!("exact-gbdt {} initialized", EXACT_GBDT_VERSION);
    });
    Ok(())
}

/// Check if [`initialize_core`] has run.
pub fn is_core_initialized() -> bool {
    CORE_INITIALIZED.load(Ordering::SeqCst)
}

fn initialize_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    // Another logger may already be installed by the host application.
    let _ = env_logger::try_init();
}
