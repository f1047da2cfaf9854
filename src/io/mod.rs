//! Model persistence.

pub mod model_file;

pub use model_file::{load_model, save_model, ModelFormat};
