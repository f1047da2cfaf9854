//! Model persistence.
//!
//! A trained [`Gbdt`] is written as JSON when the path ends in `.json` and
//! as bincode otherwise. Files carry the crate version that wrote them, and
//! every loaded model is structurally validated before it is returned.

use crate::boosting::Gbdt;
use crate::core::constants::EXACT_GBDT_VERSION;
use crate::core::error::{GbdtError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// On-disk encoding of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFormat {
    /// Human-readable JSON
    Json,
    /// Compact binary encoding
    Bincode,
}

impl ModelFormat {
    /// Format implied by a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ModelFormat::Json,
            _ => ModelFormat::Bincode,
        }
    }
}

#[derive(Serialize)]
struct ModelFileRef<'a> {
    version: &'a str,
    model: &'a Gbdt,
}

#[derive(Deserialize)]
struct ModelFile {
    version: String,
    model: Gbdt,
}

/// Write `model` to `path`.
pub fn save_model<P: AsRef<Path>>(model: &Gbdt, path: P) -> Result<()> {
    let path = path.as_ref();
    if !model.is_trained() {
        return Err(GbdtError::serialization("refusing to save an untrained model"));
    }

    let file = ModelFileRef {
        version: EXACT_GBDT_VERSION,
        model,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    match ModelFormat::from_path(path) {
        ModelFormat::Json => serde_json::to_writer_pretty(&mut writer, &file)?,
        ModelFormat::Bincode => bincode::serialize_into(&mut writer, &file)?,
    }
    writer.flush()?;

    log::info!(
        "saved model with {} trees to {}",
        model.num_trees(),
        path.display()
    );
    Ok(())
}

/// Read a model from `path` and validate it.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Gbdt> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    // Length prefixes are checked against the buffer, so truncated or
    // foreign files fail instead of over-allocating.
    let file: ModelFile = match ModelFormat::from_path(path) {
        ModelFormat::Json => serde_json::from_slice(&bytes)?,
        ModelFormat::Bincode => bincode::deserialize(&bytes)?,
    };

    if file.version != EXACT_GBDT_VERSION {
        log::warn!(
            "{} was written by version {}, reading with {}",
            path.display(),
            file.version,
            EXACT_GBDT_VERSION
        );
    }
    file.model.validate_structure()?;

    log::info!(
        "loaded model with {} trees from {}",
        file.model.num_trees(),
        path.display()
    );
    Ok(file.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ModelFormat::from_path("model.json"), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path("model.JSON"), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path("model.bin"), ModelFormat::Bincode);
        assert_eq!(ModelFormat::from_path("model"), ModelFormat::Bincode);
    }

    #[test]
    fn test_untrained_model_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let model = Gbdt::new(crate::config::Config::default()).unwrap();
        let err = save_model(&model, dir.path().join("m.json")).unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_missing_file() {
        let err = load_model("/nonexistent/model.bin").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
