//! Text loader for [`Problem`]s.
//!
//! A problem is read from two line-aligned files:
//! - the dense file, one instance per line: `label v1 v2 ... vF`
//! - the sparse file, one instance per line: `label j1 j2 ...`
//!   where each `j` is the index of an active sparse field.
//!
//! Labels may be written as `1`/`-1` or `1`/`0`; `0` is read as `-1`.

use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use crate::dataset::Problem;
use csv::{ReaderBuilder, StringRecord, Trim};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Minimum number of sparse fields. Train and validation files must agree
    /// on the sparse layout, so the larger of this and `max index + 1` is used.
    pub sparse_width: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            delimiter: ' ',
            sparse_width: None,
        }
    }
}

/// Reads dense/sparse text files into a [`Problem`].
#[derive(Debug, Clone, Default)]
pub struct ProblemLoader {
    config: LoaderConfig,
}

struct DenseRows {
    labels: Vec<Label>,
    values: Vec<Score>,
    nr_field: usize,
}

struct SparseRows {
    labels: Vec<Label>,
    active: Vec<Vec<FieldIndex>>,
    max_field: Option<FieldIndex>,
}

impl ProblemLoader {
    /// Create a loader with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with a custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        ProblemLoader { config }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Reserve at least `width` sparse fields
    pub fn with_sparse_width(mut self, width: usize) -> Self {
        self.config.sparse_width = Some(width);
        self
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a problem from a dense file and a sparse file.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(&self, dense_path: P, sparse_path: Q) -> Result<Problem> {
        let dense = self.read_dense(dense_path.as_ref())?;
        let sparse = self.read_sparse(sparse_path.as_ref())?;

        if dense.labels.len() != sparse.labels.len() {
            return Err(GbdtError::data_loading(format!(
                "dense file has {} instances but sparse file has {}",
                dense.labels.len(),
                sparse.labels.len()
            )));
        }
        if let Some(i) = dense
            .labels
            .iter()
            .zip(sparse.labels.iter())
            .position(|(a, b)| a != b)
        {
            return Err(GbdtError::data_loading(format!(
                "labels of dense and sparse files disagree at instance {}",
                i + 1
            )));
        }

        let nr_sparse_field = sparse
            .max_field
            .map_or(0, |j| j as usize + 1)
            .max(self.config.sparse_width.unwrap_or(0));

        self.assemble(dense, sparse.active, nr_sparse_field)
    }

    /// Load a problem that only has dense fields.
    pub fn load_dense<P: AsRef<Path>>(&self, dense_path: P) -> Result<Problem> {
        let dense = self.read_dense(dense_path.as_ref())?;
        let nr_sparse_field = self.config.sparse_width.unwrap_or(0);
        self.assemble(dense, Vec::new(), nr_sparse_field)
    }

    fn assemble(
        &self,
        dense: DenseRows,
        active: Vec<Vec<FieldIndex>>,
        nr_sparse_field: usize,
    ) -> Result<Problem> {
        let nr_instance = dense.labels.len();
        let features = Array2::from_shape_vec((nr_instance, dense.nr_field), dense.values)
            .map_err(|e| GbdtError::data_loading(format!("dense matrix shape: {}", e)))?;
        let problem = Problem::new(features, active, nr_sparse_field, Array1::from_vec(dense.labels))?;

        log::info!(
            "loaded {} instances ({} dense fields, {} sparse fields)",
            problem.nr_instance(),
            problem.nr_field(),
            problem.nr_sparse_field()
        );
        Ok(problem)
    }

    fn reader(&self, path: &Path) -> Result<csv::Reader<std::fs::File>> {
        if !self.config.delimiter.is_ascii() {
            return Err(GbdtError::config(format!(
                "delimiter {:?} must be an ASCII character",
                self.config.delimiter
            )));
        }
        ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.config.delimiter as u8)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| GbdtError::data_loading(format!("{}: {}", path.display(), e)))
    }

    fn read_dense(&self, path: &Path) -> Result<DenseRows> {
        let mut reader = self.reader(path)?;
        let mut rows = DenseRows {
            labels: Vec::new(),
            values: Vec::new(),
            nr_field: 0,
        };

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            // Blank lines are skipped by the reader, so count from its position.
            let line = record.position().map_or(0, |p| p.line() as usize);
            let mut tokens = record.iter().filter(|t| !t.is_empty());
            let label = match tokens.next() {
                Some(token) => parse_label(token, path, line)?,
                None => continue,
            };

            let before = rows.values.len();
            for token in tokens {
                let value: Score = token.parse().map_err(|_| {
                    GbdtError::data_loading(format!(
                        "{}:{}: invalid dense value {:?}",
                        path.display(),
                        line,
                        token
                    ))
                })?;
                rows.values.push(value);
            }

            let width = rows.values.len() - before;
            if rows.labels.is_empty() {
                rows.nr_field = width;
            } else if width != rows.nr_field {
                return Err(GbdtError::data_loading(format!(
                    "{}:{}: expected {} dense values, got {}",
                    path.display(),
                    line,
                    rows.nr_field,
                    width
                )));
            }
            rows.labels.push(label);
        }

        Ok(rows)
    }

    fn read_sparse(&self, path: &Path) -> Result<SparseRows> {
        let mut reader = self.reader(path)?;
        let mut rows = SparseRows {
            labels: Vec::new(),
            active: Vec::new(),
            max_field: None,
        };

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            // Blank lines are skipped by the reader, so count from its position.
            let line = record.position().map_or(0, |p| p.line() as usize);
            let mut tokens = record.iter().filter(|t| !t.is_empty());
            let label = match tokens.next() {
                Some(token) => parse_label(token, path, line)?,
                None => continue,
            };

            let fields = tokens
                .map(|token| {
                    token.parse::<FieldIndex>().map_err(|_| {
                        GbdtError::data_loading(format!(
                            "{}:{}: invalid sparse index {:?}",
                            path.display(),
                            line,
                            token
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if let Some(&max) = fields.iter().max() {
                rows.max_field = Some(rows.max_field.map_or(max, |m| m.max(max)));
            }
            rows.labels.push(label);
            rows.active.push(fields);
        }

        Ok(rows)
    }
}

fn parse_label(token: &str, path: &Path, line: usize) -> Result<Label> {
    let value: f64 = token.parse().map_err(|_| {
        GbdtError::data_loading(format!("{}:{}: invalid label {:?}", path.display(), line, token))
    })?;
    if value == 1.0 {
        Ok(1.0)
    } else if value == 0.0 || value == -1.0 {
        Ok(-1.0)
    } else {
        Err(GbdtError::data_loading(format!(
            "{}:{}: label {} is not one of -1, 0, 1",
            path.display(),
            line,
            token
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_dense_and_sparse() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "tr.dense", "1 0.5 3\n0 0.25 1\n-1 2 2\n");
        let sparse = write(&dir, "tr.sparse", "1 4 1\n0\n-1 0\n");

        let problem = ProblemLoader::new().load(&dense, &sparse).unwrap();
        assert_eq!(problem.nr_instance(), 3);
        assert_eq!(problem.nr_field(), 2);
        assert_eq!(problem.nr_sparse_field(), 5);
        assert_eq!(problem.labels(), &[1.0, -1.0, -1.0]);
        assert_eq!(problem.value(1, 0), 0.25);
        assert_eq!(problem.sparse_fields_of(0), &[1, 4]);
        assert!(problem.sparse_fields_of(1).is_empty());
    }

    #[test]
    fn test_sparse_width_is_a_minimum() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "va.dense", "1 0.5\n-1 0.1\n");
        let sparse = write(&dir, "va.sparse", "1 2\n-1\n");

        let problem = ProblemLoader::new()
            .with_sparse_width(10)
            .load(&dense, &sparse)
            .unwrap();
        assert_eq!(problem.nr_sparse_field(), 10);
    }

    #[test]
    fn test_dense_only() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "tr.csv", "1,0.5,3\n-1,0.25,1\n");

        let problem = ProblemLoader::new()
            .with_delimiter(',')
            .load_dense(&dense)
            .unwrap();
        assert_eq!(problem.nr_field(), 2);
        assert_eq!(problem.nr_sparse_field(), 0);
    }

    #[test]
    fn test_rejects_ragged_dense_rows() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "bad.dense", "1 0.5 3\n-1 0.25\n");
        let err = ProblemLoader::new().load_dense(&dense).unwrap_err();
        assert_eq!(err.category(), "data_loading");
    }

    #[test]
    fn test_rejects_label_disagreement() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "a.dense", "1 0.5\n-1 0.25\n");
        let sparse = write(&dir, "a.sparse", "1 0\n1 0\n");
        assert!(ProblemLoader::new().load(&dense, &sparse).is_err());
    }

    #[test]
    fn test_rejects_bad_label() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "b.dense", "2 0.5\n");
        assert!(ProblemLoader::new().load_dense(&dense).is_err());
    }

    #[test]
    fn test_rejects_huge_sparse_index() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "h.dense", "1 0.5\n-1 0.25\n");
        let sparse = write(&dir, "h.sparse", "1 4000000000\n-1\n");
        let err = ProblemLoader::new().load(&dense, &sparse).unwrap_err();
        assert_eq!(err.category(), "dataset");
    }

    #[test]
    fn test_error_cites_file_line_after_blank_lines() {
        let dir = TempDir::new().unwrap();
        let dense = write(&dir, "gap.dense", "1 0.5\n\n\n-1 oops\n");
        let err = ProblemLoader::new().load_dense(&dense).unwrap_err();
        assert!(err.to_string().contains("gap.dense:4:"), "{}", err);

        let dense = write(&dir, "gap2.dense", "1 0.5\n\n-1 0.25\n");
        let sparse = write(&dir, "gap2.sparse", "1 0\n\n\n-1 x\n");
        let err = ProblemLoader::new().load(&dense, &sparse).unwrap_err();
        assert!(err.to_string().contains("gap2.sparse:4:"), "{}", err);
    }
}
