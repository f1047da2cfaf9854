//! The immutable training/validation problem consumed by the trainer.
//!
//! A [`Problem`] holds the same data in the three layouts the trainer needs:
//! - row-major dense values, used to route instances through a split;
//! - per-field columns sorted ascending by value, replayed by the exact
//!   split scan in a single left-to-right pass;
//! - sparse memberships both per instance (CSR) and per field (CSC).

use crate::core::constants::MAX_SPARSE_FIELDS;
use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use crate::dataset_error;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// One entry of a value-sorted dense column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseNode {
    /// Instance the value belongs to
    pub row: InstanceIndex,
    /// Field value
    pub value: Score,
}

/// Binary classification problem with dense and sparse fields.
#[derive(Debug, Clone)]
pub struct Problem {
    nr_instance: usize,
    nr_field: usize,
    nr_sparse_field: usize,
    /// Dense values, shape `(nr_instance, nr_field)`
    features: Array2<Score>,
    /// Per dense field, all instances sorted ascending by value
    sorted_columns: Vec<Vec<DenseNode>>,
    /// Sparse fields active for each instance, sorted ascending (CSR)
    sparse_rows: Vec<FieldIndex>,
    sparse_row_ptr: Vec<usize>,
    /// Instances for which each sparse field is active, ascending (CSC)
    sparse_cols: Vec<InstanceIndex>,
    sparse_col_ptr: Vec<usize>,
    labels: Vec<Label>,
}

impl Problem {
    /// Build a problem from a dense matrix, per-instance sparse memberships
    /// and labels in {-1, +1}.
    ///
    /// `active` may be empty when the problem has no sparse fields; otherwise
    /// it must hold one list per instance. Lists need not be sorted and may
    /// contain duplicates.
    pub fn new(
        features: Array2<Score>,
        active: Vec<Vec<FieldIndex>>,
        nr_sparse_field: usize,
        labels: Array1<Label>,
    ) -> Result<Self> {
        let nr_instance = labels.len();
        let nr_field = features.ncols();

        if features.nrows() != nr_instance {
            return Err(GbdtError::dimension_mismatch(
                format!("{} feature rows", nr_instance),
                format!("{} feature rows", features.nrows()),
            ));
        }
        if nr_instance > InstanceIndex::MAX as usize {
            return Err(dataset_error!(
                "{} instances exceed the supported maximum of {}",
                nr_instance,
                InstanceIndex::MAX
            ));
        }
        if nr_sparse_field > MAX_SPARSE_FIELDS {
            return Err(dataset_error!(
                "{} sparse fields exceed the supported maximum of {}",
                nr_sparse_field,
                MAX_SPARSE_FIELDS
            ));
        }
        if !active.is_empty() && active.len() != nr_instance {
            return Err(GbdtError::dimension_mismatch(
                format!("{} sparse rows", nr_instance),
                format!("{} sparse rows", active.len()),
            ));
        }

        let (sparse_rows, sparse_row_ptr) = build_sparse_rows(active, nr_instance, nr_sparse_field)?;
        let (sparse_cols, sparse_col_ptr) =
            build_sparse_cols(&sparse_rows, &sparse_row_ptr, nr_sparse_field);
        let sorted_columns = build_sorted_columns(&features);

        let problem = Problem {
            nr_instance,
            nr_field,
            nr_sparse_field,
            features,
            sorted_columns,
            sparse_rows,
            sparse_row_ptr,
            sparse_cols,
            sparse_col_ptr,
            labels: labels.to_vec(),
        };
        problem.validate()?;

        log::debug!(
            "problem built: {} instances, {} dense fields, {} sparse fields, {} sparse entries",
            problem.nr_instance,
            problem.nr_field,
            problem.nr_sparse_field,
            problem.sparse_rows.len()
        );

        Ok(problem)
    }

    /// Problem without instances, e.g. to stand for a missing validation set.
    pub fn empty(nr_field: usize, nr_sparse_field: usize) -> Self {
        Problem {
            nr_instance: 0,
            nr_field,
            nr_sparse_field,
            features: Array2::zeros((0, nr_field)),
            sorted_columns: vec![Vec::new(); nr_field],
            sparse_rows: Vec::new(),
            sparse_row_ptr: vec![0],
            sparse_cols: Vec::new(),
            sparse_col_ptr: vec![0; nr_sparse_field + 1],
            labels: Vec::new(),
        }
    }

    /// Check every precondition the trainer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.labels.len() != self.nr_instance
            || self.features.nrows() != self.nr_instance
            || self.features.ncols() != self.nr_field
            || self.sorted_columns.len() != self.nr_field
            || self.sparse_row_ptr.len() != self.nr_instance + 1
            || self.sparse_col_ptr.len() != self.nr_sparse_field + 1
        {
            return Err(GbdtError::data_dimension_mismatch(
                "problem layouts disagree on instance or field counts",
            ));
        }

        if let Some((i, label)) = self
            .labels
            .iter()
            .enumerate()
            .find(|&(_, &y)| y != 1.0 && y != -1.0)
        {
            return Err(dataset_error!(
                "label {} at instance {} is not in {{-1, +1}}",
                label,
                i
            ));
        }

        if let Some(((i, j), value)) = self
            .features
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(dataset_error!(
                "non-finite value {} at instance {}, field {}",
                value,
                i,
                j
            ));
        }

        for (j, column) in self.sorted_columns.iter().enumerate() {
            if column.len() != self.nr_instance {
                return Err(dataset_error!(
                    "sorted column {} holds {} entries, expected {}",
                    j,
                    column.len(),
                    self.nr_instance
                ));
            }
            if column.windows(2).any(|w| w[0].value > w[1].value) {
                return Err(dataset_error!("dense field {} is not sorted by value", j));
            }
        }

        if let Some(&j) = self
            .sparse_rows
            .iter()
            .find(|&&j| j as usize >= self.nr_sparse_field)
        {
            return Err(dataset_error!(
                "sparse field {} out of range for {} sparse fields",
                j,
                self.nr_sparse_field
            ));
        }

        Ok(())
    }

    /// Number of instances
    pub fn nr_instance(&self) -> usize {
        self.nr_instance
    }

    /// Number of dense fields
    pub fn nr_field(&self) -> usize {
        self.nr_field
    }

    /// Number of sparse fields
    pub fn nr_sparse_field(&self) -> usize {
        self.nr_sparse_field
    }

    /// Length of an encoded instance: dense fields followed by sparse fields.
    pub fn nr_feature(&self) -> usize {
        self.nr_field + self.nr_sparse_field
    }

    /// Whether the problem holds no instances
    pub fn is_empty(&self) -> bool {
        self.nr_instance == 0
    }

    /// Labels in {-1, +1}
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Dense value matrix, shape `(nr_instance, nr_field)`
    pub fn features(&self) -> &Array2<Score> {
        &self.features
    }

    /// Dense value of `field` for instance `i`.
    #[inline]
    pub fn value(&self, i: usize, field: usize) -> Score {
        self.features[[i, field]]
    }

    /// All instances of a dense field, sorted ascending by value.
    #[inline]
    pub fn sorted_column(&self, field: usize) -> &[DenseNode] {
        &self.sorted_columns[field]
    }

    /// Sparse fields active for instance `i`, ascending.
    #[inline]
    pub fn sparse_fields_of(&self, i: usize) -> &[FieldIndex] {
        &self.sparse_rows[self.sparse_row_ptr[i]..self.sparse_row_ptr[i + 1]]
    }

    /// Instances for which sparse field `j` is active, ascending.
    #[inline]
    pub fn instances_of(&self, j: usize) -> &[InstanceIndex] {
        &self.sparse_cols[self.sparse_col_ptr[j]..self.sparse_col_ptr[j + 1]]
    }

    /// Whether sparse field `j` is active for instance `i`.
    #[inline]
    pub fn is_active(&self, i: usize, j: FieldIndex) -> bool {
        self.sparse_fields_of(i).binary_search(&j).is_ok()
    }

    /// Write instance `i` into `buf` in the encoding trees are evaluated on:
    /// dense values first, then one 0/1 slot per sparse field.
    pub fn encode_instance(&self, i: usize, buf: &mut [Score]) {
        debug_assert_eq!(buf.len(), self.nr_feature());
        for (slot, &v) in buf[..self.nr_field].iter_mut().zip(self.features.row(i).iter()) {
            *slot = v;
        }
        let sparse = &mut buf[self.nr_field..];
        sparse.iter_mut().for_each(|slot| *slot = 0.0);
        for &j in self.sparse_fields_of(i) {
            sparse[j as usize] = 1.0;
        }
    }

    /// Encoded copy of instance `i`.
    pub fn encoded_instance(&self, i: usize) -> Vec<Score> {
        let mut buf = vec![0.0; self.nr_feature()];
        self.encode_instance(i, &mut buf);
        buf
    }

    /// Mean label, used for the initial log-odds.
    pub fn mean_label(&self) -> f64 {
        if self.nr_instance == 0 {
            return 0.0;
        }
        self.labels.iter().map(|&y| y as f64).sum::<f64>() / self.nr_instance as f64
    }
}

fn build_sparse_rows(
    active: Vec<Vec<FieldIndex>>,
    nr_instance: usize,
    nr_sparse_field: usize,
) -> Result<(Vec<FieldIndex>, Vec<usize>)> {
    let mut rows = Vec::with_capacity(active.iter().map(Vec::len).sum());
    let mut ptr = Vec::with_capacity(nr_instance + 1);
    ptr.push(0);

    for (i, mut fields) in active.into_iter().enumerate() {
        fields.sort_unstable();
        fields.dedup();
        if let Some(&j) = fields.last() {
            if j as usize >= nr_sparse_field {
                return Err(dataset_error!(
                    "sparse field {} of instance {} out of range for {} sparse fields",
                    j,
                    i,
                    nr_sparse_field
                ));
            }
        }
        rows.extend_from_slice(&fields);
        ptr.push(rows.len());
    }

    // No sparse memberships given at all.
    ptr.resize(nr_instance + 1, rows.len());
    Ok((rows, ptr))
}

fn build_sparse_cols(
    rows: &[FieldIndex],
    row_ptr: &[usize],
    nr_sparse_field: usize,
) -> (Vec<InstanceIndex>, Vec<usize>) {
    let mut col_ptr = vec![0usize; nr_sparse_field + 1];
    for &j in rows {
        col_ptr[j as usize + 1] += 1;
    }
    for j in 0..nr_sparse_field {
        col_ptr[j + 1] += col_ptr[j];
    }

    let mut cols = vec![0 as InstanceIndex; rows.len()];
    let mut next = col_ptr.clone();
    for i in 0..row_ptr.len() - 1 {
        for &j in &rows[row_ptr[i]..row_ptr[i + 1]] {
            cols[next[j as usize]] = i as InstanceIndex;
            next[j as usize] += 1;
        }
    }

    (cols, col_ptr)
}

fn build_sorted_columns(features: &Array2<Score>) -> Vec<Vec<DenseNode>> {
    (0..features.ncols())
        .into_par_iter()
        .map(|j| {
            let mut column: Vec<DenseNode> = features
                .column(j)
                .iter()
                .enumerate()
                .map(|(i, &value)| DenseNode {
                    row: i as InstanceIndex,
                    value,
                })
                .collect();
            // Stable: equal values keep instance order.
            column.sort_by(|a, b| a.value.total_cmp(&b.value));
            column
        })
        .collect()
}
