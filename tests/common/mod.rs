//! Common test utilities for exact-gbdt integration tests.

#![allow(dead_code)]

use exact_gbdt::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration with progress output silenced.
pub fn quiet_config(max_depth: usize, num_trees: usize, min_leaf_size: usize, num_threads: usize) -> Config {
    ConfigBuilder::new()
        .max_depth(max_depth)
        .num_trees(num_trees)
        .min_leaf_size(min_leaf_size)
        .num_threads(num_threads)
        .verbosity(VerbosityLevel::Silent)
        .build()
        .unwrap()
}

/// The four-instance example: one dense field, two positives on the left.
pub fn four_instance_problem() -> Problem {
    let features = Array2::from_shape_vec((4, 1), vec![0.1, 0.2, 0.8, 0.9]).unwrap();
    let labels = Array1::from_vec(vec![1.0, 1.0, -1.0, -1.0]);
    Problem::new(features, Vec::new(), 0, labels).unwrap()
}

/// Dense features uniform in [-3, 3) with a noisy linear decision boundary
/// and sparse fields that are active more often for positives.
pub fn create_mixed_problem(
    num_samples: usize,
    nr_field: usize,
    nr_sparse_field: usize,
    seed: u64,
) -> Problem {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut features = Array2::zeros((num_samples, nr_field));
    let mut labels = Array1::zeros(num_samples);
    let mut active = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let mut score = 0.0;
        for j in 0..nr_field {
            // Coarse grid so that columns contain ties.
            let value: f32 = (rng.gen_range(-30..30) as f32) / 10.0;
            features[[i, j]] = value;
            score += value * if j % 2 == 0 { 1.0 } else { -0.5 };
        }
        score += rng.gen_range(-0.5..0.5);
        let label: f32 = if score > 0.0 { 1.0 } else { -1.0 };
        labels[i] = label;

        let fields: Vec<u32> = (0..nr_sparse_field as u32)
            .filter(|&j| {
                let p = if (j % 2 == 0) == (label > 0.0) { 0.6 } else { 0.2 };
                rng.gen_bool(p)
            })
            .collect();
        active.push(fields);
    }

    Problem::new(features, active, nr_sparse_field, labels).unwrap()
}

/// One dense field in [0, 1); the label is `+1` exactly when `x < 0.5`.
pub fn create_separable_problem(num_samples: usize, seed: u64) -> Problem {
    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f32> = (0..num_samples).map(|_| rng.gen_range(0.0..1.0)).collect();
    let labels: Vec<f32> = values
        .iter()
        .map(|&x| if x < 0.5 { 1.0 } else { -1.0 })
        .collect();
    let features = Array2::from_shape_vec((num_samples, 1), values).unwrap();
    Problem::new(features, Vec::new(), 0, Array1::from_vec(labels)).unwrap()
}

/// Logistic-loss residuals at score 0, i.e. `y / 2`.
pub fn initial_residuals(problem: &Problem) -> Vec<f32> {
    problem.labels().iter().map(|&y| y / 2.0).collect()
}

/// Write `problem` as a dense file and a sparse file under `dir`.
pub fn write_problem_files(dir: &Path, name: &str, problem: &Problem) -> (PathBuf, PathBuf) {
    let dense_path = dir.join(format!("{}.dense", name));
    let sparse_path = dir.join(format!("{}.sparse", name));

    let mut dense = fs::File::create(&dense_path).unwrap();
    let mut sparse = fs::File::create(&sparse_path).unwrap();
    for i in 0..problem.nr_instance() {
        let label = problem.labels()[i] as i32;

        let mut line = label.to_string();
        for j in 0..problem.nr_field() {
            line.push(' ');
            line.push_str(&problem.value(i, j).to_string());
        }
        writeln!(dense, "{}", line).unwrap();

        let mut line = label.to_string();
        for &j in problem.sparse_fields_of(i) {
            line.push(' ');
            line.push_str(&j.to_string());
        }
        writeln!(sparse, "{}", line).unwrap();
    }

    (dense_path, sparse_path)
}

/// Run `f` inside a dedicated pool of `num_threads` workers.
pub fn with_threads<T: Send>(num_threads: usize, f: impl FnOnce() -> T + Send) -> T {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .unwrap()
        .install(f)
}
