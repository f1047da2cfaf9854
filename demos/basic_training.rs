//! Basic training example for exact-gbdt.
//!
//! Builds a synthetic problem with dense and sparse fields, trains an
//! ensemble with a validation set, evaluates it, derives the leaf-index
//! encoding and round-trips the model through a file.
//!
//! Run with: `cargo run --example basic_training`

use anyhow::{Context, Result};
use exact_gbdt::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn synthetic_problem(rng: &mut StdRng, n_rows: usize, nr_field: usize, nr_sparse_field: usize) -> Result<Problem> {
    let mut features = Array2::zeros((n_rows, nr_field));
    let mut labels = Array1::zeros(n_rows);
    let mut active = Vec::with_capacity(n_rows);

    for i in 0..n_rows {
        let mut score = 0.0f32;
        for j in 0..nr_field {
            let value: f32 = rng.gen_range(0.0..1.0);
            features[[i, j]] = value;
            if j < 2 {
                score += value - 0.5;
            }
        }
        let fields: Vec<u32> = (0..nr_sparse_field as u32).filter(|_| rng.gen_bool(0.15)).collect();
        if fields.contains(&0) {
            score += 0.3;
        }
        labels[i] = if score + rng.gen_range(-0.2..0.2) > 0.0 { 1.0 } else { -1.0 };
        active.push(fields);
    }

    Problem::new(features, active, nr_sparse_field, labels).context("building synthetic problem")
}

fn main() -> Result<()> {
    exact_gbdt::init()?;

    println!("exact-gbdt {} - Basic Training Example", VERSION);
    println!("=======================================");

    let mut rng = StdRng::seed_from_u64(2024);
    let train = synthetic_problem(&mut rng, 20_000, 8, 20)?;
    let valid = synthetic_problem(&mut rng, 5_000, 8, 20)?;
    println!(
        "train: {} instances, valid: {} instances, {} dense + {} sparse fields",
        train.nr_instance(),
        valid.nr_instance(),
        train.nr_field(),
        train.nr_sparse_field()
    );

    let config = ConfigBuilder::new()
        .max_depth(5)
        .num_trees(20)
        .min_leaf_size(100)
        .build()?;
    println!("config: {:?}", config.as_parameter_map());

    let mut model = Gbdt::new(config)?;
    let history = model.fit(&train, Some(&valid))?;
    println!(
        "trained {} trees in {:.2}s (bias {:.4})",
        model.num_trees(),
        history.total_secs(),
        model.bias()
    );

    let scores = model.predict_problem(&valid)?;
    let metrics = BinaryMetrics::calculate(valid.labels(), &scores)?;
    println!("validation: {}", metrics);

    let encoding = model.transform(&valid)?;
    println!("leaf indices of instance 0: {:?}", encoding[0]);

    let path = std::env::temp_dir().join("exact_gbdt_basic_training.json");
    save_model(&model, &path)?;
    let loaded = load_model(&path)?;
    let x = valid.encoded_instance(0);
    println!(
        "instance 0: score {:.4}, reloaded score {:.4}, p(+1) {:.4}",
        model.predict(&x)?,
        loaded.predict(&x)?,
        model.predict_proba(&x)?
    );
    std::fs::remove_file(&path).ok();

    Ok(())
}
