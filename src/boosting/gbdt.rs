//! Gradient-boosted decision trees for binary classification.
//!
//! The model is `F(x) = bias + Σ_t tree_t(x)`, fit to logistic loss. Each
//! round fits one [`Cart`] to the pseudo-residuals `y / (1 + exp(y F))`
//! and adds its Newton-step leaf outputs to the running score.

use super::history::{RoundRecord, TrainingHistory};
use crate::config::Config;
use crate::core::constants::BIAS_LABEL_MARGIN;
use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use crate::core::utils::threading::{build_thread_pool, current_static_block_size};
use crate::dataset::Problem;
use crate::metrics::classification::{mean_logistic_loss, sigmoid};
use crate::tree::Cart;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Field layout a model was trained on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub nr_field: usize,
    pub nr_sparse_field: usize,
}

impl FeatureLayout {
    pub fn of(problem: &Problem) -> Self {
        FeatureLayout {
            nr_field: problem.nr_field(),
            nr_sparse_field: problem.nr_sparse_field(),
        }
    }

    /// Length of an encoded instance
    pub fn nr_feature(&self) -> usize {
        self.nr_field + self.nr_sparse_field
    }
}

/// Boosted tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gbdt {
    config: Config,
    layout: FeatureLayout,
    trees: Vec<Cart>,
    bias: Score,
}

impl Gbdt {
    /// Untrained model with a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Gbdt {
            config,
            layout: FeatureLayout::default(),
            trees: Vec::new(),
            bias: 0.0,
        })
    }

    /// Train `num_trees` trees on `train`, reporting validation loss on
    /// `valid` after every round when it is supplied and non-empty.
    ///
    /// Any previously trained trees are discarded.
    pub fn fit(&mut self, train: &Problem, valid: Option<&Problem>) -> Result<TrainingHistory> {
        if train.is_empty() {
            return Err(GbdtError::training("training problem has no instances"));
        }
        let layout = FeatureLayout::of(train);
        let valid = valid.filter(|v| !v.is_empty());
        if let Some(valid) = valid {
            if FeatureLayout::of(valid) != layout {
                return Err(GbdtError::data_dimension_mismatch(format!(
                    "validation problem has {} dense and {} sparse fields, training has {} and {}",
                    valid.nr_field(),
                    valid.nr_sparse_field(),
                    layout.nr_field,
                    layout.nr_sparse_field
                )));
            }
        }

        let pool = build_thread_pool(self.config.num_threads)?;
        log::info!(
            "training {} trees of depth {} on {} instances with {} threads",
            self.config.num_trees,
            self.config.max_depth,
            train.nr_instance(),
            pool.current_num_threads()
        );

        self.layout = layout;
        self.trees.clear();
        let result = pool.install(|| self.boost(train, valid));
        if result.is_err() {
            self.trees.clear();
        }
        result
    }

    fn boost(&mut self, train: &Problem, valid: Option<&Problem>) -> Result<TrainingHistory> {
        let params = self.config.tree_params();
        let verbose = self.config.verbose();

        self.bias = initial_bias(train.mean_label());
        log::debug!("initial bias {:.6}", self.bias);

        let labels = train.labels();
        let mut f_tr = vec![self.bias; train.nr_instance()];
        let mut f_va = valid.map(|v| vec![self.bias; v.nr_instance()]);
        let mut residuals = vec![0.0; train.nr_instance()];
        let mut f1 = vec![0.0; train.nr_instance()];
        let mut history = TrainingHistory::new();

        for t in 0..self.config.num_trees {
            let start = Instant::now();

            compute_residuals(labels, &f_tr, &mut residuals);

            let mut tree = Cart::new(params);
            tree.fit(train, &residuals, &mut f1)?;

            add_assign(&mut f_tr, &f1);
            let train_loss = mean_logistic_loss(labels, &f_tr)?;

            let valid_loss = match (valid, f_va.as_mut()) {
                (Some(valid), Some(f_va)) => {
                    accumulate_tree(valid, &tree, f_va)?;
                    Some(mean_logistic_loss(valid.labels(), f_va)?)
                }
                _ => None,
            };

            self.trees.push(tree);

            let record = RoundRecord {
                iteration: t,
                elapsed_secs: start.elapsed().as_secs_f64(),
                train_loss,
                valid_loss,
            };
            if verbose {
                log::info!("{}", record);
            }
            history.push(record);
        }

        Ok(history)
    }

    /// Raw score `bias + Σ gamma` of an encoded instance.
    pub fn predict(&self, x: &[Score]) -> Result<Score> {
        self.check_encoded(x)?;
        let mut s = self.bias;
        for tree in &self.trees {
            s += tree.predict(x)?.value;
        }
        Ok(s)
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, x: &[Score]) -> Result<Score> {
        Ok(sigmoid(self.predict(x)?))
    }

    /// Leaf reached in every tree, in tree order.
    pub fn get_indices(&self, x: &[Score]) -> Result<Vec<LeafIndex>> {
        self.check_encoded(x)?;
        self.trees
            .iter()
            .map(|tree| tree.predict(x).map(|hit| hit.index))
            .collect()
    }

    /// Raw scores for every instance of `problem`.
    pub fn predict_problem(&self, problem: &Problem) -> Result<Vec<Score>> {
        self.check_problem(problem)?;
        let pool = build_thread_pool(self.config.num_threads)?;
        pool.install(|| -> Result<Vec<Score>> {
            let mut scores = vec![self.bias; problem.nr_instance()];
            for tree in &self.trees {
                accumulate_tree(problem, tree, &mut scores)?;
            }
            Ok(scores)
        })
    }

    /// Leaf indices for every instance of `problem`, one vector per instance.
    pub fn transform(&self, problem: &Problem) -> Result<Vec<Vec<LeafIndex>>> {
        self.check_problem(problem)?;
        let pool = build_thread_pool(self.config.num_threads)?;
        pool.install(|| {
            (0..problem.nr_instance())
                .into_par_iter()
                .map_init(
                    || vec![0.0; problem.nr_feature()],
                    |x, i| {
                        problem.encode_instance(i, x);
                        self.get_indices(x)
                    },
                )
                .collect()
        })
    }

    /// Trained trees in order
    pub fn trees(&self) -> &[Cart] {
        &self.trees
    }

    /// Number of trained trees
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Whether `fit` has produced any trees
    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Initial log-odds
    pub fn bias(&self) -> Score {
        self.bias
    }

    /// Model configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Field layout of the training problem
    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// Check a deserialized model: valid configuration and every tree
    /// structurally sound with the configured depth.
    pub fn validate_structure(&self) -> Result<()> {
        self.config.validate()?;
        if !self.bias.is_finite() {
            return Err(GbdtError::serialization(format!("bias {} is not finite", self.bias)));
        }
        let params = self.config.tree_params();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.params().max_depth != params.max_depth {
                return Err(GbdtError::serialization(format!(
                    "tree {} has depth {}, model is configured for {}",
                    t,
                    tree.params().max_depth,
                    params.max_depth
                )));
            }
            tree.validate_structure()?;
            let nr_feature = self.layout.nr_feature();
            for split in tree.nodes().iter().filter_map(|node| node.split()) {
                if split.feature() >= nr_feature {
                    return Err(GbdtError::serialization(format!(
                        "tree {} splits on feature {} of {}",
                        t,
                        split.feature(),
                        nr_feature
                    )));
                }
                // Dense splits address 0..nr_field, sparse splits the slots after it.
                if split.is_sparse() != (split.feature() >= self.layout.nr_field) {
                    return Err(GbdtError::serialization(format!(
                        "tree {} has split {} on a {} feature slot",
                        t,
                        split,
                        if split.is_sparse() { "dense" } else { "sparse" }
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_encoded(&self, x: &[Score]) -> Result<()> {
        if !self.is_trained() {
            return Err(GbdtError::prediction("model has not been trained"));
        }
        if x.len() != self.layout.nr_feature() {
            return Err(GbdtError::dimension_mismatch(
                format!("{} encoded features", self.layout.nr_feature()),
                format!("{} encoded features", x.len()),
            ));
        }
        Ok(())
    }

    fn check_problem(&self, problem: &Problem) -> Result<()> {
        if !self.is_trained() {
            return Err(GbdtError::prediction("model has not been trained"));
        }
        if FeatureLayout::of(problem) != self.layout {
            return Err(GbdtError::data_dimension_mismatch(format!(
                "problem has {} dense and {} sparse fields, model expects {} and {}",
                problem.nr_field(),
                problem.nr_sparse_field(),
                self.layout.nr_field,
                self.layout.nr_sparse_field
            )));
        }
        Ok(())
    }
}

/// Initial log-odds `ln((1 + ȳ) / (1 - ȳ))`, with the mean label kept
/// strictly inside (-1, 1).
pub fn initial_bias(mean_label: f64) -> Score {
    let y_bar = mean_label.clamp(-1.0 + BIAS_LABEL_MARGIN, 1.0 - BIAS_LABEL_MARGIN);
    ((1.0 + y_bar) / (1.0 - y_bar)).ln() as Score
}

/// Pseudo-residual `y / (1 + exp(y F))` of logistic loss.
#[inline]
pub fn residual(y: Label, f: Score) -> Score {
    (y as f64 / (1.0 + (y as f64 * f as f64).exp())) as Score
}

fn compute_residuals(labels: &[Label], scores: &[Score], residuals: &mut [Score]) {
    let block = current_static_block_size(labels.len());
    residuals
        .par_chunks_mut(block)
        .zip(labels.par_chunks(block).zip(scores.par_chunks(block)))
        .for_each(|(residuals, (labels, scores))| {
            for ((r, &y), &f) in residuals.iter_mut().zip(labels).zip(scores) {
                *r = residual(y, f);
            }
        });
}

fn add_assign(scores: &mut [Score], delta: &[Score]) {
    let block = current_static_block_size(scores.len());
    scores
        .par_chunks_mut(block)
        .zip(delta.par_chunks(block))
        .for_each(|(scores, delta)| {
            for (f, &d) in scores.iter_mut().zip(delta) {
                *f += d;
            }
        });
}

/// Add one tree's output to the running score of every instance.
fn accumulate_tree(problem: &Problem, tree: &Cart, scores: &mut [Score]) -> Result<()> {
    let block = current_static_block_size(scores.len());
    scores
        .par_chunks_mut(block)
        .enumerate()
        .try_for_each(|(c, chunk)| -> Result<()> {
            let mut x = vec![0.0; problem.nr_feature()];
            for (k, f) in chunk.iter_mut().enumerate() {
                problem.encode_instance(c * block + k, &mut x);
                *f += tree.predict(&x)?.value;
            }
            Ok(())
        })
}
