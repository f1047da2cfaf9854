//! Boosting integration tests.

use approx::assert_relative_eq;
use exact_gbdt::*;

mod common;
use common::*;

#[test]
fn test_loss_decreases_on_separable_data() {
    let problem = create_separable_problem(1_000, 17);
    let mut model = Gbdt::new(quiet_config(3, 8, 100, 2)).unwrap();
    let history = model.fit(&problem, None).unwrap();

    let losses = history.train_losses();
    assert_eq!(losses.len(), 8);
    for pair in losses.windows(2) {
        assert!(pair[1] < pair[0], "loss went up: {:?}", losses);
    }
    assert!(losses[0] < std::f64::consts::LN_2);

    let scores = model.predict_problem(&problem).unwrap();
    assert_eq!(error_rate(problem.labels(), &scores).unwrap(), 0.0);
}

#[test]
fn test_loss_decreases_on_mixed_data() {
    let problem = create_mixed_problem(3_000, 4, 6, 23);
    let mut model = Gbdt::new(quiet_config(4, 10, 100, 0)).unwrap();
    let history = model.fit(&problem, None).unwrap();

    let first = history.records().first().unwrap().train_loss;
    let last = history.last().unwrap().train_loss;
    assert!(last < first);
    assert!(first < std::f64::consts::LN_2);
}

#[test]
fn test_bias_from_label_mean() {
    let problem = create_mixed_problem(500, 2, 2, 5);
    let mut model = Gbdt::new(quiet_config(2, 1, 10, 1)).unwrap();
    model.fit(&problem, None).unwrap();

    let y_bar = problem.mean_label();
    let expected = ((1.0 + y_bar) / (1.0 - y_bar)).ln() as f32;
    assert_relative_eq!(model.bias(), expected, epsilon = 1e-6);
}

#[test]
fn test_single_class_bias_is_finite() {
    let features = ndarray::Array2::from_shape_vec((3, 1), vec![0.1, 0.5, 0.9]).unwrap();
    let labels = ndarray::Array1::from_vec(vec![1.0, 1.0, 1.0]);
    let problem = Problem::new(features, Vec::new(), 0, labels).unwrap();

    let mut model = Gbdt::new(quiet_config(2, 2, 1, 1)).unwrap();
    let history = model.fit(&problem, None).unwrap();
    assert!(model.bias().is_finite() && model.bias() > 0.0);
    assert!(history.train_losses().iter().all(|l| l.is_finite()));
    assert!(model.predict(&[0.3]).unwrap() > 0.0);
}

#[test]
fn test_training_scores_match_predictions() {
    let train = create_mixed_problem(2_000, 3, 5, 31);
    let valid = create_mixed_problem(700, 3, 5, 32);
    let mut model = Gbdt::new(quiet_config(4, 5, 50, 3)).unwrap();
    let history = model.fit(&train, Some(&valid)).unwrap();

    let train_scores = model.predict_problem(&train).unwrap();
    let train_loss = mean_logistic_loss(train.labels(), &train_scores).unwrap();
    assert_relative_eq!(train_loss, history.last().unwrap().train_loss, epsilon = 1e-9);

    let valid_scores = model.predict_problem(&valid).unwrap();
    let valid_loss = mean_logistic_loss(valid.labels(), &valid_scores).unwrap();
    assert_relative_eq!(valid_loss, history.last().unwrap().valid_loss.unwrap(), epsilon = 1e-9);
    assert_eq!(history.valid_losses().len(), 5);

    for i in (0..valid.nr_instance()).step_by(37) {
        let x = valid.encoded_instance(i);
        assert_eq!(model.predict(&x).unwrap(), valid_scores[i]);
    }
}

#[test]
fn test_get_indices_and_transform() {
    let problem = create_mixed_problem(1_000, 3, 4, 41);
    let mut model = Gbdt::new(quiet_config(3, 4, 50, 2)).unwrap();
    model.fit(&problem, None).unwrap();

    let encoded = model.transform(&problem).unwrap();
    assert_eq!(encoded.len(), problem.nr_instance());

    for (i, indices) in encoded.iter().enumerate() {
        assert_eq!(indices.len(), 4);
        let x = problem.encoded_instance(i);
        assert_eq!(indices, &model.get_indices(&x).unwrap());

        // Summing the leaves named by the indices reproduces the score.
        let mut score = model.bias();
        for (tree, &leaf) in model.trees().iter().zip(indices) {
            let node = tree.node(leaf as usize).unwrap();
            assert!(node.is_leaf());
            score += node.gamma();
        }
        assert_eq!(score, model.predict(&x).unwrap());
    }
}

#[test]
fn test_refit_replaces_trees() {
    let problem = create_mixed_problem(600, 2, 2, 3);
    let mut model = Gbdt::new(quiet_config(2, 3, 20, 1)).unwrap();
    model.fit(&problem, None).unwrap();
    let first = model.clone();
    model.fit(&problem, None).unwrap();

    assert_eq!(model.num_trees(), 3);
    assert_eq!(model, first);
}

#[test]
fn test_predict_proba() {
    let problem = four_instance_problem();
    let mut model = Gbdt::new(quiet_config(1, 3, 1, 1)).unwrap();
    model.fit(&problem, None).unwrap();

    let p = model.predict_proba(&[0.15]).unwrap();
    let q = model.predict_proba(&[0.85]).unwrap();
    assert!(p > 0.5 && p < 1.0);
    assert!(q < 0.5 && q > 0.0);
}
