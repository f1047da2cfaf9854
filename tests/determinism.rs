//! Trees and scores must not depend on the number of worker threads.

use exact_gbdt::*;
use proptest::prelude::*;

mod common;
use common::*;

fn train(problem: &Problem, max_depth: usize, min_leaf_size: usize, num_threads: usize) -> Gbdt {
    let mut model = Gbdt::new(quiet_config(max_depth, 4, min_leaf_size, num_threads)).unwrap();
    model.fit(problem, None).unwrap();
    model
}

#[test]
fn test_same_model_across_thread_counts() {
    // Large enough for per-instance loops to be split into several blocks.
    let problem = create_mixed_problem(5_000, 6, 10, 99);
    let reference = train(&problem, 5, 40, 1);

    for threads in [2, 4, 7] {
        let model = train(&problem, 5, 40, threads);
        assert_eq!(model.trees(), reference.trees(), "trees differ with {} threads", threads);
        assert_eq!(model.bias(), reference.bias());
        assert_eq!(
            model.predict_problem(&problem).unwrap(),
            reference.predict_problem(&problem).unwrap()
        );
    }
}

#[test]
fn test_same_history_across_thread_counts() {
    let problem = create_mixed_problem(2_500, 3, 4, 7);
    let valid = create_mixed_problem(800, 3, 4, 8);

    let mut one = Gbdt::new(quiet_config(4, 3, 30, 1)).unwrap();
    let h1 = one.fit(&problem, Some(&valid)).unwrap();
    let mut many = Gbdt::new(quiet_config(4, 3, 30, 5)).unwrap();
    let h2 = many.fit(&problem, Some(&valid)).unwrap();

    assert_eq!(h1.train_losses(), h2.train_losses());
    assert_eq!(h1.valid_losses(), h2.valid_losses());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_tree_independent_of_threads(
        seed in 0u64..10_000,
        num_samples in 50usize..400,
        nr_field in 1usize..4,
        nr_sparse_field in 0usize..4,
        max_depth in 1usize..5,
        min_leaf_size in 1usize..40,
        threads in 2usize..6,
    ) {
        let problem = create_mixed_problem(num_samples, nr_field, nr_sparse_field, seed);
        let residuals = initial_residuals(&problem);
        let params = TreeParams { max_depth, min_leaf_size };

        let fit = |num_threads: usize| {
            with_threads(num_threads, || {
                let mut tree = Cart::new(params);
                let mut predictions = vec![0.0; problem.nr_instance()];
                tree.fit(&problem, &residuals, &mut predictions).unwrap();
                (tree, predictions)
            })
        };

        let (tree_a, pred_a) = fit(1);
        let (tree_b, pred_b) = fit(threads);
        prop_assert_eq!(&tree_a, &tree_b);
        prop_assert_eq!(pred_a, pred_b);
        prop_assert!(tree_a.validate_structure().is_ok());
        prop_assert!(tree_a.num_splits() < tree_a.max_tnodes());
    }
}
