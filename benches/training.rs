use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use exact_gbdt::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn create_problem(n_rows: usize, nr_field: usize, nr_sparse_field: usize) -> Problem {
    let mut rng = StdRng::seed_from_u64(42);

    let mut features = Array2::zeros((n_rows, nr_field));
    let mut labels = Array1::zeros(n_rows);
    let mut active = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let mut score = 0.0f32;
        for j in 0..nr_field {
            let value: f32 = rng.gen_range(-1.0..1.0);
            features[[i, j]] = value;
            score += value / (j + 1) as f32;
        }
        let fields: Vec<u32> = (0..nr_sparse_field as u32).filter(|_| rng.gen_bool(0.1)).collect();
        score += 0.2 * fields.len() as f32 - 0.2;
        labels[i] = if score + rng.gen_range(-0.3..0.3) > 0.0 { 1.0 } else { -1.0 };
        active.push(fields);
    }

    Problem::new(features, active, nr_sparse_field, labels).unwrap()
}

fn bench_cart_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_fit");
    group.sample_size(10);

    for n_rows in [10_000, 50_000].iter() {
        let problem = create_problem(*n_rows, 10, 50);
        let residuals: Vec<f32> = problem.labels().iter().map(|&y| y / 2.0).collect();
        let params = TreeParams {
            max_depth: 7,
            min_leaf_size: 100,
        };

        group.bench_with_input(BenchmarkId::new("depth7", n_rows), &problem, |b, problem| {
            let mut predictions = vec![0.0; problem.nr_instance()];
            b.iter(|| {
                let mut tree = Cart::new(params);
                tree.fit(black_box(problem), &residuals, &mut predictions).unwrap();
                tree
            })
        });
    }

    group.finish();
}

fn bench_gbdt_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("gbdt_fit");
    group.sample_size(10);

    let problem = create_problem(20_000, 10, 50);
    for threads in [1, 4].iter() {
        let config = ConfigBuilder::new()
            .num_trees(10)
            .num_threads(*threads)
            .verbosity(VerbosityLevel::Silent)
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("threads", threads), &problem, |b, problem| {
            b.iter(|| {
                let mut model = Gbdt::new(config.clone()).unwrap();
                model.fit(black_box(problem), None).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let train = create_problem(20_000, 10, 50);
    let config = ConfigBuilder::new()
        .num_trees(30)
        .verbosity(VerbosityLevel::Silent)
        .build()
        .unwrap();
    let mut model = Gbdt::new(config).unwrap();
    model.fit(&train, None).unwrap();

    group.bench_function("predict_problem", |b| {
        b.iter(|| model.predict_problem(black_box(&train)).unwrap())
    });
    group.bench_function("transform", |b| {
        b.iter(|| model.transform(black_box(&train)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_cart_fit, bench_gbdt_fit, bench_prediction);
criterion_main!(benches);
