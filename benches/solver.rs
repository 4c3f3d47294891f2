use criterion::{black_box, criterion_group, criterion_main, Criterion};
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparse_recovery_rs::{bp_admm, omp, oracle, AdmmOptions, OmpOptions};
use std::time::Duration;

struct Problem {
    a: Mat<f64>,
    b: Vec<f64>,
    support: Vec<usize>,
}

/// Random n×m dictionary with unit-norm atoms and a k-sparse observation.
fn sparse_problem(seed: u64, nrows: usize, ncols: usize, sparsity: usize) -> Problem {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut a = Mat::from_fn(nrows, ncols, |_, _| rng.gen_range(-1.0..1.0));
    for j in 0..ncols {
        let norm = a.col(j).norm_l2();
        for i in 0..nrows {
            a[(i, j)] /= norm;
        }
    }

    let mut support: Vec<usize> = Vec::with_capacity(sparsity);
    while support.len() < sparsity {
        let index = rng.gen_range(0..ncols);
        if !support.contains(&index) {
            support.push(index);
        }
    }

    let mut b = vec![0.0; nrows];
    for &j in &support {
        let coeff = rng.gen_range(1.0..2.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        for i in 0..nrows {
            b[i] += coeff * a[(i, j)];
        }
    }
    for value in &mut b {
        *value += rng.gen_range(-1e-3..1e-3);
    }
    Problem { a, b, support }
}

fn bench_oracle(c: &mut Criterion) {
    let problem = sparse_problem(1, 64, 256, 8);
    c.bench_function("oracle_64x256_k8", |bench| {
        bench.iter(|| {
            let x = oracle(problem.a.as_ref(), &problem.b, &problem.support).unwrap();
            black_box(x);
        });
    });
}

fn bench_omp(c: &mut Criterion) {
    let problem = sparse_problem(2, 64, 256, 8);
    let options = OmpOptions::with_max_support(8);
    c.bench_function("omp_64x256_k8", |bench| {
        bench.iter(|| {
            let solution = omp(problem.a.as_ref(), &problem.b, &options, None).unwrap();
            black_box(solution);
        });
    });
}

fn bench_bp_admm(c: &mut Criterion) {
    let problem = sparse_problem(3, 64, 256, 8);
    let options = AdmmOptions::new(0.05);
    c.bench_function("bp_admm_64x256", |bench| {
        bench.iter(|| {
            let solution = bp_admm(problem.a.as_ref(), &problem.b, &options, None).unwrap();
            black_box(solution);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_millis(1000));
    targets =
        bench_oracle,
        bench_omp,
        bench_bp_admm
}
criterion_main!(benches);
