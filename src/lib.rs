//! Sparse coefficient recovery for underdetermined linear systems `b ≈ A x`.
//!
//! `A` is a dense n×m dictionary (usually m >= n) whose columns are called atoms.
//! Three solvers recover a sparse `x` of length m:
//! - `oracle`: least squares restricted to a known support.
//! - `omp`: orthogonal matching pursuit, greedily adding one atom per iteration
//!   until the requested support size is reached.
//! - `bp_admm`: basis pursuit denoising, `min 0.5 * ||b - A x||^2 + lambda * ||x||_1`,
//!   solved with ADMM against a Cholesky factor of `A'A + I` computed once.
//!
//! Every call is independent: all iteration state lives inside the call.
//! `metrics` holds the helpers used to score a recovery against ground truth.
//!
//! Example:
//! ```rust,no_run
//! use faer::mat;
//! use sparse_recovery_rs::{bp_admm, omp, oracle, AdmmOptions, OmpOptions};
//!
//! let a = mat![
//!     [1.0, 0.0, 0.5, 0.5],
//!     [0.0, 1.0, 0.5, -0.5f64],
//! ];
//! let b = [1.0, 0.5];
//!
//! let x = oracle(a.as_ref(), &b, &[0, 1]).unwrap();
//! assert_eq!(x.len(), 4);
//!
//! let greedy = omp(a.as_ref(), &b, &OmpOptions::with_max_support(1), None).unwrap();
//! assert_eq!(greedy.support.len(), 1);
//!
//! let relaxed = bp_admm(a.as_ref(), &b, &AdmmOptions::new(0.05), None).unwrap();
//! println!("{:?} after {} iterations", relaxed.stats.status, relaxed.stats.iterations);
//! ```

mod admm;
pub mod metrics;
mod omp;
mod oracle;
mod report;
mod solver;
mod support;

pub use admm::{bp_admm, soft_threshold, AdmmOptions, AdmmSolution};
pub use omp::{omp, OmpOptions, OmpSolution};
pub use oracle::oracle;
pub use report::{
    AdmmIterationReport, OmpIterationReport, Reporter, SolveStatus, SolverStats, StdoutReporter,
};
pub use solver::SolveError;
pub use support::{Support, SupportError};
