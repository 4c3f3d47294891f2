use std::time::Instant;

use faer::linalg::triangular_solve::{
    solve_lower_triangular_in_place, solve_upper_triangular_in_place,
};
use faer::{Mat, MatMut, MatRef, Par};

use crate::report::{
    emit_line, AdmmIterationReport, Reporter, ReporterSlot, SolveStatus, SolverStats,
};
use crate::solver::{
    adjoint_apply, check_problem, cholesky_lower, count_nonzeros, format_duration, gram, l2_norm,
    SolveError,
};

/// Guards the relative-change denominator.
const RELATIVE_EPS: f64 = 1e-12;

/// Options controlling the basis pursuit ADMM solve.
#[derive(Debug, Clone)]
pub struct AdmmOptions {
    /// Weight of the L1 penalty.
    pub lambda: f64,
    /// Iteration cap; the loop stops once the iteration count exceeds it.
    pub max_iters: usize,
    /// Converge when ||v - v_prev|| / (||v|| + eps) < tol.
    pub tol: f64,
    /// Parallelism used by the dense kernels.
    pub par: Par,
    /// Emit the per-iteration table and timing on finish.
    pub verbose: bool,
}

impl AdmmOptions {
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda,
            max_iters: 200,
            tol: 1e-4,
            par: Par::Seq,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmmSolution {
    /// The shrinkage iterate `v`, sparse by construction.
    pub x: Vec<f64>,
    pub stats: SolverStats,
}

/// Soft-thresholding, the proximal operator of `threshold * |.|`.
pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    let magnitude = value.abs() - threshold;
    if magnitude > 0.0 {
        magnitude.copysign(value)
    } else {
        0.0
    }
}

/// `A'A + I` factored once; every iteration reuses it for two triangular solves.
struct Factorization {
    lower: Mat<f64>,
    upper: Mat<f64>,
}

impl Factorization {
    fn new(a: MatRef<'_, f64>, par: Par) -> Result<Self, SolveError> {
        let mut normal = gram(a, par);
        for i in 0..normal.nrows() {
            normal[(i, i)] += 1.0;
        }
        let lower = cholesky_lower(normal.as_ref(), par)?;
        let upper = lower.transpose().to_owned();
        Ok(Self { lower, upper })
    }

    /// Solves `(A'A + I) x = rhs` in place.
    fn solve_in_place(&self, rhs: &mut [f64], par: Par) {
        let dim = rhs.len();
        let mut rhs = MatMut::from_column_major_slice_mut(rhs, dim, 1);
        solve_lower_triangular_in_place(self.lower.as_ref(), rhs.as_mut(), par);
        solve_upper_triangular_in_place(self.upper.as_ref(), rhs.as_mut(), par);
    }
}

/// Basis pursuit denoising via ADMM.
///
/// Approximately solves `min_x 0.5 * ||b - A x||_2^2 + lambda * ||x||_1` with
/// unit penalty. Returns the soft-thresholded iterate `v`, not the smooth
/// least-squares iterate.
///
/// Hitting the iteration cap is not an error: a warning is logged, the status
/// is `SolveStatus::MaxIterations` and the current `v` is returned.
pub fn bp_admm(
    a: MatRef<'_, f64>,
    b: &[f64],
    options: &AdmmOptions,
    reporter: Option<&mut dyn Reporter>,
) -> Result<AdmmSolution, SolveError> {
    check_problem(a, b)?;
    if !options.lambda.is_finite() || options.lambda < 0.0 {
        return Err(SolveError::InvalidLambda {
            value: options.lambda,
        });
    }
    let start_time = options.verbose.then(Instant::now);
    let mut reporter = ReporterSlot::new(reporter, options.verbose);

    let m = a.ncols();
    let par = options.par;
    let lambda = options.lambda;
    let factorization = Factorization::new(a, par)?;

    let mut atb = vec![0.0; m];
    adjoint_apply(a, b, &mut atb, par);

    let mut v = vec![0.0; m];
    let mut v_prev = vec![0.0; m];
    let mut u = vec![0.0; m];
    let mut x = vec![0.0; m];

    let mut iter = 0;
    let mut relative_change;
    let status = loop {
        // x = (A'A + I)^-1 (A'b + v - u)
        for i in 0..m {
            x[i] = atb[i] + v[i] - u[i];
        }
        factorization.solve_in_place(&mut x, par);

        for i in 0..m {
            v[i] = soft_threshold(x[i] + u[i], lambda);
            u[i] += x[i] - v[i];
        }

        iter += 1;
        let v_norm = l2_norm(&v);
        relative_change = if v_norm > 0.0 {
            let mut diff = 0.0;
            for i in 0..m {
                let d = v[i] - v_prev[i];
                diff += d * d;
            }
            Some(diff.sqrt() / (v_norm + RELATIVE_EPS))
        } else {
            None
        };

        if let Some(reporter) = reporter.as_mut() {
            reporter.on_admm_iteration(&AdmmIterationReport {
                iteration: iter,
                relative_change,
                v_norm,
                dual_norm: l2_norm(&u),
                nonzeros: count_nonzeros(&v),
            });
        }

        v_prev.copy_from_slice(&v);

        if relative_change.is_some_and(|change| change < options.tol) {
            break SolveStatus::Converged;
        }
        if iter > options.max_iters {
            break SolveStatus::MaxIterations;
        }
    };

    match status {
        SolveStatus::Converged => {
            log::debug!("bp_admm: converged after {iter} iterations");
        }
        SolveStatus::MaxIterations => {
            log::warn!(
                "BP-ADMM did not converge after {iter} iterations (relative change {})",
                relative_change.map_or_else(|| "n/a".to_string(), |c| format!("{c:.3e}"))
            );
        }
    }

    reporter.finish();
    if let Some(start) = start_time {
        emit_line(&format!("time: {}", format_duration(start.elapsed())));
    }

    let stats = SolverStats {
        status,
        iterations: iter,
        relative_change,
        nonzeros: count_nonzeros(&v),
    };
    Ok(AdmmSolution { x: v, stats })
}
