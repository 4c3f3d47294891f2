use std::time::Instant;

use faer::{MatRef, Par};

use crate::report::{emit_line, OmpIterationReport, Reporter, ReporterSlot};
use crate::solver::{
    adjoint_apply, check_problem, cholesky_lstsq, format_duration, l2_norm, restricted_residual,
    scatter, SolveError,
};
use crate::support::Support;

/// Options controlling orthogonal matching pursuit.
#[derive(Debug, Clone)]
pub struct OmpOptions {
    /// Number of atoms to select. `None` selects every atom of `A`.
    pub max_support: Option<usize>,
    /// Parallelism used by the dense kernels.
    pub par: Par,
    /// Emit the per-iteration table and timing on finish.
    pub verbose: bool,
}

impl Default for OmpOptions {
    fn default() -> Self {
        Self {
            max_support: None,
            par: Par::Seq,
            verbose: false,
        }
    }
}

impl OmpOptions {
    pub fn with_max_support(max_support: usize) -> Self {
        Self {
            max_support: Some(max_support),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OmpSolution {
    /// Length-m coefficients, zero outside `support`.
    pub x: Vec<f64>,
    /// Selected atoms in selection order.
    pub support: Support,
    /// `||b - A x||_2` at exit.
    pub residual_norm: f64,
}

/// Orthogonal matching pursuit.
///
/// Grows the support one atom per iteration, always picking the inactive atom
/// whose correlation with the residual has the largest magnitude (lowest index
/// on ties), then refits least squares over the whole support. Runs exactly
/// `max_support` iterations; there is no residual-based early exit.
///
/// The refit goes through a Cholesky solve of the restricted normal
/// equations, so a rank-deficient support (e.g. `max_support > nrows`)
/// returns `SolveError::Factorization`.
pub fn omp(
    a: MatRef<'_, f64>,
    b: &[f64],
    options: &OmpOptions,
    reporter: Option<&mut dyn Reporter>,
) -> Result<OmpSolution, SolveError> {
    check_problem(a, b)?;
    let m = a.ncols();
    let max_support = match options.max_support {
        None => m,
        Some(requested) if requested == 0 || requested > m => {
            return Err(SolveError::InvalidSupportSize {
                requested,
                ncols: m,
            });
        }
        Some(requested) => requested,
    };
    let start_time = options.verbose.then(Instant::now);
    let mut reporter = ReporterSlot::new(reporter, options.verbose);

    let mut support = Support::empty(m);
    let mut residual = b.to_vec();
    let mut projections = vec![0.0; m];
    let mut coeffs = Vec::new();
    let mut residual_norm = l2_norm(&residual);

    while support.len() < max_support {
        adjoint_apply(a, &residual, &mut projections, options.par);
        let Some((selected, projection)) = select_atom(&projections, &support) else {
            break;
        };
        support.insert(selected);

        coeffs = cholesky_lstsq(a, b, support.indices(), options.par)?;
        restricted_residual(a, b, support.indices(), &coeffs, &mut residual, options.par);
        residual_norm = l2_norm(&residual);

        log::debug!(
            "omp: selected atom {selected} (|proj|={projection:.3e}), support {}, residual {residual_norm:.3e}",
            support.len()
        );
        if let Some(reporter) = reporter.as_mut() {
            reporter.on_omp_iteration(&OmpIterationReport {
                iteration: support.len() - 1,
                selected,
                projection,
                support_size: support.len(),
                residual_norm,
            });
        }
    }

    reporter.finish();
    if let Some(start) = start_time {
        emit_line(&format!("time: {}", format_duration(start.elapsed())));
    }

    let x = scatter(m, support.indices(), &coeffs);
    Ok(OmpSolution {
        x,
        support,
        residual_norm,
    })
}

/// First index (among atoms not yet in `support`) with the largest `|projection|`.
fn select_atom(projections: &[f64], support: &Support) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &projection) in projections.iter().enumerate() {
        if support.contains(index) {
            continue;
        }
        let magnitude = projection.abs();
        best = match best {
            Some((_, current)) if magnitude > current => Some((index, magnitude)),
            Some(kept) => Some(kept),
            None => Some((index, magnitude)),
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_atom_prefers_lowest_index_on_ties() {
        let support = Support::empty(4);
        assert_eq!(select_atom(&[1.0, -3.0, 3.0, 2.0], &support), Some((1, 3.0)));
    }

    #[test]
    fn select_atom_skips_active_atoms() {
        let mut support = Support::empty(3);
        support.insert(0);
        assert_eq!(select_atom(&[5.0, 0.0, -1.0], &support), Some((2, 1.0)));
        support.insert(1);
        support.insert(2);
        assert_eq!(select_atom(&[5.0, 0.0, -1.0], &support), None);
    }
}
