use faer::{MatRef, Par};

use crate::solver::{check_problem, pinv_lstsq, scatter, SolveError};
use crate::support::Support;

/// Oracle estimator: least squares restricted to a known support.
///
/// Solves `min ||b - A x||_2` subject to `supp(x) ⊆ support`. Entries of the
/// returned `x` outside `support` are exactly zero; an empty support yields
/// the zero vector. The restricted normal matrix is inverted through its
/// pseudo-inverse, so linearly dependent atoms do not fail the call.
pub fn oracle(a: MatRef<'_, f64>, b: &[f64], support: &[usize]) -> Result<Vec<f64>, SolveError> {
    check_problem(a, b)?;
    let support = Support::new(a.ncols(), support.to_vec())?;
    let coeffs = pinv_lstsq(a, b, support.indices(), Par::Seq)?;
    Ok(scatter(a.ncols(), support.indices(), &coeffs))
}
