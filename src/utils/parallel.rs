//! Parallel evaluation of simulators.
//!
//! Evaluation never mutates the module tree, so one simulator can be shared
//! across rayon worker threads.

use ndarray::{Array1, Array2, Array3};
use rayon::prelude::*;

use super::finite_difference::{column, eval_flat, stack, DEFAULT_EPSILON};
use crate::error::Result;
use crate::sims::Simulator;

/// Evaluate `sim` once per row of `batch` in parallel.
///
/// Each row is a flat dynamic parameter vector. Images are returned in row
/// order; the first failing row's error is returned.
pub fn batch_forward(sim: &dyn Simulator, batch: &Array2<f64>) -> Result<Vec<Array2<f64>>> {
    let rows: Vec<Array1<f64>> = batch.outer_iter().map(|row| row.to_owned()).collect();
    rows.par_iter().map(|row| eval_flat(sim, row)).collect()
}

/// Compute the image Jacobian using forward finite differences in parallel.
///
/// Same result as [`super::finite_difference::jacobian`], with one rayon task
/// per parameter.
pub fn jacobian_parallel(
    sim: &dyn Simulator,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array3<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let base = eval_flat(sim, params)?;
    let columns = (0..params.len())
        .into_par_iter()
        .map(|j| column(sim, params, &base, j, eps))
        .collect::<Result<Vec<_>>>()?;
    stack(columns, base.dim())
}
