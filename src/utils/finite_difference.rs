//! Finite-difference derivatives of simulator images.
//!
//! These functions compute the derivative of a simulator's output image with
//! respect to each entry of its flat dynamic parameter vector, using forward
//! differences.

use ndarray::{Array1, Array2, Array3, Axis};

use crate::error::{CausticsError, Result};
use crate::sims::Simulator;

/// Default step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Step for parameter `value`, scaled to its magnitude.
pub(crate) fn step_size(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Evaluate `sim` at a flat parameter vector.
pub(crate) fn eval_flat(sim: &dyn Simulator, params: &Array1<f64>) -> Result<Array2<f64>> {
    sim.call(params.clone().into())
}

/// Stack per-parameter derivative images into `(n_params, rows, cols)`.
pub(crate) fn stack(columns: Vec<Array2<f64>>, dim: (usize, usize)) -> Result<Array3<f64>> {
    let mut jac = Array3::zeros((columns.len(), dim.0, dim.1));
    for (j, column) in columns.into_iter().enumerate() {
        if column.dim() != dim {
            return Err(CausticsError::ShapeMismatch {
                name: "jacobian".to_string(),
                expected: vec![dim.0, dim.1],
                got: column.shape().to_vec(),
            });
        }
        jac.index_axis_mut(Axis(0), j).assign(&column);
    }
    Ok(jac)
}

/// Derivative image for parameter `j`.
pub(crate) fn column(
    sim: &dyn Simulator,
    params: &Array1<f64>,
    base: &Array2<f64>,
    j: usize,
    eps: f64,
) -> Result<Array2<f64>> {
    let mut perturbed = params.clone();
    let eps_j = step_size(params[j], eps);
    perturbed[j] += eps_j;
    let image = eval_flat(sim, &perturbed)?;
    if image.dim() != base.dim() {
        return Err(CausticsError::ShapeMismatch {
            name: "jacobian".to_string(),
            expected: base.shape().to_vec(),
            got: image.shape().to_vec(),
        });
    }
    Ok((image - base) / eps_j)
}

/// Compute the image Jacobian using forward finite differences.
///
/// `J[j, r, c]` is the derivative of pixel `(r, c)` with respect to
/// `params[j]`, where `params` is the flat dynamic vector in traversal order.
///
/// # Arguments
///
/// * `sim` - The simulator to evaluate
/// * `params` - The flat dynamic parameter values
/// * `epsilon` - The step size for finite differences (optional)
pub fn jacobian(sim: &dyn Simulator, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array3<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let base = eval_flat(sim, params)?;
    let columns = (0..params.len())
        .map(|j| column(sim, params, &base, j, eps))
        .collect::<Result<Vec<_>>>()?;
    stack(columns, base.dim())
}
