//! Coordinate transforms and pixel grids.

use crate::parameters::Tensor;
use ndarray::{Array1, Array2, Zip};

/// Translate points by `(-x0, -y0)` and rotate them by `-phi`.
pub fn translate_rotate(x: &Tensor, y: &Tensor, x0: f64, y0: f64, phi: f64) -> (Tensor, Tensor) {
    let (c, s) = (phi.cos(), phi.sin());
    let mut xt = Tensor::zeros(x.raw_dim());
    let mut yt = Tensor::zeros(y.raw_dim());
    Zip::from(&mut xt)
        .and(&mut yt)
        .and(x)
        .and(y)
        .for_each(|xo, yo, &xi, &yi| {
            let (dx, dy) = (xi - x0, yi - y0);
            *xo = dx * c + dy * s;
            *yo = -dx * s + dy * c;
        });
    (xt, yt)
}

/// Rotate vector components by `phi`.
pub fn derotate(vx: &Tensor, vy: &Tensor, phi: f64) -> (Tensor, Tensor) {
    let (c, s) = (phi.cos(), phi.sin());
    let mut ox = Tensor::zeros(vx.raw_dim());
    let mut oy = Tensor::zeros(vy.raw_dim());
    Zip::from(&mut ox)
        .and(&mut oy)
        .and(vx)
        .and(vy)
        .for_each(|xo, yo, &a, &b| {
            *xo = a * c - b * s;
            *yo = a * s + b * c;
        });
    (ox, oy)
}

/// Stretch the y axis by `1 / q`.
pub fn to_elliptical(x: &Tensor, y: &Tensor, q: f64) -> (Tensor, Tensor) {
    (x.clone(), y / q)
}

/// Pixel-centre coordinates of an `nx` by `ny` grid centred on the origin
///
/// Returns `(x, y)` arrays of shape `(ny, nx)`; `x` varies along columns.
pub fn get_meshgrid(pixelscale: f64, nx: usize, ny: usize) -> (Array2<f64>, Array2<f64>) {
    let axis = |n: usize| -> Array1<f64> {
        let half = pixelscale * (n as f64 - 1.0) / 2.0;
        Array1::linspace(-half, half, n)
    };
    let xs = axis(nx);
    let ys = axis(ny);
    let x = Array2::from_shape_fn((ny, nx), |(_, j)| xs[j]);
    let y = Array2::from_shape_fn((ny, nx), |(i, _)| ys[i]);
    (x, y)
}

/// Sum `factor` by `factor` blocks and divide by the block area.
pub fn avg_pool(image: &Array2<f64>, factor: usize) -> Array2<f64> {
    if factor <= 1 {
        return image.clone();
    }
    let (rows, cols) = image.dim();
    let area = (factor * factor) as f64;
    Array2::from_shape_fn((rows / factor, cols / factor), |(i, j)| {
        image
            .slice(ndarray::s![i * factor..(i + 1) * factor, j * factor..(j + 1) * factor])
            .sum()
            / area
    })
}
