//! 2D convolution for point-spread functions
//!
//! Supports the two edge modes image simulation needs: `Valid` (output only
//! where the kernel fully overlaps) and `Same` (zero padding, output the size
//! of the input).

use ndarray::{Array2, ArrayView2};

/// Mode for handling edges in convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveMode {
    /// Only compute output where input and kernel fully overlap
    Valid,
    /// Use zero-padding to maintain input size
    #[default]
    Same,
}

/// Convolve `image` with `kernel`
///
/// The kernel is flipped, so this is a true convolution rather than a
/// correlation. In `Same` mode the kernel centre is at `(rows / 2, cols / 2)`.
pub fn convolve2d(image: &ArrayView2<f64>, kernel: &ArrayView2<f64>, mode: ConvolveMode) -> Array2<f64> {
    let (img_rows, img_cols) = image.dim();
    let (ker_rows, ker_cols) = kernel.dim();

    // Output pixel (i, j) under kernel tap (ki, kj) reads input (i + off_r - ki, j + off_c - kj)
    let (out_rows, out_cols, off_r, off_c) = match mode {
        ConvolveMode::Valid => {
            if ker_rows > img_rows || ker_cols > img_cols {
                return Array2::zeros((0, 0));
            }
            (
                img_rows - ker_rows + 1,
                img_cols - ker_cols + 1,
                ker_rows - 1,
                ker_cols - 1,
            )
        }
        ConvolveMode::Same => (img_rows, img_cols, ker_rows / 2, ker_cols / 2),
    };

    Array2::from_shape_fn((out_rows, out_cols), |(i, j)| {
        let mut sum = 0.0;
        for ki in 0..ker_rows {
            let Some(r) = (i + off_r).checked_sub(ki).filter(|&r| r < img_rows) else {
                continue;
            };
            for kj in 0..ker_cols {
                if let Some(c) = (j + off_c).checked_sub(kj).filter(|&c| c < img_cols) {
                    sum += image[[r, c]] * kernel[[ki, kj]];
                }
            }
        }
        sum
    })
}
