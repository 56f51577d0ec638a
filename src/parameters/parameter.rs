//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the fundamental building block
//! of the module graph. A parameter either holds a concrete tensor value
//! ("static") or only declares the shape a value must have when it is
//! supplied at call time ("dynamic").

use crate::error::CausticsError;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tensor type used for every parameter value.
pub type Tensor = ArrayD<f64>;

/// Build a zero-dimensional tensor holding `value`.
pub fn scalar_tensor(value: f64) -> Tensor {
    ndarray::arr0(value).into_dyn()
}

/// Build a tensor of the given shape from row-major data.
pub fn tensor_from_vec(shape: &[usize], data: Vec<f64>) -> crate::error::Result<Tensor> {
    let expected: usize = shape.iter().product();
    let got = data.len();
    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|_| CausticsError::ShapeMismatch {
        name: "<tensor>".to_string(),
        expected: vec![expected],
        got: vec![got],
    })
}

/// Storage precision declared by a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit float
    F32,
    /// 64-bit float
    #[default]
    F64,
}

impl DType {
    /// Size in bytes of one element
    pub fn size(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Round a tensor to this precision.
    pub fn round(&self, tensor: Tensor) -> Tensor {
        match self {
            DType::F32 => tensor.mapv(|v| v as f32 as f64),
            DType::F64 => tensor,
        }
    }
}

/// Errors that can occur when working with a single parameter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("expected shape {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("dynamic parameter declared without a shape")]
    MissingShape,
}

impl ParameterError {
    /// Attach the qualified parameter name and lift into the crate error.
    pub fn with_name(self, name: &str) -> CausticsError {
        match self {
            ParameterError::ShapeMismatch { expected, got } => CausticsError::ShapeMismatch {
                name: name.to_string(),
                expected,
                got,
            },
            ParameterError::MissingShape => CausticsError::MissingShape(name.to_string()),
        }
    }
}

/// A single named value slot on a module
///
/// The name itself lives in the owning container; a Parameter only knows its
/// value, its declared shape and its precision. A parameter is dynamic iff it
/// has no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Current value (`None` means dynamic)
    value: Option<Tensor>,

    /// Declared shape, fixed at creation
    shape: Vec<usize>,

    /// Declared precision
    dtype: DType,
}

impl Parameter {
    /// Create a parameter from an optional value and an optional shape
    ///
    /// # Arguments
    ///
    /// * `value` - Concrete value; `None` creates a dynamic parameter
    /// * `shape` - Declared shape; required when `value` is `None`
    /// * `dtype` - Storage precision
    ///
    /// # Returns
    ///
    /// The new parameter, or an error when the shape is missing for a dynamic
    /// parameter or disagrees with the value's shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use caustics_rs::parameters::{DType, Parameter};
    ///
    /// let p = Parameter::new(None, Some(vec![2]), DType::F64).unwrap();
    /// assert!(p.is_dynamic());
    /// assert_eq!(p.shape(), &[2]);
    /// ```
    pub fn new(
        value: Option<Tensor>,
        shape: Option<Vec<usize>>,
        dtype: DType,
    ) -> Result<Self, ParameterError> {
        match (value, shape) {
            (Some(value), Some(shape)) if value.shape() != shape.as_slice() => {
                Err(ParameterError::ShapeMismatch {
                    expected: shape,
                    got: value.shape().to_vec(),
                })
            }
            (Some(value), _) => Ok(Self {
                shape: value.shape().to_vec(),
                value: Some(dtype.round(value)),
                dtype,
            }),
            (None, Some(shape)) => Ok(Self {
                value: None,
                shape,
                dtype,
            }),
            (None, None) => Err(ParameterError::MissingShape),
        }
    }

    /// Create a static parameter
    pub fn fixed(value: Tensor) -> Self {
        Self {
            shape: value.shape().to_vec(),
            value: Some(value),
            dtype: DType::F64,
        }
    }

    /// Create a static scalar parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use caustics_rs::parameters::Parameter;
    ///
    /// let p = Parameter::scalar(1.5);
    /// assert!(p.is_static());
    /// assert!(p.shape().is_empty());
    /// ```
    pub fn scalar(value: f64) -> Self {
        Self::fixed(scalar_tensor(value))
    }

    /// Create a dynamic parameter with the given shape
    pub fn dynamic(shape: &[usize]) -> Self {
        Self {
            value: None,
            shape: shape.to_vec(),
            dtype: DType::F64,
        }
    }

    /// Change the declared precision, rounding any held value.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self.value = self.value.take().map(|v| dtype.round(v));
        self
    }

    /// Get the current value
    pub fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    /// Get the declared shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the declared precision
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of elements a value of this parameter holds
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the parameter awaits a value at call time
    pub fn is_dynamic(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the parameter holds a value
    pub fn is_static(&self) -> bool {
        self.value.is_some()
    }

    /// Check that a candidate value has the declared shape.
    pub fn check_shape(&self, value: &Tensor) -> Result<(), ParameterError> {
        if value.shape() != self.shape.as_slice() {
            return Err(ParameterError::ShapeMismatch {
                expected: self.shape.clone(),
                got: value.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Set the value, making the parameter static
    ///
    /// # Arguments
    ///
    /// * `value` - New value; must have the declared shape
    ///
    /// # Returns
    ///
    /// `Ok(())` if the value was stored, or a shape mismatch error, in which
    /// case the parameter is left unchanged.
    pub fn set_value(&mut self, value: Tensor) -> Result<(), ParameterError> {
        self.check_shape(&value)?;
        self.value = Some(self.dtype.round(value));
        Ok(())
    }

    /// Drop the value, making the parameter dynamic. The shape is kept.
    pub fn clear(&mut self) {
        self.value = None;
    }
}
