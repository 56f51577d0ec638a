use crate::error::Result;
use crate::module::{PackArgs, Packed, Parametrized};
use ndarray::Array2;

/// A root module that renders an image from packed parameter values
///
/// `forward` only reads the tree, so one simulator may be evaluated from
/// several threads at once.
pub trait Simulator: Parametrized + Send + Sync {
    /// Evaluate with values already resolved by [`Parametrized::pack`].
    fn forward(&self, packed: &Packed) -> Result<Array2<f64>>;

    /// Pack `args` against this tree, then evaluate.
    fn call(&self, args: PackArgs) -> Result<Array2<f64>> {
        let packed = self.pack(args)?;
        self.forward(&packed)
    }
}

impl std::fmt::Debug for dyn Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.module())
    }
}
