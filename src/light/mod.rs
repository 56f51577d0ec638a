//! Surface brightness profiles.

pub mod sersic;

pub use sersic::{Sersic, SersicParams};

use crate::error::Result;
use crate::module::{Packed, Parametrized};
use crate::parameters::Tensor;

/// A light profile evaluated on source-plane coordinates
pub trait Source: Parametrized + Send + Sync {
    /// Surface brightness at `(x, y)`.
    fn brightness(&self, x: &Tensor, y: &Tensor, packed: &Packed) -> Result<Tensor>;
}

impl std::fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.module())
    }
}
