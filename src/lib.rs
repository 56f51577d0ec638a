//! # caustics-rs
//!
//! `caustics-rs` simulates strong gravitational lensing on top of a small
//! parameter-graph runtime.
//!
//! The library provides:
//! - A module tree where every physics object declares named parameters
//!   that are either static (stored) or dynamic (supplied per call)
//! - A pack/unpack calling convention that routes call-time values to the
//!   module that declared them, in a deterministic traversal order
//! - Immutable state snapshots that round-trip through the safetensors
//!   format with version and creation-time metadata
//! - Cosmology, thin lenses, light profiles and an image simulator
//! - JSON configuration with a kind registry
//!
//! ## Basic Usage
//!
//! ```rust
//! use caustics_rs::cosmology::{FlatLambdaCDM, FlatLambdaCDMParams};
//! use caustics_rs::lenses::{SieParams, ThinLens, SIE};
//! use caustics_rs::module::{PackArgs, Parametrized};
//! use ndarray::arr1;
//! use std::sync::Arc;
//!
//! # fn main() -> caustics_rs::Result<()> {
//! let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::default())?);
//! let params = SieParams { z_l: Some(0.5), x0: Some(0.0), y0: Some(0.0), ..Default::default() };
//! let lens = SIE::new(cosmo, params, 0.0, Some("sie"))?;
//!
//! // q, phi and b are dynamic
//! let packed = lens.pack(PackArgs::from_pairs([("q", 0.8), ("phi", 0.3), ("b", 1.1)]))?;
//! let x = arr1(&[0.4, -0.9]).into_dyn();
//! let y = arr1(&[1.0, 0.2]).into_dyn();
//! let (bx, by) = lens.raytrace(&x, &y, 1.2, &packed)?;
//! assert_eq!(bx.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod cosmology;
pub mod error;
pub mod io;
pub mod lenses;
pub mod light;
pub mod models;
pub mod module;
pub mod parameters;
pub mod sims;
pub mod utils;

// Re-exports for convenience
pub use error::{CausticsError, Result};
pub use models::{build_simulator, Config, ModelConfig, Registry};
pub use module::{Module, PackArgs, Packed, Parametrized};
pub use parameters::{Parameter, Tensor};
pub use sims::{LensSource, Simulator, StateDict};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
