//! # Simulators
//!
//! Root modules that turn packed parameter values into images, and the
//! snapshot type used to persist a tree's static parameters.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use caustics_rs::cosmology::{FlatLambdaCDM, FlatLambdaCDMParams};
//! use caustics_rs::lenses::{SieParams, SIE};
//! use caustics_rs::light::{Sersic, SersicParams};
//! use caustics_rs::module::{PackArgs, Parametrized};
//! use caustics_rs::sims::{ImageSettings, LensSource, Simulator};
//! use std::sync::Arc;
//!
//! # fn main() -> caustics_rs::Result<()> {
//! let cosmo = Arc::new(FlatLambdaCDM::new(None, FlatLambdaCDMParams::default())?);
//! let lens = Arc::new(SIE::new(cosmo, SieParams::default(), 0.0, Some("lens"))?);
//! let source = Arc::new(Sersic::new(SersicParams::default(), 0.0, false, Some("src"))?);
//! let sim = LensSource::new(lens, source, Some(1.0), ImageSettings::default(), None)?;
//!
//! // source parameters come first in traversal order, then the lens
//! let x = vec![0.0, 0.0, 0.8, 0.0, 1.5, 0.5, 1.0, 0.5, 0.0, 0.0, 0.7, 0.3, 1.2];
//! let image = sim.call(x.into())?;
//! assert_eq!(image.dim(), (100, 100));
//! let snapshot = sim.state_dict()?;
//! assert!(snapshot.contains_key("sim.z_s"));
//! # Ok(())
//! # }
//! ```

pub mod lens_source;
pub mod simulator;
pub mod state_dict;

pub use lens_source::{ImageSettings, LensSource};
pub use simulator::Simulator;
pub use state_dict::{ParamSource, StateDict, StateMetadata};
