//! # Cosmology
//!
//! Distance measures and densities needed to turn angular lens quantities
//! into physical ones. Distances are in Mpc, densities in solar masses per
//! Mpc^3 (volume) or Mpc^2 (surface).
//!
//! Implementors provide [`Cosmology::comoving_distance`],
//! [`Cosmology::transverse_comoving_distance`] and
//! [`Cosmology::critical_density`]; every other measure is derived from those.

pub mod flat_lambda_cdm;

pub use flat_lambda_cdm::{FlatLambdaCDM, FlatLambdaCDMParams};

use crate::constants::G_OVER_C2;
use crate::error::Result;
use crate::module::{Packed, Parametrized};
use std::f64::consts::PI;
use std::fmt;

/// A cosmological model evaluated with packed parameter values
pub trait Cosmology: Parametrized + Send + Sync {
    /// Critical density at redshift `z`.
    fn critical_density(&self, z: f64, packed: &Packed) -> Result<f64>;

    /// Line-of-sight comoving distance to redshift `z`.
    fn comoving_distance(&self, z: f64, packed: &Packed) -> Result<f64>;

    /// Transverse comoving distance to redshift `z`.
    fn transverse_comoving_distance(&self, z: f64, packed: &Packed) -> Result<f64>;

    fn comoving_distance_z1z2(&self, z1: f64, z2: f64, packed: &Packed) -> Result<f64> {
        Ok(self.comoving_distance(z2, packed)? - self.comoving_distance(z1, packed)?)
    }

    fn transverse_comoving_distance_z1z2(&self, z1: f64, z2: f64, packed: &Packed) -> Result<f64> {
        Ok(self.transverse_comoving_distance(z2, packed)?
            - self.transverse_comoving_distance(z1, packed)?)
    }

    fn angular_diameter_distance(&self, z: f64, packed: &Packed) -> Result<f64> {
        Ok(self.comoving_distance(z, packed)? / (1.0 + z))
    }

    fn angular_diameter_distance_z1z2(&self, z1: f64, z2: f64, packed: &Packed) -> Result<f64> {
        Ok(self.comoving_distance_z1z2(z1, z2, packed)? / (1.0 + z2))
    }

    /// Time delay distance `(1 + z_l) D_l D_s / D_ls`.
    fn time_delay_distance(&self, z_l: f64, z_s: f64, packed: &Packed) -> Result<f64> {
        let (d_l, d_s, d_ls) = self.lensing_distances(z_l, z_s, packed)?;
        Ok((1.0 + z_l) * d_l * d_s / d_ls)
    }

    /// Critical surface density for a lens at `z_l` and a source at `z_s`.
    fn critical_surface_density(&self, z_l: f64, z_s: f64, packed: &Packed) -> Result<f64> {
        let (d_l, d_s, d_ls) = self.lensing_distances(z_l, z_s, packed)?;
        Ok(d_s / (4.0 * PI * G_OVER_C2 * d_l * d_ls))
    }

    /// Angular diameter distances to the lens, to the source, and between them.
    fn lensing_distances(&self, z_l: f64, z_s: f64, packed: &Packed) -> Result<(f64, f64, f64)> {
        Ok((
            self.angular_diameter_distance(z_l, packed)?,
            self.angular_diameter_distance(z_s, packed)?,
            self.angular_diameter_distance_z1z2(z_l, z_s, packed)?,
        ))
    }
}

impl fmt::Debug for dyn Cosmology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.module())
    }
}
