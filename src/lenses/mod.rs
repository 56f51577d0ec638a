//! # Lenses
//!
//! Thin gravitational lenses. Angles are in arcsec; every lens owns a
//! cosmology submodule and a lens redshift parameter `z_l`.
//!
//! ## Core Components
//!
//! - [`ThinLens`]: deflection, convergence and potential of a thin lens plus
//!   the ray tracing and time delay built on them
//! - [`SIE`]: singular isothermal ellipsoid with optional core
//! - [`SIS`]: singular isothermal sphere

pub mod sie;
pub mod sis;

pub use sie::{SieParams, SIE};
pub use sis::{SisParams, SIS};

use crate::constants::{ARCSEC_TO_RAD, C_MPC_S, DAYS_TO_SECONDS};
use crate::cosmology::Cosmology;
use crate::error::Result;
use crate::module::{Packed, Parametrized};
use crate::parameters::Tensor;

/// A lens whose mass lies in a single plane at redshift `z_l`
pub trait ThinLens: Parametrized + Send + Sync {
    /// Cosmology used to convert between reduced and physical quantities.
    fn cosmology(&self) -> &dyn Cosmology;

    /// Reduced deflection angle at `(x, y)` for a source at `z_s`.
    fn reduced_deflection_angle(
        &self,
        x: &Tensor,
        y: &Tensor,
        z_s: f64,
        packed: &Packed,
    ) -> Result<(Tensor, Tensor)>;

    /// Dimensionless surface density.
    fn convergence(&self, x: &Tensor, y: &Tensor, z_s: f64, packed: &Packed) -> Result<Tensor>;

    /// Lensing potential in arcsec^2.
    fn potential(&self, x: &Tensor, y: &Tensor, z_s: f64, packed: &Packed) -> Result<Tensor>;

    fn z_l(&self, packed: &Packed) -> Result<f64> {
        self.unpack(packed)?.scalar("z_l")
    }

    /// Map image-plane positions back to the source plane.
    fn raytrace(&self, x: &Tensor, y: &Tensor, z_s: f64, packed: &Packed) -> Result<(Tensor, Tensor)> {
        let (ax, ay) = self.reduced_deflection_angle(x, y, z_s, packed)?;
        Ok((x - &ax, y - &ay))
    }

    /// Deflection angle scaled by `D_s / D_ls`.
    fn physical_deflection_angle(
        &self,
        x: &Tensor,
        y: &Tensor,
        z_s: f64,
        packed: &Packed,
    ) -> Result<(Tensor, Tensor)> {
        let z_l = self.z_l(packed)?;
        let cosmo = self.cosmology();
        let d_s = cosmo.angular_diameter_distance(z_s, packed)?;
        let d_ls = cosmo.angular_diameter_distance_z1z2(z_l, z_s, packed)?;
        let (ax, ay) = self.reduced_deflection_angle(x, y, z_s, packed)?;
        let scale = d_s / d_ls;
        Ok((ax * scale, ay * scale))
    }

    /// Arrival time delay in days
    ///
    /// `geometric` adds half the squared deflection, `shapiro` subtracts the
    /// potential. With both off the result is zero.
    fn time_delay(
        &self,
        x: &Tensor,
        y: &Tensor,
        z_s: f64,
        packed: &Packed,
        geometric: bool,
        shapiro: bool,
    ) -> Result<Tensor> {
        let z_l = self.z_l(packed)?;
        let (d_l, d_s, d_ls) = self.cosmology().lensing_distances(z_l, z_s, packed)?;
        let factor = (1.0 + z_l) / C_MPC_S * d_s * d_l / d_ls * ARCSEC_TO_RAD.powi(2)
            / DAYS_TO_SECONDS;

        let mut delay = Tensor::zeros(x.raw_dim());
        if geometric {
            let (ax, ay) = self.reduced_deflection_angle(x, y, z_s, packed)?;
            delay = delay + (&ax * &ax + &ay * &ay) * 0.5;
        }
        if shapiro {
            delay = delay - self.potential(x, y, z_s, packed)?;
        }
        Ok(delay * factor)
    }
}

impl std::fmt::Debug for dyn ThinLens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.module())
    }
}
