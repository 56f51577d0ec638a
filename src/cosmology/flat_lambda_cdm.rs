//! Flat Lambda-CDM cosmology without radiation.

use super::Cosmology;
use crate::constants::{C_MPC_S, KM_TO_MPC};
use crate::error::Result;
use crate::module::{MetaParam, Module, Packed, Parametrized};
use crate::parameters::scalar_tensor;
use serde::{Deserialize, Serialize};

/// Planck 2018 `h`.
pub const H0_DEFAULT: f64 = 0.6766;
/// Planck 2018 critical density at `z = 0`, in solar masses per Mpc^3.
pub const CRITICAL_DENSITY_0_DEFAULT: f64 = 127_052_815_397.498_38;
/// Planck 2018 matter density at `z = 0`.
pub const OM0_DEFAULT: f64 = 0.30966;

/// Simpson intervals per unit of integration range.
const SIMPSON_INTERVALS: usize = 256;
/// Upper bound on Simpson intervals for one integral.
const MAX_SIMPSON_INTERVALS: usize = 1 << 20;
/// `1 - Om0` below this is treated as Einstein-de Sitter.
const EDS_TOLERANCE: f64 = 1e-12;

/// Parameter values for [`FlatLambdaCDM`]; `None` makes a parameter dynamic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlatLambdaCDMParams {
    /// Hubble constant over 100 km/s/Mpc. Default: 0.6766
    pub h0: Option<f64>,

    /// Critical density at z = 0 in Msun/Mpc^3. Default: Planck 2018
    pub critical_density_0: Option<f64>,

    /// Matter density parameter at z = 0. Default: 0.30966
    #[serde(rename = "Om0")]
    pub om0: Option<f64>,
}

impl Default for FlatLambdaCDMParams {
    fn default() -> Self {
        Self {
            h0: Some(H0_DEFAULT),
            critical_density_0: Some(CRITICAL_DENSITY_0_DEFAULT),
            om0: Some(OM0_DEFAULT),
        }
    }
}

impl FlatLambdaCDMParams {
    /// Every parameter dynamic.
    pub fn dynamic() -> Self {
        Self {
            h0: None,
            critical_density_0: None,
            om0: None,
        }
    }
}

/// Flat Lambda-CDM cosmology with parameters `h0`, `critical_density_0`, `Om0`
#[derive(Debug)]
pub struct FlatLambdaCDM {
    module: Module,
}

impl FlatLambdaCDM {
    pub const KIND: &'static str = "FlatLambdaCDM";

    pub fn new(name: Option<&str>, params: FlatLambdaCDMParams) -> Result<Self> {
        let module = Module::new(Self::KIND, name)?;
        module.declare_meta_param("h0", MetaParam::scalar("Hubble constant over 100"))?;
        module.declare_meta_param(
            "critical_density_0",
            MetaParam::scalar("Critical density at z=0 (Msun/Mpc^3)"),
        )?;
        module.declare_meta_param("Om0", MetaParam::scalar("Matter density parameter at z=0"))?;

        module.add_param("h0", params.h0.map(scalar_tensor), None)?;
        module.add_param(
            "critical_density_0",
            params.critical_density_0.map(scalar_tensor),
            None,
        )?;
        module.add_param("Om0", params.om0.map(scalar_tensor), None)?;
        Ok(Self { module })
    }

    fn values(&self, packed: &Packed) -> Result<(f64, f64, f64)> {
        let p = self.unpack(packed)?;
        Ok((p.scalar("h0")?, p.scalar("critical_density_0")?, p.scalar("Om0")?))
    }
}

impl Parametrized for FlatLambdaCDM {
    fn module(&self) -> &Module {
        &self.module
    }
}

impl Cosmology for FlatLambdaCDM {
    fn critical_density(&self, z: f64, packed: &Packed) -> Result<f64> {
        let (_, rho0, om0) = self.values(packed)?;
        Ok(critical_density(z, rho0, om0))
    }

    fn comoving_distance(&self, z: f64, packed: &Packed) -> Result<f64> {
        let (h0, _, om0) = self.values(packed)?;
        Ok(comoving_distance(z, h0, om0))
    }

    fn transverse_comoving_distance(&self, z: f64, packed: &Packed) -> Result<f64> {
        self.comoving_distance(z, packed)
    }
}

/// Hubble distance `c / H0` in Mpc.
pub fn hubble_distance(h0: f64) -> f64 {
    C_MPC_S / (100.0 * KM_TO_MPC) / h0
}

/// `F(x) = integral from 0 to x of (1 + t^3)^(-1/2) dt`, by composite Simpson.
/// Non-finite `x` gives NaN.
fn comoving_helper(x: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    let wanted = (SIMPSON_INTERVALS as f64 * x.abs()).ceil();
    let half = (wanted / 2.0).min((MAX_SIMPSON_INTERVALS / 2) as f64) as usize;
    let n = 2 * (half + 1);
    let h = x / n as f64;
    let f = |t: f64| 1.0 / (1.0 + t * t * t).sqrt();
    let interior: f64 = (1..n)
        .map(|i| {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            w * f(i as f64 * h)
        })
        .sum();
    h / 3.0 * (f(0.0) + interior + f(x))
}

/// Comoving distance to `z` in Mpc.
///
/// `Om0 = 1` uses the Einstein-de Sitter closed form; `Om0 > 1` and
/// non-finite inputs give NaN.
pub fn comoving_distance(z: f64, h0: f64, om0: f64) -> f64 {
    if !(z.is_finite() && om0.is_finite()) {
        return f64::NAN;
    }
    let ode0 = 1.0 - om0;
    if ode0.abs() < EDS_TOLERANCE {
        return hubble_distance(h0) * 2.0 * (1.0 - 1.0 / (1.0 + z).sqrt());
    }
    if ode0 < 0.0 {
        return f64::NAN;
    }
    let ratio = (om0 / ode0).cbrt();
    let dc1z = comoving_helper((1.0 + z) * ratio);
    let dc = comoving_helper(ratio);
    hubble_distance(h0) * (dc1z - dc) / (om0.cbrt() * ode0.powf(1.0 / 6.0))
}

/// Transverse comoving distance to `z` in Mpc; equal to the comoving distance
/// in a flat universe.
pub fn transverse_comoving_distance(z: f64, h0: f64, om0: f64) -> f64 {
    comoving_distance(z, h0, om0)
}

/// Critical density at `z`.
pub fn critical_density(z: f64, critical_density_0: f64, om0: f64) -> f64 {
    let ode0 = 1.0 - om0;
    critical_density_0 * (om0 * (1.0 + z).powi(3) + ode0)
}

pub fn comoving_distance_z1z2(z1: f64, z2: f64, h0: f64, om0: f64) -> f64 {
    comoving_distance(z2, h0, om0) - comoving_distance(z1, h0, om0)
}

pub fn angular_diameter_distance(z: f64, h0: f64, om0: f64) -> f64 {
    comoving_distance(z, h0, om0) / (1.0 + z)
}

pub fn angular_diameter_distance_z1z2(z1: f64, z2: f64, h0: f64, om0: f64) -> f64 {
    comoving_distance_z1z2(z1, z2, h0, om0) / (1.0 + z2)
}
