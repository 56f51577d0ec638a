//! Singular isothermal ellipsoid.

use super::ThinLens;
use crate::cosmology::Cosmology;
use crate::error::Result;
use crate::module::{MetaParam, Module, Packed, Parametrized};
use crate::parameters::{scalar_tensor, Tensor};
use crate::utils::geometry::{derotate, translate_rotate};
use ndarray::Zip;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Axis ratios closer to one than this use the spherical limit.
const ROUND_TOLERANCE: f64 = 1e-10;

/// Parameter values for [`SIE`]; `None` makes a parameter dynamic
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SieParams {
    /// Lens redshift
    pub z_l: Option<f64>,
    /// Centre x in arcsec
    pub x0: Option<f64>,
    /// Centre y in arcsec
    pub y0: Option<f64>,
    /// Axis ratio in (0, 1]
    pub q: Option<f64>,
    /// Position angle in radians
    pub phi: Option<f64>,
    /// Einstein radius in arcsec
    pub b: Option<f64>,
}

struct SieValues {
    x0: f64,
    y0: f64,
    q: f64,
    phi: f64,
    b: f64,
}

/// Singular isothermal ellipsoid with core radius `s`
#[derive(Debug)]
pub struct SIE {
    module: Module,
    cosmology: Arc<dyn Cosmology>,
    s: f64,
}

impl SIE {
    pub const KIND: &'static str = "SIE";

    /// Create the lens and attach `cosmology` as its child
    ///
    /// # Errors
    ///
    /// `AlreadyAttached` if the cosmology already belongs to another tree.
    pub fn new(
        cosmology: Arc<dyn Cosmology>,
        params: SieParams,
        s: f64,
        name: Option<&str>,
    ) -> Result<Self> {
        let module = Module::new(Self::KIND, name)?;
        for (param, desc) in [
            ("z_l", "Lens redshift"),
            ("x0", "Centre x (arcsec)"),
            ("y0", "Centre y (arcsec)"),
            ("q", "Axis ratio"),
            ("phi", "Position angle (radians)"),
            ("b", "Einstein radius (arcsec)"),
        ] {
            module.declare_meta_param(param, MetaParam::scalar(desc))?;
        }
        module.add_param("z_l", params.z_l.map(scalar_tensor), None)?;
        module.add_param("x0", params.x0.map(scalar_tensor), None)?;
        module.add_param("y0", params.y0.map(scalar_tensor), None)?;
        module.add_param("q", params.q.map(scalar_tensor), None)?;
        module.add_param("phi", params.phi.map(scalar_tensor), None)?;
        module.add_param("b", params.b.map(scalar_tensor), None)?;
        module.add_child(cosmology.module())?;
        Ok(Self {
            module,
            cosmology,
            s,
        })
    }

    pub fn core_radius(&self) -> f64 {
        self.s
    }

    fn values(&self, packed: &Packed) -> Result<SieValues> {
        let p = self.unpack(packed)?;
        Ok(SieValues {
            x0: p.scalar("x0")?,
            y0: p.scalar("y0")?,
            q: p.scalar("q")?,
            phi: p.scalar("phi")?,
            b: p.scalar("b")?,
        })
    }

    fn psi(&self, x: f64, y: f64, q: f64) -> f64 {
        (q * q * (x * x + self.s * self.s) + y * y).sqrt()
    }
}

impl Parametrized for SIE {
    fn module(&self) -> &Module {
        &self.module
    }
}

impl ThinLens for SIE {
    fn cosmology(&self) -> &dyn Cosmology {
        self.cosmology.as_ref()
    }

    fn reduced_deflection_angle(
        &self,
        x: &Tensor,
        y: &Tensor,
        _z_s: f64,
        packed: &Packed,
    ) -> Result<(Tensor, Tensor)> {
        let SieValues { x0, y0, q, phi, b } = self.values(packed)?;
        let (xt, yt) = translate_rotate(x, y, x0, y0, phi);
        let s = self.s;
        let f = (1.0 - q * q).sqrt();
        let norm = b * q.sqrt();

        let mut ax = Tensor::zeros(xt.raw_dim());
        let mut ay = Tensor::zeros(yt.raw_dim());
        Zip::from(&mut ax)
            .and(&mut ay)
            .and(&xt)
            .and(&yt)
            .for_each(|ax, ay, &x, &y| {
                let psi = self.psi(x, y, q);
                if f < ROUND_TOLERANCE {
                    *ax = norm * x / (psi + s);
                    *ay = norm * y / (psi + q * q * s);
                } else {
                    *ax = norm / f * (f * x / (psi + s)).atan();
                    *ay = norm / f * (f * y / (psi + q * q * s)).atanh();
                }
            });
        Ok(derotate(&ax, &ay, phi))
    }

    fn convergence(&self, x: &Tensor, y: &Tensor, _z_s: f64, packed: &Packed) -> Result<Tensor> {
        let SieValues { x0, y0, q, phi, b } = self.values(packed)?;
        let (xt, yt) = translate_rotate(x, y, x0, y0, phi);
        Ok(Zip::from(&xt)
            .and(&yt)
            .map_collect(|&x, &y| 0.5 * q.sqrt() * b / self.psi(x, y, q)))
    }

    fn potential(&self, x: &Tensor, y: &Tensor, z_s: f64, packed: &Packed) -> Result<Tensor> {
        let SieValues { x0, y0, phi, .. } = self.values(packed)?;
        let (ax, ay) = self.reduced_deflection_angle(x, y, z_s, packed)?;
        let (ax, ay) = derotate(&ax, &ay, -phi);
        let (xt, yt) = translate_rotate(x, y, x0, y0, phi);
        Ok(&xt * &ax + &yt * &ay)
    }
}
