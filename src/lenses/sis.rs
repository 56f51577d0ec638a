//! Singular isothermal sphere.

use super::ThinLens;
use crate::cosmology::Cosmology;
use crate::error::Result;
use crate::module::{MetaParam, Module, Packed, Parametrized};
use crate::parameters::{scalar_tensor, Tensor};
use crate::utils::geometry::translate_rotate;
use ndarray::Zip;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SisParams {
    pub z_l: Option<f64>,
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    /// Einstein radius in arcsec
    pub th_ein: Option<f64>,
}

/// Singular isothermal sphere with softening `s`
#[derive(Debug)]
pub struct SIS {
    module: Module,
    cosmology: Arc<dyn Cosmology>,
    s: f64,
}

impl SIS {
    pub const KIND: &'static str = "SIS";

    pub fn new(
        cosmology: Arc<dyn Cosmology>,
        params: SisParams,
        s: f64,
        name: Option<&str>,
    ) -> Result<Self> {
        let module = Module::new(Self::KIND, name)?;
        module.declare_meta_param("z_l", MetaParam::scalar("Lens redshift"))?;
        module.declare_meta_param("x0", MetaParam::scalar("Centre x (arcsec)"))?;
        module.declare_meta_param("y0", MetaParam::scalar("Centre y (arcsec)"))?;
        module.declare_meta_param("th_ein", MetaParam::scalar("Einstein radius (arcsec)"))?;
        module.add_param("z_l", params.z_l.map(scalar_tensor), None)?;
        module.add_param("x0", params.x0.map(scalar_tensor), None)?;
        module.add_param("y0", params.y0.map(scalar_tensor), None)?;
        module.add_param("th_ein", params.th_ein.map(scalar_tensor), None)?;
        module.add_child(cosmology.module())?;
        Ok(Self {
            module,
            cosmology,
            s,
        })
    }

    /// Centred radius of every point plus the einstein radius.
    fn radii(&self, x: &Tensor, y: &Tensor, packed: &Packed) -> Result<(Tensor, Tensor, Tensor, f64)> {
        let p = self.unpack(packed)?;
        let (xt, yt) = translate_rotate(x, y, p.scalar("x0")?, p.scalar("y0")?, 0.0);
        let s = self.s;
        let r = Zip::from(&xt)
            .and(&yt)
            .map_collect(|&x, &y| (x * x + y * y).sqrt() + s);
        Ok((xt, yt, r, p.scalar("th_ein")?))
    }
}

impl Parametrized for SIS {
    fn module(&self) -> &Module {
        &self.module
    }
}

impl ThinLens for SIS {
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
        let (xt, yt, r, th_ein) = self.radii(x, y, packed)?;
        Ok((xt / &r * th_ein, yt / &r * th_ein))
    }

    fn convergence(&self, x: &Tensor, y: &Tensor, _z_s: f64, packed: &Packed) -> Result<Tensor> {
        let (_, _, r, th_ein) = self.radii(x, y, packed)?;
        Ok(r.mapv(|r| th_ein / (2.0 * r)))
    }

    fn potential(&self, x: &Tensor, y: &Tensor, _z_s: f64, packed: &Packed) -> Result<Tensor> {
        let (_, _, r, th_ein) = self.radii(x, y, packed)?;
        Ok(r * th_ein)
    }
}
