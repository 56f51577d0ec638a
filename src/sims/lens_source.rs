//! Lens plus source image simulator.

use super::Simulator;
use crate::error::{CausticsError, Result};
use crate::lenses::ThinLens;
use crate::light::Source;
use crate::module::{MetaParam, Module, Packed, Parametrized};
use crate::parameters::scalar_tensor;
use crate::utils::convolve::{convolve2d, ConvolveMode};
use crate::utils::geometry::{avg_pool, get_meshgrid};
use log::debug;
use ndarray::{Array2, Ix2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel grid of the rendered image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSettings {
    /// Arcsec per output pixel. Default: 0.05
    pub pixelscale: f64,

    /// Output columns. Default: 100
    pub pixels_x: usize,

    /// Output rows; equal to `pixels_x` when unset
    pub pixels_y: Option<usize>,

    /// Sub-pixels per output pixel along each axis. Default: 1
    pub upsample_factor: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            pixelscale: 0.05,
            pixels_x: 100,
            pixels_y: None,
            upsample_factor: 1,
        }
    }
}

impl ImageSettings {
    /// `(rows, cols)` of the output image.
    pub fn shape(&self) -> (usize, usize) {
        (self.pixels_y.unwrap_or(self.pixels_x), self.pixels_x)
    }

    fn validate(&self) -> Result<()> {
        if self.pixelscale.is_nan() || self.pixelscale <= 0.0 {
            return Err(CausticsError::InvalidConfig(format!(
                "pixelscale must be positive, got {}",
                self.pixelscale
            )));
        }
        if self.pixels_x == 0 || self.pixels_y == Some(0) {
            return Err(CausticsError::InvalidConfig("image has no pixels".to_string()));
        }
        if self.upsample_factor == 0 {
            return Err(CausticsError::InvalidConfig(
                "upsample_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders a source seen through a single thin lens
///
/// The source redshift `z_s` is this module's own parameter; the lens,
/// source and optional lens light are child modules.
#[derive(Debug)]
pub struct LensSource {
    module: Module,
    lens: Arc<dyn ThinLens>,
    source: Arc<dyn Source>,
    lens_light: Option<Arc<dyn Source>>,
    psf: Option<Array2<f64>>,
    settings: ImageSettings,
}

impl LensSource {
    pub const KIND: &'static str = "LensSource";

    pub fn new(
        lens: Arc<dyn ThinLens>,
        source: Arc<dyn Source>,
        z_s: Option<f64>,
        settings: ImageSettings,
        name: Option<&str>,
    ) -> Result<Self> {
        settings.validate()?;
        let module = Module::new(Self::KIND, name)?;
        module.declare_meta_param("z_s", MetaParam::scalar("Source redshift"))?;
        module.add_param("z_s", z_s.map(scalar_tensor), None)?;
        module.add_child(lens.module())?;
        module.add_child(source.module())?;
        Ok(Self {
            module,
            lens,
            source,
            lens_light: None,
            psf: None,
            settings,
        })
    }

    /// Add light emitted by the lens galaxy, evaluated on the image plane.
    pub fn with_lens_light(mut self, lens_light: Arc<dyn Source>) -> Result<Self> {
        self.module.add_child(lens_light.module())?;
        self.lens_light = Some(lens_light);
        Ok(self)
    }

    /// Convolve the upsampled image with `psf` before pooling.
    pub fn with_psf(mut self, psf: Array2<f64>) -> Result<Self> {
        if psf.is_empty() {
            return Err(CausticsError::InvalidConfig("psf kernel is empty".to_string()));
        }
        self.psf = Some(psf);
        Ok(self)
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    pub fn lens(&self) -> &dyn ThinLens {
        self.lens.as_ref()
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }
}

impl Parametrized for LensSource {
    fn module(&self) -> &Module {
        &self.module
    }
}

impl Simulator for LensSource {
    fn forward(&self, packed: &Packed) -> Result<Array2<f64>> {
        let z_s = self.unpack(packed)?.scalar("z_s")?;
        let up = self.settings.upsample_factor;
        let (rows, cols) = self.settings.shape();
        let (gx, gy) = get_meshgrid(self.settings.pixelscale / up as f64, cols * up, rows * up);
        let (gx, gy) = (gx.into_dyn(), gy.into_dyn());

        let (bx, by) = self.lens.raytrace(&gx, &gy, z_s, packed)?;
        let mut mu = self.source.brightness(&bx, &by, packed)?;
        if let Some(light) = &self.lens_light {
            mu = mu + light.brightness(&gx, &gy, packed)?;
        }

        let got = mu.shape().to_vec();
        let mu = mu
            .into_dimensionality::<Ix2>()
            .map_err(|_| CausticsError::ShapeMismatch {
                name: format!("{}.image", self.module.name()),
                expected: vec![rows * up, cols * up],
                got,
            })?;
        let mu = match &self.psf {
            Some(psf) => convolve2d(&mu.view(), &psf.view(), ConvolveMode::Same),
            None => mu,
        };
        debug!("{} rendered {}x{} (upsample {})", self.module.name(), rows, cols, up);
        Ok(avg_pool(&mu, up))
    }
}
