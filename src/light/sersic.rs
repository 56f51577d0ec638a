//! Elliptical Sersic profile.

use super::Source;
use crate::error::Result;
use crate::module::{MetaParam, Module, Packed, Parametrized};
use crate::parameters::{scalar_tensor, Tensor};
use crate::utils::geometry::{to_elliptical, translate_rotate};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Parameter values for [`Sersic`]; `None` makes a parameter dynamic
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SersicParams {
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub q: Option<f64>,
    pub phi: Option<f64>,
    /// Sersic index
    pub n: Option<f64>,
    /// Effective (half-light) radius in arcsec
    #[serde(rename = "Re")]
    pub re: Option<f64>,
    /// Brightness at the effective radius
    #[serde(rename = "Ie")]
    pub ie: Option<f64>,
}

/// `I(R) = Ie exp(-k ((R / Re)^(1/n) - 1))` on elliptical radius `R`
#[derive(Debug)]
pub struct Sersic {
    module: Module,
    s: f64,
    use_lenstronomy_k: bool,
}

impl Sersic {
    pub const KIND: &'static str = "Sersic";

    pub fn new(
        params: SersicParams,
        s: f64,
        use_lenstronomy_k: bool,
        name: Option<&str>,
    ) -> Result<Self> {
        let module = Module::new(Self::KIND, name)?;
        for (param, desc) in [
            ("x0", "Centre x (arcsec)"),
            ("y0", "Centre y (arcsec)"),
            ("q", "Axis ratio"),
            ("phi", "Position angle (radians)"),
            ("n", "Sersic index"),
            ("Re", "Effective radius (arcsec)"),
            ("Ie", "Brightness at the effective radius"),
        ] {
            module.declare_meta_param(param, MetaParam::scalar(desc))?;
        }
        let values = [
            ("x0", params.x0),
            ("y0", params.y0),
            ("q", params.q),
            ("phi", params.phi),
            ("n", params.n),
            ("Re", params.re),
            ("Ie", params.ie),
        ];
        for (param, value) in values {
            module.add_param(param, value.map(scalar_tensor), None)?;
        }
        Ok(Self {
            module,
            s,
            use_lenstronomy_k,
        })
    }

    /// Ciotti and Bertin expansion of `k(n)`, or the linear fit used by lenstronomy.
    pub fn k(&self, n: f64) -> f64 {
        if self.use_lenstronomy_k {
            1.9992 * n - 0.3271
        } else {
            2.0 * n - 1.0 / 3.0 + 4.0 / (405.0 * n) + 46.0 / (25515.0 * n * n)
        }
    }
}

impl Parametrized for Sersic {
    fn module(&self) -> &Module {
        &self.module
    }
}

impl Source for Sersic {
    fn brightness(&self, x: &Tensor, y: &Tensor, packed: &Packed) -> Result<Tensor> {
        let p = self.unpack(packed)?;
        let (x0, y0, q, phi) = (p.scalar("x0")?, p.scalar("y0")?, p.scalar("q")?, p.scalar("phi")?);
        let (n, re, ie) = (p.scalar("n")?, p.scalar("Re")?, p.scalar("Ie")?);

        let (xt, yt) = translate_rotate(x, y, x0, y0, phi);
        let (ex, ey) = to_elliptical(&xt, &yt, q);
        let k = self.k(n);
        let s = self.s;
        Ok(Zip::from(&ex).and(&ey).map_collect(|&ex, &ey| {
            let r = (ex * ex + ey * ey).sqrt() + s;
            ie * (-k * ((r / re).powf(1.0 / n) - 1.0)).exp()
        }))
    }
}
