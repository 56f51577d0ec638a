//! Kind registry
//!
//! Maps the `kind` string of a [`ModelConfig`] to a factory that builds the
//! model, recursing into nested models through the same registry. There is
//! one table per model category so a lens kind can never be built where a
//! cosmology is expected.

use super::config::ModelConfig;
use crate::cosmology::{Cosmology, FlatLambdaCDM};
use crate::error::{CausticsError, Result};
use crate::lenses::{ThinLens, SIE, SIS};
use crate::light::{Sersic, Source};
use crate::sims::{ImageSettings, LensSource, Simulator};
use log::debug;
use ndarray::Array2;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub type CosmologyFactory = fn(&ModelConfig, &Registry) -> Result<Arc<dyn Cosmology>>;
pub type LensFactory = fn(&ModelConfig, &Registry) -> Result<Arc<dyn ThinLens>>;
pub type LightFactory = fn(&ModelConfig, &Registry) -> Result<Arc<dyn Source>>;
pub type SimulatorFactory = fn(&ModelConfig, &Registry) -> Result<Arc<dyn Simulator>>;

const COSMOLOGY: &str = "cosmology";
const SINGLE_LENSES: &str = "single_lenses";
const LIGHT: &str = "light";
const SIMULATORS: &str = "simulators";

/// Factories for every buildable kind, one table per category
#[derive(Clone, Default)]
pub struct Registry {
    cosmology: BTreeMap<String, CosmologyFactory>,
    single_lenses: BTreeMap<String, LensFactory>,
    light: BTreeMap<String, LightFactory>,
    simulators: BTreeMap<String, SimulatorFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("kinds", &self.kinds()).finish()
    }
}

fn register<F>(table: &mut BTreeMap<String, F>, category: &str, kind: &str, factory: F) -> Result<()> {
    if table.contains_key(kind) {
        return Err(CausticsError::DuplicateName(format!("{}.{}", category, kind)));
    }
    debug!("Registered {} kind '{}'", category, kind);
    table.insert(kind.to_string(), factory);
    Ok(())
}

fn lookup<'a, F>(table: &'a BTreeMap<String, F>, category: &str, kind: &str) -> Result<&'a F> {
    table.get(kind).ok_or_else(|| CausticsError::UnknownKind {
        category: category.to_string(),
        kind: kind.to_string(),
    })
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every kind shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .cosmology
            .insert(FlatLambdaCDM::KIND.to_string(), build_flat_lambda_cdm);
        registry.single_lenses.insert(SIE::KIND.to_string(), build_sie);
        registry.single_lenses.insert(SIS::KIND.to_string(), build_sis);
        registry.light.insert(Sersic::KIND.to_string(), build_sersic);
        registry
            .simulators
            .insert(LensSource::KIND.to_string(), build_lens_source);
        registry
    }

    /// Process-wide built-in registry, created on first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::builtin)
    }

    pub fn register_cosmology(&mut self, kind: &str, factory: CosmologyFactory) -> Result<()> {
        register(&mut self.cosmology, COSMOLOGY, kind, factory)
    }

    pub fn register_lens(&mut self, kind: &str, factory: LensFactory) -> Result<()> {
        register(&mut self.single_lenses, SINGLE_LENSES, kind, factory)
    }

    pub fn register_light(&mut self, kind: &str, factory: LightFactory) -> Result<()> {
        register(&mut self.light, LIGHT, kind, factory)
    }

    pub fn register_simulator(&mut self, kind: &str, factory: SimulatorFactory) -> Result<()> {
        register(&mut self.simulators, SIMULATORS, kind, factory)
    }

    pub fn build_cosmology(&self, config: &ModelConfig) -> Result<Arc<dyn Cosmology>> {
        lookup(&self.cosmology, COSMOLOGY, &config.kind)?(config, self)
    }

    pub fn build_lens(&self, config: &ModelConfig) -> Result<Arc<dyn ThinLens>> {
        lookup(&self.single_lenses, SINGLE_LENSES, &config.kind)?(config, self)
    }

    pub fn build_light(&self, config: &ModelConfig) -> Result<Arc<dyn Source>> {
        lookup(&self.light, LIGHT, &config.kind)?(config, self)
    }

    pub fn build_simulator(&self, config: &ModelConfig) -> Result<Arc<dyn Simulator>> {
        lookup(&self.simulators, SIMULATORS, &config.kind)?(config, self)
    }

    /// Registered kinds per category, sorted.
    pub fn kinds(&self) -> BTreeMap<&'static str, Vec<String>> {
        BTreeMap::from([
            (COSMOLOGY, self.cosmology.keys().cloned().collect()),
            (SINGLE_LENSES, self.single_lenses.keys().cloned().collect()),
            (LIGHT, self.light.keys().cloned().collect()),
            (SIMULATORS, self.simulators.keys().cloned().collect()),
        ])
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoInit {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LensInit {
    cosmology: ModelConfig,
    #[serde(default)]
    s: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SersicInit {
    #[serde(default)]
    s: f64,
    #[serde(default)]
    use_lenstronomy_k: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LensSourceInit {
    lens: ModelConfig,
    source: ModelConfig,
    #[serde(default)]
    lens_light: Option<ModelConfig>,
    #[serde(default)]
    psf: Option<Vec<Vec<f64>>>,
    pixelscale: Option<f64>,
    pixels_x: Option<usize>,
    pixels_y: Option<usize>,
    upsample_factor: Option<usize>,
}

fn build_flat_lambda_cdm(config: &ModelConfig, _: &Registry) -> Result<Arc<dyn Cosmology>> {
    config.init_as::<NoInit>()?;
    Ok(Arc::new(FlatLambdaCDM::new(config.module_name(), config.params_as()?)?))
}

fn build_sie(config: &ModelConfig, registry: &Registry) -> Result<Arc<dyn ThinLens>> {
    let init: LensInit = config.init_as()?;
    let cosmology = registry.build_cosmology(&init.cosmology)?;
    Ok(Arc::new(SIE::new(cosmology, config.params_as()?, init.s, config.module_name())?))
}

fn build_sis(config: &ModelConfig, registry: &Registry) -> Result<Arc<dyn ThinLens>> {
    let init: LensInit = config.init_as()?;
    let cosmology = registry.build_cosmology(&init.cosmology)?;
    Ok(Arc::new(SIS::new(cosmology, config.params_as()?, init.s, config.module_name())?))
}

fn build_sersic(config: &ModelConfig, _: &Registry) -> Result<Arc<dyn Source>> {
    let init: SersicInit = config.init_as()?;
    Ok(Arc::new(Sersic::new(
        config.params_as()?,
        init.s,
        init.use_lenstronomy_k,
        config.module_name(),
    )?))
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LensSourceParams {
    z_s: Option<f64>,
}

fn psf_kernel(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != cols) {
        return Err(CausticsError::InvalidConfig("psf rows differ in length".to_string()));
    }
    let n = rows.len();
    Array2::from_shape_vec((n, cols), rows.into_iter().flatten().collect())
        .map_err(|e| CausticsError::InvalidConfig(format!("psf: {}", e)))
}

fn build_lens_source(config: &ModelConfig, registry: &Registry) -> Result<Arc<dyn Simulator>> {
    let init: LensSourceInit = config.init_as()?;
    let params: LensSourceParams = config.params_as()?;
    let defaults = ImageSettings::default();
    let settings = ImageSettings {
        pixelscale: init.pixelscale.unwrap_or(defaults.pixelscale),
        pixels_x: init.pixels_x.unwrap_or(defaults.pixels_x),
        pixels_y: init.pixels_y,
        upsample_factor: init.upsample_factor.unwrap_or(defaults.upsample_factor),
    };

    let lens = registry.build_lens(&init.lens)?;
    let source = registry.build_light(&init.source)?;
    let mut sim = LensSource::new(lens, source, params.z_s, settings, config.module_name())?;
    if let Some(light) = &init.lens_light {
        sim = sim.with_lens_light(registry.build_light(light)?)?;
    }
    if let Some(psf) = init.psf {
        sim = sim.with_psf(psf_kernel(psf)?)?;
    }
    Ok(Arc::new(sim))
}
