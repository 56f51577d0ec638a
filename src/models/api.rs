//! Building simulators from configuration documents.

use super::config::Config;
use super::registry::Registry;
use crate::error::Result;
use crate::sims::{Simulator, StateDict};
use log::info;
use std::path::Path;
use std::sync::Arc;

/// Build the configured simulator with the built-in registry
///
/// When the configuration names a snapshot under `state.load.path`, the
/// snapshot's static values are loaded into the new tree.
pub fn build_simulator(config: &Config) -> Result<Arc<dyn Simulator>> {
    build_simulator_with(config, Registry::global())
}

/// Build the configured simulator with a custom registry.
pub fn build_simulator_with(config: &Config, registry: &Registry) -> Result<Arc<dyn Simulator>> {
    let sim = registry.build_simulator(&config.simulator)?;
    if let Some(state) = &config.state {
        let path = &state.load.path;
        let snapshot = StateDict::load(path)?;
        let loaded = sim.load_state_dict(&snapshot)?;
        info!(
            "Loaded {} parameters into '{}' from {}",
            loaded,
            sim.name(),
            path.display()
        );
    }
    Ok(sim)
}

/// Read a JSON configuration file and build its simulator.
pub fn build_simulator_from_file(path: impl AsRef<Path>) -> Result<Arc<dyn Simulator>> {
    build_simulator(&Config::from_file(path)?)
}
