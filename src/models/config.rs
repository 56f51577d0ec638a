//! Declarative simulator configuration
//!
//! A configuration document is JSON. The root names one simulator model and
//! optionally a snapshot to restore:
//!
//! ```json
//! {
//!   "simulator": {
//!     "name": "sim",
//!     "kind": "LensSource",
//!     "params": { "z_s": 1.5 },
//!     "init_kwargs": {
//!       "lens": {
//!         "name": "lens",
//!         "kind": "SIE",
//!         "params": { "phi": "pi / 3", "b": null },
//!         "init_kwargs": { "cosmology": { "kind": "FlatLambdaCDM" } }
//!       },
//!       "source": { "name": "src", "kind": "Sersic" },
//!       "pixelscale": 0.05,
//!       "pixels_x": 64
//!     }
//!   },
//!   "state": { "load": { "path": "snapshot.st" } }
//! }
//! ```
//!
//! `params` values are numbers, `null` (dynamic) or expression strings;
//! a parameter left out takes the model's default.

use super::expression::evaluate_str;
use crate::error::{CausticsError, Result};
use crate::io;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};

/// Root of a configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub simulator: ModelConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub load: FileInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileInput {
    pub path: PathBuf,
}

/// One model of the graph: its kind, parameter values and constructor arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Module name; the kind name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Registered kind, e.g. `"SIE"`
    pub kind: String,

    /// Meta-parameter values
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,

    /// Non-parameter constructor arguments, including nested models
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub init_kwargs: Map<String, Value>,
}

impl ModelConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            name: None,
            kind: kind.into(),
            params: Map::new(),
            init_kwargs: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_init(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.init_kwargs.insert(key.into(), value.into());
        self
    }

    /// Nest another model as a constructor argument.
    pub fn with_model(self, key: impl Into<String>, model: &ModelConfig) -> Result<Self> {
        let value = serde_json::to_value(model)?;
        Ok(self.with_init(key, value))
    }

    /// Parameter values with every expression string evaluated
    ///
    /// # Errors
    ///
    /// `Expression` when a string fails to parse or names anything but `pi`,
    /// `InvalidConfig` for values that are not numbers, strings or null.
    pub fn resolved_params(&self) -> Result<Map<String, Value>> {
        self.params
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_value(key, value)?)))
            .collect()
    }

    fn resolve_value(&self, key: &str, value: &Value) -> Result<Value> {
        match value {
            Value::Null | Value::Number(_) => Ok(value.clone()),
            Value::String(expr) => {
                let v = evaluate_str(expr)?;
                Number::from_f64(v).map(Value::Number).ok_or_else(|| {
                    CausticsError::InvalidConfig(format!(
                        "{}: '{}' evaluates to the non-finite value {}",
                        self.describe(key),
                        expr,
                        v
                    ))
                })
            }
            other => Err(CausticsError::InvalidConfig(format!(
                "{}: expected a number, null or expression, got {}",
                self.describe(key),
                other
            ))),
        }
    }

    /// Deserialize the resolved parameters into a `…Params` struct.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.resolved_params()?))
            .map_err(|e| CausticsError::InvalidConfig(format!("{} params: {}", self.label(), e)))
    }

    /// Deserialize `init_kwargs` into a constructor argument struct.
    pub fn init_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.init_kwargs.clone()))
            .map_err(|e| CausticsError::InvalidConfig(format!("{} init_kwargs: {}", self.label(), e)))
    }

    /// The configured name, or `None` to let the module default to its kind
    pub fn module_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} '{}'", self.kind, name),
            None => self.kind.clone(),
        }
    }

    fn describe(&self, key: &str) -> String {
        format!("{} param '{}'", self.label(), key)
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = io::from_file(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
