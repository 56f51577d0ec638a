//! Immutable snapshots of static parameters
//!
//! A [`StateDict`] maps qualified parameter names to static parameters and
//! carries a small metadata block. It can be written to and read from the
//! safetensors container format under the `.st` extension.

use crate::error::{CausticsError, Result};
use crate::io;
use crate::module::{traversal, Module};
use crate::parameters::namespace::qualified;
use crate::parameters::{
    tensor_from_vec, DType, Frozen, NamespaceDict, NestedNamespaceDict, Parameter, Tensor,
};
use chrono::{Local, NaiveDateTime, Timelike};
use log::{info, warn};
use safetensors::tensor::{SafeTensors, TensorView};
use safetensors::Dtype;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Required extension for snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "st";

/// Metadata key holding the library version.
pub const SOFTWARE_VERSION: &str = "software_version";
/// Metadata key holding the ISO-8601 creation time.
pub const CREATED_TIME: &str = "created_time";
/// Metadata key holding the JSON-encoded [`StateMetadata`].
pub const STATE_METADATA: &str = "state_metadata";
const PARAM_ORDER: &str = "param_order";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const FILE_FORMAT: &str = "%Y%m%dT%H%M%S_caustics.st";

/// Graph-derived metadata stored alongside a module snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMetadata {
    /// Module name to parameter name to snapshot key
    pub key_maps: BTreeMap<String, BTreeMap<String, String>>,
    /// Module name to kind
    pub class_maps: BTreeMap<String, String>,
    /// Module names in dependency traversal order
    pub module_order: Vec<String>,
}

/// Parameters a [`StateDict`] can be built from
#[derive(Debug, Clone)]
pub enum ParamSource {
    /// The `{"static": ..., "dynamic": ...}` form returned by `Module::params`
    Nested(NamespaceDict<NestedNamespaceDict<Parameter>>),
    /// Flat qualified-name mapping; every entry must be static
    Flat(NamespaceDict<Parameter>),
}

impl From<NamespaceDict<NestedNamespaceDict<Parameter>>> for ParamSource {
    fn from(params: NamespaceDict<NestedNamespaceDict<Parameter>>) -> Self {
        ParamSource::Nested(params)
    }
}

impl From<NamespaceDict<Parameter>> for ParamSource {
    fn from(params: NamespaceDict<Parameter>) -> Self {
        ParamSource::Flat(params)
    }
}

/// Immutable ordered mapping from qualified name to static parameter
#[derive(Debug, Clone)]
pub struct StateDict {
    entries: Frozen<NamespaceDict<Parameter>>,
    metadata: Frozen<NamespaceDict<String>>,
    created_time: NaiveDateTime,
}

impl PartialEq for StateDict {
    /// Snapshots compare by their entries; metadata is ignored.
    fn eq(&self, other: &Self) -> bool {
        *self.entries == *other.entries
    }
}

impl StateDict {
    fn build(entries: NamespaceDict<Parameter>, state: Option<&StateMetadata>) -> Result<Self> {
        let created_time = now();
        let mut metadata = NamespaceDict::new();
        metadata.insert(SOFTWARE_VERSION, crate::VERSION.to_string());
        metadata.insert(CREATED_TIME, created_time.format(TIME_FORMAT).to_string());
        if let Some(state) = state {
            metadata.insert(STATE_METADATA, serde_json::to_string(state)?);
        }
        Ok(Self {
            entries: Frozen::new(entries),
            metadata: Frozen::new(metadata),
            created_time,
        })
    }

    /// Build a snapshot from a parameter collection
    ///
    /// The nested form contributes its flattened `"static"` group. The flat
    /// form must not contain dynamic parameters.
    pub fn from_params(params: impl Into<ParamSource>) -> Result<Self> {
        let entries = match params.into() {
            ParamSource::Nested(nested) => nested
                .get("static")
                .map(|s| s.flatten())
                .unwrap_or_default(),
            ParamSource::Flat(flat) => {
                let unresolved: Vec<String> = flat
                    .iter()
                    .filter(|(_, p)| p.is_dynamic())
                    .map(|(k, _)| k.clone())
                    .collect();
                if !unresolved.is_empty() {
                    return Err(CausticsError::UnresolvedDynamic(unresolved));
                }
                flat
            }
        };
        Self::build(entries, None)
    }

    /// Snapshot of every static parameter in `module`'s subtree
    ///
    /// Records the traversal order, each module's kind and the key each
    /// parameter was stored under.
    pub fn from_module(module: &Module) -> Result<Self> {
        let params = module.params();
        let statics = params.get("static").cloned().unwrap_or_default();

        let mut state = StateMetadata {
            module_order: module.traversal_order(),
            ..Default::default()
        };
        for m in traversal::preorder(module) {
            state.class_maps.insert(m.name(), m.kind());
        }
        for (module_name, group) in statics.iter() {
            let keys = group
                .keys()
                .map(|p| (p.clone(), qualified(module_name, p)))
                .collect();
            state.key_maps.insert(module_name.clone(), keys);
        }

        Self::build(statics.flatten(), Some(&state))
    }

    /// Wrap every stored value back into a static parameter.
    pub fn to_params(&self) -> NamespaceDict<Parameter> {
        (*self.entries).clone()
    }

    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.entries.get(key).and_then(Parameter::value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Parameter)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Always fails: snapshots cannot be modified after creation.
    pub fn insert(&mut self, key: &str, value: Parameter) -> Result<()> {
        self.entries.insert(key, value)
    }

    /// Always fails: snapshots cannot be modified after creation.
    pub fn remove(&mut self, key: &str) -> Result<Parameter> {
        self.entries.remove(key)
    }

    pub fn metadata(&self) -> &NamespaceDict<String> {
        &self.metadata
    }

    pub fn created_time(&self) -> NaiveDateTime {
        self.created_time
    }

    /// Decoded graph metadata, when the snapshot came from a module.
    pub fn state_metadata(&self) -> Result<Option<StateMetadata>> {
        self.metadata
            .get(STATE_METADATA)
            .map(|s| serde_json::from_str(s))
            .transpose()
            .map_err(Into::into)
    }

    /// Encode as safetensors bytes
    pub fn to_safetensors(&self) -> Result<Vec<u8>> {
        let mut buffers = Vec::with_capacity(self.entries.len());
        for (key, param) in self.entries.iter() {
            let value = param
                .value()
                .ok_or_else(|| CausticsError::UnresolvedDynamic(vec![key.clone()]))?;
            let (dtype, bytes) = encode(value, param.dtype());
            buffers.push((key.clone(), dtype, value.shape().to_vec(), bytes));
        }

        let views = buffers
            .iter()
            .map(|(key, dtype, shape, bytes)| {
                TensorView::new(*dtype, shape.clone(), bytes).map(|view| (key.clone(), view))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut info: HashMap<String, String> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let order: Vec<&String> = self.entries.keys().collect();
        info.insert(PARAM_ORDER.to_string(), serde_json::to_string(&order)?);

        Ok(safetensors::serialize(views, &Some(info))?)
    }

    /// Decode safetensors bytes written by [`StateDict::to_safetensors`]
    pub fn from_safetensors(bytes: &[u8]) -> Result<Self> {
        let (_, header) = SafeTensors::read_metadata(bytes)?;
        let mut info = header.metadata().clone().unwrap_or_default();
        let tensors = SafeTensors::deserialize(bytes)?;

        let mut unlisted: Vec<String> = tensors.names().into_iter().cloned().collect();
        unlisted.sort();
        let order: Vec<String> = match info.remove(PARAM_ORDER) {
            Some(order) => {
                let mut order: Vec<String> = serde_json::from_str(&order)?;
                let listed: HashSet<&String> = order.iter().collect();
                unlisted.retain(|name| !listed.contains(name));
                order.extend(unlisted);
                order
            }
            None => unlisted,
        };

        let mut entries = NamespaceDict::new();
        for key in order {
            let view = tensors.tensor(&key)?;
            let (value, dtype) = decode(&key, view.dtype(), view.shape(), view.data())?;
            let param = Parameter::new(Some(value), None, dtype).map_err(|e| e.with_name(&key))?;
            entries.insert(key, param);
        }

        let created_time = match info.get(CREATED_TIME) {
            Some(s) => NaiveDateTime::parse_from_str(s, TIME_FORMAT)
                .map_err(|e| CausticsError::Other(format!("invalid {}: {}", CREATED_TIME, e)))?,
            None => now(),
        };

        let mut metadata = NamespaceDict::new();
        for known in [SOFTWARE_VERSION, CREATED_TIME, STATE_METADATA] {
            if let Some(v) = info.remove(known) {
                metadata.insert(known, v);
            }
        }
        let mut rest: Vec<_> = info.into_iter().collect();
        rest.sort();
        for (k, v) in rest {
            metadata.insert(k, v);
        }

        Ok(Self {
            entries: Frozen::new(entries),
            metadata: Frozen::new(metadata),
            created_time,
        })
    }

    /// Default file name derived from the creation time.
    pub fn default_file_name(&self) -> String {
        self.created_time.format(FILE_FORMAT).to_string()
    }

    /// Write the snapshot to `path`, or to a timestamped file in the working
    /// directory. Returns the absolute path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(self.default_file_name()),
        };
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
            return Err(CausticsError::InvalidPath(format!(
                "{}: file must have '.{}' extension",
                path.display(),
                SNAPSHOT_EXTENSION
            )));
        }
        let written = io::to_file(&path, self.to_safetensors()?)?;
        info!("saved state dict with {} entries to {}", self.len(), written.display());
        Ok(written)
    }

    /// Read a snapshot written by [`StateDict::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = Self::from_safetensors(&io::from_file(path)?)?;
        info!("loaded state dict with {} entries from {}", state.len(), path.display());
        Ok(state)
    }

    /// Assign stored values to the matching parameters of `module`'s subtree
    ///
    /// Keys are looked up through the recorded key maps when present, and
    /// by qualified name otherwise. Entries that match nothing are skipped.
    /// Every match is shape-checked before any value is assigned, so an
    /// error leaves the tree unchanged.
    pub(crate) fn apply_to(&self, module: &Module) -> Result<usize> {
        let key_maps = self
            .state_metadata()?
            .map(|s| s.key_maps)
            .unwrap_or_default();

        let mut used = HashSet::new();
        let mut assignments = Vec::new();
        for m in traversal::traversal_modules(module) {
            let name = m.name();
            for (param, slot) in m.own_parameters() {
                let key = key_maps
                    .get(&name)
                    .and_then(|k| k.get(&param))
                    .cloned()
                    .unwrap_or_else(|| qualified(&name, &param));
                if let Some(value) = self.get(&key) {
                    slot.check_shape(value)
                        .map_err(|e| e.with_name(&qualified(&name, &param)))?;
                    assignments.push((m.clone(), param, value.clone()));
                    used.insert(key);
                }
            }
        }
        for (m, param, value) in assignments {
            m.set_param_value(&param, value)?;
        }

        for key in self.keys().filter(|k| !used.contains(*k)) {
            warn!("state dict entry '{}' matches no parameter; skipped", key);
        }
        Ok(used.len())
    }
}

/// Local time truncated to the microsecond precision kept in metadata.
fn now() -> NaiveDateTime {
    let t = Local::now().naive_local();
    t.with_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}

fn encode(value: &Tensor, dtype: DType) -> (Dtype, Vec<u8>) {
    match dtype {
        DType::F32 => (
            Dtype::F32,
            value.iter().flat_map(|&v| (v as f32).to_le_bytes()).collect(),
        ),
        DType::F64 => (
            Dtype::F64,
            value.iter().flat_map(|&v| v.to_le_bytes()).collect(),
        ),
    }
}

fn decode(key: &str, dtype: Dtype, shape: &[usize], data: &[u8]) -> Result<(Tensor, DType)> {
    let (values, dtype) = match dtype {
        Dtype::F64 => (
            data.chunks_exact(8)
                .map(|c| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(c);
                    f64::from_le_bytes(buf)
                })
                .collect::<Vec<_>>(),
            DType::F64,
        ),
        Dtype::F32 => (
            data.chunks_exact(4)
                .map(|c| {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(c);
                    f32::from_le_bytes(buf) as f64
                })
                .collect::<Vec<_>>(),
            DType::F32,
        ),
        other => {
            return Err(CausticsError::Other(format!(
                "unsupported dtype {:?} for '{}'",
                other, key
            )))
        }
    };
    Ok((tensor_from_vec(shape, values)?, dtype))
}
