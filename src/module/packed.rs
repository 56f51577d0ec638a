//! The pack/unpack calling convention
//!
//! `pack` resolves every dynamic parameter of a tree from call-time values
//! and lays them out by module, in dependency traversal order. `unpack`
//! reads one module's values back out by identity. Packing either resolves
//! every dynamic parameter or fails without producing anything.

use super::{traversal_modules, Module, ModuleId};
use crate::error::{CausticsError, Result};
use crate::parameters::namespace::qualified;
use crate::parameters::{scalar_tensor, tensor_from_vec, DType, NamespaceDict, Tensor};
use ndarray::Array1;
use std::collections::HashMap;

/// Call-time values for a tree's dynamic parameters
#[derive(Debug, Clone, Default)]
pub enum PackArgs {
    /// No values; every parameter must be static
    #[default]
    None,
    /// One tensor per dynamic parameter, in traversal order
    Sequence(Vec<Tensor>),
    /// Every dynamic parameter flattened and concatenated in traversal order
    Flat(Array1<f64>),
    /// Values keyed by qualified (`"module.param"`) or bare parameter name
    Mapping(NamespaceDict<Tensor>),
}

impl PackArgs {
    /// Mapping of scalar values.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        PackArgs::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), scalar_tensor(v)))
                .collect(),
        )
    }
}

impl From<Vec<Tensor>> for PackArgs {
    fn from(values: Vec<Tensor>) -> Self {
        PackArgs::Sequence(values)
    }
}

impl From<Vec<f64>> for PackArgs {
    fn from(values: Vec<f64>) -> Self {
        PackArgs::Sequence(values.into_iter().map(scalar_tensor).collect())
    }
}

impl From<Array1<f64>> for PackArgs {
    fn from(values: Array1<f64>) -> Self {
        PackArgs::Flat(values)
    }
}

impl From<NamespaceDict<Tensor>> for PackArgs {
    fn from(values: NamespaceDict<Tensor>) -> Self {
        PackArgs::Mapping(values)
    }
}

impl From<HashMap<String, Tensor>> for PackArgs {
    fn from(values: HashMap<String, Tensor>) -> Self {
        let mut pairs: Vec<_> = values.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        PackArgs::Mapping(pairs.into_iter().collect())
    }
}

/// Resolved dynamic values of one tree, grouped per module
///
/// Slots follow the tree's traversal order at pack time. The container is
/// immutable and may be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Packed {
    order: Vec<String>,
    slices: Vec<NamespaceDict<Tensor>>,
    index: HashMap<ModuleId, usize>,
}

impl Packed {
    /// Module names in the order their slices were packed.
    pub fn module_order(&self) -> &[String] {
        &self.order
    }

    /// Dynamic values packed for the module with identity `id`.
    pub fn slice(&self, id: ModuleId) -> Option<&NamespaceDict<Tensor>> {
        self.index.get(&id).map(|&i| &self.slices[i])
    }

    /// Total number of packed tensors.
    pub fn len(&self) -> usize {
        self.slices.iter().map(NamespaceDict::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All packed tensors with their qualified names, in pack order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Tensor)> {
        self.order
            .iter()
            .zip(&self.slices)
            .flat_map(|(m, s)| s.iter().map(move |(p, t)| (qualified(m, p), t)))
    }
}

/// One module's resolved parameter values
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    module: String,
    values: NamespaceDict<Tensor>,
}

impl Unpacked {
    pub fn values(&self) -> &NamespaceDict<Tensor> {
        &self.values
    }

    pub fn tensor(&self, name: &str) -> Result<&Tensor> {
        self.values
            .get(name)
            .ok_or_else(|| CausticsError::UnknownParameter(qualified(&self.module, name)))
    }

    /// Value of a single-element parameter.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let tensor = self.tensor(name)?;
        match tensor.len() {
            1 => tensor
                .iter()
                .next()
                .copied()
                .ok_or_else(|| CausticsError::UnknownParameter(qualified(&self.module, name))),
            _ => Err(CausticsError::ShapeMismatch {
                name: qualified(&self.module, name),
                expected: vec![],
                got: tensor.shape().to_vec(),
            }),
        }
    }
}

struct Slot {
    module: usize,
    param: String,
    qualified: String,
    shape: Vec<usize>,
    dtype: DType,
}

impl Slot {
    fn size(&self) -> usize {
        self.shape.iter().product()
    }

    fn accept(&self, value: Tensor) -> Result<Tensor> {
        if value.shape() != self.shape.as_slice() {
            return Err(CausticsError::ShapeMismatch {
                name: self.qualified.clone(),
                expected: self.shape.clone(),
                got: value.shape().to_vec(),
            });
        }
        Ok(self.dtype.round(value))
    }
}

fn resolve_mapping(slots: &[Slot], values: NamespaceDict<Tensor>) -> Result<Vec<Option<Tensor>>> {
    let mut resolved: Vec<Option<Tensor>> = vec![None; slots.len()];
    for (key, value) in values {
        let target = match slots.iter().position(|s| s.qualified == key) {
            Some(i) => i,
            None => {
                let matches: Vec<usize> = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.param == key)
                    .map(|(i, _)| i)
                    .collect();
                match matches.as_slice() {
                    [i] => *i,
                    [] => return Err(CausticsError::UnknownParameter(key)),
                    many => {
                        return Err(CausticsError::AmbiguousParameter {
                            name: key,
                            candidates: many.iter().map(|&i| slots[i].qualified.clone()).collect(),
                        })
                    }
                }
            }
        };
        if resolved[target].is_some() {
            return Err(CausticsError::ConflictingValues(slots[target].qualified.clone()));
        }
        resolved[target] = Some(slots[target].accept(value)?);
    }
    Ok(resolved)
}

impl Module {
    /// Resolve this tree's dynamic parameters into a [`Packed`] container
    ///
    /// # Errors
    ///
    /// * `UnresolvedDynamic` for [`PackArgs::None`] while dynamic parameters exist
    /// * `MissingParameter` when a dynamic parameter receives no value
    /// * `ExcessValues` when more positional values than parameters are given
    /// * `ShapeMismatch` when a value has the wrong shape
    /// * `UnknownParameter`, `AmbiguousParameter`, `ConflictingValues` for
    ///   mapping keys that do not resolve to exactly one parameter
    pub fn pack(&self, args: impl Into<PackArgs>) -> Result<Packed> {
        let modules = traversal_modules(self);
        let order: Vec<String> = modules.iter().map(Module::name).collect();

        let mut slots = Vec::new();
        for (pos, module) in modules.iter().enumerate() {
            for (param, p) in module.own_parameters().iter() {
                if p.is_dynamic() {
                    slots.push(Slot {
                        module: pos,
                        param: param.clone(),
                        qualified: qualified(&order[pos], param),
                        shape: p.shape().to_vec(),
                        dtype: p.dtype(),
                    });
                }
            }
        }

        let resolved: Vec<Option<Tensor>> = match args.into() {
            PackArgs::None => {
                if !slots.is_empty() {
                    return Err(CausticsError::UnresolvedDynamic(
                        slots.iter().map(|s| s.qualified.clone()).collect(),
                    ));
                }
                Vec::new()
            }
            PackArgs::Sequence(values) => {
                if values.len() > slots.len() {
                    return Err(CausticsError::ExcessValues {
                        expected: slots.len(),
                        got: values.len(),
                    });
                }
                let mut values = values.into_iter();
                slots
                    .iter()
                    .map(|slot| values.next().map(|v| slot.accept(v)).transpose())
                    .collect::<Result<_>>()?
            }
            PackArgs::Flat(values) => {
                let total: usize = slots.iter().map(Slot::size).sum();
                if values.len() != total {
                    return Err(CausticsError::ShapeMismatch {
                        name: "<flat>".to_string(),
                        expected: vec![total],
                        got: vec![values.len()],
                    });
                }
                let mut offset = 0;
                slots
                    .iter()
                    .map(|slot| {
                        let chunk = values.slice(ndarray::s![offset..offset + slot.size()]).to_vec();
                        offset += slot.size();
                        tensor_from_vec(&slot.shape, chunk).and_then(|t| slot.accept(t)).map(Some)
                    })
                    .collect::<Result<_>>()?
            }
            PackArgs::Mapping(values) => resolve_mapping(&slots, values)?,
        };

        if let Some(i) = resolved.iter().position(Option::is_none) {
            return Err(CausticsError::MissingParameter(slots[i].qualified.clone()));
        }

        let mut slices: Vec<NamespaceDict<Tensor>> = vec![NamespaceDict::new(); modules.len()];
        for (slot, value) in slots.iter().zip(resolved.into_iter().flatten()) {
            slices[slot.module].insert(slot.param.clone(), value);
        }

        let index = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id(), i))
            .collect();

        Ok(Packed {
            order,
            slices,
            index,
        })
    }

    /// This module's own parameter values for one evaluation
    ///
    /// Static parameters contribute their stored value, dynamic parameters
    /// the value packed for this module.
    pub fn unpack(&self, packed: &Packed) -> Result<Unpacked> {
        let name = self.name();
        let slice = packed.slice(self.id());
        let mut values = NamespaceDict::new();
        for (param, p) in self.own_parameters() {
            let value = match p.value() {
                Some(v) => v.clone(),
                None => slice
                    .and_then(|s| s.get(&param))
                    .cloned()
                    .ok_or_else(|| CausticsError::MissingParameter(qualified(&name, &param)))?,
            };
            values.insert(param, value);
        }
        Ok(Unpacked {
            module: name,
            values,
        })
    }
}
