//! # Module Graph
//!
//! Every physics object owns a [`Module`]: a named node that holds its own
//! parameters and its child modules. Nodes form a tree. Names are unique
//! across the whole connected tree, which lets parameters be addressed by
//! `"module.param"` keys and lets packed call-time values be routed back to
//! the module that declared them.
//!
//! ## Core Components
//!
//! - [`Module`]: shared handle to a tree node
//! - [`NamingPolicy`]: collision handling when attaching subtrees
//! - [`traversal_order`]: the deterministic dependency order used by
//!   `pack`, `unpack` and snapshots
//! - [`PackArgs`], [`Packed`], [`Unpacked`]: the call-time convention
//!
//! ## Example Usage
//!
//! ```rust
//! use caustics_rs::module::{Module, PackArgs};
//!
//! let sim = Module::new("Sim", None).unwrap();
//! let lens = Module::new("Lens", Some("lens")).unwrap();
//! lens.add_param("einstein_radius", None, Some(&[])).unwrap();
//! sim.add_child(&lens).unwrap();
//!
//! let packed = sim.pack(PackArgs::from_pairs([("einstein_radius", 1.4)])).unwrap();
//! let values = lens.unpack(&packed).unwrap();
//! assert_eq!(values.scalar("einstein_radius").unwrap(), 1.4);
//! ```

pub mod naming;
pub mod packed;
pub mod traversal;

pub use naming::{unique_name, NamingPolicy};
pub use packed::{PackArgs, Packed, Unpacked};
pub use traversal::{traversal_modules, traversal_order};

use crate::error::{CausticsError, Result};
use crate::parameters::namespace::{qualified, validate_name};
use crate::parameters::{DType, NamespaceDict, NestedNamespaceDict, Parameter, Tensor};
use crate::sims::StateDict;
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique module identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    fn next() -> Self {
        ModuleId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Schema entry for a constructor argument that may become a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct MetaParam {
    /// Shape a value of this parameter has
    pub shape: Vec<usize>,
    /// Storage precision
    pub dtype: DType,
    /// Human readable description
    pub description: String,
}

impl MetaParam {
    /// Scalar `f64` entry
    pub fn scalar(description: &str) -> Self {
        Self {
            shape: Vec::new(),
            dtype: DType::F64,
            description: description.to_string(),
        }
    }
}

struct ModuleNode {
    id: ModuleId,
    name: String,
    kind: String,
    params: NamespaceDict<Parameter>,
    children: Vec<Module>,
    parent: Weak<RwLock<ModuleNode>>,
    meta_params: NamespaceDict<MetaParam>,
}

/// Shared handle to a node of a module tree
///
/// Cloning the handle does not copy the node. Locks are held only for the
/// duration of a single accessor, so a finalized tree can be read from many
/// threads at once.
#[derive(Clone)]
pub struct Module {
    node: Arc<RwLock<ModuleNode>>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.read();
        f.debug_struct("Module")
            .field("id", &node.id)
            .field("name", &node.name)
            .field("kind", &node.kind)
            .field("params", &node.params.keys().collect::<Vec<_>>())
            .field("children", &node.children.len())
            .finish()
    }
}

impl Module {
    /// Create a detached module
    ///
    /// # Arguments
    ///
    /// * `kind` - Type identifier, recorded in snapshot class maps
    /// * `name` - Module name; defaults to `kind`
    pub fn new(kind: &str, name: Option<&str>) -> Result<Self> {
        let name = name.unwrap_or(kind);
        validate_name(name)?;
        Ok(Self {
            node: Arc::new(RwLock::new(ModuleNode {
                id: ModuleId::next(),
                name: name.to_string(),
                kind: kind.to_string(),
                params: NamespaceDict::new(),
                children: Vec::new(),
                parent: Weak::new(),
                meta_params: NamespaceDict::new(),
            })),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ModuleNode> {
        self.node.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModuleNode> {
        self.node.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> ModuleId {
        self.read().id
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn kind(&self) -> String {
        self.read().kind.clone()
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Declare a constructor argument eligible to become a parameter.
    pub fn declare_meta_param(&self, name: &str, meta: MetaParam) -> Result<()> {
        validate_name(name)?;
        self.write().meta_params.insert(name, meta);
        Ok(())
    }

    pub fn meta_params(&self) -> NamespaceDict<MetaParam> {
        self.read().meta_params.clone()
    }

    /// Register a new parameter on this module
    ///
    /// With a value the parameter is static, otherwise dynamic. A dynamic
    /// parameter takes its shape from `shape`, or from the declared meta
    /// parameter of the same name.
    ///
    /// # Errors
    ///
    /// * `DuplicateName` if this module already has a parameter `name`
    /// * `MissingShape` if no shape can be determined for a dynamic parameter
    /// * `ShapeMismatch` if `value` disagrees with `shape`
    pub fn add_param(&self, name: &str, value: Option<Tensor>, shape: Option<&[usize]>) -> Result<()> {
        validate_name(name)?;
        let mut node = self.write();
        let key = qualified(&node.name, name);
        if node.params.contains_key(name) {
            return Err(CausticsError::DuplicateName(key));
        }
        let meta = node.meta_params.get(name).cloned();
        let dtype = meta.as_ref().map(|m| m.dtype).unwrap_or_default();
        let shape = match (shape, &value) {
            (Some(s), _) => Some(s.to_vec()),
            (None, Some(_)) => None,
            (None, None) => meta.map(|m| m.shape),
        };
        let param = Parameter::new(value, shape, dtype).map_err(|e| e.with_name(&key))?;
        node.params.insert(name, param);
        Ok(())
    }

    /// Copy of one of this module's own parameters.
    pub fn param(&self, name: &str) -> Option<Parameter> {
        self.read().params.get(name).cloned()
    }

    /// Give a parameter a value, making it static.
    pub fn set_param_value(&self, name: &str, value: Tensor) -> Result<()> {
        let mut node = self.write();
        let key = qualified(&node.name, name);
        let param = node
            .params
            .get_mut(name)
            .ok_or_else(|| CausticsError::UnknownParameter(key.clone()))?;
        param.set_value(value).map_err(|e| e.with_name(&key))
    }

    /// Drop a parameter's value, making it dynamic.
    pub fn clear_param(&self, name: &str) -> Result<()> {
        let mut node = self.write();
        let key = qualified(&node.name, name);
        node.params
            .get_mut(name)
            .ok_or(CausticsError::UnknownParameter(key))?
            .clear();
        Ok(())
    }

    /// This module's own parameters in declaration order.
    pub fn own_parameters(&self) -> NamespaceDict<Parameter> {
        self.read().params.clone()
    }

    /// Direct children in attachment order.
    pub fn children(&self) -> Vec<Module> {
        self.read().children.clone()
    }

    /// Direct child with the given name.
    pub fn child(&self, name: &str) -> Option<Module> {
        self.read().children.iter().find(|c| c.name() == name).cloned()
    }

    pub fn parent(&self) -> Option<Module> {
        self.read().parent.upgrade().map(|node| Module { node })
    }

    /// Topmost ancestor, or `self` when detached.
    pub fn root(&self) -> Module {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Module with the given name anywhere below (and including) `self`.
    pub fn find(&self, name: &str) -> Option<Module> {
        traversal::breadth_first(self)
            .into_iter()
            .find(|m| m.name() == name)
    }

    fn tree_names(&self) -> HashSet<String> {
        traversal::breadth_first(&self.root())
            .iter()
            .map(Module::name)
            .collect()
    }

    /// Attach `child` under this module, renaming on collision
    ///
    /// Returns the name the child ends up with.
    pub fn add_child(&self, child: &Module) -> Result<String> {
        self.add_child_with_policy(child, NamingPolicy::Rename)
    }

    /// Attach `child` under this module
    ///
    /// Every module in the incoming subtree whose name is already used in
    /// this tree is renamed (or rejected, depending on `policy`). Renaming
    /// walks the incoming subtree breadth first and picks the first name not
    /// used in either tree.
    ///
    /// # Errors
    ///
    /// * `AlreadyAttached` if `child` has a parent
    /// * `CyclicAttachment` if `child` is this module or one of its ancestors
    /// * `DuplicateName` under [`NamingPolicy::Reject`] when names collide
    pub fn add_child_with_policy(&self, child: &Module, policy: NamingPolicy) -> Result<String> {
        if child.parent().is_some() {
            return Err(CausticsError::AlreadyAttached(child.name()));
        }
        if self.root().ptr_eq(child) {
            return Err(CausticsError::CyclicAttachment(child.name()));
        }

        let existing = self.tree_names();
        let incoming = traversal::breadth_first(child);
        let mut taken = existing.clone();
        taken.extend(incoming.iter().map(Module::name));

        let mut renames = Vec::new();
        for module in &incoming {
            let name = module.name();
            if !existing.contains(&name) {
                continue;
            }
            if policy == NamingPolicy::Reject {
                return Err(CausticsError::DuplicateName(name));
            }
            let renamed = unique_name(&name, &taken);
            taken.insert(renamed.clone());
            renames.push((module.clone(), name, renamed));
        }

        for (module, old, new) in renames {
            debug!("renaming module '{}' to '{}' on attach", old, new);
            module.write().name = new;
        }

        child.write().parent = Arc::downgrade(&self.node);
        self.write().children.push(child.clone());

        let name = child.name();
        debug!("attached module '{}' under '{}'", name, self.name());
        Ok(name)
    }

    /// Detach a direct child by name, returning it as the root of its own tree.
    pub fn detach_child(&self, name: &str) -> Result<Module> {
        let child = {
            let mut node = self.write();
            let pos = node
                .children
                .iter()
                .position(|c| c.name() == name)
                .ok_or_else(|| CausticsError::ModuleNotFound(name.to_string()))?;
            node.children.remove(pos)
        };
        child.write().parent = Weak::new();
        debug!("detached module '{}' from '{}'", name, self.name());

        self.validate_names()?;
        child.validate_names()?;
        Ok(child)
    }

    /// Rename this module, keeping names unique across its tree.
    pub fn set_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.name() == name {
            return Ok(());
        }
        if self.tree_names().contains(name) {
            return Err(CausticsError::DuplicateName(name.to_string()));
        }
        self.write().name = name.to_string();
        Ok(())
    }

    /// Check that every name in this module's tree is unique.
    pub fn validate_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for module in traversal::breadth_first(&self.root()) {
            let name = module.name();
            if !seen.insert(name.clone()) {
                return Err(CausticsError::DuplicateName(name));
            }
        }
        Ok(())
    }

    /// Module names in dependency traversal order.
    pub fn traversal_order(&self) -> Vec<String> {
        traversal_order(self)
    }

    /// All parameters of the subtree, split by binding
    ///
    /// The result has the keys `"static"` and `"dynamic"`, each a nested
    /// module to parameter mapping. Modules appear in traversal order and
    /// modules with no parameters of a kind are omitted from that group.
    pub fn params(&self) -> NamespaceDict<NestedNamespaceDict<Parameter>> {
        let mut static_params = NamespaceDict::new();
        let mut dynamic_params = NamespaceDict::new();
        for module in traversal_modules(self) {
            let node = module.read();
            let mut s = NamespaceDict::new();
            let mut d = NamespaceDict::new();
            for (name, param) in node.params.iter() {
                if param.is_static() {
                    s.insert(name.clone(), param.clone());
                } else {
                    d.insert(name.clone(), param.clone());
                }
            }
            if !s.is_empty() {
                static_params.insert(node.name.clone(), s);
            }
            if !d.is_empty() {
                dynamic_params.insert(node.name.clone(), d);
            }
        }
        let mut out = NamespaceDict::new();
        out.insert("static", static_params);
        out.insert("dynamic", dynamic_params);
        out
    }

    /// Qualified names of every dynamic parameter in traversal order.
    pub fn dynamic_names(&self) -> Vec<String> {
        self.params()
            .get("dynamic")
            .map(|d| d.flatten().keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the subtree's static parameters.
    pub fn state_dict(&self) -> Result<StateDict> {
        StateDict::from_module(self)
    }

    /// Assign snapshot values to matching parameters in the subtree
    ///
    /// Returns the number of parameters assigned.
    pub fn load_state_dict(&self, state: &StateDict) -> Result<usize> {
        state.apply_to(self)
    }
}

/// Capability shared by every object that owns a module
pub trait Parametrized {
    /// The module node backing this object
    fn module(&self) -> &Module;

    fn name(&self) -> String {
        self.module().name()
    }

    fn params(&self) -> NamespaceDict<NestedNamespaceDict<Parameter>> {
        self.module().params()
    }

    fn pack(&self, args: PackArgs) -> Result<Packed> {
        self.module().pack(args)
    }

    fn unpack(&self, packed: &Packed) -> Result<Unpacked> {
        self.module().unpack(packed)
    }

    fn state_dict(&self) -> Result<StateDict> {
        self.module().state_dict()
    }

    fn load_state_dict(&self, state: &StateDict) -> Result<usize> {
        self.module().load_state_dict(state)
    }
}

impl Parametrized for Module {
    fn module(&self) -> &Module {
        self
    }
}
