//! # Parameter System
//!
//! Parameters are the named values physics modules are built from. Each one
//! is either *static* (holds a tensor) or *dynamic* (declares only a shape
//! and receives its value at call time).
//!
//! ## Key Features
//!
//! - **Static/dynamic binding**: a parameter is dynamic exactly when it has no value
//! - **Shape checking**: values are validated against the declared shape
//! - **Ordered namespaces**: insertion-ordered containers with a two-level
//!   module/parameter form that flattens to `"module.param"` keys
//! - **Frozen containers**: read-only wrappers for finalized collections
//!
//! ## Core Components
//!
//! - [`Parameter`]: a single value slot with shape and precision
//! - [`NamespaceDict`] and [`NestedNamespaceDict`]: ordered name-keyed containers
//! - [`Frozen`]: read-only wrapper
//!
//! ## Example Usage
//!
//! ```rust
//! use caustics_rs::parameters::{NamespaceDict, Parameter};
//!
//! let mut lens = NamespaceDict::new();
//! lens.insert("b", Parameter::scalar(1.2));
//! lens.insert("q", Parameter::dynamic(&[]));
//!
//! let mut nested = NamespaceDict::new();
//! nested.insert("lens", lens);
//!
//! let flat = nested.flatten();
//! assert!(flat.contains_key("lens.b"));
//! assert_eq!(flat.unflatten().unwrap(), nested);
//! ```

pub mod frozen;
pub mod namespace;
pub mod parameter;


// Re-export key types
pub use frozen::Frozen;
pub use namespace::{NamespaceDict, NestedNamespaceDict};
pub use parameter::{scalar_tensor, tensor_from_vec, DType, Parameter, ParameterError, Tensor};
