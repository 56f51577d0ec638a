//! # Configuration Models
//!
//! Declarative construction of simulator graphs.
//!
//! ## Core Components
//!
//! - [`Config`], [`ModelConfig`]: the serde document model
//! - [`Expression`]: arithmetic strings allowed as parameter values
//! - [`Registry`]: kind name to factory tables
//! - [`build_simulator`]: configuration to ready simulator, restoring a
//!   snapshot when one is named

pub mod api;
pub mod config;
pub mod expression;
pub mod registry;

pub use api::{build_simulator, build_simulator_from_file, build_simulator_with};
pub use config::{Config, FileInput, ModelConfig, StateConfig};
pub use expression::{evaluate_str, Expression, ExpressionError};
pub use registry::Registry;
