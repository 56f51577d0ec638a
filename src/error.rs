use thiserror::Error;

/// Error types for the caustics-rs library.
#[derive(Error, Debug)]
pub enum CausticsError {
    /// A module or parameter name is already taken and could not be renamed.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// A dynamic parameter needed for evaluation has no supplied value.
    #[error("Missing value for dynamic parameter '{0}'")]
    MissingParameter(String),

    /// A supplied or assigned value disagrees with the declared shape.
    #[error("Shape mismatch for '{name}': expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Attempted mutation of a finalized state dictionary.
    #[error("'StateDict' cannot be modified after creation.")]
    ImmutableState,

    /// Dynamic parameters remain where only static values are allowed.
    #[error("Unresolved dynamic parameters: {}", .0.join(", "))]
    UnresolvedDynamic(Vec<String>),

    /// A kind name has no registered factory.
    #[error("Unknown kind '{kind}' in {category}")]
    UnknownKind { category: String, kind: String },

    /// A supplied key does not name any dynamic parameter.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A bare parameter name matches more than one module.
    #[error("Ambiguous parameter '{name}': matches {}", .candidates.join(", "))]
    AmbiguousParameter {
        name: String,
        candidates: Vec<String>,
    },

    /// More positional values were supplied than there are dynamic parameters.
    #[error("Too many values: expected {expected}, got {got}")]
    ExcessValues { expected: usize, got: usize },

    /// The same dynamic parameter was supplied more than once.
    #[error("Conflicting values supplied for '{0}'")]
    ConflictingValues(String),

    /// A dynamic parameter was declared without any shape.
    #[error("No shape declared for dynamic parameter '{0}'")]
    MissingShape(String),

    /// Names must be non-empty and may not contain the '.' separator.
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// The module already has a parent.
    #[error("Module '{0}' is already attached to a parent")]
    AlreadyAttached(String),

    /// Attaching the module would create a cycle.
    #[error("Attaching '{0}' would create a cycle")]
    CyclicAttachment(String),

    /// A named module could not be found.
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// A snapshot path with the wrong suffix or shape.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A configuration document could not be turned into a model graph.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration expression failure.
    #[error("Expression error: {0}")]
    Expression(#[from] crate::models::expression::ExpressionError),

    /// Snapshot encoding or decoding failure.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] safetensors::SafeTensorError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for caustics-rs operations.
pub type Result<T> = std::result::Result<T, CausticsError>;

impl From<String> for CausticsError {
    fn from(s: String) -> Self {
        CausticsError::Other(s)
    }
}

impl From<&str> for CausticsError {
    fn from(s: &str) -> Self {
        CausticsError::Other(s.to_string())
    }
}
