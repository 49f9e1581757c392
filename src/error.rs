//! Error types for the scene graph
//!
//! All fallible operations in the crate return [`Result`], which carries an
//! [`SgError`]. Errors raised at the UI boundary (scheduled node operations,
//! color map loading from the editor) are logged instead of propagated.

use thiserror::Error;

use crate::sg::node::NodeType;
use crate::sg::value::ValueKind;

/// Errors produced by scene graph operations
#[derive(Debug, Error)]
pub enum SgError {
    #[error("node '{node}' has no child named '{child}'")]
    ChildNotFound { node: String, child: String },

    #[error("no node factory registered for subtype '{0}'")]
    UnknownSubtype(String),

    #[error("node '{node}': got a {actual} value, expected {expected}")]
    TypeMismatch {
        node: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("node '{node}' is a {actual} node, expected {expected}")]
    WrongNodeType {
        node: String,
        expected: NodeType,
        actual: NodeType,
    },

    #[error("node '{child}' is already attached to '{parent}'")]
    AlreadyParented { child: String, parent: String },

    #[error("adding '{child}' under '{parent}' would create a cycle")]
    Cycle { child: String, parent: String },

    #[error("render device: {0}")]
    Device(String),

    #[error("transfer function: {0}")]
    TransferFunction(String),

    #[error("job was dropped before producing a result")]
    JobCancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SgError>;
