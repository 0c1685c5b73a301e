//! Error types for the Gridnet schematic engine.
//!
//! This module provides a unified error type [`GridnetError`] that covers
//! all error conditions that can occur during node resolution, component
//! mutation, netlist synthesis, and loading.
//!
//! Every error is a recoverable condition to be surfaced to whatever layer
//! drives the engine. Mutations fail atomically: an `Err` return means the
//! sheet is unchanged.

use thiserror::Error;

/// Result type alias using [`GridnetError`].
pub type Result<T> = std::result::Result<T, GridnetError>;

/// Unified error type for all Gridnet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridnetError {
    // ============ Component Store Errors ============
    /// Component not found in the store
    #[error("Unknown component '{name}'")]
    UnknownComponent { name: String },

    /// Duplicate component name
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    /// Zero-length or malformed component placement
    #[error("Invalid geometry for {kind}: {message}")]
    InvalidGeometry { kind: &'static str, message: String },

    // ============ Node Registry Errors ============
    /// Node not found in the registry
    #[error("Unknown node '{name}'")]
    UnknownNode { name: String },

    /// Two different nodes claim the same explicit name
    #[error("Node name '{name}' conflicts with an existing node")]
    NodeNameConflict { name: String },

    /// A second node tried to take ground identity
    #[error("Ground is already defined by node '{existing}'")]
    GroundAlreadyDefined { existing: String },

    // ============ Synthesis Errors ============
    /// Controlled source synthesized without a controlling component
    #[error("Controlled source '{name}' has no controlling component")]
    MissingControlReference { name: String },

    // ============ Load Errors ============
    /// Element type not part of the supported enumeration
    #[error("Unknown element type '{etype}' for element '{name}'")]
    UnknownElementType { etype: String, name: String },
}

impl GridnetError {
    /// Create an unknown-component error.
    pub fn unknown_component(name: impl Into<String>) -> Self {
        Self::UnknownComponent { name: name.into() }
    }

    /// Create an unknown-node error.
    pub fn unknown_node(name: impl Into<String>) -> Self {
        Self::UnknownNode { name: name.into() }
    }

    /// Create an invalid-geometry error.
    pub fn invalid_geometry(kind: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            kind,
            message: message.into(),
        }
    }
}
