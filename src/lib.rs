//! # Gridnet Core
//!
//! The connectivity and netlist-synthesis engine of a grid-based
//! schematic editor.
//!
//! This library provides:
//! - A node identity registry that merges nodes when terminals touch and
//!   recycles freed IDs so ground (`0`) and low numbers stay dense
//! - An ordered component store with collision-free auto-naming and the
//!   spatial queries an editor needs
//! - A netlist synthesizer mapping 2-D placements back to symbolic,
//!   orientation- and size-annotated records
//! - A single-level undo/redo history of add/delete edits
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`sheet`] - The [`Sheet`] aggregate: node registry, component store,
//!   and edit history
//! - [`components`] - The closed set of placeable element kinds
//! - [`load`] - Reconstruction of a sheet from a parsed external circuit
//! - [`error`] - Unified error type
//!
//! Everything else — canvas rendering, event routing, dialogs, export,
//! and the symbolic circuit solver — is an external collaborator. The
//! engine exposes blocking, single-writer operations and holds no timers
//! or I/O; an embedding that adds concurrency must serialize mutating
//! calls, since node merges rewrite several components' terminal
//! bindings.
//!
//! ## Usage
//!
//! ```
//! use gridnet_core::{Kind, Sheet};
//!
//! let mut sheet = Sheet::new("lowpass", "me");
//! sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0))?;
//! sheet.place(Kind::Capacitor, (2.0, 0.0), (2.0, -2.0))?;
//! sheet.place_ground((2.0, -2.0))?;
//!
//! let netlist = sheet.netlist()?;
//! assert_eq!(netlist, "R1 1 2 ; right\nC1 2 0 ; down\n");
//! # Ok::<(), gridnet_core::GridnetError>(())
//! ```

pub mod components;
pub mod error;
pub mod load;
pub mod sheet;

mod netlist;

// Re-export main types for convenience
pub use components::{Component, ControlledKind, Kind, SourceKind};
pub use error::{GridnetError, Result};
pub use load::{ElementDef, NodePlacement};
pub use sheet::{NodeId, Sheet};

/// Default grid unit length: the placement distance corresponding to one
/// unit of netlist length scale.
pub const STEP: f64 = 2.0;
