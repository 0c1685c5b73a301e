//! Passive two-terminal elements: Resistor, Capacitor, Inductor.

use crate::sheet::NodeId;

/// A resistor element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resistor {
    pub name: String,
    pub nodes: [NodeId; 2],
    /// Free-form value. `None` means symbolic, defaulting to the name.
    pub value: Option<String>,
    /// Opaque styling attributes passed through to the netlist.
    pub attrs: String,
}

impl Resistor {
    /// Create a new resistor bound to two nodes.
    pub fn new(name: String, nodes: [NodeId; 2]) -> Self {
        Self {
            name,
            nodes,
            value: None,
            attrs: String::new(),
        }
    }
}

/// A capacitor element.
///
/// Carries an optional initial condition (the voltage across the capacitor
/// at t = 0) in addition to its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capacitor {
    pub name: String,
    pub nodes: [NodeId; 2],
    pub value: Option<String>,
    /// Initial voltage, free-form.
    pub initial_value: Option<String>,
    pub attrs: String,
}

impl Capacitor {
    /// Create a new capacitor bound to two nodes.
    pub fn new(name: String, nodes: [NodeId; 2]) -> Self {
        Self {
            name,
            nodes,
            value: None,
            initial_value: None,
            attrs: String::new(),
        }
    }
}

/// An inductor element.
///
/// Carries an optional initial condition (the current through the inductor
/// at t = 0) in addition to its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inductor {
    pub name: String,
    pub nodes: [NodeId; 2],
    pub value: Option<String>,
    /// Initial current, free-form.
    pub initial_value: Option<String>,
    pub attrs: String,
}

impl Inductor {
    /// Create a new inductor bound to two nodes.
    pub fn new(name: String, nodes: [NodeId; 2]) -> Self {
        Self {
            name,
            nodes,
            value: None,
            initial_value: None,
            attrs: String::new(),
        }
    }
}
