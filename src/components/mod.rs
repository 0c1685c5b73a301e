//! Component models for the schematic engine.
//!
//! This module provides the closed set of placeable elements:
//! - Passive: Resistor, Capacitor, Inductor
//! - Sources: VoltageSource, CurrentSource
//! - Dependent: VCVS, CCCS, VCCS, CCVS
//! - Connectivity: Wire, Port, Ground
//!
//! Each kind carries only the fields it needs; kind-specific behavior is
//! dispatched through the [`Component`] enum rather than attribute checks.

mod controlled;
mod passive;
mod sources;
mod wiring;

pub use controlled::{ControlledKind, ControlledSource};
pub use passive::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, SourceKind, VoltageSource};
pub use wiring::{Ground, Port, Wire};

use crate::sheet::NodeId;

/// The fixed enumeration of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Vcvs,
    Cccs,
    Vccs,
    Ccvs,
    Wire,
    Port,
    Ground,
}

impl Kind {
    /// Display-name prefix used for auto-generated names.
    pub fn prefix(&self) -> &'static str {
        match self {
            Kind::Resistor => "R",
            Kind::Capacitor => "C",
            Kind::Inductor => "L",
            Kind::VoltageSource => "V",
            Kind::CurrentSource => "I",
            Kind::Vcvs => "E",
            Kind::Cccs => "F",
            Kind::Vccs => "G",
            Kind::Ccvs => "H",
            Kind::Wire => "W",
            Kind::Port => "P",
            Kind::Ground => "GND",
        }
    }

    /// Human-readable kind name.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Resistor => "Resistor",
            Kind::Capacitor => "Capacitor",
            Kind::Inductor => "Inductor",
            Kind::VoltageSource => "Voltage source",
            Kind::CurrentSource => "Current source",
            Kind::Vcvs => "VCVS",
            Kind::Cccs => "CCCS",
            Kind::Vccs => "VCCS",
            Kind::Ccvs => "CCVS",
            Kind::Wire => "Wire",
            Kind::Port => "Port",
            Kind::Ground => "Ground",
        }
    }

    /// Parse a netlist element type into a kind.
    ///
    /// Ground flags have no netlist element type and are never produced.
    pub fn from_type(etype: &str) -> Option<Self> {
        let mut chars = etype.chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match letter.to_ascii_uppercase() {
            'R' => Some(Kind::Resistor),
            'C' => Some(Kind::Capacitor),
            'L' => Some(Kind::Inductor),
            'V' => Some(Kind::VoltageSource),
            'I' => Some(Kind::CurrentSource),
            'E' => Some(Kind::Vcvs),
            'F' => Some(Kind::Cccs),
            'G' => Some(Kind::Vccs),
            'H' => Some(Kind::Ccvs),
            'W' => Some(Kind::Wire),
            'P' => Some(Kind::Port),
            _ => None,
        }
    }

    /// Number of terminals a component of this kind binds.
    pub fn node_count(&self) -> usize {
        match self {
            Kind::Ground => 1,
            _ => 2,
        }
    }

    /// Whether records of this kind carry a value token.
    pub fn carries_value(&self) -> bool {
        !matches!(self, Kind::Wire | Kind::Port | Kind::Ground)
    }

    /// The dependent-source kind, for the four controlled variants.
    pub fn controlled(&self) -> Option<ControlledKind> {
        match self {
            Kind::Vcvs => Some(ControlledKind::Vcvs),
            Kind::Cccs => Some(ControlledKind::Cccs),
            Kind::Vccs => Some(ControlledKind::Vccs),
            Kind::Ccvs => Some(ControlledKind::Ccvs),
            _ => None,
        }
    }
}

/// A placed circuit element.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    Controlled(ControlledSource),
    Wire(Wire),
    Port(Port),
    Ground(Ground),
}

impl Component {
    /// Build a component of `kind` over already-validated terminals.
    ///
    /// `nodes` must hold exactly `kind.node_count()` entries; the store
    /// checks this before calling.
    pub(crate) fn assemble(kind: Kind, name: String, nodes: &[NodeId]) -> Self {
        match kind {
            Kind::Resistor => Component::Resistor(Resistor::new(name, [nodes[0], nodes[1]])),
            Kind::Capacitor => Component::Capacitor(Capacitor::new(name, [nodes[0], nodes[1]])),
            Kind::Inductor => Component::Inductor(Inductor::new(name, [nodes[0], nodes[1]])),
            Kind::VoltageSource => {
                Component::VoltageSource(VoltageSource::new(name, [nodes[0], nodes[1]]))
            }
            Kind::CurrentSource => {
                Component::CurrentSource(CurrentSource::new(name, [nodes[0], nodes[1]]))
            }
            Kind::Vcvs => {
                Component::Controlled(ControlledSource::new(name, [nodes[0], nodes[1]], ControlledKind::Vcvs))
            }
            Kind::Cccs => {
                Component::Controlled(ControlledSource::new(name, [nodes[0], nodes[1]], ControlledKind::Cccs))
            }
            Kind::Vccs => {
                Component::Controlled(ControlledSource::new(name, [nodes[0], nodes[1]], ControlledKind::Vccs))
            }
            Kind::Ccvs => {
                Component::Controlled(ControlledSource::new(name, [nodes[0], nodes[1]], ControlledKind::Ccvs))
            }
            Kind::Wire => Component::Wire(Wire::new(name, [nodes[0], nodes[1]])),
            Kind::Port => Component::Port(Port::new(name, [nodes[0], nodes[1]])),
            Kind::Ground => Component::Ground(Ground::new(name, nodes[0])),
        }
    }

    /// Get the component kind.
    pub fn kind(&self) -> Kind {
        match self {
            Component::Resistor(_) => Kind::Resistor,
            Component::Capacitor(_) => Kind::Capacitor,
            Component::Inductor(_) => Kind::Inductor,
            Component::VoltageSource(_) => Kind::VoltageSource,
            Component::CurrentSource(_) => Kind::CurrentSource,
            Component::Controlled(c) => match c.kind {
                ControlledKind::Vcvs => Kind::Vcvs,
                ControlledKind::Cccs => Kind::Cccs,
                ControlledKind::Vccs => Kind::Vccs,
                ControlledKind::Ccvs => Kind::Ccvs,
            },
            Component::Wire(_) => Kind::Wire,
            Component::Port(_) => Kind::Port,
            Component::Ground(_) => Kind::Ground,
        }
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        match self {
            Component::Resistor(r) => &r.name,
            Component::Capacitor(c) => &c.name,
            Component::Inductor(l) => &l.name,
            Component::VoltageSource(v) => &v.name,
            Component::CurrentSource(i) => &i.name,
            Component::Controlled(c) => &c.name,
            Component::Wire(w) => &w.name,
            Component::Port(p) => &p.name,
            Component::Ground(g) => &g.name,
        }
    }

    /// Get the bound terminal nodes.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Component::Resistor(r) => &r.nodes,
            Component::Capacitor(c) => &c.nodes,
            Component::Inductor(l) => &l.nodes,
            Component::VoltageSource(v) => &v.nodes,
            Component::CurrentSource(i) => &i.nodes,
            Component::Controlled(c) => &c.nodes,
            Component::Wire(w) => &w.nodes,
            Component::Port(p) => &p.nodes,
            Component::Ground(g) => &g.nodes,
        }
    }

    /// Mutable access to the terminal bindings, for merge rewrites.
    pub(crate) fn nodes_mut(&mut self) -> &mut [NodeId] {
        match self {
            Component::Resistor(r) => &mut r.nodes,
            Component::Capacitor(c) => &mut c.nodes,
            Component::Inductor(l) => &mut l.nodes,
            Component::VoltageSource(v) => &mut v.nodes,
            Component::CurrentSource(i) => &mut i.nodes,
            Component::Controlled(c) => &mut c.nodes,
            Component::Wire(w) => &mut w.nodes,
            Component::Port(p) => &mut p.nodes,
            Component::Ground(g) => &mut g.nodes,
        }
    }

    /// Get the value, if one is set.
    pub fn value(&self) -> Option<&str> {
        match self {
            Component::Resistor(r) => r.value.as_deref(),
            Component::Capacitor(c) => c.value.as_deref(),
            Component::Inductor(l) => l.value.as_deref(),
            Component::VoltageSource(v) => v.value.as_deref(),
            Component::CurrentSource(i) => i.value.as_deref(),
            Component::Controlled(c) => c.value.as_deref(),
            Component::Wire(_) | Component::Port(_) | Component::Ground(_) => None,
        }
    }

    /// Set the value. Ignored for kinds that never carry one.
    pub fn set_value(&mut self, value: Option<String>) {
        match self {
            Component::Resistor(r) => r.value = value,
            Component::Capacitor(c) => c.value = value,
            Component::Inductor(l) => l.value = value,
            Component::VoltageSource(v) => v.value = value,
            Component::CurrentSource(i) => i.value = value,
            Component::Controlled(c) => c.value = value,
            Component::Wire(_) | Component::Port(_) | Component::Ground(_) => {}
        }
    }

    /// Get the initial condition (capacitors and inductors only).
    pub fn initial_value(&self) -> Option<&str> {
        match self {
            Component::Capacitor(c) => c.initial_value.as_deref(),
            Component::Inductor(l) => l.initial_value.as_deref(),
            _ => None,
        }
    }

    /// Set the initial condition. Ignored for kinds without one.
    pub fn set_initial_value(&mut self, value: Option<String>) {
        match self {
            Component::Capacitor(c) => c.initial_value = value,
            Component::Inductor(l) => l.initial_value = value,
            _ => {}
        }
    }

    /// Set the source waveform kind. Ignored for non-source kinds.
    pub fn set_source_kind(&mut self, kind: Option<SourceKind>) {
        match self {
            Component::VoltageSource(v) => v.kind = kind,
            Component::CurrentSource(i) => i.kind = kind,
            _ => {}
        }
    }

    /// Set the controlling component reference. Ignored for kinds that
    /// are not dependent sources.
    pub fn set_control(&mut self, control: Option<String>) {
        if let Component::Controlled(c) = self {
            c.control = control;
        }
    }

    /// Copy value, attributes, and kind-specific payload from a same-kind
    /// component. Terminal bindings and the name are left untouched.
    pub(crate) fn copy_payload_from(&mut self, src: &Component) {
        self.set_value(src.value().map(String::from));
        self.set_attrs(src.attrs().to_string());
        match (&mut *self, src) {
            (Component::Capacitor(d), Component::Capacitor(s)) => {
                d.initial_value = s.initial_value.clone();
            }
            (Component::Inductor(d), Component::Inductor(s)) => {
                d.initial_value = s.initial_value.clone();
            }
            (Component::VoltageSource(d), Component::VoltageSource(s)) => d.kind = s.kind,
            (Component::CurrentSource(d), Component::CurrentSource(s)) => d.kind = s.kind,
            (Component::Controlled(d), Component::Controlled(s)) => {
                d.control = s.control.clone();
            }
            _ => {}
        }
    }

    /// Get the source waveform kind (independent sources only).
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            Component::VoltageSource(v) => v.kind,
            Component::CurrentSource(i) => i.kind,
            _ => None,
        }
    }

    /// Get the dependent-source payload, if this is a controlled source.
    pub fn controlled_source(&self) -> Option<&ControlledSource> {
        match self {
            Component::Controlled(c) => Some(c),
            _ => None,
        }
    }

    /// Get the free-form attribute string.
    pub fn attrs(&self) -> &str {
        match self {
            Component::Resistor(r) => &r.attrs,
            Component::Capacitor(c) => &c.attrs,
            Component::Inductor(l) => &l.attrs,
            Component::VoltageSource(v) => &v.attrs,
            Component::CurrentSource(i) => &i.attrs,
            Component::Controlled(c) => &c.attrs,
            Component::Wire(w) => &w.attrs,
            Component::Port(p) => &p.attrs,
            Component::Ground(g) => &g.attrs,
        }
    }

    /// Set the free-form attribute string.
    pub fn set_attrs(&mut self, attrs: String) {
        match self {
            Component::Resistor(r) => r.attrs = attrs,
            Component::Capacitor(c) => c.attrs = attrs,
            Component::Inductor(l) => l.attrs = attrs,
            Component::VoltageSource(v) => v.attrs = attrs,
            Component::CurrentSource(i) => i.attrs = attrs,
            Component::Controlled(c) => c.attrs = attrs,
            Component::Wire(w) => w.attrs = attrs,
            Component::Port(p) => p.attrs = attrs,
            Component::Ground(g) => g.attrs = attrs,
        }
    }
}
