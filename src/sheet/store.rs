//! Ordered store of placed components.
//!
//! Insertion order is significant: it is the order netlist records are
//! emitted in and the order spatial queries iterate. Component counts stay
//! small (tens to low hundreds), so queries are plain O(n) scans.

use std::collections::{HashMap, HashSet};

use crate::components::{Component, Kind};
use crate::error::{GridnetError, Result};
use crate::sheet::{NodeId, NodeRegistry};

/// Owns the ordered list of placed components and their display names.
#[derive(Debug, Default)]
pub struct ComponentStore {
    components: Vec<Component>,
    /// Names ever used, per kind. Deleted names are not recycled, so a
    /// stale symbolic reference can never silently rebind to a new element.
    used_names: HashMap<Kind, HashSet<String>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component under an explicit name (load and undo paths).
    pub fn add(&mut self, component: Component) -> Result<&Component> {
        if self.index_of(component.name()).is_some() {
            return Err(GridnetError::DuplicateComponent {
                name: component.name().to_string(),
            });
        }
        self.register_name(component.kind(), component.name());
        self.components.push(component);
        let idx = self.components.len() - 1;
        Ok(&self.components[idx])
    }

    /// Construct and insert a component of `kind`, assigning the smallest
    /// free display name for that kind.
    pub fn add_auto(&mut self, kind: Kind, nodes: &[NodeId]) -> Result<&Component> {
        if nodes.len() != kind.node_count() {
            return Err(GridnetError::invalid_geometry(
                kind.label(),
                format!(
                    "expected {} terminals, got {}",
                    kind.node_count(),
                    nodes.len()
                ),
            ));
        }
        if nodes.len() == 2 && nodes[0] == nodes[1] {
            return Err(GridnetError::invalid_geometry(
                kind.label(),
                format!("zero-length element on node {}", nodes[0]),
            ));
        }

        let name = self.next_name(kind);
        self.register_name(kind, &name);
        self.components.push(Component::assemble(kind, name, nodes));
        let idx = self.components.len() - 1;
        Ok(&self.components[idx])
    }

    /// Remove and return the component called `name`.
    pub fn remove(&mut self, name: &str) -> Result<Component> {
        let idx = self.find_index(name)?;
        Ok(self.components.remove(idx))
    }

    /// Look up a component by display name.
    pub fn get(&self, name: &str) -> Result<&Component> {
        self.find_index(name).map(|idx| &self.components[idx])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Result<&mut Component> {
        let idx = self.find_index(name)?;
        Ok(&mut self.components[idx])
    }

    /// Position of `name` in insertion order.
    pub fn find_index(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| GridnetError::unknown_component(name))
    }

    /// The component whose midpoint is nearest `(x, y)` and within the
    /// relative pick tolerance of its own half-length.
    pub fn closest(&self, x: f64, y: f64, registry: &NodeRegistry) -> Option<&Component> {
        let mut best: Option<(f64, &Component)> = None;
        for cpt in &self.components {
            let nodes = cpt.nodes();
            if nodes.len() != 2 {
                continue;
            }
            let (p1, p2) = match (registry.node(nodes[0]), registry.node(nodes[1])) {
                (Some(a), Some(b)) => (a.position, b.position),
                _ => continue,
            };
            let xmid = (p1.0 + p2.0) as f64 / 2.0;
            let ymid = (p1.1 + p2.1) as f64 / 2.0;
            let rsq = (xmid - x) * (xmid - x) + (ymid - y) * (ymid - y);
            let ssq = ((p2.0 - p1.0) * (p2.0 - p1.0) + (p2.1 - p1.1) * (p2.1 - p1.1)) as f64;
            if rsq < 0.1 * ssq && best.map_or(true, |(r, _)| rsq < r) {
                best = Some((rsq, cpt));
            }
        }
        best.map(|(_, cpt)| cpt)
    }

    /// Find the component whose ordered terminals display as `(n1, n2)`.
    /// Used to resolve voltage-control references by node pair.
    pub fn find_by_terminals(
        &self,
        n1: &str,
        n2: &str,
        registry: &NodeRegistry,
    ) -> Result<&Component> {
        self.components
            .iter()
            .find(|cpt| {
                let nodes = cpt.nodes();
                nodes.len() == 2
                    && registry.name_of(nodes[0]) == n1
                    && registry.name_of(nodes[1]) == n2
            })
            .ok_or_else(|| GridnetError::unknown_component(format!("({}, {})", n1, n2)))
    }

    /// Rewrite every terminal bound to `from` so it binds `to`.
    /// Returns the number of rewritten terminals.
    pub(crate) fn rebind(&mut self, from: NodeId, to: NodeId) -> usize {
        let mut rewritten = 0;
        for cpt in &mut self.components {
            for node in cpt.nodes_mut() {
                if *node == from {
                    *node = to;
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// One diagnostic line per component: name followed by node names.
    pub fn describe(&self, registry: &NodeRegistry) -> String {
        let mut out = String::new();
        for cpt in &self.components {
            out.push_str(cpt.name());
            for &node in cpt.nodes() {
                out.push(' ');
                out.push_str(&registry.name_of(node));
            }
            out.push('\n');
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|cpt| cpt.name() == name)
    }

    /// Smallest positive integer never used for this kind.
    fn next_name(&self, kind: Kind) -> String {
        let used = self.used_names.get(&kind);
        let mut num = 1usize;
        loop {
            let name = format!("{}{}", kind.prefix(), num);
            if used.map_or(true, |set| !set.contains(&name)) {
                return name;
            }
            num += 1;
        }
    }

    fn register_name(&mut self, kind: Kind, name: &str) {
        self.used_names
            .entry(kind)
            .or_default()
            .insert(name.to_string());
    }
}
