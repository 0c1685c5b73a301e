//! Schematic sheet: node registry + component store + edit history.
//!
//! The [`Sheet`] is the single mutable aggregate of an editing session.
//! Every mutation either completes or returns an error with the sheet
//! unchanged, so a netlist can be synthesized after any successful call.

mod history;
mod nodes;
mod store;

pub use history::{EditHistory, EditOp, EditRecord};
pub use nodes::{MergeOutcome, Node, NodeId, NodeRegistry};
pub use store::ComponentStore;

use log::debug;

use crate::components::{Component, Kind};
use crate::error::{GridnetError, Result};
use crate::netlist;
use crate::STEP;

/// Label offset from the component midpoint, in grid units.
const LABEL_OFFSET: f64 = 0.75;

/// A schematic sheet.
#[derive(Debug)]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Author who produced the sheet.
    pub author: String,
    /// Grid unit length: the placement distance corresponding to netlist
    /// length scale 1.
    pub step: f64,
    pub(crate) registry: NodeRegistry,
    pub(crate) store: ComponentStore,
    history: EditHistory,
    clipped: Option<Component>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            step: STEP,
            registry: NodeRegistry::new(),
            store: ComponentStore::new(),
            history: EditHistory::new(),
            clipped: None,
        }
    }

    /// Snap a raw coordinate pair to the grid.
    pub fn snap(&self, x: f64, y: f64) -> (i64, i64) {
        let step = self.step;
        let sx = ((x + 0.5 * step) / step).floor() * step;
        let sy = ((y + 0.5 * step) / step).floor() * step;
        (sx.round() as i64, sy.round() as i64)
    }

    /// Place a two-terminal component of `kind` between two grid points,
    /// assigning the next free display name and recording the edit.
    pub fn place(&mut self, kind: Kind, p1: (f64, f64), p2: (f64, f64)) -> Result<&Component> {
        if kind == Kind::Ground {
            return Err(GridnetError::invalid_geometry(
                kind.label(),
                "ground flags are placed on a single point",
            ));
        }
        let a_pos = self.snap(p1.0, p1.1);
        let b_pos = self.snap(p2.0, p2.1);
        if a_pos == b_pos {
            return Err(GridnetError::invalid_geometry(
                kind.label(),
                format!("zero-length placement at ({}, {})", a_pos.0, a_pos.1),
            ));
        }

        let mut created = Vec::new();
        let a = self.resolve_tracking(a_pos, None, &mut created)?;
        let b = self.resolve_tracking(b_pos, None, &mut created)?;

        let name = match self.store.add_auto(kind, &[a, b]) {
            Ok(cpt) => cpt.name().to_string(),
            Err(e) => {
                for id in created {
                    self.registry.discard(id);
                }
                return Err(e);
            }
        };
        self.registry.acquire(a);
        self.registry.acquire(b);

        let record = self.snapshot(&name, EditOp::Add)?;
        self.history.record(record);
        debug!("placed {} between {:?} and {:?}", name, a_pos, b_pos);
        self.store.get(&name)
    }

    /// Place a ground flag on a grid point, marking its node as ground.
    pub fn place_ground(&mut self, p: (f64, f64)) -> Result<&Component> {
        let pos = self.snap(p.0, p.1);
        let mut created = Vec::new();
        let node = self.resolve_tracking(pos, None, &mut created)?;

        match self.registry.mark_ground(node) {
            Ok(Some(old)) => {
                self.store.rebind(old, NodeId::GROUND);
            }
            Ok(None) => {}
            Err(e) => {
                for id in created {
                    self.registry.discard(id);
                }
                return Err(e);
            }
        }

        let name = self
            .store
            .add_auto(Kind::Ground, &[NodeId::GROUND])?
            .name()
            .to_string();
        self.registry.acquire(NodeId::GROUND);

        let record = self.snapshot(&name, EditOp::Add)?;
        self.history.record(record);
        debug!("placed {} at {:?}", name, pos);
        self.store.get(&name)
    }

    /// Remove the component called `name`, releasing its nodes and
    /// recording the edit.
    pub fn remove(&mut self, name: &str) -> Result<Component> {
        let record = self.snapshot(name, EditOp::Delete)?;
        let cpt = self.store.remove(name)?;
        for &node in cpt.nodes() {
            self.registry.release(node);
        }
        self.history.record(record);
        Ok(cpt)
    }

    /// Remove the component and hold it on the clipboard for [`Sheet::paste`].
    pub fn cut(&mut self, name: &str) -> Result<()> {
        let cpt = self.remove(name)?;
        self.clipped = Some(cpt);
        Ok(())
    }

    /// Place a copy of the last cut component between two grid points
    /// under a fresh auto name. No-op when the clipboard is empty.
    pub fn paste(&mut self, p1: (f64, f64), p2: (f64, f64)) -> Result<Option<&Component>> {
        let Some(clip) = self.clipped.clone() else {
            return Ok(None);
        };
        let name = match clip.kind() {
            Kind::Ground => self.place_ground(p1)?.name().to_string(),
            kind => self.place(kind, p1, p2)?.name().to_string(),
        };
        self.store.get_mut(&name)?.copy_payload_from(&clip);
        Ok(Some(self.store.get(&name)?))
    }

    /// Union two nodes, keeping the lower ID and rewriting terminal
    /// bindings that referenced the freed one.
    pub fn merge_nodes(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let outcome = self.registry.merge(a, b)?;
        if let Some(freed) = outcome.freed {
            self.store.rebind(freed, outcome.kept);
        }
        Ok(outcome.kept)
    }

    /// Give `node` the ground identity (ID 0), rewriting bindings.
    pub fn mark_ground(&mut self, node: NodeId) -> Result<()> {
        if let Some(old) = self.registry.mark_ground(node)? {
            self.store.rebind(old, NodeId::GROUND);
        }
        Ok(())
    }

    /// Undo the most recent recorded edit. Returns the affected component
    /// name, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        let record = self.history.pop_undo()?;
        let name = record.component.name().to_string();
        let outcome = match record.op {
            EditOp::Add => self.retract(&name),
            EditOp::Delete => self.reinstate(&record),
        };
        match outcome {
            Ok(()) => {
                self.history.push_redo(record);
                Some(name)
            }
            Err(_) => {
                self.history.push_undo(record);
                None
            }
        }
    }

    /// Re-apply the most recently undone edit. Returns the affected
    /// component name, or `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        let record = self.history.pop_redo()?;
        let name = record.component.name().to_string();
        let outcome = match record.op {
            EditOp::Add => self.reinstate(&record),
            EditOp::Delete => self.retract(&name),
        };
        match outcome {
            Ok(()) => {
                self.history.push_undo(record);
                Some(name)
            }
            Err(_) => {
                self.history.push_redo(record);
                None
            }
        }
    }

    /// Synthesize the netlist for the whole sheet.
    pub fn netlist(&self) -> Result<String> {
        netlist::render(self)
    }

    /// The component nearest `(x, y)` within the pick tolerance.
    pub fn closest(&self, x: f64, y: f64) -> Option<&Component> {
        self.store.closest(x, y, &self.registry)
    }

    /// Find a component by its ordered terminal node names.
    pub fn find_by_terminals(&self, n1: &str, n2: &str) -> Result<&Component> {
        self.store.find_by_terminals(n1, n2, &self.registry)
    }

    /// Look up a component by display name.
    pub fn get(&self, name: &str) -> Result<&Component> {
        self.store.get(name)
    }

    /// The node owning the snapped position, if any.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.registry.at(self.snap(x, y))
    }

    /// The ground node, if one has been marked.
    pub fn ground_node(&self) -> Option<NodeId> {
        self.registry.ground()
    }

    /// Read-only view of the node registry, for rendering layers.
    pub fn nodes(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Read-only view of the component store, for rendering layers.
    pub fn components(&self) -> &ComponentStore {
        &self.store
    }

    /// Terminal positions of `name`, in terminal order.
    pub fn terminal_positions(&self, name: &str) -> Result<Vec<(i64, i64)>> {
        let cpt = self.store.get(name)?;
        cpt.nodes()
            .iter()
            .map(|&node| {
                self.registry
                    .node(node)
                    .map(|n| n.position)
                    .ok_or_else(|| GridnetError::unknown_node(node.to_string()))
            })
            .collect()
    }

    /// Where a rendering layer should place the component's label: the
    /// midpoint, pushed off the component axis.
    pub fn label_position(&self, name: &str) -> Result<(f64, f64)> {
        let positions = self.terminal_positions(name)?;
        let (p1, p2) = match positions.as_slice() {
            [only] => (*only, *only),
            [first, second, ..] => (*first, *second),
            [] => return Err(GridnetError::unknown_component(name)),
        };
        let mut x = (p1.0 + p2.0) as f64 / 2.0;
        let mut y = (p1.1 + p2.1) as f64 / 2.0;
        let vertical = (p2.1 - p1.1).abs() > (p2.0 - p1.0).abs();
        if vertical {
            x += LABEL_OFFSET;
        } else {
            y += LABEL_OFFSET;
        }
        Ok((x, y))
    }

    /// Set the value of the named component.
    pub fn set_value(&mut self, name: &str, value: Option<String>) -> Result<()> {
        self.store.get_mut(name)?.set_value(value);
        Ok(())
    }

    /// Set the initial condition of the named capacitor or inductor.
    pub fn set_initial_value(&mut self, name: &str, value: Option<String>) -> Result<()> {
        self.store.get_mut(name)?.set_initial_value(value);
        Ok(())
    }

    /// Set the waveform kind of the named source.
    pub fn set_source_kind(
        &mut self,
        name: &str,
        kind: Option<crate::components::SourceKind>,
    ) -> Result<()> {
        self.store.get_mut(name)?.set_source_kind(kind);
        Ok(())
    }

    /// Set the controlling component of the named dependent source.
    pub fn set_control(&mut self, name: &str, control: Option<String>) -> Result<()> {
        self.store.get_mut(name)?.set_control(control);
        Ok(())
    }

    /// Set the free-form attribute string of the named component.
    pub fn set_attrs(&mut self, name: &str, attrs: String) -> Result<()> {
        self.store.get_mut(name)?.set_attrs(attrs);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Resolve a node, remembering whether this call created it so a
    /// failed mutation can roll the creation back.
    fn resolve_tracking(
        &mut self,
        pos: (i64, i64),
        name: Option<&str>,
        created: &mut Vec<NodeId>,
    ) -> Result<NodeId> {
        let existed = self.registry.at(pos).is_some();
        let id = self.registry.resolve_or_create(pos, name)?;
        if !existed {
            created.push(id);
        }
        Ok(id)
    }

    /// Capture a history record for the named component in its current
    /// state, including terminal positions and explicit node names.
    fn snapshot(&self, name: &str, op: EditOp) -> Result<EditRecord> {
        let cpt = self.store.get(name)?;
        let mut terminals = Vec::with_capacity(cpt.nodes().len());
        for &node in cpt.nodes() {
            let entry = self
                .registry
                .node(node)
                .map(|n| (n.position, n.name.clone()))
                .ok_or_else(|| GridnetError::unknown_node(node.to_string()))?;
            terminals.push(entry);
        }
        Ok(EditRecord {
            component: cpt.clone(),
            op,
            terminals,
        })
    }

    /// Remove a component without touching the history (undo/redo path).
    fn retract(&mut self, name: &str) -> Result<()> {
        let cpt = self.store.remove(name)?;
        for &node in cpt.nodes() {
            self.registry.release(node);
        }
        Ok(())
    }

    /// Re-add a recorded component with its original name and terminals
    /// (undo/redo path; never re-run through auto-naming).
    fn reinstate(&mut self, record: &EditRecord) -> Result<()> {
        if self.store.get(record.component.name()).is_ok() {
            return Err(GridnetError::DuplicateComponent {
                name: record.component.name().to_string(),
            });
        }
        let mut created = Vec::new();
        let mut nodes = Vec::with_capacity(record.terminals.len());
        for (pos, name) in &record.terminals {
            match self.resolve_tracking(*pos, name.as_deref(), &mut created) {
                Ok(id) => nodes.push(id),
                Err(e) => {
                    for id in created {
                        self.registry.discard(id);
                    }
                    return Err(e);
                }
            }
        }

        // A ground flag's node must regain the ground identity.
        if record.component.kind() == Kind::Ground {
            let node = nodes[0];
            if !node.is_ground() {
                match self.registry.mark_ground(node) {
                    Ok(Some(old)) => {
                        self.store.rebind(old, NodeId::GROUND);
                        nodes[0] = NodeId::GROUND;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        for id in created {
                            self.registry.discard(id);
                        }
                        return Err(e);
                    }
                }
            }
        }

        let mut cpt = record.component.clone();
        for (slot, id) in cpt.nodes_mut().iter_mut().zip(nodes.iter()) {
            *slot = *id;
        }
        match self.store.add(cpt) {
            Ok(_) => {
                for &id in &nodes {
                    self.registry.acquire(id);
                }
                Ok(())
            }
            Err(e) => {
                for id in created {
                    self.registry.discard(id);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        Sheet::new("test", "nobody")
    }

    #[test]
    fn test_shared_terminal_resolves_to_same_node() {
        let mut sheet = sheet();
        let first = sheet
            .place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0))
            .unwrap()
            .nodes()
            .to_vec();
        let second = sheet
            .place(Kind::Resistor, (2.0, 0.0), (4.0, 0.0))
            .unwrap()
            .nodes()
            .to_vec();
        assert_eq!(first[1], second[0]);
        assert_eq!(sheet.nodes().len(), 3);
        assert_eq!(sheet.nodes().node(first[1]).unwrap().count, 2);
    }

    #[test]
    fn test_mark_ground_renumbers_bindings() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        let node = sheet.node_at(0.0, 0.0).unwrap();
        sheet.mark_ground(node).unwrap();

        let cpt = sheet.get("R1").unwrap();
        assert_eq!(cpt.nodes()[0], NodeId::GROUND);
        assert_eq!(sheet.ground_node(), Some(NodeId::GROUND));
    }

    #[test]
    fn test_ground_flag_placement() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place_ground((0.0, 0.0)).unwrap();

        assert_eq!(sheet.get("R1").unwrap().nodes()[0], NodeId::GROUND);
        // A second ground flag elsewhere is rejected while this one holds.
        assert!(matches!(
            sheet.place_ground((2.0, 0.0)),
            Err(GridnetError::GroundAlreadyDefined { .. })
        ));
        // The failed attempt must not leave state behind.
        assert_eq!(sheet.components().len(), 2);
    }

    #[test]
    fn test_zero_length_rejected_atomically() {
        let mut sheet = sheet();
        assert!(matches!(
            sheet.place(Kind::Capacitor, (0.0, 0.0), (0.5, 0.0)),
            Err(GridnetError::InvalidGeometry { .. })
        ));
        assert!(sheet.nodes().is_empty());
        assert!(sheet.components().is_empty());
    }

    #[test]
    fn test_undo_redo_of_delete() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.remove("R1").unwrap();
        assert!(sheet.components().is_empty());
        assert!(sheet.nodes().is_empty());

        let undone = sheet.undo().unwrap();
        assert_eq!(undone, "R1");
        let cpt = sheet.get("R1").unwrap();
        assert_eq!(cpt.name(), "R1");
        assert_eq!(sheet.nodes().len(), 2);

        let redone = sheet.redo().unwrap();
        assert_eq!(redone, "R1");
        assert!(sheet.components().is_empty());
    }

    #[test]
    fn test_undo_of_add_removes_component() {
        let mut sheet = sheet();
        sheet.place(Kind::Wire, (0.0, 0.0), (0.0, 4.0)).unwrap();
        assert_eq!(sheet.undo().unwrap(), "W1");
        assert!(sheet.components().is_empty());
        assert!(sheet.nodes().is_empty());
        // Empty-stack undo is a no-op.
        assert_eq!(sheet.undo(), None);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.undo().unwrap();
        assert!(sheet.can_redo());
        sheet.place(Kind::Inductor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        assert!(!sheet.can_redo());
    }

    #[test]
    fn test_cut_paste_preserves_payload() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.set_value("R1", Some("10k".to_string())).unwrap();
        sheet.cut("R1").unwrap();

        let pasted = sheet.paste((4.0, 0.0), (6.0, 0.0)).unwrap().unwrap();
        assert_eq!(pasted.name(), "R2");
        assert_eq!(pasted.value(), Some("10k"));
    }

    #[test]
    fn test_merge_nodes_rebinds_terminals() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place(Kind::Resistor, (4.0, 0.0), (6.0, 0.0)).unwrap();
        let b = sheet.node_at(2.0, 0.0).unwrap();
        let c = sheet.node_at(4.0, 0.0).unwrap();

        let kept = sheet.merge_nodes(c, b).unwrap();
        assert_eq!(kept, b);
        assert_eq!(sheet.get("R2").unwrap().nodes()[0], b);
        assert_eq!(sheet.nodes().node(b).unwrap().count, 2);
    }

    #[test]
    fn test_label_position_offsets_off_axis() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (4.0, 0.0)).unwrap();
        assert_eq!(sheet.label_position("R1").unwrap(), (2.0, 0.75));

        sheet.place(Kind::Wire, (0.0, 0.0), (0.0, 4.0)).unwrap();
        assert_eq!(sheet.label_position("W1").unwrap(), (0.75, 2.0));
    }
}
