//! Node identity registry.
//!
//! Maps grid positions to canonical nodes and keeps node IDs dense and low,
//! so generated netlists stay stable and human-readable (nodes `0, 1, 2, …`
//! rather than sparse). ID 0 is reserved for ground and is only assigned
//! when a node is explicitly marked as ground.
//!
//! Components hold [`NodeId`] indices into this registry; merging rewrites
//! which ID a position resolves to instead of aliasing shared node objects.

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};

use crate::error::{GridnetError, Result};

/// A unique identifier for a node.
/// Node 0 is always ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The ground node (always index 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A canonical electrical node: a set of terminals at one grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Explicit name. Unnamed nodes display their decimal ID.
    pub name: Option<String>,
    /// Grid-snapped position.
    pub position: (i64, i64),
    /// Number of component terminals currently bound to this node.
    pub count: usize,
}

impl Node {
    fn new(position: (i64, i64), name: Option<String>) -> Self {
        Self {
            name,
            position,
            count: 0,
        }
    }
}

/// Result of a [`NodeRegistry::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The surviving canonical node (the lower ID).
    pub kept: NodeId,
    /// The ID returned to the free pool, if the merge was not a no-op.
    /// Callers must rewrite terminal bindings from this ID to `kept`.
    pub freed: Option<NodeId>,
}

/// Owns node identity: position → node resolution, merging, ground
/// marking, and ID recycling.
#[derive(Debug)]
pub struct NodeRegistry {
    /// Slot vector indexed by node ID. Slot 0 is ground and stays empty
    /// until a node is marked as ground.
    slots: Vec<Option<Node>>,
    /// Position index. Every live position maps to exactly one node; a
    /// node may own several positions after a merge.
    by_position: HashMap<(i64, i64), usize>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            slots: vec![None],
            by_position: HashMap::new(),
        }
    }

    /// Return the node at `position`, creating one with the smallest free
    /// ID (never 0) if the position is vacant.
    ///
    /// Fails with `NodeNameConflict` if `requested_name` is already the
    /// display name of a different node, or the position's owner already
    /// has a different explicit name.
    pub fn resolve_or_create(
        &mut self,
        position: (i64, i64),
        requested_name: Option<&str>,
    ) -> Result<NodeId> {
        if let Some(&id) = self.by_position.get(&position) {
            if let Some(name) = requested_name {
                let current = self.slots[id].as_ref().and_then(|n| n.name.as_deref());
                match current {
                    Some(existing) if existing != name => {
                        return Err(GridnetError::NodeNameConflict {
                            name: name.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        if self.name_taken_by_other(name, id) {
                            return Err(GridnetError::NodeNameConflict {
                                name: name.to_string(),
                            });
                        }
                        if let Some(node) = self.slots[id].as_mut() {
                            node.name = Some(name.to_string());
                        }
                    }
                }
            }
            return Ok(NodeId(id));
        }

        if let Some(name) = requested_name {
            if self.name_taken_by_other(name, usize::MAX) {
                return Err(GridnetError::NodeNameConflict {
                    name: name.to_string(),
                });
            }
        }

        let id = self.alloc();
        self.slots[id] = Some(Node::new(position, requested_name.map(String::from)));
        self.by_position.insert(position, id);
        trace!("node {} created at {:?}", id, position);
        Ok(NodeId(id))
    }

    /// Bind one more terminal to `id`.
    pub fn acquire(&mut self, id: NodeId) {
        if let Some(node) = self.slots.get_mut(id.0).and_then(|s| s.as_mut()) {
            node.count += 1;
        }
    }

    /// Unbind one terminal from `id`. A node whose last terminal is
    /// released is removed and its ID returned to the free pool.
    /// Returns `true` if the node was removed.
    pub fn release(&mut self, id: NodeId) -> bool {
        let emptied = match self.slots.get_mut(id.0).and_then(|s| s.as_mut()) {
            Some(node) => {
                node.count = node.count.saturating_sub(1);
                node.count == 0
            }
            None => false,
        };
        if emptied {
            self.evict(id.0);
            debug!("node {} released and freed", id);
        }
        emptied
    }

    /// Union two nodes. The lower ID survives; the higher is freed and its
    /// bindings must be rewritten by the caller (see [`MergeOutcome`]).
    /// Idempotent when `a == b`.
    pub fn merge(&mut self, a: NodeId, b: NodeId) -> Result<MergeOutcome> {
        if self.node(a).is_none() {
            return Err(GridnetError::unknown_node(a.to_string()));
        }
        if self.node(b).is_none() {
            return Err(GridnetError::unknown_node(b.to_string()));
        }
        if a == b {
            return Ok(MergeOutcome {
                kept: a,
                freed: None,
            });
        }

        let (kept, freed) = if a < b { (a, b) } else { (b, a) };
        let freed_node = match self.slots[freed.0].take() {
            Some(node) => node,
            None => return Err(GridnetError::unknown_node(freed.to_string())),
        };

        // Positions owned by the freed node now resolve to the kept one.
        for id in self.by_position.values_mut() {
            if *id == freed.0 {
                *id = kept.0;
            }
        }
        self.trim_tail();

        if let Some(node) = self.slots[kept.0].as_mut() {
            node.count += freed_node.count;
            if node.name.is_none() {
                node.name = freed_node.name;
            }
        }

        debug!("node {} merged into {}", freed, kept);
        Ok(MergeOutcome {
            kept,
            freed: Some(freed),
        })
    }

    /// Move `id` to the ground slot (ID 0), freeing its old ID.
    ///
    /// Returns the freed ID so the caller can rewrite terminal bindings,
    /// or `None` when the node already is ground. Fails with
    /// `GroundAlreadyDefined` while a different node holds ID 0.
    pub fn mark_ground(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        if self.node(id).is_none() {
            return Err(GridnetError::unknown_node(id.to_string()));
        }
        if id.is_ground() {
            return Ok(None);
        }
        if self.slots[0].is_some() {
            return Err(GridnetError::GroundAlreadyDefined {
                existing: self.name_of(NodeId::GROUND),
            });
        }

        let node = self.slots[id.0].take();
        self.slots[0] = node;
        for slot in self.by_position.values_mut() {
            if *slot == id.0 {
                *slot = 0;
            }
        }
        self.trim_tail();
        debug!("node {} marked as ground", id);
        Ok(Some(id))
    }

    /// Drop a node outright, regardless of its reference count.
    /// Rollback helper for failed multi-step mutations.
    pub(crate) fn discard(&mut self, id: NodeId) {
        if self.slots.get(id.0).map_or(false, |s| s.is_some()) {
            self.evict(id.0);
        }
    }

    /// Get the node for `id`, if assigned.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    /// Display name for `id`: the explicit name, else the decimal ID.
    pub fn name_of(&self, id: NodeId) -> String {
        match self.node(id).and_then(|n| n.name.as_deref()) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }

    /// The node owning `position`, if any.
    pub fn at(&self, position: (i64, i64)) -> Option<NodeId> {
        self.by_position.get(&position).map(|&id| NodeId(id))
    }

    /// Find a node by display name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.ids().find(|&id| self.name_of(id) == name)
    }

    /// The ground node, if one has been marked.
    pub fn ground(&self) -> Option<NodeId> {
        self.slots[0].as_ref().map(|_| NodeId::GROUND)
    }

    /// Currently-assigned IDs, ascending.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| NodeId(i)))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest unassigned slot index >= 1, growing the vector at the tail.
    fn alloc(&mut self) -> usize {
        for i in 1..self.slots.len() {
            if self.slots[i].is_none() {
                return i;
            }
        }
        self.slots.push(None);
        self.slots.len() - 1
    }

    fn evict(&mut self, idx: usize) {
        self.slots[idx] = None;
        self.by_position.retain(|_, id| *id != idx);
        self.trim_tail();
    }

    /// Freeing the highest assigned ID shrinks the slot vector, so IDs
    /// stay dense at the tail.
    fn trim_tail(&mut self) {
        while self.slots.len() > 1 && matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }

    fn name_taken_by_other(&self, name: &str, own_id: usize) -> bool {
        self.ids()
            .any(|id| id.0 != own_id && self.name_of(id) == name)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
