//! Per-frame transform change tracking
//!
//! Two collections, both engine-wide and frame-scoped:
//!
//! - the **dirty-root work list**: roots of subtrees that must be walked by
//!   the transform propagator this frame, filled by the upward dirty-marking
//!   walk at mutation time;
//! - the **world-changed buffer**: every node whose world matrix actually
//!   changed this frame, grouped by its component-mask *family* so consumers
//!   can skip whole groups without testing each node.
//!
//! The buffer is append-only during propagation, read by consumer systems in
//! their `process`, and cleared at the end of `Scene::update`. Entries for a
//! destroyed node are purged eagerly so no consumer ever sees a stale key.

use std::collections::HashMap;

use super::mask::ComponentMask;
use super::node::NodeKey;

/// Frame-scoped transform change state.
#[derive(Default)]
pub struct TransformChanges {
    dirty_roots: Vec<NodeKey>,
    world_changed: HashMap<ComponentMask, Vec<NodeKey>>,
    total: usize,
}

impl TransformChanges {
    /// Create empty change state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subtree root for this frame's propagation pass.
    pub(crate) fn push_dirty_root(&mut self, root: NodeKey) {
        self.dirty_roots.push(root);
    }

    /// Take the pending root work list, leaving it empty.
    pub(crate) fn take_dirty_roots(&mut self) -> Vec<NodeKey> {
        std::mem::take(&mut self.dirty_roots)
    }

    /// Pending dirty roots (testing/diagnostics).
    pub fn dirty_roots(&self) -> &[NodeKey] {
        &self.dirty_roots
    }

    /// Record a node whose world matrix changed, under its family.
    pub(crate) fn push_world_changed(&mut self, node: NodeKey, family: ComponentMask) {
        self.world_changed.entry(family).or_default().push(node);
        self.total += 1;
    }

    /// Iterate `(family, nodes)` groups.
    pub fn families(&self) -> impl Iterator<Item = (ComponentMask, &[NodeKey])> {
        self.world_changed
            .iter()
            .map(|(family, nodes)| (*family, nodes.as_slice()))
    }

    /// Iterate changed nodes whose family contains all bits of `required`.
    ///
    /// This is the consumer-side filter: a system interested in mask `M`
    /// only touches groups whose family satisfies `M`.
    pub fn nodes_with(&self, required: ComponentMask) -> impl Iterator<Item = NodeKey> + '_ {
        self.world_changed
            .iter()
            .filter(move |(family, _)| family.contains(required))
            .flat_map(|(_, nodes)| nodes.iter().copied())
    }

    /// Iterate every changed node regardless of family.
    pub fn all_changed(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.world_changed.values().flat_map(|nodes| nodes.iter().copied())
    }

    /// Number of world-changed entries this frame.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether no world changes were recorded this frame.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Drop every reference to a node being destroyed mid-frame.
    pub(crate) fn remove_node(&mut self, node: NodeKey) {
        self.dirty_roots.retain(|k| *k != node);
        for nodes in self.world_changed.values_mut() {
            let before = nodes.len();
            nodes.retain(|k| *k != node);
            self.total -= before - nodes.len();
        }
    }

    /// End-of-frame reset of the world-changed buffer.
    ///
    /// Group allocations are kept so steady-state frames do not reallocate.
    pub(crate) fn clear(&mut self) {
        for nodes in self.world_changed.values_mut() {
            nodes.clear();
        }
        self.total = 0;
    }
}
