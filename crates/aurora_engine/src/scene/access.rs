//! Mutable node-storage view handed to systems
//!
//! System hooks never receive the scene itself; they receive a [`NodeAccess`]
//! wrapping node storage and the frame's transform change state. This keeps
//! synchronous dispatch re-entrancy-safe by construction: a handler can read
//! and mutate node-local data, but cannot structurally mutate the registry
//! that is currently iterating over it.

use slotmap::SlotMap;

use crate::foundation::math::Mat4;

use super::changes::TransformChanges;
use super::components::TransformComponent;
use super::node::{Node, NodeFlags, NodeKey};

/// Borrowed view over node storage and transform change tracking.
pub struct NodeAccess<'a> {
    nodes: &'a mut SlotMap<NodeKey, Node>,
    changes: &'a mut TransformChanges,
}

impl<'a> NodeAccess<'a> {
    pub(crate) fn new(
        nodes: &'a mut SlotMap<NodeKey, Node>,
        changes: &'a mut TransformChanges,
    ) -> Self {
        Self { nodes, changes }
    }

    /// Whether the key still resolves to a live node.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Resolve a node, `None` if it was destroyed.
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Resolve a node mutably, `None` if it was destroyed.
    ///
    /// Local transform writes must go through [`Self::set_local_transform`]
    /// so the propagator sees them.
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// This frame's change buffer (read side for consumer systems).
    pub fn changes(&self) -> &TransformChanges {
        self.changes
    }

    pub(crate) fn changes_mut(&mut self) -> &mut TransformChanges {
        self.changes
    }

    /// Write a node's local transform and mark the transform pipeline.
    pub fn set_local_transform(&mut self, key: NodeKey, local: Mat4) {
        let Some(node) = self.nodes.get_mut(key) else {
            debug_assert!(false, "set_local_transform on destroyed node");
            return;
        };
        let Some(transform) = node.get_mut::<TransformComponent>() else {
            debug_assert!(false, "node has no transform component");
            return;
        };
        transform.set_local(local);
        self.mark_transform_changed(key);
    }

    /// Flag a node's transform as stale and record the affected root.
    ///
    /// Sets `NEED_UPDATE` on the node and walks upward setting `DIRTY` on
    /// every ancestor, stopping at the first ancestor already carrying the
    /// bit (an earlier walk covers this path). A parentless node terminates
    /// the walk and enters the frame's root work list — at most once per
    /// frame, because a second walk through it stops on its `DIRTY` bit.
    pub fn mark_transform_changed(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            debug_assert!(false, "mark_transform_changed on destroyed node");
            return;
        };

        if node.flags.contains(NodeFlags::DIRTY) {
            node.flags |= NodeFlags::NEED_UPDATE;
            return;
        }
        node.flags |= NodeFlags::NEED_UPDATE | NodeFlags::DIRTY;

        let mut current = key;
        loop {
            let parent = self.nodes[current].parent();
            match parent {
                None => {
                    self.changes.push_dirty_root(current);
                    break;
                }
                Some(parent_key) => {
                    let Some(parent) = self.nodes.get_mut(parent_key) else {
                        debug_assert!(false, "parent link to destroyed node");
                        break;
                    };
                    if parent.flags.contains(NodeFlags::DIRTY) {
                        break;
                    }
                    parent.flags |= NodeFlags::DIRTY;
                    current = parent_key;
                }
            }
        }
    }
}
