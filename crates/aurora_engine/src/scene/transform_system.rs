//! Hierarchical world-transform propagation
//!
//! Dirty marking happens at mutation time (see
//! [`NodeAccess::mark_transform_changed`]): the changed node gets
//! `NEED_UPDATE`, its ancestor chain gets `DIRTY`, and the affected root
//! enters the frame's work list. This system drains that work list once per
//! frame, between the pre- and post-transform hooks.
//!
//! The downward walk uses an explicit stack, not language recursion, so deep
//! hierarchies cannot overflow the thread stack. Pruning invariant: a node
//! that is `DIRTY` but not itself stale only pushes its children that are
//! still `DIRTY`; clean siblings are never touched. A recomputed node pushes
//! all children unconditionally, because their world matrices are stale
//! relative to the new parent world regardless of their own flags.
//!
//! Total work per frame is bounded by the number of `NEED_UPDATE` nodes plus
//! their transitive descendants, independent of scene size.

use std::any::Any;

use crate::foundation::math::Mat4;

use super::access::NodeAccess;
use super::components::TransformComponent;
use super::node::{NodeFlags, NodeKey};
use super::system::System;

/// Default traversal stack bound; exceeding it is treated as a corrupted
/// hierarchy (structurally impossible while nodes have single parents).
pub const DEFAULT_STACK_CAPACITY: usize = 4096;

/// The transform propagator.
pub struct TransformSystem {
    stack: Vec<(NodeKey, bool)>,
    child_scratch: Vec<NodeKey>,
    stack_capacity: usize,
    visited: usize,
    updated: usize,
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_CAPACITY)
    }
}

impl TransformSystem {
    /// Create a propagator with the given traversal stack bound.
    pub fn new(stack_capacity: usize) -> Self {
        Self {
            stack: Vec::new(),
            child_scratch: Vec::new(),
            stack_capacity,
            visited: 0,
            updated: 0,
        }
    }

    /// Nodes visited by the last `process` call (diagnostics).
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Nodes whose world matrix was recomputed by the last `process` call.
    pub fn updated(&self) -> usize {
        self.updated
    }

    /// Update the configured stack bound.
    pub fn set_stack_capacity(&mut self, capacity: usize) {
        self.stack_capacity = capacity;
    }

    fn visit(&mut self, nodes: &mut NodeAccess, key: NodeKey, force: bool) {
        // a key may have been marked and then destroyed within the frame
        let Some(node) = nodes.get(key) else {
            return;
        };
        self.visited += 1;

        let flags = node.flags();
        if force || flags.contains(NodeFlags::NEED_UPDATE) {
            let Some(transform) = node.get::<TransformComponent>() else {
                debug_assert!(false, "node without transform in dirty walk");
                return;
            };
            let local = *transform.local();
            let parent_world = transform
                .parent()
                .and_then(|p| nodes.get(p))
                .and_then(|parent| parent.get::<TransformComponent>())
                .map_or_else(Mat4::identity, |parent| *parent.world());
            let world = parent_world * local;

            let family = node.mask();
            let Some(node) = nodes.get_mut(key) else {
                return;
            };
            if let Some(transform) = node.get_mut::<TransformComponent>() {
                transform.set_world(world);
            }
            node.flags.remove(NodeFlags::NEED_UPDATE | NodeFlags::DIRTY);
            // all descendants are stale relative to the new parent world
            for &child in node.children() {
                self.stack.push((child, true));
            }
            nodes.changes_mut().push_world_changed(key, family);
            self.updated += 1;
        } else if flags.contains(NodeFlags::DIRTY) {
            let Some(node) = nodes.get_mut(key) else {
                return;
            };
            node.flags.remove(NodeFlags::DIRTY);
            self.child_scratch.clear();
            self.child_scratch.extend_from_slice(node.children());
            // pruning: only descend into branches that still carry the flag
            for index in 0..self.child_scratch.len() {
                let child = self.child_scratch[index];
                if nodes
                    .get(child)
                    .is_some_and(|c| c.flags().contains(NodeFlags::DIRTY))
                {
                    self.stack.push((child, false));
                }
            }
        }

        debug_assert!(
            self.stack.len() <= self.stack_capacity,
            "transform traversal stack exceeded capacity {} (corrupted hierarchy?)",
            self.stack_capacity
        );
    }
}

impl System for TransformSystem {
    fn process(&mut self, nodes: &mut NodeAccess, _dt: f32) {
        self.visited = 0;
        self.updated = 0;

        let roots = nodes.changes_mut().take_dirty_roots();
        for root in roots {
            let Some(node) = nodes.get(root) else {
                continue;
            };
            if !node
                .flags()
                .intersects(NodeFlags::NEED_UPDATE | NodeFlags::DIRTY)
            {
                continue;
            }

            debug_assert!(self.stack.is_empty());
            self.stack.push((root, false));
            while let Some((key, force)) = self.stack.pop() {
                self.visit(nodes, key, force);
            }
        }

        if self.updated > 0 {
            log::trace!(
                "transform propagation: {} visited, {} recomputed",
                self.visited,
                self.updated
            );
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
