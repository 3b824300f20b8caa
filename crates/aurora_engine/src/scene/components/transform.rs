//! Transform component
//!
//! Holds a node's local and world matrices. The world matrix is owned by the
//! transform propagator: it is only valid after the propagator has run for a
//! frame in which this node was reachable from a dirty root, at which point
//! `world == parent.world * local` (`world == local` for roots).

use std::any::Any;

use crate::foundation::math::Mat4;

use super::super::component::{Component, TypedComponent};
use super::super::mask::ComponentType;
use super::super::node::NodeKey;
use super::TRANSFORM;

/// Spatial transform attached to every node.
#[derive(Debug, Clone)]
pub struct TransformComponent {
    local: Mat4,
    world: Mat4,
    /// Weak link to the parent node, re-resolved on every reparent. Never
    /// implies ownership; a stale key resolves to nothing.
    parent: Option<NodeKey>,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            local: Mat4::identity(),
            world: Mat4::identity(),
            parent: None,
        }
    }
}

impl TransformComponent {
    /// Local transform relative to the parent.
    pub fn local(&self) -> &Mat4 {
        &self.local
    }

    /// Write the local matrix.
    ///
    /// Callers outside the engine must go through
    /// [`Scene::set_local_transform`](crate::scene::Scene::set_local_transform)
    /// so the change is picked up by the propagator.
    pub fn set_local(&mut self, local: Mat4) {
        self.local = local;
    }

    /// World transform as of the last propagation pass.
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    pub(crate) fn set_world(&mut self, world: Mat4) {
        self.world = world;
    }

    /// Parent node this transform composes against.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeKey>) {
        self.parent = parent;
    }
}

impl Component for TransformComponent {
    fn component_type(&self) -> ComponentType {
        TRANSFORM
    }

    fn clone_component(&self) -> Box<dyn Component> {
        // the parent link is per-node; the clone is re-linked on attach
        Box::new(Self {
            local: self.local,
            world: self.world,
            parent: None,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedComponent for TransformComponent {
    const TYPE: ComponentType = TRANSFORM;
}
