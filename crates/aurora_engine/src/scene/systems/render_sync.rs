//! Render sync system
//!
//! Keeps the renderer-facing cache (world matrix, spatial position,
//! visibility, mesh/material handles) in step with the scene. Transform
//! updates arrive in batch through the per-frame change buffer; visibility
//! arrives through the `VisibilityChanged` event.

use std::any::Any;
use std::collections::HashMap;

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

use super::super::access::NodeAccess;
use super::super::components::{RenderableComponent, TransformComponent, RENDERABLE, TRANSFORM};
use super::super::events::SceneEvent;
use super::super::mask::ComponentMask;
use super::super::node::NodeKey;
use super::super::system::System;

/// Cached render state for one registered node.
#[derive(Debug, Clone)]
pub struct SyncedRenderable {
    /// World matrix as of the last sync.
    pub world: Mat4,
    /// Spatial-index position (world translation).
    pub position: Vec3,
    /// Whether the node is currently visible.
    pub visible: bool,
    /// Mesh handle mirrored from the component.
    pub mesh: super::super::components::MeshId,
    /// Material handle mirrored from the component.
    pub material: super::super::components::MaterialId,
}

/// Mirrors renderable nodes into a renderer-consumable cache.
#[derive(Default)]
pub struct RenderSyncSystem {
    cache: HashMap<NodeKey, SyncedRenderable>,
    synced_last_frame: usize,
}

impl RenderSyncSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Component mask this system should be registered with.
    pub fn required_mask() -> ComponentMask {
        TRANSFORM.bit() | RENDERABLE.bit()
    }

    /// Cached state for a node, if registered.
    pub fn entry(&self, node: NodeKey) -> Option<&SyncedRenderable> {
        self.cache.get(&node)
    }

    /// Number of registered renderables.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no renderables are registered.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Entries refreshed by the last `process` call.
    pub fn synced_last_frame(&self) -> usize {
        self.synced_last_frame
    }

    fn snapshot(nodes: &NodeAccess, key: NodeKey) -> Option<SyncedRenderable> {
        let node = nodes.get(key)?;
        let transform = node.get::<TransformComponent>()?;
        let renderable = node.get::<RenderableComponent>()?;
        Some(SyncedRenderable {
            world: *transform.world(),
            position: transform.world().translation_part(),
            visible: node.is_visible(),
            mesh: renderable.mesh,
            material: renderable.material,
        })
    }
}

impl System for RenderSyncSystem {
    fn register_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        if let Some(entry) = Self::snapshot(nodes, node) {
            log::trace!("render sync: registered node {node:?}");
            self.cache.insert(node, entry);
        }
    }

    fn unregister_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        log::trace!("render sync: unregistered node {node:?}");
        self.cache.remove(&node);
    }

    fn immediate_event(&mut self, nodes: &mut NodeAccess, node: Option<NodeKey>, event: SceneEvent) {
        if event != SceneEvent::VisibilityChanged {
            return;
        }
        let Some(key) = node else {
            return;
        };
        if let (Some(entry), Some(node)) = (self.cache.get_mut(&key), nodes.get(key)) {
            entry.visible = node.is_visible();
        }
    }

    fn process(&mut self, nodes: &mut NodeAccess, _dt: f32) {
        self.synced_last_frame = 0;
        for key in nodes.changes().nodes_with(Self::required_mask()) {
            let Some(node) = nodes.get(key) else {
                continue;
            };
            let Some(transform) = node.get::<TransformComponent>() else {
                continue;
            };
            if let Some(entry) = self.cache.get_mut(&key) {
                entry.world = *transform.world();
                entry.position = transform.world().translation_part();
                self.synced_last_frame += 1;
            }
        }
        if self.synced_last_frame > 0 {
            log::trace!("render sync: refreshed {} entries", self.synced_last_frame);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
