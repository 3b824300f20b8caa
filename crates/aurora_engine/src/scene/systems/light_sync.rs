//! Light sync system
//!
//! Re-derives world-space light parameters (position for point lights,
//! direction for directional lights) whenever a lit node's world transform
//! changes, so the lighting pipeline never re-scans the scene.

use std::any::Any;
use std::collections::HashMap;

use crate::foundation::math::{Mat4Ext, Vec3};

use super::super::access::NodeAccess;
use super::super::components::{
    LightComponent, LightType, TransformComponent, LIGHT, TRANSFORM,
};
use super::super::mask::ComponentMask;
use super::super::node::NodeKey;
use super::super::system::System;

/// World-space light data mirrored for the lighting pipeline.
#[derive(Debug, Clone)]
pub struct SyncedLight {
    /// Light kind.
    pub light_type: LightType,
    /// World-space position (point lights).
    pub position: Vec3,
    /// World-space direction (directional lights); local -Z of the node.
    pub direction: Vec3,
    /// Color mirrored from the component.
    pub color: Vec3,
    /// Intensity mirrored from the component.
    pub intensity: f32,
    /// Whether the light is active.
    pub enabled: bool,
}

/// Mirrors light nodes into a lighting-consumable cache.
#[derive(Default)]
pub struct LightSyncSystem {
    cache: HashMap<NodeKey, SyncedLight>,
}

impl LightSyncSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Component mask this system should be registered with.
    pub fn required_mask() -> ComponentMask {
        TRANSFORM.bit() | LIGHT.bit()
    }

    /// Cached state for a node, if registered.
    pub fn entry(&self, node: NodeKey) -> Option<&SyncedLight> {
        self.cache.get(&node)
    }

    /// Number of registered lights.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no lights are registered.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn snapshot(nodes: &NodeAccess, key: NodeKey) -> Option<SyncedLight> {
        let node = nodes.get(key)?;
        let transform = node.get::<TransformComponent>()?;
        let light = node.get::<LightComponent>()?;
        let world = transform.world();
        Some(SyncedLight {
            light_type: light.light_type,
            position: world.translation_part(),
            direction: world.transform_vector(&Vec3::new(0.0, 0.0, -1.0)),
            color: light.color,
            intensity: light.intensity,
            enabled: light.enabled,
        })
    }
}

impl System for LightSyncSystem {
    fn register_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        if let Some(entry) = Self::snapshot(nodes, node) {
            log::trace!("light sync: registered node {node:?}");
            self.cache.insert(node, entry);
        }
    }

    fn unregister_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        log::trace!("light sync: unregistered node {node:?}");
        self.cache.remove(&node);
    }

    fn process(&mut self, nodes: &mut NodeAccess, _dt: f32) {
        let mut refreshed = 0usize;
        for key in nodes.changes().nodes_with(Self::required_mask()) {
            if !self.cache.contains_key(&key) {
                continue;
            }
            if let Some(entry) = Self::snapshot(nodes, key) {
                self.cache.insert(key, entry);
                refreshed += 1;
            }
        }
        if refreshed > 0 {
            log::trace!("light sync: refreshed {refreshed} lights");
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
