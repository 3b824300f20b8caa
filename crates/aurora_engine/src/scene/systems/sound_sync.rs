//! Sound sync system
//!
//! Keeps positional-audio emitter state current: positions follow the change
//! buffer each frame, playback parameters refresh on the `SoundChanged`
//! event raised by whoever edits the emitter component.

use std::any::Any;
use std::collections::HashMap;

use crate::foundation::math::{Mat4Ext, Vec3};

use super::super::access::NodeAccess;
use super::super::components::{
    SoundEmitterComponent, SoundId, TransformComponent, SOUND_EMITTER, TRANSFORM,
};
use super::super::events::SceneEvent;
use super::super::mask::ComponentMask;
use super::super::node::NodeKey;
use super::super::system::System;

/// World-space emitter data mirrored for the audio subsystem.
#[derive(Debug, Clone)]
pub struct SyncedEmitter {
    /// Sound resource handle.
    pub sound: SoundId,
    /// World-space position.
    pub position: Vec3,
    /// Playback volume.
    pub volume: f32,
    /// Audible range.
    pub max_distance: f32,
}

/// Mirrors sound emitter nodes into an audio-consumable cache.
#[derive(Default)]
pub struct SoundSyncSystem {
    cache: HashMap<NodeKey, SyncedEmitter>,
}

impl SoundSyncSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Component mask this system should be registered with.
    pub fn required_mask() -> ComponentMask {
        TRANSFORM.bit() | SOUND_EMITTER.bit()
    }

    /// Cached state for a node, if registered.
    pub fn entry(&self, node: NodeKey) -> Option<&SyncedEmitter> {
        self.cache.get(&node)
    }

    /// Number of registered emitters.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no emitters are registered.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn snapshot(nodes: &NodeAccess, key: NodeKey) -> Option<SyncedEmitter> {
        let node = nodes.get(key)?;
        let transform = node.get::<TransformComponent>()?;
        let emitter = node.get::<SoundEmitterComponent>()?;
        Some(SyncedEmitter {
            sound: emitter.sound,
            position: transform.world().translation_part(),
            volume: emitter.volume,
            max_distance: emitter.max_distance,
        })
    }
}

impl System for SoundSyncSystem {
    fn register_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        if let Some(entry) = Self::snapshot(nodes, node) {
            log::trace!("sound sync: registered node {node:?}");
            self.cache.insert(node, entry);
        }
    }

    fn unregister_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        log::trace!("sound sync: unregistered node {node:?}");
        self.cache.remove(&node);
    }

    fn immediate_event(&mut self, nodes: &mut NodeAccess, node: Option<NodeKey>, event: SceneEvent) {
        if event != SceneEvent::SoundChanged {
            return;
        }
        let Some(key) = node else {
            return;
        };
        if self.cache.contains_key(&key) {
            if let Some(entry) = Self::snapshot(nodes, key) {
                self.cache.insert(key, entry);
            }
        }
    }

    fn process(&mut self, nodes: &mut NodeAccess, _dt: f32) {
        for key in nodes.changes().nodes_with(Self::required_mask()) {
            if let Some(entry) = self.cache.get_mut(&key) {
                if let Some(position) = nodes
                    .get(key)
                    .and_then(|n| n.get::<TransformComponent>())
                    .map(|t| t.world().translation_part())
                {
                    entry.position = position;
                }
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
