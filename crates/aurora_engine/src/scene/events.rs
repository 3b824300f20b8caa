//! Scene event types and the system subscription table
//!
//! Events are cross-cutting, synchronous notifications delivered to systems
//! that registered for the event type. Delivery itself is driven by
//! [`Scene`](super::Scene) (which owns both the subscription table and the
//! systems); this module holds the event enumeration and the table.

use std::collections::HashMap;

use super::system::SystemId;

/// Closed enumeration of scene-level event types.
///
/// Subsystems register for the events they care about; the first three drive
/// the transform pipeline, the rest are domain notifications raised by their
/// owning subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEvent {
    /// A node's local transform matrix was written.
    LocalTransformChanged,
    /// A node was attached to a different parent.
    TransformParentChanged,
    /// A node's world matrix was recomputed this frame (batched flush).
    WorldTransformChanged,
    /// A node's visibility flag was toggled.
    VisibilityChanged,
    /// The scene configuration was replaced.
    ConfigChanged,
    /// Decal projection parameters changed on a node.
    DecalChanged,
    /// Reflection probe parameters changed on a node.
    ReflectionChanged,
    /// Sound emitter parameters changed on a node.
    SoundChanged,
}

/// Subscription table mapping event types to interested systems.
#[derive(Default)]
pub struct EventDispatcher {
    subscriptions: HashMap<SceneEvent, Vec<SystemId>>,
}

impl EventDispatcher {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a system to an event type.
    ///
    /// Double subscription is a programmer error.
    pub fn register(&mut self, system: SystemId, event: SceneEvent) {
        let subscribers = self.subscriptions.entry(event).or_default();
        debug_assert!(
            !subscribers.contains(&system),
            "system {system:?} already subscribed to {event:?}"
        );
        subscribers.push(system);
    }

    /// Drop one subscription; missing subscriptions are ignored.
    pub fn unregister(&mut self, system: SystemId, event: SceneEvent) {
        if let Some(subscribers) = self.subscriptions.get_mut(&event) {
            subscribers.retain(|id| *id != system);
        }
    }

    /// Drop every subscription of a system (used when the system is removed).
    pub fn unregister_all(&mut self, system: SystemId) {
        for subscribers in self.subscriptions.values_mut() {
            subscribers.retain(|id| *id != system);
        }
    }

    /// Systems subscribed to an event, in subscription order.
    pub fn subscribers(&self, event: SceneEvent) -> &[SystemId] {
        self.subscriptions
            .get(&event)
            .map_or(&[], Vec::as_slice)
    }
}
