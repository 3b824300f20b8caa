//! System trait and the ordered system registry
//!
//! A system declares a required component mask and, optionally, per-frame
//! processing. The registry keeps two orders: the registration order (used
//! for dispatching registration events) and a separate process list whose
//! relative order can be controlled with insert-before.

use std::any::Any;

use super::access::NodeAccess;
use super::events::SceneEvent;
use super::mask::{ComponentMask, ComponentType};
use super::node::NodeKey;

/// Identifier of a registered system, stable for the scene's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(u32);

impl SystemId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Scene-lifetime processor observing nodes through registration callbacks.
///
/// Default implementations make every hook optional. The component-level
/// hooks funnel into the node-level ones, so a system that only cares about
/// "node started/stopped matching my mask" implements `register_node` /
/// `unregister_node` alone.
///
/// Systems never own nodes; every hook receives the node storage view and a
/// key that is guaranteed live for the duration of the call.
pub trait System: Any {
    /// A node now satisfies this system's required mask (node creation, or
    /// retroactive walk when the system is added to a populated scene).
    fn register_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        let _ = (nodes, node);
    }

    /// A registered node is going away (destruction, system removal, scene
    /// teardown). Guaranteed to arrive before the node is released.
    fn unregister_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        let _ = (nodes, node);
    }

    /// A component attach transitioned the node into satisfying the mask.
    fn register_component(&mut self, nodes: &mut NodeAccess, node: NodeKey, ty: ComponentType) {
        let _ = ty;
        self.register_node(nodes, node);
    }

    /// A component detach is about to transition the node out of the mask.
    /// Called before the bit clears and the component is destroyed.
    fn unregister_component(&mut self, nodes: &mut NodeAccess, node: NodeKey, ty: ComponentType) {
        let _ = ty;
        self.unregister_node(nodes, node);
    }

    /// Synchronous event delivery. `node` is `None` for scene-wide events
    /// (currently only [`SceneEvent::ConfigChanged`]).
    fn immediate_event(&mut self, nodes: &mut NodeAccess, node: Option<NodeKey>, event: SceneEvent) {
        let _ = (nodes, node, event);
    }

    /// Batched event delivery; one call covers the whole group. The default
    /// forwards to `immediate_event` per node.
    fn group_event(&mut self, nodes: &mut NodeAccess, group: &[NodeKey], event: SceneEvent) {
        for &node in group {
            self.immediate_event(nodes, Some(node), event);
        }
    }

    /// Per-frame work, called in process-list order for systems registered
    /// with `needs_process`.
    fn process(&mut self, nodes: &mut NodeAccess, dt: f32) {
        let _ = (nodes, dt);
    }

    /// Hook running immediately before the transform propagator each frame;
    /// the place to write animation-driven local transforms.
    fn pre_transform(&mut self, nodes: &mut NodeAccess, dt: f32) {
        let _ = (nodes, dt);
    }

    /// Hook running immediately after the transform propagator each frame,
    /// once world matrices for the frame are final.
    fn post_transform(&mut self, nodes: &mut NodeAccess, dt: f32) {
        let _ = (nodes, dt);
    }

    /// Downcast support for typed system lookup.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct SystemEntry {
    pub id: SystemId,
    pub system: Box<dyn System>,
    pub required: ComponentMask,
}

/// Ordered collection of registered systems.
#[derive(Default)]
pub(crate) struct SystemRegistry {
    entries: Vec<SystemEntry>,
    process_order: Vec<SystemId>,
    next_id: u32,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system in registration order; if it processes, insert it
    /// into the process list (before `insert_before` when given).
    pub fn add(
        &mut self,
        system: Box<dyn System>,
        required: ComponentMask,
        needs_process: bool,
        insert_before: Option<SystemId>,
    ) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;

        self.entries.push(SystemEntry {
            id,
            system,
            required,
        });

        if needs_process {
            let position = insert_before.map_or(self.process_order.len(), |before| {
                let found = self.process_order.iter().position(|p| *p == before);
                debug_assert!(found.is_some(), "insert_before target not in process list");
                found.unwrap_or(self.process_order.len())
            });
            self.process_order.insert(position, id);
        } else {
            debug_assert!(
                insert_before.is_none(),
                "insert_before given for a system without process"
            );
        }

        id
    }

    /// Remove a system from both orders. Unknown ids are a programmer error.
    pub fn remove(&mut self, id: SystemId) -> Option<SystemEntry> {
        let position = self.entries.iter().position(|e| e.id == id);
        debug_assert!(position.is_some(), "removing system not in registry");
        let entry = self.entries.remove(position?);
        self.process_order.retain(|p| *p != id);
        Some(entry)
    }

    pub fn get_mut(&mut self, id: SystemId) -> Option<&mut SystemEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn get(&self, id: SystemId) -> Option<&SystemEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Registration-ordered iteration.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut SystemEntry> {
        self.entries.iter_mut()
    }

    /// Registration-ordered read iteration.
    pub fn entries(&self) -> impl Iterator<Item = &SystemEntry> {
        self.entries.iter()
    }

    /// Current process order.
    pub fn process_order(&self) -> &[SystemId] {
        &self.process_order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
