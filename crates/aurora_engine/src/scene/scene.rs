//! Scene: node storage, system registry and the per-frame update loop
//!
//! All structural mutation goes through the scene so that registration
//! events fire synchronously at the mutation site: a system always observes
//! a consistent mask the moment it is notified. `update` drives the frame
//! sequence — process systems in order, with the transform propagator run
//! between the pre- and post-transform hooks and its changed set flushed to
//! `WorldTransformChanged` subscribers in one grouped call.

use slotmap::SlotMap;

use crate::config::{ConfigError, SceneConfig};
use crate::foundation::math::Mat4;

use super::access::NodeAccess;
use super::changes::TransformChanges;
use super::component::{Component, ComponentRegistry};
use super::components::{self, TransformComponent, TRANSFORM};
use super::events::{EventDispatcher, SceneEvent};
use super::mask::{ComponentMask, ComponentType};
use super::node::{Node, NodeKey};
use super::system::{System, SystemId, SystemRegistry};
use super::transform_system::TransformSystem;

/// The scene runtime: hierarchy, components, systems and events.
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    registry: ComponentRegistry,
    systems: SystemRegistry,
    events: EventDispatcher,
    changes: TransformChanges,
    config: SceneConfig,
    transform_system: SystemId,
    frame: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene with default configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create a scene with the given configuration.
    pub fn with_config(config: SceneConfig) -> Self {
        debug_assert!(config.validate().is_ok());

        let mut registry = ComponentRegistry::new();
        components::register_builtin(&mut registry);

        let mut systems = SystemRegistry::new();
        let transform_system = systems.add(
            Box::new(TransformSystem::new(config.transform_stack_capacity)),
            TRANSFORM.bit(),
            true,
            None,
        );

        Self {
            nodes: SlotMap::with_capacity_and_key(config.expected_node_count),
            roots: Vec::new(),
            registry,
            systems,
            events: EventDispatcher::new(),
            changes: TransformChanges::new(),
            config,
            transform_system,
            frame: 0,
        }
    }

    // ---- nodes -----------------------------------------------------------

    /// Create a node under `parent` (or as a root) with a transform attached.
    pub fn create_node(&mut self, parent: Option<NodeKey>) -> NodeKey {
        self.create_named_node("node", parent)
    }

    /// Create a named node under `parent` (or as a root).
    pub fn create_named_node(&mut self, name: impl Into<String>, parent: Option<NodeKey>) -> NodeKey {
        debug_assert!(parent.map_or(true, |p| self.nodes.contains_key(p)));
        let parent = parent.filter(|p| self.nodes.contains_key(*p));

        let mut node = Node::new(name.into(), parent);
        let mut transform = TransformComponent::default();
        transform.set_parent(parent);
        node.attach_raw(Box::new(transform));

        let key = self.nodes.insert(node);
        match parent {
            Some(p) => self.nodes[p].children_mut().push(key),
            None => self.roots.push(key),
        }
        log::trace!("created node {key:?}");

        self.dispatch_register_node(key);

        // schedule the initial world matrix for the next propagation pass
        let Self { nodes, changes, .. } = self;
        NodeAccess::new(nodes, changes).mark_transform_changed(key);

        key
    }

    /// Destroy a node and its whole subtree.
    ///
    /// Every node is torn down parent-first: components detach in reverse
    /// order with their unregister notifications, remaining observers get
    /// `unregister_node`, and all references in the change buffer are purged
    /// before the storage is released.
    pub fn remove_node(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            debug_assert!(false, "remove_node on destroyed node");
            return;
        };
        let parent = node.parent();
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children_mut().retain(|c| *c != key);
                }
            }
            None => self.roots.retain(|r| *r != key),
        }

        let subtree = self.collect_subtree(key);
        log::trace!("removing node {key:?} ({} nodes in subtree)", subtree.len());
        for node_key in subtree {
            self.destroy_node_storage(node_key);
        }
    }

    /// Move a node under a new parent (or make it a root).
    ///
    /// Re-resolves the transform's parent link and marks the subtree for
    /// propagation; fires `TransformParentChanged`.
    pub fn reparent(&mut self, key: NodeKey, new_parent: Option<NodeKey>) {
        if !self.nodes.contains_key(key) {
            debug_assert!(false, "reparent of destroyed node");
            return;
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(p) {
                debug_assert!(false, "reparent under destroyed node");
                return;
            }
            // a node may not become its own descendant
            let mut cursor = Some(p);
            while let Some(ancestor) = cursor {
                if ancestor == key {
                    debug_assert!(false, "reparent would create a cycle");
                    log::error!("reparent of {key:?} under its own descendant ignored");
                    return;
                }
                cursor = self.nodes[ancestor].parent();
            }
        }

        let old_parent = self.nodes[key].parent();
        if old_parent == new_parent {
            return;
        }
        match old_parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children_mut().retain(|c| *c != key);
                }
            }
            None => self.roots.retain(|r| *r != key),
        }
        match new_parent {
            Some(p) => self.nodes[p].children_mut().push(key),
            None => self.roots.push(key),
        }

        let node = &mut self.nodes[key];
        node.set_parent(new_parent);
        if let Some(transform) = node.get_mut::<TransformComponent>() {
            transform.set_parent(new_parent);
        }

        let Self { nodes, changes, .. } = self;
        NodeAccess::new(nodes, changes).mark_transform_changed(key);
        self.notify_all_systems(key, SceneEvent::TransformParentChanged);
    }

    /// Resolve a node for reading.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Resolve a node for mutation.
    ///
    /// Local transform writes must use [`Self::set_local_transform`] so the
    /// propagator sees them.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Whether the key resolves to a live node.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Total number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current root nodes in creation order.
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Depth-first search for the first node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        let mut stack: Vec<NodeKey> = self.roots.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.name() == name {
                return Some(key);
            }
            stack.extend(node.children().iter().rev());
        }
        None
    }

    /// Clone a subtree (components included) under a new parent.
    pub fn clone_subtree(&mut self, source: NodeKey, parent: Option<NodeKey>) -> Option<NodeKey> {
        let src = self.nodes.get(source)?;
        let name = src.name().to_string();
        let local = *src.get::<TransformComponent>()?.local();
        let cloned: Vec<Box<dyn Component>> = src
            .components()
            .filter(|c| c.component_type() != TRANSFORM)
            .map(|c| c.clone_component())
            .collect();
        let children: Vec<NodeKey> = src.children().to_vec();

        let key = self.create_named_node(name, parent);
        self.set_local_transform(key, local);
        for component in cloned {
            self.attach(key, component);
        }
        for child in children {
            self.clone_subtree(child, Some(key));
        }
        Some(key)
    }

    // ---- components ------------------------------------------------------

    /// Attach a component, firing `register_component` on every system the
    /// node newly satisfies. Attaching an already-present type is a
    /// programmer error; the instance is replaced without re-notification.
    pub fn attach(&mut self, key: NodeKey, component: Box<dyn Component>) {
        let ty = component.component_type();
        if !self.registry.is_registered(ty) {
            debug_assert!(false, "attach of unregistered component type {}", ty.index());
            log::error!("attach of unregistered component type {}", ty.index());
            return;
        }
        let Some(node) = self.nodes.get_mut(key) else {
            debug_assert!(false, "attach on destroyed node");
            return;
        };

        let old_mask = node.mask();
        if node.attach_raw(component).is_some() {
            return;
        }
        let new_mask = self.nodes[key].mask();
        log::trace!("attached component {} to {key:?}", ty.index());

        let Self { nodes, systems, changes, .. } = self;
        let mut access = NodeAccess::new(nodes, changes);
        for entry in systems.entries_mut() {
            if !old_mask.contains(entry.required) && new_mask.contains(entry.required) {
                entry.system.register_component(&mut access, key, ty);
            }
        }
    }

    /// Create a component by tag (through the registry) and attach it.
    pub fn attach_by_type(&mut self, key: NodeKey, ty: ComponentType) {
        if let Some(component) = self.registry.create(ty) {
            self.attach(key, component);
        }
    }

    /// Detach and destroy a component, firing `unregister_component` first
    /// on every system that stops matching. The transform component cannot
    /// be detached (every node keeps one for its lifetime).
    pub fn detach(&mut self, key: NodeKey, ty: ComponentType) {
        debug_assert!(ty != TRANSFORM, "the transform component cannot be detached");
        if ty == TRANSFORM {
            return;
        }
        let Some(node) = self.nodes.get(key) else {
            debug_assert!(false, "detach on destroyed node");
            return;
        };
        if !node.mask().has(ty) {
            debug_assert!(false, "detach of unattached component type {}", ty.index());
            return;
        }

        self.notify_detach_transition(key, ty);
        if let Some(node) = self.nodes.get_mut(key) {
            node.detach_raw(ty);
        }
        log::trace!("detached component {} from {key:?}", ty.index());
    }

    /// The component type registry.
    pub fn component_registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Mutable registry access, for registering external component types.
    pub fn component_registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    // ---- transforms ------------------------------------------------------

    /// Write a node's local transform; marks the transform pipeline and
    /// fires `LocalTransformChanged`.
    pub fn set_local_transform(&mut self, key: NodeKey, local: Mat4) {
        {
            let Self { nodes, changes, .. } = self;
            NodeAccess::new(nodes, changes).set_local_transform(key, local);
        }
        self.notify_all_systems(key, SceneEvent::LocalTransformChanged);
    }

    /// A node's local transform.
    pub fn local_transform(&self, key: NodeKey) -> Option<&Mat4> {
        self.nodes
            .get(key)?
            .get::<TransformComponent>()
            .map(TransformComponent::local)
    }

    /// A node's world transform as of the last propagation pass.
    pub fn world_transform(&self, key: NodeKey) -> Option<&Mat4> {
        self.nodes
            .get(key)?
            .get::<TransformComponent>()
            .map(TransformComponent::world)
    }

    /// Toggle a node's visibility; fires `VisibilityChanged`.
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) {
        let Some(node) = self.nodes.get_mut(key) else {
            debug_assert!(false, "set_visible on destroyed node");
            return;
        };
        if node.is_visible() == visible {
            return;
        }
        node.set_visible(visible);
        self.notify_all_systems(key, SceneEvent::VisibilityChanged);
    }

    // ---- systems ---------------------------------------------------------

    /// Register a system.
    ///
    /// The system lands at the end of the registration order; when
    /// `needs_process` it also enters the process list, before
    /// `insert_before` if given. Existing matching nodes are registered
    /// immediately, in hierarchy order.
    pub fn add_system(
        &mut self,
        system: Box<dyn System>,
        required: ComponentMask,
        needs_process: bool,
        insert_before: Option<SystemId>,
    ) -> SystemId {
        let id = self.systems.add(system, required, needs_process, insert_before);
        log::debug!("added system {id:?} (process: {needs_process})");

        let keys = self.collect_all_nodes();
        let Self { nodes, systems, changes, .. } = self;
        if let Some(entry) = systems.get_mut(id) {
            for key in keys {
                if nodes[key].mask().contains(entry.required) {
                    let mut access = NodeAccess::new(nodes, changes);
                    entry.system.register_node(&mut access, key);
                }
            }
        }
        id
    }

    /// Remove a system, unregistering every node it currently matches and
    /// dropping its event subscriptions. Removing an unknown system (or the
    /// built-in propagator) is a programmer error.
    pub fn remove_system(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        debug_assert!(id != self.transform_system, "the transform propagator cannot be removed");
        if id == self.transform_system {
            return None;
        }

        let keys = self.collect_all_nodes();
        {
            let Self { nodes, systems, changes, .. } = self;
            if let Some(entry) = systems.get_mut(id) {
                for key in keys {
                    if nodes[key].mask().contains(entry.required) {
                        let mut access = NodeAccess::new(nodes, changes);
                        entry.system.unregister_node(&mut access, key);
                    }
                }
            }
        }

        self.events.unregister_all(id);
        log::debug!("removed system {id:?}");
        self.systems.remove(id).map(|entry| entry.system)
    }

    /// Typed lookup of a registered system.
    pub fn system<T: System>(&self) -> Option<&T> {
        self.systems
            .entries()
            .find_map(|entry| entry.system.as_any().downcast_ref::<T>())
    }

    /// Typed mutable lookup of a registered system.
    pub fn system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems
            .entries_mut()
            .find_map(|entry| entry.system.as_any_mut().downcast_mut::<T>())
    }

    /// Id of the built-in transform propagator (for `insert_before`).
    pub fn transform_system_id(&self) -> SystemId {
        self.transform_system
    }

    // ---- events ----------------------------------------------------------

    /// Subscribe a system to an event type.
    pub fn register_system_for_event(&mut self, id: SystemId, event: SceneEvent) {
        debug_assert!(self.systems.get(id).is_some(), "subscribing unknown system");
        self.events.register(id, event);
    }

    /// Drop one event subscription.
    pub fn unregister_system_for_event(&mut self, id: SystemId, event: SceneEvent) {
        self.events.unregister(id, event);
    }

    /// Deliver an event to one system, synchronously.
    pub fn notify_system(&mut self, id: SystemId, node: Option<NodeKey>, event: SceneEvent) {
        let Self { nodes, systems, changes, .. } = self;
        if let Some(entry) = systems.get_mut(id) {
            let mut access = NodeAccess::new(nodes, changes);
            entry.system.immediate_event(&mut access, node, event);
        }
    }

    /// Deliver an event to every subscribed system whose required mask the
    /// node satisfies, synchronously, in registration order.
    pub fn notify_all_systems(&mut self, node: NodeKey, event: SceneEvent) {
        let Self { nodes, systems, events, changes, .. } = self;
        let Some(mask) = nodes.get(node).map(Node::mask) else {
            return;
        };
        for &id in events.subscribers(event) {
            if let Some(entry) = systems.get_mut(id) {
                if mask.contains(entry.required) {
                    let mut access = NodeAccess::new(nodes, changes);
                    entry.system.immediate_event(&mut access, Some(node), event);
                }
            }
        }
    }

    /// Deliver an event for a batch of nodes: each subscribed system gets
    /// one `group_event` call covering the subset of nodes it matches.
    pub fn group_notify_all_systems(&mut self, group: &[NodeKey], event: SceneEvent) {
        let Self { nodes, systems, events, changes, .. } = self;
        for &id in events.subscribers(event) {
            if let Some(entry) = systems.get_mut(id) {
                let filtered: Vec<NodeKey> = group
                    .iter()
                    .copied()
                    .filter(|k| {
                        nodes
                            .get(*k)
                            .is_some_and(|n| n.mask().contains(entry.required))
                    })
                    .collect();
                if !filtered.is_empty() {
                    let mut access = NodeAccess::new(nodes, changes);
                    entry.system.group_event(&mut access, &filtered, event);
                }
            }
        }
    }

    /// Deliver a scene-wide event (no node) to every subscriber.
    pub fn broadcast(&mut self, event: SceneEvent) {
        let Self { nodes, systems, events, changes, .. } = self;
        for &id in events.subscribers(event) {
            if let Some(entry) = systems.get_mut(id) {
                let mut access = NodeAccess::new(nodes, changes);
                entry.system.immediate_event(&mut access, None, event);
            }
        }
    }

    // ---- configuration ---------------------------------------------------

    /// Current configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Replace the configuration; fires `ConfigChanged` on success.
    pub fn set_config(&mut self, config: SceneConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(entry) = self.systems.get_mut(self.transform_system) {
            if let Some(propagator) = entry.system.as_any_mut().downcast_mut::<TransformSystem>() {
                propagator.set_stack_capacity(config.transform_stack_capacity);
            }
        }
        self.config = config;
        log::info!("scene configuration replaced");
        self.broadcast(SceneEvent::ConfigChanged);
        Ok(())
    }

    // ---- frame loop ------------------------------------------------------

    /// Advance the scene by one frame.
    ///
    /// Process systems run in process-list order. At the transform
    /// propagator's slot the sequence is: every pre-transform hook, the
    /// propagation pass, one grouped `WorldTransformChanged` flush, every
    /// post-transform hook. The change buffer clears at the end of the
    /// frame.
    pub fn update(&mut self, dt: f32) {
        let order: Vec<SystemId> = self.systems.process_order().to_vec();
        for id in order {
            if id == self.transform_system {
                self.run_pre_transform_hooks(dt);
                self.run_process(id, dt);
                self.flush_world_changes();
                self.run_post_transform_hooks(dt);
            } else {
                self.run_process(id, dt);
            }
        }

        if self.config.log_frame_stats {
            log::debug!(
                "frame {}: {} world transform changes",
                self.frame,
                self.changes.len()
            );
        }
        self.changes.clear();
        self.frame += 1;
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// This frame's change buffer (valid until the end of `update`).
    pub fn changes(&self) -> &TransformChanges {
        &self.changes
    }

    // ---- internals -------------------------------------------------------

    fn run_process(&mut self, id: SystemId, dt: f32) {
        let Self { nodes, systems, changes, .. } = self;
        if let Some(entry) = systems.get_mut(id) {
            let mut access = NodeAccess::new(nodes, changes);
            entry.system.process(&mut access, dt);
        }
    }

    fn run_pre_transform_hooks(&mut self, dt: f32) {
        let order: Vec<SystemId> = self.systems.process_order().to_vec();
        let Self { nodes, systems, changes, .. } = self;
        for id in order {
            if let Some(entry) = systems.get_mut(id) {
                let mut access = NodeAccess::new(nodes, changes);
                entry.system.pre_transform(&mut access, dt);
            }
        }
    }

    fn run_post_transform_hooks(&mut self, dt: f32) {
        let order: Vec<SystemId> = self.systems.process_order().to_vec();
        let Self { nodes, systems, changes, .. } = self;
        for id in order {
            if let Some(entry) = systems.get_mut(id) {
                let mut access = NodeAccess::new(nodes, changes);
                entry.system.post_transform(&mut access, dt);
            }
        }
    }

    fn flush_world_changes(&mut self) {
        let changed: Vec<NodeKey> = self.changes.all_changed().collect();
        if !changed.is_empty() {
            self.group_notify_all_systems(&changed, SceneEvent::WorldTransformChanged);
        }
    }

    fn dispatch_register_node(&mut self, key: NodeKey) {
        let Self { nodes, systems, changes, .. } = self;
        let Some(mask) = nodes.get(key).map(Node::mask) else {
            return;
        };
        let mut access = NodeAccess::new(nodes, changes);
        for entry in systems.entries_mut() {
            if mask.contains(entry.required) {
                entry.system.register_node(&mut access, key);
            }
        }
    }

    fn notify_detach_transition(&mut self, key: NodeKey, ty: ComponentType) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        let old_mask = node.mask();
        let mut new_mask = old_mask;
        new_mask.remove(ty);

        let Self { nodes, systems, changes, .. } = self;
        let mut access = NodeAccess::new(nodes, changes);
        for entry in systems.entries_mut() {
            if old_mask.contains(entry.required) && !new_mask.contains(entry.required) {
                entry.system.unregister_component(&mut access, key, ty);
            }
        }
    }

    /// Tear down one node: components in reverse order with unregister
    /// notifications, then the remaining mask-less observers, then purge.
    fn destroy_node_storage(&mut self, key: NodeKey) {
        loop {
            let last = self
                .nodes
                .get(key)
                .and_then(|n| n.components().map(|c| c.component_type()).last());
            let Some(ty) = last else {
                break;
            };
            self.notify_detach_transition(key, ty);
            if let Some(node) = self.nodes.get_mut(key) {
                node.detach_raw(ty);
            }
        }

        {
            let Self { nodes, systems, changes, .. } = self;
            let mut access = NodeAccess::new(nodes, changes);
            for entry in systems.entries_mut() {
                if entry.required.is_empty() {
                    entry.system.unregister_node(&mut access, key);
                }
            }
        }

        self.changes.remove_node(key);
        self.nodes.remove(key);
    }

    /// Pre-order subtree keys, parent before children.
    fn collect_subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                order.push(current);
                stack.extend(node.children().iter().rev());
            }
        }
        order
    }

    /// Every live node, pre-order from the roots.
    fn collect_all_nodes(&self) -> Vec<NodeKey> {
        let mut order = Vec::new();
        for &root in &self.roots {
            order.extend(self.collect_subtree(root));
        }
        order
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        // every system is told about every node it still references before
        // the registry goes away
        let keys = self.collect_all_nodes();
        let Self { nodes, systems, changes, .. } = self;
        for key in keys {
            let mask = nodes[key].mask();
            for entry in systems.entries_mut() {
                if mask.contains(entry.required) {
                    let mut access = NodeAccess::new(nodes, changes);
                    entry.system.unregister_node(&mut access, key);
                }
            }
        }
        log::debug!("scene dropped after {} frames", self.frame);
    }
}
