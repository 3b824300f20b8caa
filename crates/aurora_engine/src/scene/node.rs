//! Scene node: hierarchical container owning components
//!
//! Nodes live in the scene's slot map and are addressed by generational
//! [`NodeKey`]s, so a key held after the node is destroyed resolves to `None`
//! instead of dangling. A node owns its components (sorted by type tag) and
//! its children; the parent link is non-owning.

use bitflags::bitflags;
use slotmap::new_key_type;

use super::component::{Component, TypedComponent};
use super::mask::{ComponentMask, ComponentType};

new_key_type! {
    /// Generational handle to a scene node.
    pub struct NodeKey;
}

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// Node (and its subtree) participates in rendering-facing systems.
        const VISIBLE = 1;
        /// Local transform changed and the world matrix is stale.
        const NEED_UPDATE = 1 << 1;
        /// Some descendant (possibly this node) needs a transform update, so
        /// a downward walk must visit this node.
        const DIRTY = 1 << 2;
    }
}

/// Hierarchical scene element.
pub struct Node {
    name: String,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    mask: ComponentMask,
    pub(crate) flags: NodeFlags,
    components: Vec<Box<dyn Component>>,
}

impl Node {
    pub(crate) fn new(name: String, parent: Option<NodeKey>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            mask: ComponentMask::EMPTY,
            flags: NodeFlags::VISIBLE,
            components: Vec::new(),
        }
    }

    /// Node name (not required to be unique).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Parent key, `None` for roots.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeKey>) {
        self.parent = parent;
    }

    /// Ordered child keys.
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.children
    }

    /// Union of the type bits of currently attached components.
    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Current state bits.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether the node is visible to rendering-facing systems.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.flags.set(NodeFlags::VISIBLE, visible);
    }

    /// Insert a component, keeping the list sorted by type tag and the mask
    /// in sync. Returns the replaced instance if the type was already
    /// attached (a programmer error, asserted in debug builds).
    pub(crate) fn attach_raw(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        let ty = component.component_type();
        match self
            .components
            .binary_search_by_key(&ty, |c| c.component_type())
        {
            Ok(position) => {
                debug_assert!(false, "component type {} attached twice", ty.index());
                log::warn!(
                    "node '{}': component type {} attached twice, replacing",
                    self.name,
                    ty.index()
                );
                Some(std::mem::replace(&mut self.components[position], component))
            }
            Err(position) => {
                self.components.insert(position, component);
                self.mask.insert(ty);
                None
            }
        }
    }

    /// Remove the component of the given type, clearing its mask bit.
    pub(crate) fn detach_raw(&mut self, ty: ComponentType) -> Option<Box<dyn Component>> {
        match self
            .components
            .binary_search_by_key(&ty, |c| c.component_type())
        {
            Ok(position) => {
                self.mask.remove(ty);
                Some(self.components.remove(position))
            }
            Err(_) => None,
        }
    }

    /// Untyped component lookup.
    pub fn component(&self, ty: ComponentType) -> Option<&dyn Component> {
        self.components
            .binary_search_by_key(&ty, |c| c.component_type())
            .ok()
            .map(|position| self.components[position].as_ref())
    }

    /// Untyped mutable component lookup.
    pub fn component_mut(&mut self, ty: ComponentType) -> Option<&mut dyn Component> {
        self.components
            .binary_search_by_key(&ty, |c| c.component_type())
            .ok()
            .map(|position| self.components[position].as_mut())
    }

    /// Typed component lookup.
    pub fn get<T: TypedComponent>(&self) -> Option<&T> {
        self.component(T::TYPE)?.as_any().downcast_ref()
    }

    /// Typed mutable component lookup.
    pub fn get_mut<T: TypedComponent>(&mut self) -> Option<&mut T> {
        self.component_mut(T::TYPE)?.as_any_mut().downcast_mut()
    }

    /// Iterate attached components in type-tag order.
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(AsRef::as_ref)
    }

    /// Number of attached components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
