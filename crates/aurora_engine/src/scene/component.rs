//! Component trait and type-indexed component factory
//!
//! Components are pure-data capability units owned exclusively by their node.
//! Each concrete type carries a stable [`ComponentType`] tag; the registry
//! maps tags to factory functions so collaborators can create components
//! generically without a type switch.

use std::any::Any;

use super::mask::{ComponentType, MAX_COMPONENT_TYPES};

/// Object-safe component interface.
///
/// Concrete components are plain data; all logic lives in systems. The trait
/// only exposes the type tag, the clone-into-new-node lifecycle hook and
/// `Any` downcasting.
pub trait Component: Any {
    /// Stable type tag; determines this component's mask bit.
    fn component_type(&self) -> ComponentType;

    /// Clone this component for attachment to another node.
    fn clone_component(&self) -> Box<dyn Component>;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Compile-time tag lookup, implemented by every concrete component type.
///
/// Lets callers write `node.get::<LightComponent>()` instead of passing the
/// tag separately.
pub trait TypedComponent: Component + Sized {
    /// The type tag shared by all instances of this component type.
    const TYPE: ComponentType;
}

/// Factory function producing a default-initialized component.
pub type ComponentFactory = fn() -> Box<dyn Component>;

struct RegisteredType {
    name: &'static str,
    factory: ComponentFactory,
}

/// Type-indexed component factory.
///
/// Component types are registered once at startup; creating an unregistered
/// tag is a programmer error (asserted in debug builds, `None` in release).
#[derive(Default)]
pub struct ComponentRegistry {
    types: Vec<Option<RegisteredType>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under its tag.
    ///
    /// Registering the same tag twice is a programmer error.
    pub fn register(&mut self, ty: ComponentType, name: &'static str, factory: ComponentFactory) {
        let index = ty.index();
        debug_assert!(index < MAX_COMPONENT_TYPES);

        if self.types.len() <= index {
            self.types.resize_with(index + 1, || None);
        }

        debug_assert!(
            self.types[index].is_none(),
            "component type {index} registered twice"
        );
        log::debug!("registered component type {index} ({name})");
        self.types[index] = Some(RegisteredType { name, factory });
    }

    /// Create a component instance by type tag.
    ///
    /// Returns `None` (after a debug assertion) for unregistered tags.
    pub fn create(&self, ty: ComponentType) -> Option<Box<dyn Component>> {
        let registered = self.types.get(ty.index()).and_then(Option::as_ref);
        debug_assert!(
            registered.is_some(),
            "create for unregistered component type {}",
            ty.index()
        );
        if registered.is_none() {
            log::error!("create for unregistered component type {}", ty.index());
        }
        registered.map(|r| (r.factory)())
    }

    /// Whether a tag has been registered.
    pub fn is_registered(&self, ty: ComponentType) -> bool {
        self.types
            .get(ty.index())
            .and_then(Option::as_ref)
            .is_some()
    }

    /// Human-readable name for a registered tag.
    pub fn name(&self, ty: ComponentType) -> Option<&'static str> {
        self.types
            .get(ty.index())
            .and_then(Option::as_ref)
            .map(|r| r.name)
    }
}
