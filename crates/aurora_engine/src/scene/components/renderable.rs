//! Renderable component
//!
//! Pure data: external mesh/material handles plus render state. The renderer
//! itself is an external collaborator; it observes these through the render
//! sync system's cache.

use std::any::Any;

use super::super::component::{Component, TypedComponent};
use super::super::mask::ComponentType;
use super::RENDERABLE;

/// Handle to a mesh owned by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshId(pub u32);

/// Handle to a material owned by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialId(pub u32);

/// Marks a node as drawable.
#[derive(Debug, Clone, Default)]
pub struct RenderableComponent {
    /// Mesh to draw.
    pub mesh: MeshId,
    /// Material to draw with.
    pub material: MaterialId,
    /// Whether the object writes into shadow maps.
    pub cast_shadows: bool,
}

impl RenderableComponent {
    /// Create a renderable with shadows enabled.
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            mesh,
            material,
            cast_shadows: true,
        }
    }
}

impl Component for RenderableComponent {
    fn component_type(&self) -> ComponentType {
        RENDERABLE
    }

    fn clone_component(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedComponent for RenderableComponent {
    const TYPE: ComponentType = RENDERABLE;
}
