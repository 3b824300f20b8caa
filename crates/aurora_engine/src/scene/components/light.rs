//! Light component
//!
//! Pure data component for lights; position and direction in world space are
//! derived from the owning node's world transform by the light sync system.

use std::any::Any;

use crate::foundation::math::Vec3;

use super::super::component::{Component, TypedComponent};
use super::super::mask::ComponentType;
use super::LIGHT;

/// Types of lights supported by the lighting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight) with parallel rays.
    Directional,
    /// Point light that radiates in all directions from a position.
    Point,
}

/// Light source attached to a node.
#[derive(Debug, Clone)]
pub struct LightComponent {
    /// The type of light.
    pub light_type: LightType,
    /// RGB color values (0.0 to 1.0 range).
    pub color: Vec3,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Maximum range for point lights.
    pub range: f32,
    /// Whether the light is currently active.
    pub enabled: bool,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)
    }
}

impl LightComponent {
    /// Create a directional light.
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
            range: 0.0,
            enabled: true,
        }
    }

    /// Create a point light.
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color,
            intensity,
            range,
            enabled: true,
        }
    }
}

impl Component for LightComponent {
    fn component_type(&self) -> ComponentType {
        LIGHT
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

impl TypedComponent for LightComponent {
    const TYPE: ComponentType = LIGHT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_defaults() {
        let light = LightComponent::point(Vec3::new(1.0, 0.5, 0.25), 2.0, 15.0);

        assert_eq!(light.light_type, LightType::Point);
        assert_eq!(light.range, 15.0);
        assert!(light.enabled);
    }

    #[test]
    fn test_directional_light_has_no_range() {
        let light = LightComponent::directional(Vec3::new(1.0, 1.0, 1.0), 1.5);

        assert_eq!(light.light_type, LightType::Directional);
        assert_eq!(light.range, 0.0);
    }
}
