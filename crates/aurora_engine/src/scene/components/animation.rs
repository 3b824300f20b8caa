//! Animation component
//!
//! Data for the built-in orbit/spin animation: a base local transform plus a
//! rotation that advances every frame. The animation system evaluates this in
//! its pre-transform hook, before world matrices are propagated.

use std::any::Any;

use crate::foundation::math::{Transform, Vec3};

use super::super::component::{Component, TypedComponent};
use super::super::mask::ComponentType;
use super::ANIMATION;

/// Continuous rotation applied to a node's local transform.
#[derive(Debug, Clone)]
pub struct AnimationComponent {
    /// Local transform the rotation is applied on top of.
    pub base: Transform,
    /// Rotation axis (normalized on evaluation).
    pub axis: Vec3,
    /// Angular speed in radians per second.
    pub speed: f32,
    /// Accumulated angle in radians, advanced by the animation system.
    pub angle: f32,
    /// Whether the animation advances.
    pub playing: bool,
}

impl Default for AnimationComponent {
    fn default() -> Self {
        Self {
            base: Transform::identity(),
            axis: Vec3::y(),
            speed: 1.0,
            angle: 0.0,
            playing: true,
        }
    }
}

impl AnimationComponent {
    /// Create a spin around the given axis on top of a base transform.
    pub fn spin(base: Transform, axis: Vec3, speed: f32) -> Self {
        Self {
            base,
            axis,
            speed,
            angle: 0.0,
            playing: true,
        }
    }
}

impl Component for AnimationComponent {
    fn component_type(&self) -> ComponentType {
        ANIMATION
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

impl TypedComponent for AnimationComponent {
    const TYPE: ComponentType = ANIMATION;
}
