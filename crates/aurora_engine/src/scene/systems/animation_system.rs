//! Animation system
//!
//! Advances [`AnimationComponent`]s and writes the resulting local transforms
//! in the pre-transform hook, so the propagator picks them up in the same
//! frame and world matrices are final before any consumer runs.

use std::any::Any;
use std::collections::HashSet;

use crate::foundation::math::{Mat4, Unit};

use super::super::access::NodeAccess;
use super::super::components::{AnimationComponent, ANIMATION, TRANSFORM};
use super::super::mask::ComponentMask;
use super::super::node::NodeKey;
use super::super::system::System;

/// Drives spin/orbit animations on registered nodes.
#[derive(Default)]
pub struct AnimationSystem {
    animated: HashSet<NodeKey>,
}

impl AnimationSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Component mask this system should be registered with.
    pub fn required_mask() -> ComponentMask {
        TRANSFORM.bit() | ANIMATION.bit()
    }

    /// Number of currently animated nodes.
    pub fn animated_count(&self) -> usize {
        self.animated.len()
    }
}

impl System for AnimationSystem {
    fn register_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        self.animated.insert(node);
    }

    fn unregister_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        self.animated.remove(&node);
    }

    fn pre_transform(&mut self, nodes: &mut NodeAccess, dt: f32) {
        for &key in &self.animated {
            let Some(node) = nodes.get(key) else {
                continue;
            };
            let Some(animation) = node.get::<AnimationComponent>() else {
                continue;
            };
            if !animation.playing || animation.speed == 0.0 {
                continue;
            }

            let angle = animation.angle + animation.speed * dt;
            let axis = Unit::new_normalize(animation.axis);
            let local = animation.base.to_matrix() * Mat4::from_axis_angle(&axis, angle);

            if let Some(animation) = nodes
                .get_mut(key)
                .and_then(|n| n.get_mut::<AnimationComponent>())
            {
                animation.angle = angle;
            }
            nodes.set_local_transform(key, local);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
