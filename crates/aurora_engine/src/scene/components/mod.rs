//! Built-in component types
//!
//! Pure data components: all logic lives in systems. Each type owns one tag
//! (and therefore one mask bit); external subsystems register their own types
//! in the unused tag range.

mod animation;
mod light;
mod renderable;
mod sound;
mod transform;

pub use animation::AnimationComponent;
pub use light::{LightComponent, LightType};
pub use renderable::{MaterialId, MeshId, RenderableComponent};
pub use sound::{SoundEmitterComponent, SoundId};
pub use transform::TransformComponent;

use super::component::ComponentRegistry;
use super::mask::ComponentType;

/// Tag of [`TransformComponent`]; attached to every node.
pub const TRANSFORM: ComponentType = ComponentType::new(0);

/// Tag of [`RenderableComponent`].
pub const RENDERABLE: ComponentType = ComponentType::new(1);

/// Tag of [`LightComponent`].
pub const LIGHT: ComponentType = ComponentType::new(2);

/// Tag of [`SoundEmitterComponent`].
pub const SOUND_EMITTER: ComponentType = ComponentType::new(3);

/// Tag of [`AnimationComponent`].
pub const ANIMATION: ComponentType = ComponentType::new(4);

/// Register the built-in component types with a registry.
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry.register(TRANSFORM, "Transform", || {
        Box::new(TransformComponent::default())
    });
    registry.register(RENDERABLE, "Renderable", || {
        Box::new(RenderableComponent::default())
    });
    registry.register(LIGHT, "Light", || Box::new(LightComponent::default()));
    registry.register(SOUND_EMITTER, "SoundEmitter", || {
        Box::new(SoundEmitterComponent::default())
    });
    registry.register(ANIMATION, "Animation", || {
        Box::new(AnimationComponent::default())
    });
}
