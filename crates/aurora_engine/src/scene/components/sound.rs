//! Sound emitter component
//!
//! Positional audio source data. Playback is an external collaborator; the
//! sound sync system keeps emitter positions current from world transforms.

use std::any::Any;

use super::super::component::{Component, TypedComponent};
use super::super::mask::ComponentType;
use super::SOUND_EMITTER;

/// Handle to a sound resource owned by the external audio subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SoundId(pub u32);

/// Positional sound source attached to a node.
#[derive(Debug, Clone)]
pub struct SoundEmitterComponent {
    /// Sound resource to play.
    pub sound: SoundId,
    /// Playback volume (0.0 to 1.0).
    pub volume: f32,
    /// Distance beyond which the emitter is inaudible.
    pub max_distance: f32,
    /// Whether playback loops.
    pub looped: bool,
}

impl Default for SoundEmitterComponent {
    fn default() -> Self {
        Self {
            sound: SoundId(0),
            volume: 1.0,
            max_distance: 50.0,
            looped: false,
        }
    }
}

impl SoundEmitterComponent {
    /// Create a looping ambient emitter.
    pub fn looping(sound: SoundId, volume: f32, max_distance: f32) -> Self {
        Self {
            sound,
            volume,
            max_distance,
            looped: true,
        }
    }
}

impl Component for SoundEmitterComponent {
    fn component_type(&self) -> ComponentType {
        SOUND_EMITTER
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

impl TypedComponent for SoundEmitterComponent {
    const TYPE: ComponentType = SOUND_EMITTER;
}
