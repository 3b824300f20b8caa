//! Built-in systems driving and consuming the scene runtime
//!
//! These follow the same contract any external subsystem would: declare a
//! required component mask, receive register/unregister callbacks, and do
//! batched per-frame work. The sync systems keep renderer/lighting/audio
//! facing caches current by draining the per-frame change buffer instead of
//! subscribing to low-level transform events.

mod animation_system;
mod light_sync;
mod render_sync;
mod sound_sync;

pub use animation_system::AnimationSystem;
pub use light_sync::{LightSyncSystem, SyncedLight};
pub use render_sync::{RenderSyncSystem, SyncedRenderable};
pub use sound_sync::{SoundSyncSystem, SyncedEmitter};
