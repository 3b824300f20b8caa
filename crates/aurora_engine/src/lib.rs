//! # Aurora Engine
//!
//! Scene runtime for a real-time 3D engine: the entity/component storage,
//! mask-based system dispatch, immediate event notification and hierarchical
//! world-transform propagation that rendering, lighting and audio subsystems
//! are built on top of.
//!
//! ## Quick Start
//!
//! ```rust
//! use aurora_engine::prelude::*;
//!
//! let mut scene = Scene::new();
//! let root = scene.create_named_node("root", None);
//! let child = scene.create_named_node("child", Some(root));
//!
//! scene.set_local_transform(root, Mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
//! scene.update(0.016);
//!
//! let world = scene.world_transform(child).unwrap();
//! assert_eq!(world.translation_part(), Vec3::new(1.0, 0.0, 0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{Config, ConfigError, SceneConfig};
    pub use crate::foundation::{
        logging,
        math::{Mat4, Mat4Ext, Quat, Transform, Vec3},
    };
    pub use crate::scene::{
        components::{
            AnimationComponent, LightComponent, LightType, MaterialId, MeshId,
            RenderableComponent, SoundEmitterComponent, SoundId, TransformComponent, ANIMATION,
            LIGHT, RENDERABLE, SOUND_EMITTER, TRANSFORM,
        },
        systems::{AnimationSystem, LightSyncSystem, RenderSyncSystem, SoundSyncSystem},
        Component, ComponentMask, ComponentType, Node, NodeAccess, NodeKey, Scene, SceneEvent,
        System, SystemId, TypedComponent,
    };
}
