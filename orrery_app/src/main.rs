//! Orrery demo application
//!
//! Drives the scene runtime headlessly: a sun/planet/moon hierarchy with
//! spinning pivots, lights and sound emitters, updated for a fixed number of
//! frames while the sync systems keep their caches current.

use aurora_engine::prelude::*;

struct OrreryApp {
    scene: Scene,
    sun: NodeKey,
    planet: NodeKey,
    moon: NodeKey,
}

impl OrreryApp {
    fn new() -> Self {
        log::info!("Creating orrery scene...");
        let config = SceneConfig {
            log_frame_stats: true,
            ..SceneConfig::default()
        };
        let mut scene = Scene::with_config(config);

        scene.add_system(
            Box::new(AnimationSystem::new()),
            AnimationSystem::required_mask(),
            true,
            None,
        );
        let render_id = scene.add_system(
            Box::new(RenderSyncSystem::new()),
            RenderSyncSystem::required_mask(),
            true,
            None,
        );
        scene.register_system_for_event(render_id, SceneEvent::VisibilityChanged);
        scene.add_system(
            Box::new(LightSyncSystem::new()),
            LightSyncSystem::required_mask(),
            true,
            None,
        );
        let sound_id = scene.add_system(
            Box::new(SoundSyncSystem::new()),
            SoundSyncSystem::required_mask(),
            true,
            None,
        );
        scene.register_system_for_event(sound_id, SceneEvent::SoundChanged);

        // the sun sits at the origin, glowing and slowly spinning
        let sun = scene.create_named_node("sun", None);
        scene.attach(sun, Box::new(RenderableComponent::new(MeshId(1), MaterialId(1))));
        scene.attach(
            sun,
            Box::new(LightComponent::point(Vec3::new(1.0, 0.95, 0.8), 3.0, 100.0)),
        );
        scene.attach(
            sun,
            Box::new(AnimationComponent::spin(Transform::identity(), Vec3::y(), 0.1)),
        );

        // planet orbit: a spinning pivot under the sun carries the planet
        let planet_pivot = scene.create_named_node("planet_pivot", Some(sun));
        scene.attach(
            planet_pivot,
            Box::new(AnimationComponent::spin(Transform::identity(), Vec3::y(), 0.5)),
        );
        let planet = scene.create_named_node("planet", Some(planet_pivot));
        scene.set_local_transform(planet, Mat4::translation(Vec3::new(10.0, 0.0, 0.0)));
        scene.attach(planet, Box::new(RenderableComponent::new(MeshId(2), MaterialId(2))));
        scene.attach(
            planet,
            Box::new(SoundEmitterComponent::looping(SoundId(1), 0.6, 30.0)),
        );

        // moon orbit around the planet, faster
        let moon_pivot = scene.create_named_node("moon_pivot", Some(planet));
        scene.attach(
            moon_pivot,
            Box::new(AnimationComponent::spin(Transform::identity(), Vec3::y(), 2.0)),
        );
        let moon = scene.create_named_node("moon", Some(moon_pivot));
        scene.set_local_transform(moon, Mat4::translation(Vec3::new(2.0, 0.0, 0.0)));
        scene.attach(moon, Box::new(RenderableComponent::new(MeshId(3), MaterialId(2))));

        log::info!("Scene built: {} nodes", scene.node_count());
        Self { scene, sun, planet, moon }
    }

    fn run(&mut self, frames: u32, dt: f32) {
        for _ in 0..frames {
            self.scene.update(dt);
        }

        let planet_pos = self
            .scene
            .world_transform(self.planet)
            .map(|m| m.translation_part())
            .unwrap_or_default();
        let moon_pos = self
            .scene
            .world_transform(self.moon)
            .map(|m| m.translation_part())
            .unwrap_or_default();
        log::info!(
            "after {} frames: planet at ({:.2}, {:.2}, {:.2}), moon at ({:.2}, {:.2}, {:.2})",
            frames,
            planet_pos.x,
            planet_pos.y,
            planet_pos.z,
            moon_pos.x,
            moon_pos.y,
            moon_pos.z
        );

        if let Some(render_sync) = self.scene.system::<RenderSyncSystem>() {
            log::info!(
                "render cache: {} entries, {} refreshed last frame",
                render_sync.len(),
                render_sync.synced_last_frame()
            );
        }
        if let Some(light_sync) = self.scene.system::<LightSyncSystem>() {
            if let Some(sun_light) = light_sync.entry(self.sun) {
                log::info!(
                    "sun light at ({:.2}, {:.2}, {:.2}), intensity {:.1}",
                    sun_light.position.x,
                    sun_light.position.y,
                    sun_light.position.z,
                    sun_light.intensity
                );
            }
        }
    }
}

fn main() {
    logging::init();

    let mut app = OrreryApp::new();
    app.run(600, 1.0 / 60.0);

    // hide the moon and keep running; the render cache follows
    app.scene.set_visible(app.moon, false);
    app.run(60, 1.0 / 60.0);

    log::info!("orrery demo finished after {} frames", app.scene.frame());
}
