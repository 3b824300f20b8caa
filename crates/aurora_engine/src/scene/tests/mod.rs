//! Scene-level integration tests
//!
//! Exercise the full contract: synchronous registration transitions, process
//! ordering around the transform propagator, the grouped world-transform
//! flush, buffer consumption by the sync systems, and teardown guarantees.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Mat4, Mat4Ext, Transform, Vec3};
use crate::scene::access::NodeAccess;
use crate::scene::components::{
    AnimationComponent, LightComponent, RenderableComponent, SoundEmitterComponent, MaterialId,
    MeshId, SoundId, LIGHT, RENDERABLE, SOUND_EMITTER, TRANSFORM,
};
use crate::scene::events::SceneEvent;
use crate::scene::mask::ComponentType;
use crate::scene::node::NodeKey;
use crate::scene::system::System;
use crate::scene::systems::{
    AnimationSystem, LightSyncSystem, RenderSyncSystem, SoundSyncSystem,
};
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    RegisterNode(NodeKey),
    UnregisterNode(NodeKey, bool),
    RegisterComponent(NodeKey, usize),
    UnregisterComponent(NodeKey, usize, bool),
    Event(Option<NodeKey>, SceneEvent),
    Group(usize, SceneEvent),
    ProcessChanges(Vec<NodeKey>),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

/// Test system recording every hook invocation.
struct Recorder {
    log: CallLog,
}

impl Recorder {
    fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl System for Recorder {
    fn register_node(&mut self, _nodes: &mut NodeAccess, node: NodeKey) {
        self.log.borrow_mut().push(Call::RegisterNode(node));
    }

    fn unregister_node(&mut self, nodes: &mut NodeAccess, node: NodeKey) {
        self.log
            .borrow_mut()
            .push(Call::UnregisterNode(node, nodes.contains(node)));
    }

    fn register_component(&mut self, _nodes: &mut NodeAccess, node: NodeKey, ty: ComponentType) {
        self.log
            .borrow_mut()
            .push(Call::RegisterComponent(node, ty.index()));
    }

    fn unregister_component(&mut self, nodes: &mut NodeAccess, node: NodeKey, ty: ComponentType) {
        self.log.borrow_mut().push(Call::UnregisterComponent(
            node,
            ty.index(),
            nodes.contains(node),
        ));
    }

    fn immediate_event(&mut self, _nodes: &mut NodeAccess, node: Option<NodeKey>, event: SceneEvent) {
        self.log.borrow_mut().push(Call::Event(node, event));
    }

    fn group_event(&mut self, _nodes: &mut NodeAccess, group: &[NodeKey], event: SceneEvent) {
        self.log.borrow_mut().push(Call::Group(group.len(), event));
    }

    fn process(&mut self, nodes: &mut NodeAccess, _dt: f32) {
        let mut changed: Vec<NodeKey> = nodes.changes().nodes_with(TRANSFORM.bit()).collect();
        changed.sort();
        self.log.borrow_mut().push(Call::ProcessChanges(changed));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Test system recording pre/process/post ordering into a shared log.
struct OrderProbe {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl System for OrderProbe {
    fn process(&mut self, _nodes: &mut NodeAccess, _dt: f32) {
        self.log.borrow_mut().push(format!("{}:process", self.name));
    }

    fn pre_transform(&mut self, _nodes: &mut NodeAccess, _dt: f32) {
        self.log.borrow_mut().push(format!("{}:pre", self.name));
    }

    fn post_transform(&mut self, _nodes: &mut NodeAccess, _dt: f32) {
        self.log.borrow_mut().push(format!("{}:post", self.name));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn count(log: &CallLog, predicate: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| predicate(c)).count()
}

fn assert_mask_consistent(scene: &Scene, key: NodeKey) {
    let node = scene.node(key).unwrap();
    let mut expected = crate::scene::mask::ComponentMask::EMPTY;
    for component in node.components() {
        expected.insert(component.component_type());
    }
    assert_eq!(node.mask(), expected, "mask out of sync with components");
}

#[test]
fn test_register_unregister_exactly_once_per_transition() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit() | LIGHT.bit(),
        false,
        None,
    );

    // transform alone does not satisfy the mask
    let node = scene.create_node(None);
    assert_eq!(count(&log, |c| matches!(c, Call::RegisterNode(_))), 0);

    // attach -> single transition in
    scene.attach(node, Box::new(LightComponent::default()));
    assert_eq!(
        count(&log, |c| matches!(c, Call::RegisterComponent(..))),
        1
    );

    // attaching an unrelated component is not a transition
    scene.attach(node, Box::new(SoundEmitterComponent::default()));
    assert_eq!(
        count(&log, |c| matches!(c, Call::RegisterComponent(..))),
        1
    );

    // detaching the unrelated component is not a transition either
    scene.detach(node, SOUND_EMITTER);
    assert_eq!(
        count(&log, |c| matches!(c, Call::UnregisterComponent(..))),
        0
    );

    // detach -> single transition out
    scene.detach(node, LIGHT);
    assert_eq!(
        count(&log, |c| matches!(c, Call::UnregisterComponent(..))),
        1
    );

    // re-attach -> a new transition
    scene.attach(node, Box::new(LightComponent::default()));
    assert_eq!(
        count(&log, |c| matches!(c, Call::RegisterComponent(..))),
        2
    );
    assert_mask_consistent(&scene, node);

    // destruction -> exactly one transition out, node still alive during it
    scene.remove_node(node);
    let unregisters: Vec<Call> = log
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::UnregisterComponent(..)))
        .cloned()
        .collect();
    assert_eq!(unregisters.len(), 2);
    assert_eq!(
        unregisters[1],
        Call::UnregisterComponent(node, LIGHT.index(), true)
    );
}

#[test]
fn test_add_system_registers_existing_nodes() {
    let mut scene = Scene::new();
    let lit = scene.create_node(None);
    scene.attach(lit, Box::new(LightComponent::default()));
    let unlit = scene.create_node(None);
    let lit_child = scene.create_node(Some(unlit));
    scene.attach(lit_child, Box::new(LightComponent::default()));

    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit() | LIGHT.bit(),
        false,
        None,
    );

    let registered: Vec<Call> = log.borrow().clone();
    assert_eq!(
        registered,
        vec![Call::RegisterNode(lit), Call::RegisterNode(lit_child)]
    );
}

#[test]
fn test_remove_system_unregisters_matching_nodes() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    let id = scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit(),
        false,
        None,
    );
    let a = scene.create_node(None);
    let b = scene.create_node(Some(a));

    let removed = scene.remove_system(id);
    assert!(removed.is_some());

    let unregistered: Vec<Call> = log
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::UnregisterNode(..)))
        .cloned()
        .collect();
    assert_eq!(
        unregistered,
        vec![Call::UnregisterNode(a, true), Call::UnregisterNode(b, true)]
    );
}

#[test]
fn test_scene_drop_unregisters_everything() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    {
        let mut scene = Scene::new();
        scene.add_system(
            Box::new(Recorder::new(log.clone())),
            TRANSFORM.bit(),
            false,
            None,
        );
        scene.create_node(None);
        scene.create_node(None);
    }
    assert_eq!(count(&log, |c| matches!(c, Call::UnregisterNode(_, true))), 2);
}

#[test]
fn test_process_order_and_transform_hooks() {
    let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();

    let transform_id = scene.transform_system_id();
    scene.add_system(
        Box::new(OrderProbe { name: "after", log: order.clone() }),
        TRANSFORM.bit(),
        true,
        None,
    );
    scene.add_system(
        Box::new(OrderProbe { name: "before", log: order.clone() }),
        TRANSFORM.bit(),
        true,
        Some(transform_id),
    );

    scene.update(0.016);

    let expected = vec![
        "before:process",
        "before:pre", // hooks run in process-list order: before, transform, after
        "after:pre",
        "before:post",
        "after:post",
        "after:process",
    ];
    assert_eq!(*order.borrow(), expected);
}

#[test]
fn test_change_buffer_seen_by_consumer_and_cleared() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit(),
        true,
        None,
    );

    let a = scene.create_named_node("a", None);
    let b = scene.create_named_node("b", Some(a));
    let c = scene.create_named_node("c", Some(b));
    scene.update(0.016);
    log.borrow_mut().clear();

    scene.set_local_transform(a, Mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
    scene.update(0.016);

    let mut expected = vec![a, b, c];
    expected.sort();
    assert_eq!(
        *log.borrow(),
        vec![Call::ProcessChanges(expected)],
        "consumer sees exactly the changed subtree"
    );

    // buffer cleared at end of frame: next process sees nothing
    log.borrow_mut().clear();
    scene.update(0.016);
    assert_eq!(*log.borrow(), vec![Call::ProcessChanges(Vec::new())]);
}

#[test]
fn test_world_transform_flush_is_grouped() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    let id = scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit(),
        false,
        None,
    );
    scene.register_system_for_event(id, SceneEvent::WorldTransformChanged);

    let root = scene.create_node(None);
    let _left = scene.create_node(Some(root));
    let _right = scene.create_node(Some(root));
    scene.update(0.016);
    log.borrow_mut().clear();

    scene.set_local_transform(root, Mat4::translation(Vec3::new(0.0, 1.0, 0.0)));
    scene.update(0.016);

    // one call covering the whole changed set, not one call per node
    assert_eq!(
        *log.borrow(),
        vec![Call::Group(3, SceneEvent::WorldTransformChanged)]
    );
}

#[test]
fn test_reparent_recomposes_against_new_parent() {
    let mut scene = Scene::new();
    let a = scene.create_named_node("a", None);
    let b = scene.create_named_node("b", Some(a));
    let c = scene.create_named_node("c", Some(b));

    scene.set_local_transform(b, Mat4::translation(Vec3::new(0.0, 5.0, 0.0)));
    scene.update(0.016);
    assert_eq!(
        scene.world_transform(c).unwrap().translation_part(),
        Vec3::new(0.0, 5.0, 0.0)
    );

    scene.reparent(c, Some(a));
    scene.set_local_transform(a, Mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
    scene.update(0.016);

    // c now composes with a's world, not b's
    assert_eq!(
        scene.world_transform(c).unwrap().translation_part(),
        Vec3::new(1.0, 0.0, 0.0)
    );
    assert_eq!(scene.node(a).unwrap().children(), &[b, c]);
    assert!(scene.node(b).unwrap().children().is_empty());
}

#[test]
fn test_remove_node_purges_change_buffer() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit(),
        true,
        None,
    );

    let doomed = scene.create_node(None);
    let survivor = scene.create_node(None);
    scene.update(0.016);
    log.borrow_mut().clear();

    // both marked, one destroyed before the frame runs
    scene.set_local_transform(doomed, Mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
    scene.set_local_transform(survivor, Mat4::translation(Vec3::new(2.0, 0.0, 0.0)));
    scene.remove_node(doomed);
    scene.update(0.016);

    let processed: Vec<Call> = log
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::ProcessChanges(_)))
        .cloned()
        .collect();
    assert_eq!(processed, vec![Call::ProcessChanges(vec![survivor])]);
}

#[test]
fn test_animation_drives_world_before_consumers() {
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(AnimationSystem::new()),
        AnimationSystem::required_mask(),
        true,
        None,
    );
    scene.add_system(
        Box::new(RenderSyncSystem::new()),
        RenderSyncSystem::required_mask(),
        true,
        None,
    );

    let pivot = scene.create_named_node("pivot", None);
    scene.attach(
        pivot,
        Box::new(AnimationComponent::spin(
            Transform::identity(),
            Vec3::y(),
            std::f32::consts::PI, // half a turn per second
        )),
    );
    let satellite = scene.create_named_node("satellite", Some(pivot));
    scene.set_local_transform(satellite, Mat4::translation(Vec3::new(2.0, 0.0, 0.0)));
    scene.attach(
        satellite,
        Box::new(RenderableComponent::new(MeshId(1), MaterialId(1))),
    );

    // one second of simulation in four steps: half a turn around Y
    for _ in 0..4 {
        scene.update(0.25);
    }

    let world = scene.world_transform(satellite).unwrap().translation_part();
    assert!((world.x - (-2.0)).abs() < 1e-4, "x = {}", world.x);
    assert!(world.z.abs() < 1e-4, "z = {}", world.z);

    // the render cache was refreshed in the same frame as the last step
    let sync = scene.system::<RenderSyncSystem>().unwrap();
    let entry = sync.entry(satellite).unwrap();
    assert_eq!(entry.position, world);
    assert!(sync.synced_last_frame() >= 1);
}

#[test]
fn test_light_sync_follows_moves() {
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(LightSyncSystem::new()),
        LightSyncSystem::required_mask(),
        true,
        None,
    );

    let lamp = scene.create_named_node("lamp", None);
    scene.attach(
        lamp,
        Box::new(LightComponent::point(Vec3::new(1.0, 0.9, 0.8), 2.0, 30.0)),
    );
    scene.set_local_transform(lamp, Mat4::translation(Vec3::new(0.0, 3.0, 0.0)));
    scene.update(0.016);

    let sync = scene.system::<LightSyncSystem>().unwrap();
    let entry = sync.entry(lamp).unwrap();
    assert_eq!(entry.position, Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(entry.intensity, 2.0);
}

#[test]
fn test_sound_sync_event_refresh() {
    let mut scene = Scene::new();
    let id = scene.add_system(
        Box::new(SoundSyncSystem::new()),
        SoundSyncSystem::required_mask(),
        true,
        None,
    );
    scene.register_system_for_event(id, SceneEvent::SoundChanged);

    let emitter = scene.create_named_node("emitter", None);
    scene.attach(
        emitter,
        Box::new(SoundEmitterComponent::looping(SoundId(7), 0.5, 40.0)),
    );
    scene.update(0.016);

    // edit playback parameters, then raise the domain event
    scene
        .node_mut(emitter)
        .unwrap()
        .get_mut::<SoundEmitterComponent>()
        .unwrap()
        .volume = 0.9;
    scene.notify_all_systems(emitter, SceneEvent::SoundChanged);

    let sync = scene.system::<SoundSyncSystem>().unwrap();
    assert_eq!(sync.entry(emitter).unwrap().volume, 0.9);
}

#[test]
fn test_visibility_event_updates_render_cache() {
    let mut scene = Scene::new();
    let id = scene.add_system(
        Box::new(RenderSyncSystem::new()),
        RenderSyncSystem::required_mask(),
        true,
        None,
    );
    scene.register_system_for_event(id, SceneEvent::VisibilityChanged);

    let node = scene.create_node(None);
    scene.attach(
        node,
        Box::new(RenderableComponent::new(MeshId(2), MaterialId(3))),
    );
    scene.update(0.016);
    assert!(scene.system::<RenderSyncSystem>().unwrap().entry(node).unwrap().visible);

    scene.set_visible(node, false);
    assert!(!scene.system::<RenderSyncSystem>().unwrap().entry(node).unwrap().visible);
}

#[test]
fn test_config_change_broadcast() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    let id = scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit(),
        false,
        None,
    );
    scene.register_system_for_event(id, SceneEvent::ConfigChanged);

    let mut config = scene.config().clone();
    config.log_frame_stats = true;
    scene.set_config(config).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![Call::Event(None, SceneEvent::ConfigChanged)]
    );
    assert!(scene.config().log_frame_stats);
}

#[test]
fn test_clone_subtree_clones_components_and_children() {
    let mut scene = Scene::new();
    scene.add_system(
        Box::new(RenderSyncSystem::new()),
        RenderSyncSystem::required_mask(),
        true,
        None,
    );

    let original = scene.create_named_node("prop", None);
    scene.set_local_transform(original, Mat4::translation(Vec3::new(4.0, 0.0, 0.0)));
    scene.attach(
        original,
        Box::new(RenderableComponent::new(MeshId(9), MaterialId(2))),
    );
    let child = scene.create_named_node("prop_child", Some(original));
    scene.attach(
        child,
        Box::new(LightComponent::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0)),
    );

    let clone = scene.clone_subtree(original, None).unwrap();
    assert_ne!(clone, original);
    assert_eq!(scene.node(clone).unwrap().name(), "prop");
    assert!(scene.node(clone).unwrap().mask().has(RENDERABLE));
    assert_eq!(scene.local_transform(clone), scene.local_transform(original));

    let clone_child = scene.node(clone).unwrap().children()[0];
    assert_eq!(scene.node(clone_child).unwrap().name(), "prop_child");
    assert!(scene.node(clone_child).unwrap().mask().has(LIGHT));

    // the clone registered with the render sync system on attach
    assert_eq!(scene.system::<RenderSyncSystem>().unwrap().len(), 2);
    assert_mask_consistent(&scene, clone);
    assert_mask_consistent(&scene, clone_child);
}

#[test]
fn test_find_by_name_depth_first() {
    let mut scene = Scene::new();
    let root = scene.create_named_node("root", None);
    let inner = scene.create_named_node("inner", Some(root));
    let target = scene.create_named_node("target", Some(inner));

    assert_eq!(scene.find_by_name("target"), Some(target));
    assert_eq!(scene.find_by_name("missing"), None);
}

#[test]
fn test_attach_by_type_uses_registry() {
    let mut scene = Scene::new();
    let node = scene.create_node(None);

    scene.attach_by_type(node, LIGHT);
    assert!(scene.node(node).unwrap().get::<LightComponent>().is_some());
    assert_mask_consistent(&scene, node);
}

#[test]
fn test_notify_system_is_direct_and_unfiltered() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut scene = Scene::new();
    // required mask the node does not satisfy
    let id = scene.add_system(
        Box::new(Recorder::new(log.clone())),
        TRANSFORM.bit() | LIGHT.bit(),
        false,
        None,
    );
    let node = scene.create_node(None);

    scene.notify_system(id, Some(node), SceneEvent::DecalChanged);
    assert_eq!(
        *log.borrow(),
        vec![Call::Event(Some(node), SceneEvent::DecalChanged)]
    );
}
