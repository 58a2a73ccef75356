//! 桥接层端到端行为：步进、边界、固定、碰撞查询、卷动、重置

use glam::DVec2;
use stage_physics::{
    BlockArgs, BodyMode, ContactRegion, Costume, EnableMode, JointKind, JointRequest,
    PhysicsBridge, PhysicsConfig, PositionSpace, Scene, SceneGraph, ShapeKind, StagePreset, Target,
    TargetId, Value,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 40×40 像素的方块
fn crate_target(id: u64, name: &str, x: f64, y: f64) -> Target {
    let mut target = Target::new(TargetId(id), name).with_costume(Costume {
        hull_points: vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(40.0, 0.0),
            DVec2::new(40.0, 40.0),
            DVec2::new(0.0, 40.0),
        ],
        skin_size: DVec2::new(40.0, 40.0),
        rotation_center: DVec2::new(20.0, 20.0),
        vector_source: None,
    });
    target.set_xy(x, y, false);
    target
}

fn run(bridge: &mut PhysicsBridge, scene: &mut SceneGraph, ticks: usize) {
    for _ in 0..ticks {
        bridge.step(scene);
    }
}

#[test]
fn test_body_comes_to_rest_on_boxed_floor() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 0.0, 100.0));
    let mut bridge = PhysicsBridge::new();
    bridge.enable(&scene, id, ShapeKind::Costume, EnableMode::Normal);

    run(&mut bridge, &mut scene, 150);

    // 地板上表面 y = -180，方块半高 20
    let y = scene.target(id).unwrap().y();
    assert!((y + 160.0).abs() < 3.0, "y = {y}");
    assert!(bridge.velocity_y(id).abs() < 0.5);
}

#[test]
fn test_stage_presets_and_reset() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 0.0, 0.0));
    let mut bridge = PhysicsBridge::new();
    assert_eq!(bridge.boundary().body_count(), 4);

    bridge.set_stage(StagePreset::Floor);
    assert_eq!(bridge.boundary().body_count(), 5);
    bridge.set_stage(StagePreset::Open);
    assert_eq!(bridge.boundary().body_count(), 0);

    bridge.set_body_mode(&scene, id, BodyMode::Pinned);
    bridge.change_scroll(&mut scene, DVec2::new(10.0, 10.0));
    bridge.define_spring(10.0, 0.1, 1.0);
    assert_eq!(bridge.body_count(), 1);

    bridge.reset();
    assert_eq!(bridge.body_count(), 0);
    assert_eq!(bridge.joints().joint_count(), 0);
    assert_eq!(bridge.scroll_x(), 0.0);
    assert_eq!(bridge.scroll_y(), 0.0);
    assert_eq!(bridge.boundary().preset(), Some(StagePreset::Boxed));
    assert_eq!(bridge.boundary().body_count(), 4);
    assert_eq!(bridge.joints().spring_settings().length, 2.0);
}

#[test]
fn test_pin_then_unpin_leaves_no_joints() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 0.0, 50.0));
    let mut bridge = PhysicsBridge::new();

    bridge.set_body_mode(&scene, id, BodyMode::Pinned);
    assert_eq!(bridge.joints().joint_count(), 1);
    run(&mut bridge, &mut scene, 30);

    // 固定后不会下落
    let target = scene.target(id).unwrap();
    assert!((target.y() - 50.0).abs() < 1.0);

    // 脚本移动固定的角色：固定点跟随，不叠加关节
    scene.target_mut(id).unwrap().set_xy(80.0, 50.0, false);
    run(&mut bridge, &mut scene, 30);
    assert_eq!(bridge.joints().joint_count(), 1);
    assert!((scene.target(id).unwrap().x() - 80.0).abs() < 1.0);

    bridge.set_body_mode(&scene, id, BodyMode::Dynamic);
    assert_eq!(bridge.joints().joint_count(), 0);
    assert_eq!(bridge.world().impulse_joints.len(), 0);
}

#[test]
fn test_pinned_onto_another_body() {
    init_logger();
    let mut scene = SceneGraph::new();
    let wheel = scene.insert(crate_target(1, "wheel", 0.0, 0.0));
    let axle = scene.insert(crate_target(2, "axle", 0.0, 0.0));
    let mut bridge = PhysicsBridge::new();
    bridge.set_body_mode(&scene, wheel, BodyMode::Static);
    run(&mut bridge, &mut scene, 1);

    bridge.set_body_mode(&scene, axle, BodyMode::Pinned);
    let pin = bridge.joints().pin_of(axle).unwrap();
    let entry = bridge.joints().get(pin).unwrap();
    assert_eq!(entry.kind, JointKind::Rotating);
    assert_eq!(entry.body_a, Some(axle));
    assert_eq!(entry.body_b, Some(wheel));
}

#[test]
fn test_pin_finds_body_moved_since_last_step() {
    init_logger();
    let mut scene = SceneGraph::new();
    let wheel = scene.insert(crate_target(1, "wheel", 0.0, 0.0));
    let axle = scene.insert(crate_target(2, "axle", 150.0, 0.0));
    let mut bridge = PhysicsBridge::new();
    bridge.set_body_mode(&scene, wheel, BodyMode::Static);
    run(&mut bridge, &mut scene, 1);

    // 移动后不步进，直接固定
    bridge.set_position(&mut scene, wheel, DVec2::new(150.0, 0.0), PositionSpace::Stage);
    bridge.set_body_mode(&scene, axle, BodyMode::Pinned);
    let pin = bridge.joints().pin_of(axle).unwrap();
    assert_eq!(bridge.joints().get(pin).unwrap().body_b, Some(wheel));
}

#[test]
fn test_touching_feet_versus_any() {
    init_logger();
    let mut scene = SceneGraph::new();
    let lower = scene.insert(crate_target(1, "lower", 0.0, -160.0));
    let upper = scene.insert(crate_target(2, "upper", 0.0, -120.0));
    let mut bridge = PhysicsBridge::new();
    bridge.enable(&scene, lower, ShapeKind::Costume, EnableMode::Normal);
    bridge.enable(&scene, upper, ShapeKind::Costume, EnableMode::Normal);
    run(&mut bridge, &mut scene, 30);

    let any = bridge.touching(&scene, lower, ContactRegion::Any);
    let mut names: Vec<&str> = any.split(',').collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Stage", "upper"]);

    assert_eq!(bridge.touching(&scene, lower, ContactRegion::Feet), "Stage");
    assert_eq!(bridge.touching(&scene, upper, ContactRegion::Feet), "lower");
    assert_eq!(bridge.touching(&scene, TargetId(99), ContactRegion::Any), "");
}

#[test]
fn test_touching_purges_vanished_owner() {
    init_logger();
    let mut scene = SceneGraph::new();
    let lower = scene.insert(crate_target(1, "lower", 0.0, -160.0));
    let upper = scene.insert(crate_target(2, "upper", 0.0, -120.0));
    let mut bridge = PhysicsBridge::new();
    bridge.enable(&scene, lower, ShapeKind::Costume, EnableMode::Normal);
    bridge.enable(&scene, upper, ShapeKind::Costume, EnableMode::Normal);
    run(&mut bridge, &mut scene, 30);

    scene.remove(upper);
    assert_eq!(bridge.touching(&scene, lower, ContactRegion::Any), "Stage");
    assert!(!bridge.has_body(upper));
}

#[test]
fn test_scroll_shifts_targets_by_delta() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 20.0, -160.0));
    let mut bridge = PhysicsBridge::new();
    bridge.enable(&scene, id, ShapeKind::Costume, EnableMode::Normal);
    run(&mut bridge, &mut scene, 60);

    let before = scene.target(id).unwrap().position();
    let body_before = bridge.body_position(id).unwrap();
    bridge.set_scroll(&mut scene, DVec2::new(100.0, -40.0));
    let after = scene.target(id).unwrap().position();

    assert!((after - (before - DVec2::new(100.0, -40.0))).length() < 1e-6);
    assert_eq!(bridge.body_position(id).unwrap(), body_before);
}

#[test]
fn test_removed_target_purged_on_step() {
    init_logger();
    let mut scene = SceneGraph::new();
    let a = scene.insert(crate_target(1, "a", -50.0, 0.0));
    let b = scene.insert(crate_target(2, "b", 50.0, 0.0));
    let mut bridge = PhysicsBridge::with_config(PhysicsConfig {
        stage_preset: StagePreset::Open,
        ..Default::default()
    });
    bridge.enable(&scene, a, ShapeKind::Circle, EnableMode::Normal);
    bridge.enable(&scene, b, ShapeKind::Circle, EnableMode::Normal);
    bridge
        .create_joint(&JointRequest {
            kind: JointKind::Spring,
            body_a: Some(a),
            anchor_a: DVec2::ZERO,
            body_b: Some(b),
            anchor_b: None,
        })
        .unwrap();

    scene.remove(b);
    bridge.step(&mut scene);
    assert!(!bridge.has_body(b));
    assert!(bridge.has_body(a));
    assert_eq!(bridge.joints().joint_count(), 0);
    assert_eq!(bridge.world().impulse_joints.len(), 0);
}

#[test]
fn test_drag_joint_follows_target_point() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 0.0, 0.0));
    let mut bridge = PhysicsBridge::with_config(PhysicsConfig {
        stage_preset: StagePreset::Open,
        ..Default::default()
    });
    bridge.set_gravity(DVec2::ZERO);
    bridge.enable(&scene, id, ShapeKind::Circle, EnableMode::Normal);
    let drag = bridge
        .create_joint(&JointRequest {
            kind: JointKind::Mouse,
            body_a: Some(id),
            anchor_a: DVec2::ZERO,
            body_b: None,
            anchor_b: None,
        })
        .unwrap();
    assert!(bridge.set_drag_target(drag, DVec2::new(0.0, 100.0)));

    run(&mut bridge, &mut scene, 90);
    let y = scene.target(id).unwrap().y();
    assert!((y - 100.0).abs() < 5.0, "y = {y}");
}

#[test]
fn test_block_dispatch_round() {
    init_logger();
    let mut scene = SceneGraph::new();
    let id = scene.insert(crate_target(1, "crate", 0.0, 0.0));
    let mut bridge = PhysicsBridge::new();

    let setup = [
        ("setStage", BlockArgs::new().with("stageType", "floor")),
        ("setGravity", BlockArgs::new().with("gx", 0.0).with("gy", "-10")),
        (
            "setPhysics",
            BlockArgs::new().with("shape", "costume").with("mode", "bullet"),
        ),
        (
            "setPosition",
            BlockArgs::new()
                .with("x", 10.0)
                .with("y", 20.0)
                .with("space", "stage"),
        ),
    ];
    for (opcode, args) in &setup {
        bridge.run_block(&mut scene, opcode, args, id).unwrap();
    }
    assert_eq!(bridge.boundary().body_count(), 5);
    assert_eq!(scene.target(id).unwrap().x(), 10.0);

    for _ in 0..5 {
        bridge
            .run_block(&mut scene, "doTick", &BlockArgs::new(), id)
            .unwrap();
    }
    let vy = bridge
        .run_block(&mut scene, "getVelocityY", &BlockArgs::new(), id)
        .unwrap();
    assert!(vy.to_number() < 0.0);
    assert_eq!(
        bridge
            .run_block(&mut scene, "getStatic", &BlockArgs::new(), id)
            .unwrap(),
        Value::Bool(false)
    );
}
