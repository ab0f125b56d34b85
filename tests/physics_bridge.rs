use dicebox::body::{BodyDefinition, Pose};
use dicebox::config::{AppConfig, D6Config, DieKind, DiePlacement};
use dicebox::events::DiceEvent;
use dicebox::physics::{BodyId, PhysicsBridge};
use dicebox::roller::ImpulseVector;
use dicebox::texture::TextureGenerator;
use dicebox::DiceApp;
use glam::Vec3;

fn single_d6_config() -> AppConfig {
    AppConfig { dice: vec![DiePlacement::new(DieKind::D6, [0.0, 0.0, 2.0])], ..AppConfig::default() }
}

#[test]
fn dropped_d6_lands_flat_on_the_floor() {
    let mut app = DiceApp::new(&single_d6_config()).expect("app builds");
    let die = app.dice()[0];
    for _ in 0..300 {
        app.step_fixed();
    }
    let (position, _) = app.bridge().pose(die).expect("die pose");
    assert!((position.z - 1.25).abs() < 0.05, "die should rest on its face, z = {}", position.z);
    assert!(position.x.abs() < 0.1 && position.y.abs() < 0.1);
    assert_eq!(app.face_up(die), Some(5));
}

#[test]
fn click_launches_the_die() {
    let mut app = DiceApp::new(&single_d6_config()).unwrap();
    let die = app.dice()[0];
    for _ in 0..120 {
        app.step_fixed();
    }
    let outcome = app.click(die).expect("die reacts to clicks");
    assert!((1..=6).contains(&outcome));
    let speed = app.bridge().linear_velocity(die).unwrap().length();
    assert!(speed > 1.0, "impulse should move the die, speed = {speed}");

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(e, DiceEvent::Rolled { body, outcome: o, .. } if *body == die && *o == outcome)));
}

#[test]
fn planes_do_not_react_to_clicks_or_impulses() {
    let mut app = DiceApp::new(&single_d6_config()).unwrap();
    assert!(app.click(BodyId::new(0)).is_err());
    assert!(app.click(BodyId::new(99)).is_err());

    let config = AppConfig::default();
    let floor = BodyDefinition::plane("floor", config.enclosure.color, Pose::default()).unwrap();
    let mut bridge = PhysicsBridge::new(Vec3::new(0.0, 0.0, -30.0));
    let floor_id = bridge.spawn(&floor).unwrap();
    assert!(bridge.apply_impulse(floor_id, ImpulseVector::at_origin(Vec3::Z)).is_err());
}

#[test]
fn empty_enclosure_runs() {
    let config = AppConfig { dice: Vec::new(), ..AppConfig::default() };
    let mut app = DiceApp::new(&config).unwrap();
    assert!(app.dice().is_empty());
    assert_eq!(app.bridge().body_count(), 5);
    assert_eq!(app.run_until_rest(10), 1);
    assert!((5..=6).contains(&app.advance(0.1)));
}

#[test]
fn drop_reports_spawn_contact_and_settle() {
    let mut app = DiceApp::new(&single_d6_config()).unwrap();
    app.run_until_rest(600);
    let events = app.drain_events();

    let spawned = events.iter().filter(|e| matches!(e, DiceEvent::BodySpawned { .. })).count();
    assert_eq!(spawned, 6);
    let die = app.dice()[0];
    assert!(events.iter().any(|e| matches!(e, DiceEvent::CollisionStarted { a, b } if *a == BodyId::new(0) && *b == die)));
    assert!(events.iter().any(|e| matches!(e, DiceEvent::Settled { body, .. } if *body == die)));
    assert!(app.drain_events().is_empty());
}

#[test]
fn tetrahedron_collider_drops_onto_the_floor() {
    let config = AppConfig { dice: vec![DiePlacement::new(DieKind::D4, [0.0, 0.0, 4.0])], ..AppConfig::default() };
    let mut app = DiceApp::new(&config).unwrap();
    let die = app.dice()[0];
    for _ in 0..400 {
        app.step_fixed();
    }
    let (position, _) = app.bridge().pose(die).unwrap();
    assert!(position.z > 0.0 && position.z < 2.0, "d4 should come to rest near the floor, z = {}", position.z);
    assert!(app.face_up(die).is_some());
}

#[test]
fn standalone_bridge_spawns_in_order() {
    let die = BodyDefinition::d6("die", &D6Config::default(), &TextureGenerator::new(100.0, 1.0).unwrap(), Pose::at(Vec3::Z * 3.0))
        .unwrap();
    let mut bridge = PhysicsBridge::new(Vec3::new(0.0, 0.0, -30.0));
    let a = bridge.spawn(&die).unwrap();
    let b = bridge.spawn(&die).unwrap();
    assert_eq!((a.index(), b.index()), (0, 1));
    bridge.step(1.0 / 60.0);
    assert!(bridge.linear_velocity(a).unwrap().z < 0.0);
}
