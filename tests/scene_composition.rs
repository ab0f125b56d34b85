use dicebox::body::{BodyDefinition, Material, Pose, ShapeKind};
use dicebox::config::{AppConfig, D4Config, D6Config, DieKind, DiePlacement};
use dicebox::scene::SceneComposer;
use dicebox::texture::TextureGenerator;
use glam::Vec3;

#[test]
fn d6_carries_six_textured_materials() {
    let body = BodyDefinition::d6("d6", &D6Config::default(), &TextureGenerator::new(100.0, 1.0).unwrap(), Pose::default())
        .expect("d6 builds");
    assert_eq!(body.materials.len(), 6);
    assert_eq!(body.face_count(), 6);
    assert!(body.materials.iter().all(|m| matches!(m, Material::Texture(_))));
    assert!(body.roller.as_ref().map(|r| r.outcome_count()) == Some(6));
}

#[test]
fn d4_carries_four_color_materials_with_face_groups() {
    let body = BodyDefinition::d4("d4", &D4Config::default(), Pose::default()).expect("d4 builds");
    assert_eq!(body.materials.len(), 4);
    assert_eq!(body.face_count(), 4);
    assert!(body.materials.iter().all(|m| matches!(m, Material::Color(_))));
    let ranges: Vec<(u32, u32, u32)> =
        body.mesh.groups.iter().map(|g| (g.start, g.count, g.material_index)).collect();
    assert_eq!(ranges, vec![(0, 3, 0), (3, 3, 1), (6, 3, 2), (9, 3, 3)]);
}

#[test]
fn zero_dice_still_builds_the_enclosure() {
    let config = AppConfig { dice: Vec::new(), ..AppConfig::default() };
    let scene = SceneComposer::new(&config).expect("composer").compose().expect("scene without dice");
    assert_eq!(scene.statics.len(), 5);
    assert!(scene.dynamics.is_empty());
    assert!(scene.statics.iter().all(|plane| plane.shape == ShapeKind::Plane && !plane.is_dynamic()));

    let scene = SceneComposer::new(&AppConfig::default()).unwrap().without_dice().compose().unwrap();
    assert_eq!(scene.body_count(), 5);
}

#[test]
fn every_body_has_one_material_per_face() {
    let config = AppConfig {
        dice: vec![
            DiePlacement::new(DieKind::D6, [0.0, 0.0, 2.0]),
            DiePlacement::new(DieKind::D4, [3.0, 0.0, 3.0]),
            DiePlacement::new(DieKind::D6, [-3.0, 0.0, 4.0]),
        ],
        ..AppConfig::default()
    };
    let scene = SceneComposer::new(&config).unwrap().compose().unwrap();
    assert_eq!(scene.dynamics.len(), 3);
    for body in scene.bodies() {
        assert_eq!(body.materials.len(), body.face_count(), "{} breaks the material invariant", body.name);
    }
}

#[test]
fn scene_carries_fixed_environment() {
    let config = AppConfig::default();
    let composer = SceneComposer::new(&config).unwrap();
    assert_eq!(composer.textures().texture_size(), 256);
    let scene = composer.compose().unwrap();
    assert_eq!(scene.gravity, Vec3::new(0.0, 0.0, -30.0));
    assert_eq!(scene.camera.position, [0.0, -12.0, 16.0]);
    assert_eq!(scene.lights.len(), 3);
    assert_eq!(scene.dynamics[0].pose.position, Vec3::new(0.0, 0.0, 2.0));
}

#[test]
fn textures_are_regenerated_identically_per_die() {
    let config = AppConfig {
        dice: vec![DiePlacement::new(DieKind::D6, [0.0; 3]), DiePlacement::new(DieKind::D6, [3.0, 0.0, 0.0])],
        ..AppConfig::default()
    };
    let scene = SceneComposer::new(&config).unwrap().compose().unwrap();
    let first: Vec<_> = scene.dynamics[0].textures().map(|t| t.image().as_raw().clone()).collect();
    let second: Vec<_> = scene.dynamics[1].textures().map(|t| t.image().as_raw().clone()).collect();
    assert_eq!(first, second);
}
