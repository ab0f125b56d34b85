use crate::body::{BodyDefinition, Material, Pose};
use crate::config::{AppConfig, DieKind, DiePlacement};
use crate::texture::TextureGenerator;
use anyhow::{Context, Result};
use glam::Vec3;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraDescriptor {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightDescriptor {
    Hemisphere { intensity: f32 },
    Spot { position: [f32; 3], angle: f32, penumbra: f32, intensity: f32, cast_shadow: bool, shadow_map_size: u32 },
    Point { position: [f32; 3], intensity: f32 },
}

fn default_lights() -> Vec<LightDescriptor> {
    vec![
        LightDescriptor::Hemisphere { intensity: 0.35 },
        LightDescriptor::Spot {
            position: [30.0, 0.0, 30.0],
            angle: 0.3,
            penumbra: 1.0,
            intensity: 2.0,
            cast_shadow: true,
            shadow_map_size: 256,
        },
        LightDescriptor::Point { position: [-30.0, 0.0, -30.0], intensity: 0.5 },
    ]
}

/// Everything the engine needs to set up the toy, as plain data.
#[derive(Debug, Clone)]
pub struct SceneDefinition {
    pub gravity: Vec3,
    pub camera: CameraDescriptor,
    pub lights: Vec<LightDescriptor>,
    pub statics: Vec<BodyDefinition>,
    pub dynamics: Vec<BodyDefinition>,
}

impl SceneDefinition {
    /// Statics first, then dynamics, in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = &BodyDefinition> {
        self.statics.iter().chain(self.dynamics.iter())
    }

    pub fn body_count(&self) -> usize {
        self.statics.len() + self.dynamics.len()
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary::from_scene(self)
    }

    /// Writes every face texture as `<body>_face<label>.png` under `dir`. Returns the file count.
    pub fn dump_textures(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("Creating directory {}", dir.display()))?;
        let mut written = 0;
        for body in self.bodies() {
            for texture in body.textures() {
                texture.save_png(dir.join(format!("{}_face{}.png", body.name, texture.label())))?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Floor plus four walls leaning in from `half_extent`, forming an open box.
pub fn enclosure_planes(config: &AppConfig) -> Result<Vec<BodyDefinition>> {
    let enclosure = &config.enclosure;
    let d = enclosure.half_extent;
    let tilt = enclosure.wall_tilt;
    let placements = [
        ("floor", Vec3::ZERO, Vec3::ZERO),
        ("wall_west", Vec3::new(-d, 0.0, 0.0), Vec3::new(0.0, tilt, 0.0)),
        ("wall_east", Vec3::new(d, 0.0, 0.0), Vec3::new(0.0, -tilt, 0.0)),
        ("wall_north", Vec3::new(0.0, d, 0.0), Vec3::new(tilt, 0.0, 0.0)),
        ("wall_south", Vec3::new(0.0, -d, 0.0), Vec3::new(-tilt, 0.0, 0.0)),
    ];
    placements
        .into_iter()
        .map(|(name, position, rotation)| {
            BodyDefinition::plane(name, enclosure.color, Pose::new(position, rotation))
                .with_context(|| format!("building enclosure plane '{name}'"))
        })
        .collect()
}

/// Builder over the static enclosure and the dice dropped into it.
pub struct SceneComposer<'a> {
    config: &'a AppConfig,
    textures: TextureGenerator,
    dice: Vec<DiePlacement>,
}

impl<'a> SceneComposer<'a> {
    /// Starts with the dice listed in `config`.
    pub fn new(config: &'a AppConfig) -> Result<Self> {
        let textures = TextureGenerator::from_config(&config.texture).context("texture generator settings")?;
        Ok(Self { config, textures, dice: config.dice.clone() })
    }

    pub fn without_dice(mut self) -> Self {
        self.dice.clear();
        self
    }

    pub fn with_die(mut self, kind: DieKind, pose: Pose) -> Self {
        self.dice.push(DiePlacement {
            kind,
            position: pose.position.to_array(),
            rotation: pose.rotation.to_array(),
        });
        self
    }

    pub fn textures(&self) -> &TextureGenerator {
        &self.textures
    }

    pub fn compose(self) -> Result<SceneDefinition> {
        let statics = enclosure_planes(self.config)?;
        let mut dynamics = Vec::with_capacity(self.dice.len());
        for (index, placement) in self.dice.iter().enumerate() {
            let name = format!("{}_{index}", placement.kind.label());
            let pose = Pose::new(Vec3::from_array(placement.position), Vec3::from_array(placement.rotation));
            let body = match placement.kind {
                DieKind::D4 => BodyDefinition::d4(&name, &self.config.d4, pose),
                DieKind::D6 => BodyDefinition::d6(&name, &self.config.d6, &self.textures, pose),
            }
            .with_context(|| format!("building die '{name}'"))?;
            dynamics.push(body);
        }

        let camera = CameraDescriptor { position: self.config.camera.position, target: self.config.camera.target };
        let scene = SceneDefinition {
            gravity: Vec3::from_array(self.config.physics.gravity),
            camera,
            lights: default_lights(),
            statics,
            dynamics,
        };
        tracing::info!(statics = scene.statics.len(), dice = scene.dynamics.len(), "composed scene");
        Ok(scene)
    }
}

/// Deterministic description of a composed scene, for logs and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub gravity: [f32; 3],
    pub camera: CameraDescriptor,
    pub lights: Vec<LightDescriptor>,
    pub bodies: Vec<BodySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodySummary {
    pub name: String,
    pub shape: &'static str,
    pub mass: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub faces: usize,
    pub materials: Vec<String>,
}

impl SceneSummary {
    pub fn from_scene(scene: &SceneDefinition) -> Self {
        let bodies = scene
            .bodies()
            .map(|body| BodySummary {
                name: body.name.clone(),
                shape: body.shape.label(),
                mass: body.mass,
                position: body.pose.position.to_array(),
                rotation: body.pose.rotation.to_array(),
                faces: body.face_count(),
                materials: body
                    .materials
                    .iter()
                    .map(|material| match material {
                        Material::Color(color) => format!("color:{color}"),
                        Material::Texture(texture) => {
                            format!("texture:{}@{}", texture.label(), texture.size())
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { gravity: scene.gravity.to_array(), camera: scene.camera, lights: scene.lights.clone(), bodies }
    }
}
