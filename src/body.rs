use crate::color::Color;
use crate::config::{D4Config, D6Config, DieKind};
use crate::mesh::Mesh;
use crate::roller::ImpulseRoller;
use crate::texture::{FaceLabel, Texture, TextureGenerator};
use crate::uv::compute_uvs;
use anyhow::{bail, Context, Result};
use glam::{EulerRot, Quat, Vec3};

/// Visual size of each enclosure plane; the collider itself is unbounded.
const PLANE_VISUAL_SIZE: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Infinite plane through the body origin, facing local +Z.
    Plane,
    Box { half_extents: Vec3 },
    ConvexPolyhedron { points: Vec<Vec3> },
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Plane => "plane",
            ShapeKind::Box { .. } => "box",
            ShapeKind::ConvexPolyhedron { .. } => "convex_polyhedron",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Material {
    Color(Color),
    Texture(Texture),
}

impl Material {
    pub fn kind(&self) -> &'static str {
        match self {
            Material::Color(_) => "color",
            Material::Texture(_) => "texture",
        }
    }

    pub fn texture(&self) -> Option<&Texture> {
        match self {
            Material::Texture(texture) => Some(texture),
            Material::Color(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self { position, rotation: Vec3::ZERO }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// One rigid body as handed to the physics/render bridge.
#[derive(Debug, Clone)]
pub struct BodyDefinition {
    pub name: String,
    pub shape: ShapeKind,
    /// Zero means static.
    pub mass: f32,
    pub pose: Pose,
    pub mesh: Mesh,
    pub materials: Vec<Material>,
    pub roller: Option<ImpulseRoller>,
}

impl BodyDefinition {
    fn validated(self) -> Result<Self> {
        if self.materials.len() != self.mesh.face_count() {
            bail!(
                "Body '{}' has {} materials for {} faces",
                self.name,
                self.materials.len(),
                self.mesh.face_count()
            );
        }
        if !self.mass.is_finite() || self.mass < 0.0 {
            bail!("Body '{}' has invalid mass {}", self.name, self.mass);
        }
        if !self.pose.position.is_finite() || !self.pose.rotation.is_finite() {
            bail!("Body '{}' has a non-finite pose", self.name);
        }
        Ok(self)
    }

    pub fn plane(name: impl Into<String>, color: Color, pose: Pose) -> Result<Self> {
        Self {
            name: name.into(),
            shape: ShapeKind::Plane,
            mass: 0.0,
            pose,
            mesh: Mesh::plane(PLANE_VISUAL_SIZE),
            materials: vec![Material::Color(color)],
            roller: None,
        }
        .validated()
    }

    /// Tetrahedral die with one flat color per face.
    pub fn d4(name: impl Into<String>, config: &D4Config, pose: Pose) -> Result<Self> {
        const SIDES: u32 = DieKind::D4.face_count() as u32;
        const VERTICES_PER_FACE: u32 = 3;
        let name = name.into();
        if config.face_colors.len() != SIDES as usize {
            bail!("d4 '{name}' needs {SIDES} face colors, got {}", config.face_colors.len());
        }
        let uvs = compute_uvs(SIDES, VERTICES_PER_FACE, config.uv_tab, config.uv_angle_offset)
            .with_context(|| format!("UVs for d4 '{name}'"))?;
        let mesh = Mesh::tetrahedron(config.radius, &uvs).with_context(|| format!("mesh for d4 '{name}'"))?;
        let points = mesh.hull_points();
        Self {
            name,
            shape: ShapeKind::ConvexPolyhedron { points },
            mass: config.mass,
            pose,
            mesh,
            materials: config.face_colors.iter().copied().map(Material::Color).collect(),
            roller: Some(ImpulseRoller::d4()),
        }
        .validated()
    }

    /// Cubic die whose faces carry textures labeled 1 through 6.
    pub fn d6(name: impl Into<String>, config: &D6Config, textures: &TextureGenerator, pose: Pose) -> Result<Self> {
        let name = name.into();
        if !config.size.is_finite() || config.size <= 0.0 {
            bail!("d6 '{name}' has invalid size {}", config.size);
        }
        let materials = (1..=DieKind::D6.face_count() as u32)
            .map(|face| {
                let label = FaceLabel::number(face)?;
                Ok(Material::Texture(textures.generate(&label, config.text_color, config.die_color)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self {
            name,
            shape: ShapeKind::Box { half_extents: Vec3::splat(config.size * 0.5) },
            mass: config.mass,
            pose,
            mesh: Mesh::cube(config.size),
            materials,
            roller: Some(ImpulseRoller::d6()),
        }
        .validated()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    pub fn textures(&self) -> impl Iterator<Item = &Texture> {
        self.materials.iter().filter_map(Material::texture)
    }
}
