use crate::uv::UvSet;
use anyhow::{bail, Result};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }
}

/// Range of the index buffer drawn with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: u32,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub groups: Vec<FaceGroup>,
}

/// Corner directions of a regular tetrahedron before scaling to its circumradius.
const TETRAHEDRON_CORNERS: [Vec3; 4] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
];
const TETRAHEDRON_FACES: [[u32; 3]; 4] = [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]];

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let group = FaceGroup { start: 0, count: indices.len() as u32, material_index: 0 };
        Self { vertices, indices, groups: vec![group] }
    }

    /// Regular tetrahedron inscribed in a sphere of `radius`, one group per face.
    pub fn tetrahedron(radius: f32, uvs: &UvSet) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            bail!("Tetrahedron radius {radius} must be positive");
        }
        let positions: Vec<Vec3> = TETRAHEDRON_CORNERS.iter().map(|c| c.normalize() * radius).collect();
        let faces: Vec<Vec<u32>> = TETRAHEDRON_FACES.iter().map(|f| f.to_vec()).collect();
        Self::convex_polyhedron(&positions, &faces, uvs)
    }

    /// Builds an unindexed-style polyhedron: every face gets its own vertices so each can carry
    /// its own normal, UVs and material group.
    ///
    /// Triangle `j` of a face with `n` corners uses corners `j`, `j + 1`, `j + 2` (mod `n`), which
    /// is the order [`compute_uvs`](crate::uv::compute_uvs) emits coordinates in.
    pub fn convex_polyhedron(positions: &[Vec3], faces: &[Vec<u32>], uvs: &UvSet) -> Result<Self> {
        if faces.is_empty() {
            bail!("Polyhedron needs at least one face");
        }
        if faces.len() as u32 != uvs.sides() {
            bail!("UV set covers {} faces but the polyhedron has {}", uvs.sides(), faces.len());
        }
        let loop_len = faces[0].len();
        if faces.iter().any(|face| face.len() != loop_len) {
            bail!("All polyhedron faces must have the same number of corners");
        }
        if loop_len as u32 != uvs.triangles_per_face() + 2 {
            bail!("UV set expects {} corners per face, faces have {loop_len}", uvs.triangles_per_face() + 2);
        }

        let mut vertices = Vec::with_capacity(uvs.vertex_count());
        let mut groups = Vec::with_capacity(faces.len());
        let mut uv_iter = uvs.iter();
        for (face_index, face) in faces.iter().enumerate() {
            let corners = face
                .iter()
                .map(|&i| positions.get(i as usize).copied())
                .collect::<Option<Vec<Vec3>>>();
            let Some(corners) = corners else {
                bail!("Face {face_index} references a vertex outside the position list");
            };
            let normal = flat_normal(corners[0], corners[1], corners[2]);
            let start = vertices.len() as u32;
            for j in 0..loop_len - 2 {
                for k in 0..3 {
                    let position = corners[(j + k) % loop_len];
                    let uv = uv_iter.next().unwrap_or(Vec2::ZERO);
                    vertices.push(MeshVertex::new(position, normal, uv));
                }
            }
            let count = vertices.len() as u32 - start;
            groups.push(FaceGroup { start, count, material_index: face_index as u32 });
        }

        let indices = (0..vertices.len() as u32).collect();
        Ok(Self { vertices, indices, groups })
    }

    /// Axis-aligned cube with edge length `size`. Faces, and therefore material slots, are
    /// ordered +X, -X, +Y, -Y, +Z, -Z.
    pub fn cube(size: f32) -> Self {
        let hs = size * 0.5;
        let positions = [
            Vec3::new(-hs, -hs, -hs),
            Vec3::new(hs, -hs, -hs),
            Vec3::new(hs, hs, -hs),
            Vec3::new(-hs, hs, -hs),
            Vec3::new(-hs, -hs, hs),
            Vec3::new(hs, -hs, hs),
            Vec3::new(hs, hs, hs),
            Vec3::new(-hs, hs, hs),
        ];

        let uv_quad = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let mut vertices = Vec::with_capacity(24);
        let mut write_face = |corners: [usize; 4], normal: Vec3| {
            for (i, &index) in corners.iter().enumerate() {
                vertices.push(MeshVertex::new(positions[index], normal, uv_quad[i]));
            }
        };

        write_face([1, 2, 6, 5], Vec3::X);
        write_face([0, 4, 7, 3], Vec3::NEG_X);
        write_face([3, 7, 6, 2], Vec3::Y);
        write_face([0, 1, 5, 4], Vec3::NEG_Y);
        write_face([4, 5, 6, 7], Vec3::Z);
        write_face([0, 3, 2, 1], Vec3::NEG_Z);

        let mut indices = Vec::with_capacity(36);
        let mut groups = Vec::with_capacity(6);
        for face in 0..6u32 {
            let base = face * 4;
            groups.push(FaceGroup { start: indices.len() as u32, count: 6, material_index: face });
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices, groups }
    }

    /// Square of edge `size` in the XY plane facing +Z.
    pub fn plane(size: f32) -> Self {
        let hs = size * 0.5;
        let corners = [
            (Vec3::new(-hs, -hs, 0.0), Vec2::new(0.0, 0.0)),
            (Vec3::new(hs, -hs, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(hs, hs, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(-hs, hs, 0.0), Vec2::new(0.0, 1.0)),
        ];
        let vertices = corners.iter().map(|(p, uv)| MeshVertex::new(*p, Vec3::Z, *uv)).collect();
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn face_count(&self) -> usize {
        self.groups.len()
    }

    /// Outward normal of each group's first triangle, in group order.
    pub fn face_normals(&self) -> Vec<Vec3> {
        self.groups
            .iter()
            .map(|group| {
                let tri = &self.indices[group.start as usize..(group.start + 3) as usize];
                let p = |i: u32| Vec3::from_array(self.vertices[i as usize].position);
                flat_normal(p(tri[0]), p(tri[1]), p(tri[2]))
            })
            .collect()
    }

    /// Distinct corner positions, as a convex-hull collider would want them.
    pub fn hull_points(&self) -> Vec<Vec3> {
        let mut points: Vec<Vec3> = Vec::new();
        for vertex in &self.vertices {
            let p = Vec3::from_array(vertex.position);
            if !points.iter().any(|q| q.distance_squared(p) < 1e-10) {
                points.push(p);
            }
        }
        points
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn flat_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let normal = (b - a).cross(c - a);
    if normal.length_squared() > 0.0 {
        normal.normalize()
    } else {
        Vec3::Z
    }
}
