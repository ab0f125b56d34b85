use anyhow::{bail, Result};
use glam::Vec2;
use std::f32::consts::TAU;

/// Flat `[u0, v0, u1, v1, ...]` texture coordinates, ordered face by face, triangle by triangle,
/// corner by corner.
#[derive(Debug, Clone, PartialEq)]
pub struct UvSet {
    sides: u32,
    vertices_per_loop: u32,
    coords: Vec<f32>,
}

impl UvSet {
    pub fn as_slice(&self) -> &[f32] {
        &self.coords
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn triangles_per_face(&self) -> u32 {
        self.vertices_per_loop - 2
    }

    pub fn vertex_count(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn uv(&self, vertex: usize) -> Option<Vec2> {
        let base = vertex.checked_mul(2)?;
        let pair = self.coords.get(base..base + 2)?;
        Some(Vec2::new(pair[0], pair[1]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.coords.chunks_exact(2).map(|pair| Vec2::new(pair[0], pair[1]))
    }
}

/// Maps the corners of a regular `vertices_per_loop`-gon onto the unit texture square, inset by
/// `tab`, for every triangle of every face.
///
/// Triangle `j` of a face uses polygon corners `j`, `j + 1`, `j + 2`; the consuming geometry
/// must emit its vertices in the same order.
pub fn compute_uvs(sides: u32, vertices_per_loop: u32, tab: f32, angle_offset: f32) -> Result<UvSet> {
    if sides == 0 {
        bail!("UV mapping needs at least one face");
    }
    if vertices_per_loop < 3 {
        bail!("UV mapping needs at least 3 vertices per face, got {vertices_per_loop}");
    }
    if !tab.is_finite() || tab <= -1.0 {
        bail!("UV tab factor {tab} must be finite and greater than -1");
    }
    if !angle_offset.is_finite() {
        bail!("UV angle offset {angle_offset} must be finite");
    }

    let triangles = vertices_per_loop - 2;
    let step = TAU / vertices_per_loop as f32;
    let scale = 2.0 * (1.0 + tab);
    let mut coords = Vec::with_capacity(sides as usize * triangles as usize * 3 * 2);
    for _ in 0..sides {
        for j in 0..triangles {
            for k in 0..3 {
                let theta = step * (j + k) as f32 + angle_offset;
                coords.push((theta.cos() + 1.0 + tab) / scale);
                coords.push((theta.sin() + 1.0 + tab) / scale);
            }
        }
    }

    Ok(UvSet { sides, vertices_per_loop, coords })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(compute_uvs(0, 3, 0.0, 0.0).is_err());
        assert!(compute_uvs(4, 2, 0.0, 0.0).is_err());
        assert!(compute_uvs(4, 3, -1.0, 0.0).is_err());
        assert!(compute_uvs(4, 3, f32::NAN, 0.0).is_err());
        assert!(compute_uvs(4, 3, 0.0, f32::INFINITY).is_err());
    }

    #[test]
    fn first_corner_sits_on_positive_u_axis() {
        let uvs = compute_uvs(1, 4, 0.0, 0.0).unwrap();
        let first = uvs.uv(0).unwrap();
        assert!((first - Vec2::new(1.0, 0.5)).length() < 1e-6);
        assert!(uvs.uv(uvs.vertex_count()).is_none());
    }

    #[test]
    fn faces_repeat_the_same_pattern() {
        let uvs = compute_uvs(3, 5, 0.1, 0.3).unwrap();
        let per_face = uvs.len() / 3;
        let slice = uvs.as_slice();
        assert_eq!(&slice[..per_face], &slice[per_face..2 * per_face]);
        assert_eq!(&slice[..per_face], &slice[2 * per_face..]);
    }
}
