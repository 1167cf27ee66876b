//! Static mesh data built once at startup.
//!
//! All builders use Z as the up axis and produce flat-shaded triangle lists
//! (faces do not share vertices, so every face keeps its own normal).

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::config::RainConfig;

/// Interleaved vertex used by the scene pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SceneVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Triangle mesh with a flat material.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
    /// Linear RGBA multiplier.
    pub base_color: [f32; 4],
    /// Index into the owning scene's texture list.
    pub texture: Option<usize>,
}

impl MeshData {
    fn with_color(color: [f32; 4]) -> Self {
        Self {
            base_color: color,
            ..Default::default()
        }
    }

    /// Append a planar quad given counter-clockwise corners.
    fn push_quad(&mut self, corners: [Vec3; 4]) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(SceneVertex::new(corner, normal, uv));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Append a triangle given counter-clockwise corners.
    fn push_triangle(&mut self, corners: [Vec3; 3]) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let uvs = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(0.5, 0.0)];
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(SceneVertex::new(corner, normal, uv));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Horizontal rectangle at height `z`, facing up.
pub fn ground_quad(min: Vec2, max: Vec2, z: f32, color: [f32; 4]) -> MeshData {
    let mut mesh = MeshData::with_color(color);
    mesh.push_quad([
        Vec3::new(min.x, min.y, z),
        Vec3::new(max.x, min.y, z),
        Vec3::new(max.x, max.y, z),
        Vec3::new(min.x, max.y, z),
    ]);
    mesh
}

/// Axis-aligned box centered on `center`.
pub fn cuboid(center: Vec3, size: Vec3, color: [f32; 4]) -> MeshData {
    let h = size * 0.5;
    let c = |sx: f32, sy: f32, sz: f32| center + Vec3::new(sx * h.x, sy * h.y, sz * h.z);
    let mut mesh = MeshData::with_color(color);
    let (n, p) = (-1.0, 1.0);
    // bottom, top, -y, +y, -x, +x
    mesh.push_quad([c(n, p, n), c(p, p, n), c(p, n, n), c(n, n, n)]);
    mesh.push_quad([c(n, n, p), c(p, n, p), c(p, p, p), c(n, p, p)]);
    mesh.push_quad([c(n, n, n), c(p, n, n), c(p, n, p), c(n, n, p)]);
    mesh.push_quad([c(p, p, n), c(n, p, n), c(n, p, p), c(p, p, p)]);
    mesh.push_quad([c(n, p, n), c(n, n, n), c(n, n, p), c(n, p, p)]);
    mesh.push_quad([c(p, n, n), c(p, p, n), c(p, p, p), c(p, n, p)]);
    mesh
}

/// Square pyramid standing on `base_center` with edge `size` and `height`.
pub fn pyramid(base_center: Vec3, size: f32, height: f32, color: [f32; 4]) -> MeshData {
    let h = size * 0.5;
    let c = |sx: f32, sy: f32| base_center + Vec3::new(sx * h, sy * h, 0.0);
    let apex = base_center + Vec3::new(0.0, 0.0, height);
    let mut mesh = MeshData::with_color(color);
    mesh.push_quad([c(-1.0, 1.0), c(1.0, 1.0), c(1.0, -1.0), c(-1.0, -1.0)]);
    mesh.push_triangle([c(-1.0, -1.0), c(1.0, -1.0), apex]);
    mesh.push_triangle([c(1.0, -1.0), c(1.0, 1.0), apex]);
    mesh.push_triangle([c(1.0, 1.0), c(-1.0, 1.0), apex]);
    mesh.push_triangle([c(-1.0, 1.0), c(-1.0, -1.0), apex]);
    mesh
}

/// Latitude/longitude sphere with smooth normals.
pub fn uv_sphere(center: Vec3, radius: f32, stacks: u32, slices: u32, color: [f32; 4]) -> MeshData {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let mut mesh = MeshData::with_color(color);

    for i in 0..=stacks {
        let lat = std::f32::consts::PI * (-0.5 + i as f32 / stacks as f32);
        for j in 0..=slices {
            let lng = std::f32::consts::TAU * j as f32 / slices as f32;
            let normal = Vec3::new(lng.cos() * lat.cos(), lng.sin() * lat.cos(), lat.sin());
            let uv = Vec2::new(j as f32 / slices as f32, 1.0 - i as f32 / stacks as f32);
            mesh.vertices.push(SceneVertex::new(center + normal * radius, normal, uv));
        }
    }

    let row = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            mesh.indices.extend_from_slice(&[a, a + 1, b + 1, a, b + 1, b]);
        }
    }
    mesh
}

/// Built-in backdrop: a lawn covering the spawn area, a house and a tree.
pub fn backdrop(config: &RainConfig) -> Vec<MeshData> {
    let z = config.z_ground;
    let min = Vec2::new(config.x_min, config.y_min);
    let max = Vec2::new(config.x_max, config.y_max);
    let span = (max - min).max_element().max(1.0);
    // Props are laid out for a 40-unit wide area and scaled to the real one.
    let s = span / 40.0;
    let center = (min + max) * 0.5;
    let at = |x: f32, y: f32, up: f32| Vec3::new(center.x + x * s, center.y + y * s, z + up * s);

    vec![
        ground_quad(min, max, z, [0.18, 0.4, 0.18, 1.0]),
        // House
        cuboid(at(-6.0, 4.0, 2.0), Vec3::new(8.0, 8.0, 4.0) * s, [0.5, 0.3, 0.2, 1.0]),
        pyramid(at(-6.0, 4.0, 4.0), 9.0 * s, 4.0 * s, [0.8, 0.2, 0.2, 1.0]),
        // Tree
        cuboid(at(10.0, -4.0, 1.6), Vec3::new(1.6, 1.6, 3.2) * s, [0.4, 0.2, 0.1, 1.0]),
        uv_sphere(at(10.0, -4.0, 4.8), 3.2 * s, 8, 8, [0.2, 0.4, 0.2, 1.0]),
    ]
}

/// Unit cube corners for the skybox, indexed as 12 triangles.
pub fn skybox_cube() -> ([[f32; 3]; 8], [u16; 36]) {
    let corners = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    let indices = [
        0, 1, 2, 0, 2, 3, // -z
        4, 6, 5, 4, 7, 6, // +z
        0, 5, 1, 0, 4, 5, // -y
        3, 2, 6, 3, 6, 7, // +y
        0, 3, 7, 0, 7, 4, // -x
        1, 5, 6, 1, 6, 2, // +x
    ];
    (corners, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal {n:?} is not unit length");
        }
    }

    /// Normals of a closed convex mesh point away from its centroid.
    fn assert_outward(mesh: &MeshData) {
        let centroid = mesh
            .vertices
            .iter()
            .map(|v| Vec3::from_array(v.position))
            .sum::<Vec3>()
            / mesh.vertices.len() as f32;
        for tri in mesh.indices.chunks(3) {
            let v = mesh.vertices[tri[0] as usize];
            let p = Vec3::from_array(v.position);
            assert!(Vec3::from_array(v.normal).dot(p - centroid) > 0.0);
        }
    }

    #[test]
    fn test_ground_faces_up() {
        let mesh = ground_quad(Vec2::splat(-1.0), Vec2::splat(1.0), 2.0, [1.0; 4]);
        assert_well_formed(&mesh);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0] && v.position[2] == 2.0));
    }

    #[test]
    fn test_cuboid() {
        let mesh = cuboid(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0), [1.0; 4]);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
        assert_eq!(mesh.triangle_count(), 12);
        for v in &mesh.vertices {
            assert!((v.position[0] - 1.0).abs() <= 1.0 + 1e-6);
            assert!((v.position[1] - 2.0).abs() <= 2.0 + 1e-6);
            assert!((v.position[2] - 3.0).abs() <= 3.0 + 1e-6);
        }
    }

    #[test]
    fn test_pyramid() {
        let mesh = pyramid(Vec3::ZERO, 2.0, 1.0, [1.0; 4]);
        assert_well_formed(&mesh);
        assert_outward(&mesh);
        assert_eq!(mesh.triangle_count(), 6);
    }

    #[test]
    fn test_sphere() {
        let mesh = uv_sphere(Vec3::new(0.0, 0.0, 5.0), 2.0, 8, 8, [1.0; 4]);
        assert_well_formed(&mesh);
        assert_eq!(mesh.triangle_count(), 8 * 8 * 2);
        for v in &mesh.vertices {
            let d = Vec3::from_array(v.position) - Vec3::new(0.0, 0.0, 5.0);
            assert!((d.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_backdrop_sits_on_ground() {
        let config = RainConfig::default();
        let meshes = backdrop(&config);
        assert_eq!(meshes.len(), 5);
        for mesh in &meshes {
            assert_well_formed(mesh);
            assert!(mesh.vertices.iter().all(|v| v.position[2] >= config.z_ground - 1e-4));
        }
    }

    #[test]
    fn test_skybox_cube_indices() {
        let (corners, indices) = skybox_cube();
        assert!(indices.iter().all(|&i| (i as usize) < corners.len()));
        for corner in 0..8u16 {
            assert!(indices.contains(&corner));
        }
    }
}
