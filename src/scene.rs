//! CPU-side scene: triangle meshes, flat materials and their textures.
//!
//! A scene comes either from a glTF file or from the built-in backdrop in
//! [`geometry`](crate::geometry). Node transforms are baked into the vertex
//! data at load time so the renderer only deals with a single model matrix.

use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::config::RainConfig;
use crate::error::SceneError;
use crate::geometry::{self, SceneVertex};
use crate::textures::{AddressMode, TextureData};

pub use crate::geometry::MeshData;

/// Meshes plus the textures they reference.
#[derive(Debug, Clone)]
pub struct Scene {
    pub meshes: Vec<MeshData>,
    /// Indexed by [`MeshData::texture`]. `None` for images that failed to convert.
    pub textures: Vec<Option<TextureData>>,
    /// Applied to every mesh on top of the baked node transforms.
    pub model: Mat4,
}

impl Scene {
    /// The built-in backdrop for the given rain area.
    pub fn procedural(config: &RainConfig) -> Self {
        Self {
            meshes: geometry::backdrop(config),
            textures: Vec::new(),
            model: Mat4::IDENTITY,
        }
    }

    /// Import every triangle primitive reachable from the default scene.
    ///
    /// Broken primitives and unsupported images are skipped with a warning.
    pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let (document, buffers, images) = gltf::import(path)?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(SceneError::NoScene)?;

        let textures: Vec<Option<TextureData>> = images
            .iter()
            .enumerate()
            .map(|(i, image)| convert_image(i, image))
            .collect();

        let mut meshes = Vec::new();
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &textures, &mut meshes);
        }

        if meshes.is_empty() {
            return Err(SceneError::Empty);
        }

        let triangles: usize = meshes.iter().map(MeshData::triangle_count).sum();
        log::info!(
            "Loaded {}: {} primitives, {} triangles, {} textures",
            path.display(),
            meshes.len(),
            triangles,
            textures.iter().flatten().count()
        );

        Ok(Self {
            meshes,
            textures,
            model: Mat4::IDENTITY,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    textures: &[Option<TextureData>],
    out: &mut Vec<MeshData>,
) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh {}", mesh.index()));
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "{name} primitive {i}: mode {:?} is not supported, skipping",
                    primitive.mode()
                );
                continue;
            }
            match read_primitive(&name, i, &primitive, transform, buffers, textures) {
                Ok(data) => out.push(data),
                Err(err) => log::warn!("skipping primitive: {err}"),
            }
        }
    }

    for child in node.children() {
        collect_node(&child, transform, buffers, textures, out);
    }
}

fn read_primitive(
    name: &str,
    index: usize,
    primitive: &gltf::Primitive<'_>,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
    textures: &[Option<TextureData>],
) -> Result<MeshData, SceneError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|it| it.collect())
        .ok_or_else(|| SceneError::MissingPositions {
            mesh: name.to_owned(),
            primitive: index,
        })?;
    let count = positions.len();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|it| it.collect())
        .unwrap_or_else(|| vec![[0.0, 0.0, 1.0]; count]);
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; count]);
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|it| it.into_u32().collect())
        .unwrap_or_else(|| (0..count as u32).collect());

    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(SceneError::IndexOutOfRange {
            mesh: name.to_owned(),
            primitive: index,
            index: bad,
            count,
        });
    }

    let normal_matrix = normal_matrix(transform);
    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let normal = normals.get(i).copied().map_or(Vec3::Z, Vec3::from_array);
            let uv = uvs.get(i).copied().map_or(Vec2::ZERO, Vec2::from_array);
            SceneVertex::new(
                transform.transform_point3(Vec3::from_array(p)),
                (normal_matrix * normal).try_normalize().unwrap_or(Vec3::Z),
                uv,
            )
        })
        .collect();

    let pbr = primitive.material().pbr_metallic_roughness();
    let texture = pbr
        .base_color_texture()
        .map(|info| info.texture().source().index())
        .filter(|&image| textures.get(image).is_some_and(Option::is_some));

    Ok(MeshData {
        vertices,
        indices,
        base_color: pbr.base_color_factor(),
        texture,
    })
}

/// Inverse transpose of the upper 3x3, or the plain 3x3 when it is singular.
pub(crate) fn normal_matrix(model: Mat4) -> Mat3 {
    let m = Mat3::from_mat4(model);
    if m.determinant().abs() > f32::EPSILON {
        m.inverse().transpose()
    } else {
        m
    }
}

fn convert_image(index: usize, image: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        other => {
            log::warn!("glTF image {index}: format {other:?} is not supported, skipping");
            return None;
        }
    };

    match TextureData::from_rgba(rgba, image.width, image.height) {
        Ok(texture) => Some(texture.with_address_mode(AddressMode::Repeat)),
        Err(err) => {
            log::warn!("glTF image {index}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One red triangle in the XY plane, lifted to z = 2 by its node.
    const TRIANGLE_GLTF: &str = concat!(
        r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0, "translation": [0.0, 0.0, 2.0] } ],
        "meshes": [ {
            "name": "triangle",
            "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ]
        } ],
        "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } } ],
        "buffers": [ {
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,"#,
        // Three f32 positions, then three u16 indices padded to 44 bytes.
        "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA=",
        r#""
        } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#
    );

    #[test]
    fn test_load_embedded_triangle() {
        let file = format!("rainfall-triangle-{}.gltf", std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();
        let scene = Scene::load_gltf(&path);
        std::fs::remove_file(&path).ok();
        let scene = scene.unwrap();

        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.texture, None);

        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![[0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]]);
        // No normals or UVs in the file.
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0] && v.uv == [0.0, 0.0]));
    }

    #[test]
    fn test_missing_file() {
        let result = Scene::load_gltf("definitely/not/here.gltf");
        assert!(matches!(result, Err(SceneError::Gltf(_))));
    }

    #[test]
    fn test_procedural_scene() {
        let scene = Scene::procedural(&RainConfig::default());
        assert!(!scene.meshes.is_empty());
        assert!(scene.textures.is_empty());
        assert_eq!(scene.model, Mat4::IDENTITY);
        assert!(scene.triangle_count() > 0);
    }

    #[test]
    fn test_normal_matrix_handles_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = (normal_matrix(model) * Vec3::new(1.0, 1.0, 0.0)).normalize();
        // Stretching along X flattens the surface, tilting its normal towards Y.
        assert!(n.y > n.x);

        let singular = Mat4::from_scale(Vec3::new(1.0, 1.0, 0.0));
        assert!(normal_matrix(singular).is_finite());
    }
}
