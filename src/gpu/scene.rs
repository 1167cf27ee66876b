//! Lit scene geometry: one draw per mesh, Phong shading.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::texture::{texture_entries, uniform_entry, GpuTexture, DEPTH_FORMAT};
use crate::config::Lighting;
use crate::geometry::SceneVertex;
use crate::scene::{normal_matrix, Scene};
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub light_pos: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    pub view_pos: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub has_texture: u32,
    pub _padding: [u32; 3],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: wgpu::BindGroup,
}

pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    _textures: Vec<GpuTexture>,
    model: Mat4,
    lighting: Lighting,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
        lighting: Lighting,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Uniform Layout"),
            entries: &[uniform_entry(0)],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let [texture_entry, sampler_entry] = texture_entries(1, wgpu::TextureViewDimension::D2);
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[uniform_entry(0), texture_entry, sampler_entry],
        });

        // Slot i holds scene texture i when it converted, the last slot is white.
        let mut textures: Vec<GpuTexture> = Vec::with_capacity(scene.textures.len() + 1);
        let mut slots: Vec<Option<usize>> = Vec::with_capacity(scene.textures.len());
        for (i, texture) in scene.textures.iter().enumerate() {
            slots.push(texture.as_ref().map(|data| {
                let label = format!("Scene Texture {i}");
                textures.push(GpuTexture::from_data(device, queue, data, &label));
                textures.len() - 1
            }));
        }
        let white = textures.len();
        textures.push(GpuTexture::white(device, queue));

        let meshes = scene
            .meshes
            .iter()
            .enumerate()
            .filter(|(_, mesh)| !mesh.indices.is_empty())
            .map(|(i, mesh)| {
                let slot = mesh.texture.and_then(|t| slots.get(t).copied().flatten());
                let texture = &textures[slot.unwrap_or(white)];

                let material = MaterialUniform {
                    base_color: mesh.base_color,
                    has_texture: u32::from(slot.is_some()),
                    _padding: [0; 3],
                };
                let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Material {i}")),
                    contents: bytemuck::bytes_of(&material),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let material = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Material Bind Group {i}")),
                    layout: &material_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: material_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                });

                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("Mesh Vertices {i}")),
                        contents: bytemuck::cast_slice(&mesh.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("Mesh Indices {i}")),
                        contents: bytemuck::cast_slice(&mesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mesh.indices.len() as u32,
                    material,
                }
            })
            .collect::<Vec<_>>();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SceneVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Imported meshes do not agree on winding, so nothing is culled.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!(
            "scene renderer ready: {} meshes, {} textures",
            meshes.len(),
            textures.len() - 1
        );

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            _textures: textures,
            model: scene.model,
            lighting,
        }
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, view_proj: Mat4, eye: Vec3) {
        let uniforms = SceneUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: self.model.to_cols_array_2d(),
            normal_matrix: Mat4::from_mat3(normal_matrix(self.model)).to_cols_array_2d(),
            light_pos: self.lighting.light_pos.extend(1.0).to_array(),
            light_color: self.lighting.light_color.extend(1.0).to_array(),
            ambient: self.lighting.ambient_color.extend(1.0).to_array(),
            view_pos: eye.extend(1.0).to_array(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        for mesh in &self.meshes {
            pass.set_bind_group(1, &mesh.material, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 256);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
        assert_eq!(std::mem::size_of::<SceneVertex>(), 32);
    }
}
