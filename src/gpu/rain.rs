//! Rain point-sprite rendering.
//!
//! Drops are drawn as instanced screen-aligned quads, one instance per
//! particle. Per-instance data comes from three vertex buffers: positions and
//! state codes (rewritten every frame through [`ParticleStream`]) and the
//! variants (uploaded once).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::texture::{texture_entries, uniform_entry, GpuTexture, DEPTH_FORMAT};
use crate::particles::{DropState, ParticleSystem};
use crate::shaders;
use crate::textures::TextureData;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RainUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Surface size in pixels.
    pub viewport: [f32; 2],
    /// Sprite edge length in pixels.
    pub point_size: f32,
    pub _padding: f32,
}

struct StreamSlot {
    positions: wgpu::Buffer,
    states: wgpu::Buffer,
}

/// Slot rotation and state staging for [`ParticleStream`].
///
/// Kept apart from the buffers so the bookkeeping runs without a device.
#[derive(Debug)]
struct StreamCursor {
    /// Slot written by the last frame.
    current: usize,
    capacity: usize,
    len: usize,
    state_codes: Vec<u32>,
}

impl StreamCursor {
    fn new(capacity: usize) -> Self {
        Self {
            // The first frame lands in slot 0.
            current: 1,
            capacity,
            len: 0,
            state_codes: Vec::with_capacity(capacity),
        }
    }

    /// Flip to the back slot and re-encode this frame's states.
    ///
    /// Returns the slot to write and the number of instances in it.
    fn next_frame(&mut self, positions: usize, states: &[DropState]) -> (usize, usize) {
        let count = positions.min(states.len()).min(self.capacity);

        self.state_codes.clear();
        self.state_codes.extend(states[..count].iter().map(|s| s.code()));

        self.current = 1 - self.current;
        self.len = count;
        (self.current, count)
    }
}

/// Double-buffered per-frame particle attributes.
///
/// Every [`write`](Self::write) replaces the full contents of the slot not
/// used by the previous frame, then makes it current. Draws bind the
/// current slot.
pub struct ParticleStream {
    slots: [StreamSlot; 2],
    variants: wgpu::Buffer,
    cursor: StreamCursor,
}

impl ParticleStream {
    pub fn new(device: &wgpu::Device, particles: &ParticleSystem) -> Self {
        let capacity = particles.len().max(1);
        let slot = |i: usize| StreamSlot {
            positions: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Rain Positions {i}")),
                size: (capacity * std::mem::size_of::<Vec3>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            states: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Rain States {i}")),
                size: (capacity * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let variants = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rain Variants"),
            contents: bytemuck::cast_slice(particles.variants()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            slots: [slot(0), slot(1)],
            variants,
            cursor: StreamCursor::new(particles.len()),
        }
    }

    /// Upload this frame's positions and states into the back slot and flip.
    pub fn write(&mut self, queue: &wgpu::Queue, positions: &[Vec3], states: &[DropState]) {
        debug_assert_eq!(positions.len(), states.len());
        let (next, count) = self.cursor.next_frame(positions.len(), states);

        let slot = &self.slots[next];
        queue.write_buffer(&slot.positions, 0, bytemuck::cast_slice(&positions[..count]));
        queue.write_buffer(&slot.states, 0, bytemuck::cast_slice(&self.cursor.state_codes));
    }

    /// Number of instances written by the last [`write`](Self::write).
    pub fn len(&self) -> u32 {
        self.cursor.len as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.len == 0
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let slot = &self.slots[self.cursor.current];
        pass.set_vertex_buffer(0, slot.positions.slice(..));
        pass.set_vertex_buffer(1, slot.states.slice(..));
        pass.set_vertex_buffer(2, self.variants.slice(..));
    }
}

pub struct RainRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _atlas: GpuTexture,
    stream: ParticleStream,
    point_size: f32,
}

impl RainRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        atlas: &TextureData,
        particles: &ParticleSystem,
        point_size: f32,
    ) -> Self {
        let config = particles.config();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Rain Shader"),
            source: wgpu::ShaderSource::Wgsl(
                shaders::rain_shader(config.atlas_rows, config.atlas_cols).into(),
            ),
        });

        let atlas = GpuTexture::from_data(device, queue, atlas, "Rain Atlas");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Rain Uniforms"),
            size: std::mem::size_of::<RainUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [texture_entry, sampler_entry] = texture_entries(1, wgpu::TextureViewDimension::D2);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Rain Bind Group Layout"),
            entries: &[uniform_entry(0), texture_entry, sampler_entry],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Rain Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Rain Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let instance_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vec3>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<u32>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![1 => Uint32],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<u32>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![2 => Uint32],
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Rain Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &instance_buffers,
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
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Drops are hidden by the scene but never hide each other.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let mut stream = ParticleStream::new(device, particles);
        stream.write(queue, particles.positions(), particles.states());

        log::debug!(
            "rain renderer ready: {} drops, {}x{} atlas",
            particles.len(),
            config.atlas_rows,
            config.atlas_cols
        );

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            _atlas: atlas,
            stream,
            point_size,
        }
    }

    /// Push the current particle state to the GPU.
    pub fn write_particles(&mut self, queue: &wgpu::Queue, particles: &ParticleSystem) {
        self.stream.write(queue, particles.positions(), particles.states());
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, view_proj: Mat4, width: u32, height: u32) {
        let uniforms = RainUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            viewport: [width.max(1) as f32, height.max(1) as f32],
            point_size: self.point_size,
            _padding: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.stream.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.stream.bind(pass);
        pass.draw(0..6, 0..self.stream.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // mat4x4 + vec2 + f32 + f32, already a multiple of 16.
        assert_eq!(std::mem::size_of::<RainUniforms>(), 80);
    }

    #[test]
    fn test_slots_alternate_every_frame() {
        let mut cursor = StreamCursor::new(4);
        let states = [DropState::Falling0; 4];

        let slots: Vec<usize> = (0..5).map(|_| cursor.next_frame(4, &states).0).collect();
        assert_eq!(slots, vec![0, 1, 0, 1, 0]);
        assert_eq!(cursor.current, 0);
    }

    #[test]
    fn test_each_frame_replaces_the_whole_stream() {
        let mut cursor = StreamCursor::new(4);

        let first = [
            DropState::Falling0,
            DropState::Falling1,
            DropState::Impact,
            DropState::Splash,
        ];
        assert_eq!(cursor.next_frame(4, &first), (0, 4));
        assert_eq!(cursor.state_codes, vec![0, 1, 2, 3]);
        assert_eq!(cursor.len, 4);

        // A shorter frame leaves nothing of the previous one behind.
        let second = [DropState::Splash, DropState::Impact];
        assert_eq!(cursor.next_frame(2, &second), (1, 2));
        assert_eq!(cursor.state_codes, vec![3, 2]);
        assert_eq!(cursor.len, 2);
    }

    #[test]
    fn test_frames_are_clamped_to_capacity() {
        let mut cursor = StreamCursor::new(2);
        let states = [DropState::Impact; 5];

        assert_eq!(cursor.next_frame(5, &states), (0, 2));
        assert_eq!(cursor.state_codes.len(), 2);

        // Fewer positions than states limits the count as well.
        assert_eq!(cursor.next_frame(1, &states), (1, 1));
        assert_eq!(cursor.state_codes, vec![2]);
    }
}
