//! wgpu context and the per-frame draw.
//!
//! [`GpuState`] owns the surface, device and depth buffer plus the three
//! renderers. The rain renderer always exists; the scene and skybox are
//! optional and a failure to load either only disables that part.

mod rain;
mod scene;
mod skybox;
mod texture;

use std::sync::Arc;

use winit::window::Window;

pub use rain::{ParticleStream, RainRenderer, RainUniforms};
pub use scene::{MaterialUniform, SceneRenderer, SceneUniforms};
pub use skybox::{SkyUniforms, SkyboxRenderer};
pub use texture::{create_depth_texture, GpuTexture, DEPTH_FORMAT};

use crate::camera::FlyCamera;
use crate::config::DemoConfig;
use crate::error::GpuError;
use crate::particles::ParticleSystem;
use crate::scene::Scene;
use crate::textures::{CubemapFaces, TextureData};

/// Pixel size of one cell in the generated fallback atlas.
const FALLBACK_ATLAS_CELL: u32 = 32;

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    rain: RainRenderer,
    scene: Option<SceneRenderer>,
    skybox: Option<SkyboxRenderer>,
    clear_color: wgpu::Color,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        demo: &DemoConfig,
        particles: &ParticleSystem,
        scene: Option<&Scene>,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let atlas = load_atlas(demo, particles);
        let rain = RainRenderer::new(
            &device,
            &queue,
            surface_format,
            &atlas,
            particles,
            demo.point_size,
        );

        let scene = scene
            .map(|scene| SceneRenderer::new(&device, &queue, surface_format, scene, demo.lighting));

        let skybox = demo.skybox_path.as_ref().and_then(|path| {
            let faces = match CubemapFaces::from_file(path) {
                Ok(faces) => faces,
                Err(err) => {
                    log::warn!("Skybox disabled, failed to load {}: {err}", path.display());
                    return None;
                }
            };
            let exposure = demo.skybox_exposure;
            Some(SkyboxRenderer::new(&device, &queue, surface_format, &faces, exposure))
        });

        let [r, g, b] = demo.clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            rain,
            scene,
            skybox,
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.reconfigure();
        }
    }

    /// Reconfigure the surface at its current size, after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = create_depth_texture(&self.device, &self.config);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    /// Upload the particle stream, then draw skybox, scene and rain.
    pub fn render(
        &mut self,
        camera: &FlyCamera,
        particles: &ParticleSystem,
    ) -> Result<(), wgpu::SurfaceError> {
        let projection = camera.projection_matrix(self.aspect());
        let view_proj = projection * camera.view_matrix();

        self.rain.write_particles(&self.queue, particles);
        self.rain
            .update_uniforms(&self.queue, view_proj, self.config.width, self.config.height);
        if let Some(scene) = &self.scene {
            scene.update_uniforms(&self.queue, view_proj, camera.position);
        }
        if let Some(skybox) = &self.skybox {
            skybox.update_uniforms(&self.queue, projection * camera.rotation_matrix());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(skybox) = &self.skybox {
                skybox.draw(&mut render_pass);
            }
            if let Some(scene) = &self.scene {
                scene.draw(&mut render_pass);
            }
            self.rain.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Load the rain atlas, falling back to a generated one.
fn load_atlas(demo: &DemoConfig, particles: &ParticleSystem) -> TextureData {
    let rain = particles.config();
    match TextureData::from_file(&demo.atlas_path) {
        Ok(atlas) => {
            log::info!(
                "Loaded rain atlas {} ({}x{})",
                demo.atlas_path.display(),
                atlas.width,
                atlas.height
            );
            atlas
        }
        Err(err) => {
            log::warn!(
                "Failed to load rain atlas {}: {err}; using a generated one",
                demo.atlas_path.display()
            );
            TextureData::rain_atlas(rain.atlas_rows, rain.atlas_cols, FALLBACK_ATLAS_CELL)
        }
    }
}
