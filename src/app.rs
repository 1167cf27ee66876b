//! Window, event loop and the per-frame update.
//!
//! Each redraw runs, in order: key shortcuts, clock, camera, particle
//! update, particle upload and draw. Mouse look uses raw device motion and
//! is active only while the cursor is captured (left click captures, Escape
//! releases, Escape again quits).

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{CursorGrabMode, Window, WindowId},
};

use crate::camera::FlyCamera;
use crate::config::{DemoConfig, SceneSource};
use crate::error::DemoError;
use crate::gpu::GpuState;
use crate::input::Input;
use crate::particles::ParticleSystem;
use crate::scene::Scene;
use crate::time::Time;

/// Open a window and run the demo until it is closed.
pub fn run(config: DemoConfig) -> Result<(), DemoError> {
    config.validate()?;
    let particles = ParticleSystem::new(config.rain.clone())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, particles);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    particles: ParticleSystem,
    camera: FlyCamera,
    input: Input,
    time: Time,
    cursor_captured: bool,
    /// Fatal error raised inside the event loop, returned from [`run`].
    error: Option<DemoError>,
}

impl App {
    fn new(config: DemoConfig, particles: ParticleSystem) -> Self {
        let camera = FlyCamera::new(&config.camera);
        let time = Time::with_fixed_delta(config.fixed_delta);
        Self {
            config,
            window: None,
            gpu_state: None,
            particles,
            camera,
            input: Input::new(),
            time,
            cursor_captured: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: impl Into<DemoError>) {
        self.error = Some(err.into());
        event_loop.exit();
    }

    fn load_scene(&self) -> Option<Scene> {
        match &self.config.scene {
            SceneSource::Procedural => Some(Scene::procedural(&self.config.rain)),
            SceneSource::Gltf(path) => match Scene::load_gltf(path) {
                Ok(scene) => Some(scene),
                Err(err) => {
                    log::warn!("Scene disabled, failed to load {}: {err}", path.display());
                    None
                }
            },
            SceneSource::Disabled => None,
        }
    }

    fn capture_cursor(&mut self) {
        let Some(window) = &self.window else { return };
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(err) = grabbed {
            log::warn!("Could not grab the cursor: {err}");
        }
        window.set_cursor_visible(false);
        self.cursor_captured = true;
    }

    fn release_cursor(&mut self) {
        let Some(window) = &self.window else { return };
        if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {err}");
        }
        window.set_cursor_visible(true);
        self.cursor_captured = false;
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.key_pressed(KeyCode::Escape) {
            if self.cursor_captured {
                self.release_cursor();
            } else {
                event_loop.exit();
                return;
            }
        }
        if self.input.key_pressed(KeyCode::KeyP) {
            self.time.toggle_pause();
            log::info!("{}", if self.time.is_paused() { "Paused" } else { "Resumed" });
        }

        let dt = self.time.update();

        if self.cursor_captured {
            let delta = self.input.mouse_delta();
            self.camera.process_mouse_delta(delta.x, delta.y);
        }
        self.camera
            .process_movement(self.input.movement(), self.time.real_delta());

        self.particles.update(dt);

        if let Some(gpu_state) = &mut self.gpu_state {
            match gpu_state.render(&self.camera, &self.particles) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu_state.reconfigure()
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of GPU memory");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Render error: {e:?}"),
            }
        }

        if self.time.fps_refreshed() {
            self.update_title();
        }

        self.input.begin_frame();
    }

    fn update_title(&self) {
        let Some(window) = &self.window else { return };
        let counts = self.particles.state_counts();
        let paused = if self.time.is_paused() { " [paused]" } else { "" };
        window.set_title(&format!(
            "{} | {:.0} FPS | impact {} | splash {}{paused}",
            self.config.title,
            self.time.fps(),
            counts.impact,
            counts.splash,
        ));
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err),
        };
        self.window = Some(window.clone());

        let scene = self.load_scene();
        let gpu_state = GpuState::new(window, &self.config, &self.particles, scene.as_ref());
        match pollster::block_on(gpu_state) {
            Ok(gpu_state) => {
                log::info!(
                    "Rendering {} drops (scene: {}, skybox: {})",
                    self.particles.len(),
                    gpu_state.has_scene(),
                    gpu_state.has_skybox()
                );
                self.gpu_state = Some(gpu_state);
            }
            Err(err) => self.fail(event_loop, err),
        }

        // Reset the clock so setup time does not land in the first frame.
        self.time = Time::with_fixed_delta(self.config.fixed_delta);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::Focused(false) => {
                self.input.clear();
                if self.cursor_captured {
                    self.release_cursor();
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !self.cursor_captured {
                    self.capture_cursor();
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_captured {
                self.input.add_mouse_motion(dx, dy);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
