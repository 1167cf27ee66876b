//! Free-fly camera.
//!
//! Mouse motion turns the camera (yaw around the world up axis, pitch
//! clamped short of straight up/down), WASD moves along the view direction
//! and its right vector, Space and Shift move along world up.

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

const PITCH_LIMIT: f32 = 89.0;

/// Movement keys held during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// First-person camera with yaw/pitch look and free movement.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    world_up: Vec3,
    /// Degrees.
    yaw: f32,
    /// Degrees.
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    speed: f32,
    sensitivity: f32,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl FlyCamera {
    /// Create a camera from its configuration.
    pub fn new(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: config.position,
            world_up: config.world_up.try_normalize().unwrap_or(Vec3::Z),
            yaw: config.yaw,
            pitch: config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            front: Vec3::Y,
            right: Vec3::X,
            up: Vec3::Z,
            speed: config.speed,
            sensitivity: config.sensitivity,
            fov_y: config.fov_y,
            near: config.near,
            far: config.far,
        };
        camera.update_vectors();
        camera
    }

    /// Turn the camera by a mouse delta in pixels.
    ///
    /// Moving the mouse right turns right, moving it down looks down.
    pub fn process_mouse_delta(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Move the camera for one frame.
    pub fn process_movement(&mut self, movement: Movement, dt: f32) {
        let step = self.speed * dt;
        if movement.forward {
            self.position += self.front * step;
        }
        if movement.backward {
            self.position -= self.front * step;
        }
        if movement.left {
            self.position -= self.right * step;
        }
        if movement.right {
            self.position += self.right * step;
        }
        if movement.up {
            self.position += self.world_up * step;
        }
        if movement.down {
            self.position -= self.world_up * step;
        }
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        // Z-up convention: yaw rotates around Z, pitch lifts towards Z.
        self.front =
            Vec3::new(yaw.cos() * pitch.cos(), yaw.sin() * pitch.cos(), pitch.sin()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// View matrix looking along the current front vector.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// View matrix with the translation removed, for the skybox.
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::ZERO, self.front, self.up)
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}
