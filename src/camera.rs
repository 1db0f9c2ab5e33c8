//! Perspective camera, orbit controls and the camera uniform.
//!
//! The controls orbit around a target point: dragging with the left mouse
//! button rotates, the wheel dollies in and out. With damping enabled every
//! input keeps acting for a few frames and fades out, so [`OrbitControls::update`]
//! has to run once per frame whether or not there was input.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const POLE_EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub fovy: cgmath::Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 10.0),
            target: Point3::new(0.0, 0.0, 0.0),
            fovy: cgmath::Deg(75.0),
            znear: 0.1,
            zfar: 1000.0,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit-style camera controls with optional damping.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: Rad<f32>,
    pub max_polar_angle: Rad<f32>,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    rotating: bool,
    cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(settings: &CameraSettings, viewport_height: u32) -> Self {
        Self {
            target: settings.target,
            enable_damping: true,
            damping_factor: settings.damping_factor,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: Rad(0.0),
            max_polar_angle: Rad(PI),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            rotating: false,
            cursor: None,
            viewport_height: viewport_height.max(1) as f32,
        }
    }

    /// Feed a window event; returns `true` if the controls consumed it.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let consumed = match (self.rotating, self.cursor) {
                    (true, Some(previous)) => {
                        self.rotate_by_pixels(position.x - previous.x, position.y - previous.y);
                        true
                    }
                    _ => false,
                };
                self.cursor = Some(*position);
                consumed
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                if scroll > 0.0 {
                    self.dolly_in();
                } else if scroll < 0.0 {
                    self.dolly_out();
                }
                true
            }
            WindowEvent::Resized(size) => {
                self.viewport_height = size.height.max(1) as f32;
                false
            }
            _ => false,
        }
    }

    /// A drag across the full viewport height rotates by one full turn.
    pub fn rotate_by_pixels(&mut self, dx: f64, dy: f64) {
        let per_pixel = 2.0 * PI / self.viewport_height * self.rotate_speed;
        self.delta_theta -= dx as f32 * per_pixel;
        self.delta_phi -= dy as f32 * per_pixel;
    }

    pub fn dolly_in(&mut self) {
        self.scale *= self.zoom_scale();
    }

    pub fn dolly_out(&mut self) {
        self.scale /= self.zoom_scale();
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Advance the controls by one frame and move `camera` accordingly.
    ///
    /// Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * factor;
        phi += self.delta_phi * factor;
        phi = phi.clamp(
            self.min_polar_angle.0.max(POLE_EPSILON),
            self.max_polar_angle.0.min(PI - POLE_EPSILON),
        );
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        let position = self.target
            + Vector3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        let moved = (position - camera.position).magnitude2() > 1e-12;
        camera.position = position;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
        moved
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state and its GPU-side uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Advance the controls one frame and push the new view to the GPU.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.controls.update(&mut self.camera);
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (Camera, OrbitControls) {
        let settings = CameraSettings::default();
        (
            Camera::new(settings.position, settings.target),
            OrbitControls::new(&settings, 600),
        )
    }

    #[test]
    fn idle_controls_keep_the_camera_in_place() {
        let (mut camera, mut controls) = rig();
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        let drift = camera.position - Point3::new(0.0, 0.0, 10.0);
        assert!(drift.magnitude() < 1e-4, "{:?}", camera.position);
    }

    #[test]
    fn rotation_keeps_distance_and_fades_out() {
        let (mut camera, mut controls) = rig();
        controls.rotate_by_pixels(120.0, 0.0);

        assert!(controls.update(&mut camera));
        let first_step = camera.position;
        assert!(((first_step - controls.target).magnitude() - 10.0).abs() < 1e-4);
        assert!(first_step.x < 0.0);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        let settled = camera.position;
        controls.update(&mut camera);
        assert!((camera.position - settled).magnitude() < 1e-4);
        assert!(((camera.position - controls.target).magnitude() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn wheel_up_moves_closer() {
        let (mut camera, mut controls) = rig();
        controls.dolly_in();
        controls.update(&mut camera);
        assert!((camera.position.z - 9.5).abs() < 1e-4);

        controls.dolly_out();
        controls.update(&mut camera);
        assert!((camera.position.z - 10.0).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let (mut camera, mut controls) = rig();
        controls.enable_damping = false;
        controls.rotate_by_pixels(0.0, 10_000.0);
        controls.update(&mut camera);
        assert!(camera.position.z > 0.0);
        assert!(camera.position.y > 9.99);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0);
        projection.resize(1920, 1080);
        assert!((projection.aspect() - 16.0 / 9.0).abs() < 1e-6);
        projection.resize(0, 0);
        assert_eq!(projection.aspect(), 1.0);
    }
}
