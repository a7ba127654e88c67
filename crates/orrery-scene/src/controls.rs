//! Orbit camera controller: rotate, zoom and pan around a target with damping.
//!
//! The camera sits on a sphere around `target`, described by an azimuth
//! (`theta`, around +Y, 0 on +Z) and a polar angle (`phi`, 0 straight above).
//! Input accumulates into pending deltas; every [`OrbitControls::update`]
//! applies `damping_factor` of the pending rotation and pan and keeps the
//! rest, so motion eases out over subsequent frames.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use orrery_config::CameraConfig;
use orrery_render::Camera;

/// Keeps the camera off the poles, where the look-at basis degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// Zoom factor per scroll step at `zoom_speed = 1`.
const ZOOM_STEP: f32 = 0.95;

/// Input gathered for one frame, in screen pixels and scroll steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitInput {
    /// Rotation drag. +x moves the view right, +y moves it down.
    pub rotate: Vec2,
    /// Pan drag, same orientation as `rotate`.
    pub pan: Vec2,
    /// Scroll steps. Positive zooms in.
    pub zoom: f32,
}

impl OrbitInput {
    pub fn is_idle(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Damped orbit controller.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    distance: f32,
    theta: f32,
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    pending_scale: f32,
}

impl OrbitControls {
    /// Start from the camera's current position, orbiting `config.target`.
    pub fn new(config: &CameraConfig, camera: &Camera) -> Self {
        let target = Vec3::from(config.target);
        let min_distance = config.min_distance.max(0.0);
        let max_distance = config.max_distance.max(min_distance);
        let mut controls = Self {
            target,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            min_distance,
            max_distance,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            distance: 0.0,
            theta: 0.0,
            phi: PI / 2.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        };
        controls.sync_from_offset(camera.position - target);
        controls
    }

    fn sync_from_offset(&mut self, offset: Vec3) {
        let distance = offset.length();
        if distance > 0.0 {
            self.theta = offset.x.atan2(offset.z);
            self.phi = (offset.y / distance).clamp(-1.0, 1.0).acos();
        }
        self.distance = distance;
    }

    /// Distance from the camera to the target after the last update.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Azimuth around +Y in radians.
    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    /// Angle from +Y in radians.
    pub fn polar(&self) -> f32 {
        self.phi
    }

    /// Queue one frame of input. `viewport_height` converts pixels to angles.
    pub fn apply_input(&mut self, input: &OrbitInput, viewport_height: u32, camera: &Camera) {
        if input.is_idle() {
            return;
        }
        let height = viewport_height.max(1) as f32;

        // A drag across the full viewport height is one full turn.
        self.pending_theta -= TAU * input.rotate.x / height * self.rotate_speed;
        self.pending_phi -= TAU * input.rotate.y / height * self.rotate_speed;

        if input.pan != Vec2::ZERO {
            // Pixels map to world units at the target's depth.
            let world_per_pixel = 2.0 * self.distance * (camera.fov_y * 0.5).tan() / height;
            let pan = input.pan * world_per_pixel * self.pan_speed;
            self.pending_pan += -camera.right() * pan.x + camera.up() * pan.y;
        }

        if input.zoom != 0.0 {
            let step = ZOOM_STEP.powf(self.zoom_speed);
            self.pending_scale *= step.powf(input.zoom);
        }
    }

    /// Apply one step of the pending motion and write the camera pose.
    pub fn update(&mut self, camera: &mut Camera) {
        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        self.theta += self.pending_theta * factor;
        self.phi = (self.phi + self.pending_phi * factor).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.distance = (self.distance * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pending_pan * factor;

        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.distance * sin_phi * self.theta.sin(),
            self.distance * self.phi.cos(),
            self.distance * sin_phi * self.theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        let keep = 1.0 - factor;
        self.pending_theta *= keep;
        self.pending_phi *= keep;
        self.pending_pan *= keep;
        self.pending_scale = 1.0;
    }
}
