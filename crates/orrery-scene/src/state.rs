//! The mutable scene: bodies, lights, camera and its controls.

use std::path::{Path, PathBuf};

use glam::Vec3;
use orrery_render::Camera;

use crate::controls::{OrbitControls, OrbitInput};
use crate::kinematics::Body;
use crate::lights::SceneLights;
use crate::viewport::{Viewport, ViewportError};

/// Everything the frame updater mutates. Built by
/// [`SceneBuilder`](crate::SceneBuilder); owned by one session.
#[derive(Clone, Debug)]
pub struct SceneState {
    bodies: Vec<Body>,
    central: usize,
    lights: SceneLights,
    camera: Camera,
    controls: OrbitControls,
    viewport: Viewport,
    background: Option<PathBuf>,
    frame: u64,
}

impl SceneState {
    pub(crate) fn new(
        bodies: Vec<Body>,
        central: usize,
        lights: SceneLights,
        camera: Camera,
        controls: OrbitControls,
        viewport: Viewport,
        background: Option<PathBuf>,
    ) -> Self {
        let mut state = Self {
            bodies,
            central,
            lights,
            camera,
            controls,
            viewport,
            background,
            frame: 0,
        };
        state.attach_light();
        state
    }

    /// Advance every body to elapsed time `t`, then step the camera controls.
    ///
    /// Pure arithmetic over validated state; never fails.
    pub fn advance(&mut self, t: f64) {
        for body in &mut self.bodies {
            body.advance(t);
        }
        self.attach_light();
        self.controls.update(&mut self.camera);
        self.frame += 1;
    }

    fn attach_light(&mut self) {
        if let Some(central) = self.bodies.get(self.central) {
            self.lights.point.position = central.position();
        }
    }

    /// Queue camera input for the next [`advance`](Self::advance).
    pub fn apply_input(&mut self, input: &OrbitInput) {
        self.controls
            .apply_input(input, self.viewport.height(), &self.camera);
    }

    /// Adopt a new output size: update the camera aspect ratio and rebuild
    /// its projection.
    ///
    /// Zero-sized viewports are rejected and leave the camera untouched.
    /// Calling this twice with the same size is the same as calling it once.
    pub fn reconcile_viewport(&mut self, width: u32, height: u32) -> Result<Viewport, ViewportError> {
        let viewport = Viewport::new(width, height)?;
        self.camera.set_aspect_ratio(width as f32, height as f32);
        self.camera.update_projection_matrix();
        self.viewport = viewport;
        Ok(viewport)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|body| body.name == name)
    }

    /// The stationary body that hosts the point light.
    pub fn central_body(&self) -> &Body {
        &self.bodies[self.central]
    }

    pub fn lights(&self) -> &SceneLights {
        &self.lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resolved path of the background image, if the scene has one.
    pub fn background(&self) -> Option<&Path> {
        self.background.as_deref()
    }

    /// Number of [`advance`](Self::advance) calls so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// `(name, position)` pairs, for diagnostics.
    pub fn positions(&self) -> impl Iterator<Item = (&str, Vec3)> {
        self.bodies
            .iter()
            .map(|body| (body.name.as_str(), body.position()))
    }
}
