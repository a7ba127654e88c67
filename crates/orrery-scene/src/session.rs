//! Frame and resize entry points, and a session that runs without a display.

use tracing::{debug, info};

use crate::state::SceneState;

/// Target of the render loop. The driver calls these from its event loop,
/// never concurrently.
pub trait RenderSession {
    /// Update the scene to elapsed time `t` (seconds) and produce a frame.
    fn on_frame(&mut self, t: f64);

    /// React to a new output size in physical pixels.
    fn on_resize(&mut self, width: u32, height: u32);
}

/// Runs the scene update without a GPU, logging body positions.
pub struct HeadlessSession {
    state: SceneState,
    frames: u64,
    log_every: u64,
}

impl HeadlessSession {
    /// `log_every` logs positions every that many frames; 0 disables it.
    pub fn new(state: SceneState, log_every: u64) -> Self {
        Self {
            state,
            frames: 0,
            log_every,
        }
    }

    /// Drive `frames` frames at a fixed step of `dt` seconds, starting at t = 0.
    pub fn run(&mut self, frames: u64, dt: f64) {
        info!(frames, dt, "Running headless session");
        for i in 0..frames {
            self.on_frame(i as f64 * dt);
        }
        self.log_positions();
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn log_positions(&self) {
        for (name, position) in self.state.positions() {
            info!(
                frame = self.frames,
                body = name,
                x = position.x,
                y = position.y,
                z = position.z,
                "Body position"
            );
        }
    }
}

impl RenderSession for HeadlessSession {
    fn on_frame(&mut self, t: f64) {
        self.state.advance(t);
        self.frames += 1;
        if self.log_every > 0 && self.frames % self.log_every == 0 {
            self.log_positions();
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        match self.state.reconcile_viewport(width, height) {
            Ok(viewport) => debug!(
                width = viewport.width(),
                height = viewport.height(),
                aspect = viewport.aspect_ratio(),
                "Viewport reconciled"
            ),
            Err(e) => debug!("Ignoring resize: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SceneBuilder;
    use orrery_config::Config;

    fn session() -> HeadlessSession {
        let state = SceneBuilder::from_config(&Config::default())
            .require_textures(false)
            .build()
            .unwrap();
        HeadlessSession::new(state, 0)
    }

    #[test]
    fn test_run_counts_frames() {
        let mut session = session();
        session.run(120, 1.0 / 60.0);
        assert_eq!(session.frames(), 120);
        assert_eq!(session.state().frame(), 120);
    }

    #[test]
    fn test_run_places_planets_at_last_time() {
        let mut session = session();
        session.run(61, 1.0 / 60.0);
        // Last frame is t = 1.0; earth: R = 15, ω = 0.5.
        let earth = session.state().body("earth").unwrap().position();
        let expected_x = 15.0 * 0.5f32.cos();
        let expected_z = 15.0 * 0.5f32.sin();
        assert!((earth.x - expected_x).abs() < 1e-4);
        assert!((earth.z - expected_z).abs() < 1e-4);
    }

    #[test]
    fn test_resize_through_session() {
        let mut session = session();
        session.on_resize(1920, 1080);
        assert!((session.state().camera().aspect_ratio() - 1.7778).abs() < 1e-3);
        session.on_resize(800, 0);
        assert!((session.state().camera().aspect_ratio() - 1.7778).abs() < 1e-3);
    }

    #[test]
    fn test_logging_every_frame_does_not_disturb_state() {
        let state = SceneBuilder::from_config(&Config::default())
            .require_textures(false)
            .build()
            .unwrap();
        let mut logged = HeadlessSession::new(state.clone(), 1);
        let mut quiet = HeadlessSession::new(state, 0);
        logged.run(10, 0.1);
        quiet.run(10, 0.1);
        let a: Vec<_> = logged.state().positions().map(|(_, p)| p).collect();
        let b: Vec<_> = quiet.state().positions().map(|(_, p)| p).collect();
        assert_eq!(a, b);
    }
}
