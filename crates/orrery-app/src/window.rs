//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]: it creates the
//! window and GPU session on resume, forwards mouse input to the orbit
//! controls, and drives one frame per `RedrawRequested`.

use std::path::PathBuf;
use std::sync::Arc;

use orrery_config::{CliArgs, Config};
use orrery_input::MouseState;
use orrery_render::{
    RenderContext, RenderContextError, SurfaceError, TextureError, init_render_context_blocking,
};
use orrery_scene::{OrbitInput, RenderSession, SceneState, Viewport, ViewportError};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::clock::FrameClock;
use crate::system_renderer::SystemRenderer;

/// Seconds between checks of `config.ron` for changed bloom settings.
pub const CONFIG_RELOAD_INTERVAL: f64 = 1.0;

/// Errors that end the windowed session.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    RenderContext(#[from] RenderContextError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("GPU out of memory")]
    OutOfMemory,
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attributes = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width.max(1) as f64,
            config.window.height.max(1) as f64,
        ));
    if config.window.fullscreen {
        attributes.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attributes
    }
}

/// Camera input for this frame: left drag rotates, right or middle drag pans,
/// the wheel zooms.
pub fn orbit_input_from_mouse(mouse: &MouseState) -> OrbitInput {
    OrbitInput {
        rotate: mouse.drag_delta(MouseButton::Left),
        pan: mouse.drag_delta(MouseButton::Right) + mouse.drag_delta(MouseButton::Middle),
        zoom: mouse.scroll(),
    }
}

/// Whether the window surface can be drawn to.
///
/// A minimized window reports a zero size, which the viewport rejects. No
/// frames are rendered until a valid size arrives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    #[default]
    Presentable,
    Minimized,
}

impl SurfaceStatus {
    /// Status after a viewport reconciliation.
    pub fn after_resize(result: &Result<Viewport, ViewportError>) -> Self {
        match result {
            Ok(_) => Self::Presentable,
            Err(_) => Self::Minimized,
        }
    }

    pub fn is_presentable(self) -> bool {
        self == Self::Presentable
    }
}

/// A scene bound to a window surface.
pub struct GpuSession {
    ctx: RenderContext,
    renderer: SystemRenderer,
    scene: SceneState,
    status: SurfaceStatus,
    out_of_memory: bool,
}

impl GpuSession {
    pub fn new(ctx: RenderContext, mut scene: SceneState, config: &Config) -> Result<Self, AppError> {
        let (width, height) = ctx.size();
        let reconciled = scene.reconcile_viewport(width, height);
        if let Err(e) = &reconciled {
            debug!("Initial surface size rejected: {e}");
        }
        let renderer = SystemRenderer::new(&ctx, &scene, &config.render)?;
        Ok(Self {
            ctx,
            renderer,
            scene,
            status: SurfaceStatus::after_resize(&reconciled),
            out_of_memory: false,
        })
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn apply_input(&mut self, input: &OrbitInput) {
        self.scene.apply_input(input);
    }

    /// Apply a reloaded configuration's live-tunable settings.
    pub fn apply_config(&mut self, config: &Config) {
        self.renderer.set_bloom(&self.ctx, &config.render.bloom);
    }

    pub fn status(&self) -> SurfaceStatus {
        self.status
    }

    /// Set once the GPU reports it is out of memory; the loop should exit.
    pub fn is_out_of_memory(&self) -> bool {
        self.out_of_memory
    }
}

impl RenderSession for GpuSession {
    fn on_frame(&mut self, t: f64) {
        self.scene.advance(t);
        if !self.status.is_presentable() {
            return;
        }
        match self.renderer.render(&self.ctx, &self.scene) {
            Ok(()) => {}
            Err(SurfaceError::Lost) => {
                let (width, height) = self.ctx.size();
                self.ctx.resize(width, height);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                self.out_of_memory = true;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        let reconciled = self.scene.reconcile_viewport(width, height);
        self.status = SurfaceStatus::after_resize(&reconciled);
        match reconciled {
            Ok(viewport) => {
                self.ctx.resize(viewport.width(), viewport.height());
                self.renderer.resize(&self.ctx, viewport);
                info!(
                    "Window resized to {}x{} (aspect {:.3})",
                    viewport.width(),
                    viewport.height(),
                    viewport.aspect_ratio()
                );
            }
            Err(e) => debug!("Ignoring resize, rendering paused: {e}"),
        }
    }
}

/// Hot-reload bookkeeping: the file as last read plus the CLI overrides to
/// re-apply on top of it.
struct ConfigWatch {
    config_dir: PathBuf,
    file_config: Config,
    cli: CliArgs,
    last_check: f64,
}

/// Application state: window, GPU session, input and animation clock.
pub struct AppState {
    config: Config,
    pending_scene: Option<SceneState>,
    window: Option<Arc<Window>>,
    session: Option<GpuSession>,
    mouse: MouseState,
    clock: FrameClock,
    watch: Option<ConfigWatch>,
    error: Option<AppError>,
}

impl AppState {
    pub fn new(config: Config, scene: SceneState) -> Self {
        Self {
            config,
            pending_scene: Some(scene),
            window: None,
            session: None,
            mouse: MouseState::new(),
            clock: FrameClock::new(),
            watch: None,
            error: None,
        }
    }

    /// Poll `config_dir/config.ron` for changes while running. `file_config`
    /// is the config as read from disk, before `cli` overrides.
    pub fn with_hot_reload(mut self, config_dir: PathBuf, file_config: Config, cli: CliArgs) -> Self {
        self.watch = Some(ConfigWatch {
            config_dir,
            file_config,
            cli,
            last_check: 0.0,
        });
        self
    }

    /// The error that ended the session, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: AppError) {
        error!("{e}");
        self.error = Some(e);
        event_loop.exit();
    }

    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let inner_size = window.inner_size();
        info!(
            "Window created: {}x{} (scale: {:.2})",
            inner_size.width,
            inner_size.height,
            window.scale_factor()
        );

        let ctx = init_render_context_blocking(window.clone(), self.config.window.vsync)?;
        let Some(scene) = self.pending_scene.take() else {
            return Ok(());
        };
        self.session = Some(GpuSession::new(ctx, scene, &self.config)?);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn resize_to_window(&mut self) {
        if let (Some(window), Some(session)) = (&self.window, &mut self.session) {
            let size = window.inner_size();
            session.on_resize(size.width, size.height);
            if session.status().is_presentable() {
                window.request_redraw();
            }
        }
    }

    fn check_config_reload(&mut self) {
        let now = self.clock.elapsed();
        let (Some(watch), Some(session)) = (&mut self.watch, &mut self.session) else {
            return;
        };
        if now - watch.last_check < CONFIG_RELOAD_INTERVAL {
            return;
        }
        watch.last_check = now;

        match watch.file_config.reload(&watch.config_dir) {
            Ok(Some(file_config)) => {
                let mut effective = file_config.clone();
                effective.apply_cli_overrides(&watch.cli);
                session.apply_config(&effective);
                info!("Applied reloaded bloom settings; other changes take effect on restart");
                watch.file_config = file_config;
                self.config = effective;
            }
            Ok(None) => {}
            Err(e) => debug!("Config reload skipped: {e}"),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let input = orbit_input_from_mouse(&self.mouse);
        let t = self.clock.tick();
        self.check_config_reload();

        let Some(session) = &mut self.session else {
            return;
        };
        session.apply_input(&input);
        session.on_frame(t);
        if session.is_out_of_memory() {
            self.fail(event_loop, AppError::OutOfMemory);
            return;
        }

        self.mouse.clear_transients();
        // A minimized window is redrawn again once a valid resize arrives.
        if let Some(window) = &self.window
            && session.status().is_presentable()
        {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start_session(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let (Some(window), Some(session)) = (&self.window, &mut self.session) else {
                    return;
                };
                let was_presentable = session.status().is_presentable();
                session.on_resize(new_size.width, new_size.height);
                if !was_presentable && session.status().is_presentable() {
                    window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                debug!("Scale factor changed to {scale_factor:.2}");
                self.resize_to_window();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse.on_scroll(delta);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse.on_cursor_left();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Create an event loop and run the viewer until the window closes.
#[instrument(skip_all)]
pub fn run(mut app: AppState) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use winit::event::ElementState;

    #[test]
    fn test_window_attributes_use_config_size_and_title() {
        let mut config = Config::default();
        config.window.width = 1024;
        config.window.height = 600;
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Orrery");
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
                1024.0, 600.0
            )))
        );
        assert!(attrs.fullscreen.is_none());
    }

    #[test]
    fn test_fullscreen_config_requests_borderless() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        let attrs = window_attributes_from_config(&config);
        assert!(matches!(attrs.fullscreen, Some(Fullscreen::Borderless(None))));
    }

    fn scene() -> SceneState {
        orrery_scene::SceneBuilder::from_config(&Config::default())
            .require_textures(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_zero_size_resize_pauses_rendering() {
        let mut scene = scene();
        let status = SurfaceStatus::after_resize(&scene.reconcile_viewport(800, 0));
        assert_eq!(status, SurfaceStatus::Minimized);
        assert!(!status.is_presentable());
    }

    #[test]
    fn test_valid_resize_resumes_rendering() {
        let mut scene = scene();
        let minimized = SurfaceStatus::after_resize(&scene.reconcile_viewport(0, 0));
        assert!(!minimized.is_presentable());
        let restored = SurfaceStatus::after_resize(&scene.reconcile_viewport(1920, 1080));
        assert_eq!(restored, SurfaceStatus::Presentable);
        assert_eq!(scene.viewport().width(), 1920);
    }

    #[test]
    fn test_surface_starts_presentable() {
        assert!(SurfaceStatus::default().is_presentable());
    }

    #[test]
    fn test_idle_mouse_produces_idle_input() {
        let mouse = MouseState::new();
        assert!(orbit_input_from_mouse(&mouse).is_idle());
    }

    #[test]
    fn test_left_drag_rotates() {
        let mut mouse = MouseState::new();
        mouse.on_cursor_moved(100.0, 100.0);
        mouse.on_button(MouseButton::Left, ElementState::Pressed);
        mouse.on_cursor_moved(110.0, 95.0);
        let input = orbit_input_from_mouse(&mouse);
        assert_eq!(input.rotate, Vec2::new(10.0, -5.0));
        assert_eq!(input.pan, Vec2::ZERO);
    }

    #[test]
    fn test_right_drag_pans() {
        let mut mouse = MouseState::new();
        mouse.on_cursor_moved(100.0, 100.0);
        mouse.on_button(MouseButton::Right, ElementState::Pressed);
        mouse.on_cursor_moved(90.0, 100.0);
        let input = orbit_input_from_mouse(&mouse);
        assert_eq!(input.pan, Vec2::new(-10.0, 0.0));
        assert_eq!(input.rotate, Vec2::ZERO);
    }

    #[test]
    fn test_wheel_zooms() {
        let mut mouse = MouseState::new();
        mouse.on_scroll(winit::event::MouseScrollDelta::LineDelta(0.0, 2.0));
        let input = orbit_input_from_mouse(&mouse);
        assert_eq!(input.zoom, 2.0);
    }
}
