//! Orrery application: window, frame clock and the GPU scene renderer.

pub mod clock;
pub mod system_renderer;
pub mod window;

pub use clock::FrameClock;
pub use system_renderer::{SystemRenderer, bloom_config_from};
pub use window::{AppError, AppState, GpuSession, SurfaceStatus, orbit_input_from_mouse, run};
