//! Configuration for the orrery viewer.
//!
//! Settings persist to disk as a RON file next to the user's other
//! application configs. CLI flags override whatever was loaded, and
//! [`Config::reload`] reports edits made while the viewer is running.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BloomSettings, BodyConfig, CameraConfig, Config, DebugConfig, RenderConfig, SceneConfig,
    WindowConfig, default_config_dir,
};
pub use error::ConfigError;
