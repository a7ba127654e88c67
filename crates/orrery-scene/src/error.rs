use std::path::PathBuf;

use glam::Vec3;

/// Errors raised while building a scene. All are fatal to startup.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("body #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("body name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("body '{name}': {field} must be finite, got {value}")]
    NonFinite {
        name: String,
        field: &'static str,
        value: f32,
    },

    #[error("body '{name}': radius must be positive, got {radius}")]
    InvalidRadius { name: String, radius: f32 },

    #[error("body '{name}': orbit radius must not be negative, got {orbit_radius}")]
    NegativeOrbitRadius { name: String, orbit_radius: f32 },

    #[error("body '{name}': emissive must not be negative, got {emissive}")]
    NegativeEmissive { name: String, emissive: f32 },

    #[error("texture for '{name}' not found at {path}")]
    MissingTexture { name: String, path: PathBuf },

    #[error("scene has no stationary body to host the central light")]
    NoCentralBody,

    #[error("central body '{name}' must sit at the origin, got {position}")]
    CentralBodyOffOrigin { name: String, position: Vec3 },

    #[error("camera: {field} must be finite, got {value}")]
    NonFiniteCamera { field: &'static str, value: f32 },

    #[error("camera: field of view must be between 0 and 180 degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("camera: clip planes must satisfy 0 < near < far, got near {near} far {far}")]
    InvalidClipPlanes { near: f32, far: f32 },

    #[error("camera: position and target coincide at {0}")]
    CameraAtTarget(Vec3),
}
