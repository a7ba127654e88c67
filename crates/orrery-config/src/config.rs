//! Configuration structs with defaults matching the stock solar-system scene.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering and post-processing settings.
    pub render: RenderConfig,
    /// Camera projection and orbit-control settings.
    pub camera: CameraConfig,
    /// Scene contents: bodies, lights, and textures.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Bloom post-processing parameters.
    pub bloom: BloomSettings,
    /// Latitude and longitude segments of every body sphere.
    pub sphere_segments: u32,
    /// MSAA sample count for the scene passes (1 disables, otherwise 4).
    pub msaa_samples: u32,
}

/// Bloom parameters as exposed to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomSettings {
    /// Disable to skip the bloom passes and only tonemap.
    pub enabled: bool,
    /// Luminance above which pixels start to glow.
    pub threshold: f32,
    /// Strength of the glow added back onto the scene.
    pub strength: f32,
    /// Spread of the glow (0 keeps it tight, 1 is the widest blur).
    pub radius: f32,
    /// Width of the soft transition around `threshold`.
    pub soft_knee: f32,
    /// Number of downsample/upsample levels.
    pub iterations: u32,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Initial camera position.
    pub position: [f32; 3],
    /// Point the camera orbits around.
    pub target: [f32; 3],
    /// Smooth camera motion over several frames instead of applying input at once.
    pub enable_damping: bool,
    /// Fraction of pending motion applied per frame when damping is enabled.
    pub damping_factor: f32,
    /// Closest allowed distance to the target.
    pub min_distance: f32,
    /// Farthest allowed distance to the target.
    pub max_distance: f32,
    /// Multiplier on drag-to-rotate speed.
    pub rotate_speed: f32,
    /// Multiplier on scroll-to-zoom speed.
    pub zoom_speed: f32,
    /// Multiplier on drag-to-pan speed.
    pub pan_speed: f32,
}

/// Scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory that texture paths are resolved against.
    pub asset_dir: PathBuf,
    /// Background image drawn behind all bodies.
    pub background: String,
    /// Intensity of the white ambient light.
    pub ambient_intensity: f32,
    /// Intensity of the point light at the central star.
    pub light_intensity: f32,
    /// Distance at which the point light falls off to zero.
    pub light_range: f32,
    /// The bodies making up the system. The first stationary one is the star.
    pub bodies: Vec<BodyConfig>,
}

/// One celestial body as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Unique display name.
    pub name: String,
    /// Sphere radius in scene units.
    pub radius: f32,
    /// Texture file, relative to `SceneConfig::asset_dir`.
    pub texture: String,
    /// Placement before the first frame.
    pub base_position: [f32; 3],
    /// Orbit radius around the origin. Zero means the body never moves.
    pub orbit_radius: f32,
    /// Orbital angular speed in radians per second.
    pub orbit_angular_speed: f32,
    /// Spin added to the body's rotation every frame, in radians.
    pub self_rotation_speed: f32,
    /// HDR self-illumination. Non-zero for the star so it feeds the bloom.
    pub emissive: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log body positions every N frames (0 disables).
    pub log_positions_every: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bloom: BloomSettings::default(),
            sphere_segments: 50,
            msaa_samples: 4,
        }
    }
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.85,
            strength: 1.5,
            radius: 0.4,
            soft_knee: 0.5,
            iterations: 5,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 250.0,
            position: [0.0, 30.0, 80.0],
            target: [0.0, 0.0, 0.0],
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 10.0,
            max_distance: 200.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            background: "stars.png".to_string(),
            ambient_intensity: 0.3,
            light_intensity: 1.2,
            light_range: 300.0,
            bodies: vec![
                BodyConfig {
                    name: "sun".to_string(),
                    radius: 8.0,
                    texture: "sun_texture.png".to_string(),
                    base_position: [0.0, 0.0, 0.0],
                    orbit_radius: 0.0,
                    orbit_angular_speed: 0.0,
                    self_rotation_speed: 0.002,
                    emissive: 4.0,
                },
                BodyConfig::planet("earth", 3.0, [45.0, 0.0, 0.0], 15.0, 0.5, 0.005),
                BodyConfig::planet("mars", 2.5, [80.0, 0.0, 0.0], 25.0, 0.3, 0.004),
                BodyConfig::planet("jupiter", 7.0, [120.0, 0.0, 0.0], 40.0, 0.2, 0.003),
            ],
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            radius: 1.0,
            texture: String::new(),
            base_position: [0.0; 3],
            orbit_radius: 0.0,
            orbit_angular_speed: 0.0,
            self_rotation_speed: 0.0,
            emissive: 0.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_positions_every: 0,
        }
    }
}

impl BodyConfig {
    /// A non-emissive orbiting body whose texture is `<name>_texture.png`.
    pub fn planet(
        name: &str,
        radius: f32,
        base_position: [f32; 3],
        orbit_radius: f32,
        orbit_angular_speed: f32,
        self_rotation_speed: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            radius,
            texture: format!("{name}_texture.png"),
            base_position,
            orbit_radius,
            orbit_angular_speed,
            self_rotation_speed,
            emissive: 0.0,
        }
    }
}

/// Platform config directory for the viewer, e.g. `~/.config/orrery` on Linux.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("orrery"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Absolute path of the texture named `file` under the scene asset directory.
    pub fn asset_path(&self, file: &str) -> PathBuf {
        self.scene.asset_dir.join(file)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
