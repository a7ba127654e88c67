//! Scene construction: validate body descriptors and assemble a [`SceneState`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::Vec3;
use orrery_config::{BodyConfig, CameraConfig, Config};
use orrery_render::Camera;
use tracing::{debug, info};

use crate::controls::OrbitControls;
use crate::error::SceneError;
use crate::kinematics::{Body, Orbit};
use crate::lights::SceneLights;
use crate::state::SceneState;
use crate::viewport::Viewport;

/// Static description of one body, as read from configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDescriptor {
    pub name: String,
    pub radius: f32,
    /// Texture file name, relative to the asset directory.
    pub texture: String,
    /// Where the body sits before the first frame.
    pub base_position: Vec3,
    pub orbit_radius: f32,
    pub orbit_angular_speed: f32,
    pub self_rotation_speed: f32,
    pub emissive: f32,
}

impl From<&BodyConfig> for BodyDescriptor {
    fn from(config: &BodyConfig) -> Self {
        Self {
            name: config.name.clone(),
            radius: config.radius,
            texture: config.texture.clone(),
            base_position: Vec3::from(config.base_position),
            orbit_radius: config.orbit_radius,
            orbit_angular_speed: config.orbit_angular_speed,
            self_rotation_speed: config.self_rotation_speed,
            emissive: config.emissive,
        }
    }
}

impl BodyDescriptor {
    fn validate(&self, index: usize) -> Result<(), SceneError> {
        if self.name.trim().is_empty() {
            return Err(SceneError::EmptyName { index });
        }
        let fields = [
            ("radius", self.radius),
            ("orbit_radius", self.orbit_radius),
            ("orbit_angular_speed", self.orbit_angular_speed),
            ("self_rotation_speed", self.self_rotation_speed),
            ("emissive", self.emissive),
            ("base_position.x", self.base_position.x),
            ("base_position.y", self.base_position.y),
            ("base_position.z", self.base_position.z),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SceneError::NonFinite {
                    name: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if self.radius <= 0.0 {
            return Err(SceneError::InvalidRadius {
                name: self.name.clone(),
                radius: self.radius,
            });
        }
        if self.orbit_radius < 0.0 {
            return Err(SceneError::NegativeOrbitRadius {
                name: self.name.clone(),
                orbit_radius: self.orbit_radius,
            });
        }
        if self.emissive < 0.0 {
            return Err(SceneError::NegativeEmissive {
                name: self.name.clone(),
                emissive: self.emissive,
            });
        }
        Ok(())
    }
}

/// Builder for [`SceneState`].
///
/// ```ignore
/// let scene = SceneBuilder::new("assets")
///     .with_bodies(config.scene.bodies.iter().map(BodyDescriptor::from))
///     .build()?;
/// ```
#[derive(Clone, Debug)]
pub struct SceneBuilder {
    asset_dir: PathBuf,
    bodies: Vec<BodyDescriptor>,
    background: Option<String>,
    lights: SceneLights,
    camera: CameraConfig,
    viewport: Viewport,
    require_textures: bool,
}

impl SceneBuilder {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            bodies: Vec::new(),
            background: None,
            lights: SceneLights::default(),
            camera: CameraConfig::default(),
            viewport: Viewport::default(),
            require_textures: true,
        }
    }

    /// Builder populated from the `scene`, `camera` and `window` sections.
    pub fn from_config(config: &Config) -> Self {
        let scene = &config.scene;
        let viewport =
            Viewport::new(config.window.width, config.window.height).unwrap_or_default();
        Self::new(scene.asset_dir.clone())
            .with_bodies(scene.bodies.iter().map(BodyDescriptor::from))
            .with_background(scene.background.clone())
            .with_lights(SceneLights::white(
                scene.ambient_intensity,
                scene.light_intensity,
                scene.light_range,
            ))
            .with_camera(config.camera.clone())
            .with_viewport(viewport)
    }

    pub fn with_bodies(mut self, bodies: impl IntoIterator<Item = BodyDescriptor>) -> Self {
        self.bodies.extend(bodies);
        self
    }

    pub fn with_body(mut self, body: BodyDescriptor) -> Self {
        self.bodies.push(body);
        self
    }

    /// Background image file name, relative to the asset directory. Empty
    /// means no background.
    pub fn with_background(mut self, file: impl Into<String>) -> Self {
        let file = file.into();
        self.background = (!file.is_empty()).then_some(file);
        self
    }

    pub fn with_lights(mut self, lights: SceneLights) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Whether `build` checks that texture files exist (default `true`).
    pub fn require_textures(mut self, require: bool) -> Self {
        self.require_textures = require;
        self
    }

    fn resolve(&self, owner: &str, file: &str) -> Result<PathBuf, SceneError> {
        let path = self.asset_dir.join(file);
        if self.require_textures && !path.is_file() {
            return Err(SceneError::MissingTexture {
                name: owner.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Validate every descriptor and assemble the scene.
    ///
    /// The first stationary body becomes the central body and hosts the
    /// point light. Each body starts at its base position.
    pub fn build(self) -> Result<SceneState, SceneError> {
        let mut names = HashSet::new();
        let mut bodies = Vec::with_capacity(self.bodies.len());

        for (index, descriptor) in self.bodies.iter().enumerate() {
            descriptor.validate(index)?;
            if !names.insert(descriptor.name.as_str()) {
                return Err(SceneError::DuplicateName(descriptor.name.clone()));
            }
            let texture = self.resolve(&descriptor.name, &descriptor.texture)?;
            debug!(
                name = %descriptor.name,
                texture = %texture.display(),
                "Body validated"
            );
            bodies.push(Body::new(
                descriptor.name.clone(),
                descriptor.radius,
                texture,
                descriptor.base_position,
                Orbit {
                    radius: descriptor.orbit_radius,
                    angular_speed: descriptor.orbit_angular_speed,
                },
                descriptor.self_rotation_speed,
                descriptor.emissive,
            ));
        }

        let central = bodies
            .iter()
            .position(|body| body.orbit.is_stationary())
            .ok_or(SceneError::NoCentralBody)?;
        let star = &bodies[central];
        if star.position() != Vec3::ZERO {
            return Err(SceneError::CentralBodyOffOrigin {
                name: star.name.clone(),
                position: star.position(),
            });
        }

        let background = match &self.background {
            Some(file) => Some(self.resolve("background", file)?),
            None => None,
        };

        validate_camera(&self.camera)?;
        let camera = build_camera(&self.camera, self.viewport);
        let controls = OrbitControls::new(&self.camera, &camera);

        info!(
            bodies = bodies.len(),
            central = %bodies[central].name,
            asset_dir = %self.asset_dir.display(),
            "Scene built"
        );

        Ok(SceneState::new(
            bodies,
            central,
            self.lights,
            camera,
            controls,
            self.viewport,
            background,
        ))
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }
}

fn validate_camera(config: &CameraConfig) -> Result<(), SceneError> {
    let [px, py, pz] = config.position;
    let [tx, ty, tz] = config.target;
    let fields = [
        ("fov_y_degrees", config.fov_y_degrees),
        ("near", config.near),
        ("far", config.far),
        ("position.x", px),
        ("position.y", py),
        ("position.z", pz),
        ("target.x", tx),
        ("target.y", ty),
        ("target.z", tz),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(SceneError::NonFiniteCamera { field, value });
        }
    }
    if config.fov_y_degrees <= 0.0 || config.fov_y_degrees >= 180.0 {
        return Err(SceneError::InvalidFieldOfView(config.fov_y_degrees));
    }
    if config.near <= 0.0 || config.near >= config.far {
        return Err(SceneError::InvalidClipPlanes {
            near: config.near,
            far: config.far,
        });
    }
    let position = Vec3::from(config.position);
    if position == Vec3::from(config.target) {
        return Err(SceneError::CameraAtTarget(position));
    }
    Ok(())
}

fn build_camera(config: &CameraConfig, viewport: Viewport) -> Camera {
    let mut camera = Camera::perspective(
        config.fov_y_degrees.to_radians(),
        viewport.aspect_ratio(),
        config.near,
        config.far,
    );
    camera.position = Vec3::from(config.position);
    camera.look_at(Vec3::from(config.target));
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sun() -> BodyDescriptor {
        BodyDescriptor {
            name: "sun".to_string(),
            radius: 8.0,
            texture: "sun_texture.png".to_string(),
            base_position: Vec3::ZERO,
            orbit_radius: 0.0,
            orbit_angular_speed: 0.0,
            self_rotation_speed: 0.002,
            emissive: 4.0,
        }
    }

    fn earth() -> BodyDescriptor {
        BodyDescriptor {
            name: "earth".to_string(),
            radius: 3.0,
            texture: "earth_texture.png".to_string(),
            base_position: Vec3::new(45.0, 0.0, 0.0),
            orbit_radius: 15.0,
            orbit_angular_speed: 0.5,
            self_rotation_speed: 0.005,
            emissive: 0.0,
        }
    }

    fn builder() -> SceneBuilder {
        SceneBuilder::new("assets").require_textures(false)
    }

    #[test]
    fn test_default_config_builds() {
        let scene = SceneBuilder::from_config(&Config::default())
            .require_textures(false)
            .build()
            .unwrap();
        assert_eq!(scene.bodies().len(), 4);
        assert_eq!(scene.central_body().name, "sun");
        assert!(scene.background().is_some());
    }

    #[test]
    fn test_bodies_start_at_base_position() {
        let scene = builder().with_bodies([sun(), earth()]).build().unwrap();
        let earth = scene.body("earth").unwrap();
        assert_eq!(earth.position(), Vec3::new(45.0, 0.0, 0.0));
        assert_eq!(earth.rotation(), 0.0);
    }

    #[test]
    fn test_texture_paths_resolved_against_asset_dir() {
        let scene = builder().with_body(sun()).build().unwrap();
        assert_eq!(
            scene.central_body().texture,
            Path::new("assets").join("sun_texture.png")
        );
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let mut bad = earth();
        bad.radius = 0.0;
        let err = builder().with_bodies([sun(), bad]).build().unwrap_err();
        assert!(matches!(err, SceneError::InvalidRadius { ref name, .. } if name == "earth"));
    }

    #[test]
    fn test_negative_orbit_radius_rejected() {
        let mut bad = earth();
        bad.orbit_radius = -1.0;
        let err = builder().with_bodies([sun(), bad]).build().unwrap_err();
        assert!(matches!(err, SceneError::NegativeOrbitRadius { .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bad = earth();
        bad.orbit_angular_speed = f32::NAN;
        let err = builder().with_bodies([sun(), bad]).build().unwrap_err();
        assert!(matches!(
            err,
            SceneError::NonFinite {
                field: "orbit_angular_speed",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_emissive_rejected() {
        let mut bad = sun();
        bad.emissive = -0.5;
        let err = builder().with_body(bad).build().unwrap_err();
        assert!(matches!(err, SceneError::NegativeEmissive { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut bad = earth();
        bad.name = "  ".to_string();
        let err = builder().with_bodies([sun(), bad]).build().unwrap_err();
        assert!(matches!(err, SceneError::EmptyName { index: 1 }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = builder()
            .with_bodies([sun(), earth(), earth()])
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateName(ref name) if name == "earth"));
    }

    #[test]
    fn test_scene_without_stationary_body_rejected() {
        let err = builder().with_body(earth()).build().unwrap_err();
        assert!(matches!(err, SceneError::NoCentralBody));
    }

    #[test]
    fn test_missing_texture_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneBuilder::new(dir.path())
            .with_body(sun())
            .build()
            .unwrap_err();
        match err {
            SceneError::MissingTexture { name, path } => {
                assert_eq!(name, "sun");
                assert_eq!(path, dir.path().join("sun_texture.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_background_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sun_texture.png"), b"").unwrap();
        let err = SceneBuilder::new(dir.path())
            .with_body(sun())
            .with_background("stars.png")
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::MissingTexture { ref name, .. } if name == "background"));
    }

    #[test]
    fn test_existing_textures_accepted() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["sun_texture.png", "earth_texture.png", "stars.png"] {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }
        let scene = SceneBuilder::new(dir.path())
            .with_bodies([sun(), earth()])
            .with_background("stars.png")
            .build()
            .unwrap();
        assert_eq!(scene.background(), Some(dir.path().join("stars.png").as_path()));
    }

    #[test]
    fn test_empty_background_means_none() {
        let scene = builder()
            .with_body(sun())
            .with_background("")
            .build()
            .unwrap();
        assert!(scene.background().is_none());
    }

    #[test]
    fn test_first_stationary_body_is_central() {
        let mut second_star = sun();
        second_star.name = "companion".to_string();
        let scene = builder()
            .with_bodies([earth(), sun(), second_star])
            .build()
            .unwrap();
        assert_eq!(scene.central_body().name, "sun");
    }

    #[test]
    fn test_central_body_off_origin_rejected() {
        let mut star = sun();
        star.base_position = Vec3::new(10.0, 0.0, 0.0);
        let err = builder().with_bodies([star, earth()]).build().unwrap_err();
        match err {
            SceneError::CentralBodyOffOrigin { name, position } => {
                assert_eq!(name, "sun");
                assert_eq!(position, Vec3::new(10.0, 0.0, 0.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stationary_companion_may_sit_off_origin() {
        let mut companion = sun();
        companion.name = "companion".to_string();
        companion.base_position = Vec3::new(0.0, 0.0, -60.0);
        let mut scene = builder()
            .with_bodies([sun(), companion])
            .build()
            .unwrap();
        scene.advance(3.0);
        assert_eq!(scene.central_body().position(), Vec3::ZERO);
        assert_eq!(scene.lights().point.position, Vec3::ZERO);
    }

    #[test]
    fn test_zero_field_of_view_rejected() {
        let camera = CameraConfig {
            fov_y_degrees: 0.0,
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidFieldOfView(fov) if fov == 0.0));
    }

    #[test]
    fn test_straight_angle_field_of_view_rejected() {
        let camera = CameraConfig {
            fov_y_degrees: 180.0,
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidFieldOfView(_)));
    }

    #[test]
    fn test_near_beyond_far_rejected() {
        let camera = CameraConfig {
            near: 300.0,
            far: 250.0,
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::InvalidClipPlanes { near, far } if near == 300.0 && far == 250.0
        ));
    }

    #[test]
    fn test_non_positive_near_rejected() {
        let camera = CameraConfig {
            near: 0.0,
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidClipPlanes { .. }));
    }

    #[test]
    fn test_non_finite_camera_position_rejected() {
        let camera = CameraConfig {
            position: [0.0, f32::INFINITY, 80.0],
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::NonFiniteCamera {
                field: "position.y",
                ..
            }
        ));
    }

    #[test]
    fn test_camera_at_target_rejected() {
        let camera = CameraConfig {
            position: [5.0, 5.0, 5.0],
            target: [5.0, 5.0, 5.0],
            ..Default::default()
        };
        let err = builder()
            .with_body(sun())
            .with_camera(camera)
            .build()
            .unwrap_err();
        assert!(matches!(err, SceneError::CameraAtTarget(_)));
    }

    #[test]
    fn test_camera_uses_config_and_viewport() {
        let scene = builder()
            .with_body(sun())
            .with_viewport(Viewport::new(1920, 1080).unwrap())
            .build()
            .unwrap();
        let camera = scene.camera();
        assert_eq!(camera.position, Vec3::new(0.0, 30.0, 80.0));
        assert!((camera.fov_y - 45f32.to_radians()).abs() < 1e-6);
        assert!((camera.aspect_ratio() - 1920.0 / 1080.0).abs() < 1e-6);
        let to_origin = (-camera.position).normalize();
        assert!(camera.forward().dot(to_origin) > 0.9999);
    }
}
