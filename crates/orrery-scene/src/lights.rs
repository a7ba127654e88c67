//! Scene lighting: one ambient term and one point light on the central body.

use glam::Vec3;

/// Uniform light from every direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Omnidirectional light with a linear falloff to zero at `range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Zero means no falloff.
    pub range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLights {
    pub ambient: AmbientLight,
    pub point: PointLight,
}

impl SceneLights {
    /// White lights with the given intensities, point light at the origin.
    pub fn white(ambient_intensity: f32, light_intensity: f32, light_range: f32) -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: ambient_intensity.max(0.0),
            },
            point: PointLight {
                position: Vec3::ZERO,
                color: Vec3::ONE,
                intensity: light_intensity.max(0.0),
                range: light_range.max(0.0),
            },
        }
    }
}

impl Default for SceneLights {
    fn default() -> Self {
        Self::white(0.3, 1.2, 300.0)
    }
}
