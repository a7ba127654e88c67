//! Per-frame body motion: self rotation and circular orbits.
//!
//! Orbital positions are a pure function of elapsed time and the body's
//! static orbit parameters. They are recomputed every frame, never
//! integrated, so long sessions do not drift.

use std::f32::consts::TAU;
use std::path::PathBuf;

use glam::{Mat4, Quat, Vec3};

/// Circular orbit in the XZ plane around the world origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    /// Distance from the origin. Zero means the body is stationary.
    pub radius: f32,
    /// Radians per second of elapsed time.
    pub angular_speed: f32,
}

impl Orbit {
    pub const STATIONARY: Self = Self {
        radius: 0.0,
        angular_speed: 0.0,
    };

    pub fn is_stationary(&self) -> bool {
        self.radius == 0.0
    }

    /// `(x, z)` at elapsed time `t`.
    pub fn position_at(&self, t: f64) -> (f32, f32) {
        let angle = t * f64::from(self.angular_speed);
        let r = f64::from(self.radius);
        ((r * angle.cos()) as f32, (r * angle.sin()) as f32)
    }
}

/// A celestial body with its static parameters and mutable pose.
#[derive(Clone, Debug)]
pub struct Body {
    pub name: String,
    pub radius: f32,
    /// Resolved path of the surface texture.
    pub texture: PathBuf,
    pub orbit: Orbit,
    /// Radians added to the spin angle every frame.
    pub self_rotation_speed: f32,
    /// HDR self-illumination multiplier.
    pub emissive: f32,
    rotation: f32,
    position: Vec3,
}

impl Body {
    /// Create a body resting at `base_position` with zero spin.
    pub fn new(
        name: impl Into<String>,
        radius: f32,
        texture: PathBuf,
        base_position: Vec3,
        orbit: Orbit,
        self_rotation_speed: f32,
        emissive: f32,
    ) -> Self {
        Self {
            name: name.into(),
            radius,
            texture,
            orbit,
            self_rotation_speed,
            emissive,
            rotation: 0.0,
            position: base_position,
        }
    }

    /// Advance one frame at elapsed time `t`.
    ///
    /// Spin accumulates per call and wraps into `[0, 2π)`. Orbiting bodies
    /// are placed on their circle at `t` with `y` left unchanged; stationary
    /// bodies keep their position.
    pub fn advance(&mut self, t: f64) {
        self.rotation = (self.rotation + self.self_rotation_speed).rem_euclid(TAU);
        if !self.orbit.is_stationary() {
            let (x, z) = self.orbit.position_at(t);
            self.position.x = x;
            self.position.z = z;
        }
    }

    /// Spin angle around the local Y axis, in `[0, 2π)`.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Object-to-world transform: translate, spin about Y, uniform scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.radius),
            Quat::from_rotation_y(self.rotation),
            self.position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn orbiting(radius: f32, angular_speed: f32) -> Body {
        Body::new(
            "planet",
            1.0,
            PathBuf::from("planet.png"),
            Vec3::new(45.0, 0.0, 0.0),
            Orbit {
                radius,
                angular_speed,
            },
            0.005,
            0.0,
        )
    }

    #[test]
    fn test_orbit_start_on_positive_x() {
        let mut body = orbiting(15.0, 0.5);
        body.advance(0.0);
        let p = body.position();
        assert!((p - Vec3::new(15.0, 0.0, 0.0)).length() < 1e-5, "{p:?}");
    }

    #[test]
    fn test_quarter_turn_lands_on_positive_z() {
        let mut body = orbiting(25.0, 1.0);
        body.advance(FRAC_PI_2);
        let p = body.position();
        assert!(p.x.abs() < 1e-4, "x = {}", p.x);
        assert_eq!(p.y, 0.0);
        assert!((p.z - 25.0).abs() < 1e-4, "z = {}", p.z);
    }

    #[test]
    fn test_position_stays_on_circle() {
        let mut body = orbiting(40.0, 0.2);
        for i in 0..500 {
            let t = i as f64 * 0.37;
            body.advance(t);
            let p = body.position();
            let r2 = p.x * p.x + p.z * p.z;
            assert!((r2 - 1600.0).abs() < 1e-2, "t={t}: r²={r2}");
        }
    }

    #[test]
    fn test_orbit_keeps_base_height() {
        let mut body = Body::new(
            "tilted",
            1.0,
            PathBuf::new(),
            Vec3::new(10.0, 2.5, 0.0),
            Orbit {
                radius: 10.0,
                angular_speed: 1.0,
            },
            0.0,
            0.0,
        );
        body.advance(3.0);
        assert_eq!(body.position().y, 2.5);
    }

    #[test]
    fn test_position_depends_only_on_time() {
        let mut once = orbiting(25.0, 0.3);
        let mut many = orbiting(25.0, 0.3);
        once.advance(12.5);
        for i in 0..100 {
            many.advance(i as f64 * 0.1);
        }
        many.advance(12.5);
        assert_eq!(once.position(), many.position());
    }

    #[test]
    fn test_stationary_body_does_not_move() {
        let mut sun = Body::new(
            "sun",
            8.0,
            PathBuf::new(),
            Vec3::ZERO,
            Orbit::STATIONARY,
            0.002,
            4.0,
        );
        for i in 0..1000 {
            sun.advance(i as f64 / 60.0);
        }
        assert_eq!(sun.position(), Vec3::ZERO);
        assert!(sun.rotation() > 0.0);
    }

    #[test]
    fn test_rotation_accumulates_per_frame() {
        let mut body = orbiting(15.0, 0.5);
        for _ in 0..10 {
            body.advance(1.0);
        }
        assert!((body.rotation() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_wraps_to_full_turn() {
        let mut body = orbiting(0.0, 0.0);
        body.self_rotation_speed = 1.0;
        for _ in 0..100 {
            body.advance(0.0);
            assert!((0.0..TAU).contains(&body.rotation()));
        }
        let expected = 100.0_f32.rem_euclid(TAU);
        assert!((body.rotation() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_negative_spin_wraps_into_range() {
        let mut body = orbiting(0.0, 0.0);
        body.self_rotation_speed = -0.5;
        body.advance(0.0);
        assert!((body.rotation() - (TAU - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_model_matrix_scales_and_translates() {
        let mut body = orbiting(15.0, 0.5);
        body.radius = 3.0;
        body.advance(0.0);
        let m = body.model_matrix();
        let surface = m.transform_point3(Vec3::Y);
        assert!((surface - Vec3::new(15.0, 3.0, 0.0)).length() < 1e-4);
    }
}
