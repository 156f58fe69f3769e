//! Aim rays and ray/sphere intersection
//!
//! Balloons are hit-tested as spheres. A shot is one primary ray straight
//! down the camera's forward axis plus optional spread rays nudged by a small
//! random angle around the camera's right and up axes.

use glam::{Quat, Vec3};
use rand::Rng;

use crate::centered;

/// A directed line from the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Z),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Result of a ray test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Whether the ray touched the volume
    pub hit: bool,
    /// Distance along the ray to the first surface crossing
    pub distance: f32,
    /// Surface point (if hit)
    pub point: Vec3,
}

impl RayHit {
    pub fn miss() -> Self {
        Self {
            hit: false,
            distance: f32::INFINITY,
            point: Vec3::ZERO,
        }
    }
}

/// Intersect a ray with a sphere
///
/// Only crossings in front of the origin count. A ray starting inside the
/// sphere reports the exit point.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> RayHit {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return RayHit::miss();
    }

    let root = discriminant.sqrt();
    let mut t = -b - root;
    if t < 0.0 {
        // Origin inside the sphere
        t = -b + root;
    }
    if t < 0.0 {
        return RayHit::miss();
    }

    RayHit {
        hit: true,
        distance: t,
        point: ray.at(t),
    }
}

/// Build a shot: primary ray plus `spread_rays` randomly perturbed rays.
///
/// `spread_angle` is the maximum deviation in radians on each axis.
pub fn build_aim_rays<R: Rng>(
    origin: Vec3,
    rotation: Quat,
    spread_angle: f32,
    spread_rays: u32,
    rng: &mut R,
) -> Vec<Ray> {
    let forward = rotation * Vec3::NEG_Z;
    let mut rays = Vec::with_capacity(1 + spread_rays as usize);
    rays.push(Ray::new(origin, forward));

    if spread_angle <= 0.0 {
        return rays;
    }

    let right = rotation * Vec3::X;
    let up = rotation * Vec3::Y;
    for _ in 0..spread_rays {
        let yaw = centered(rng.random::<f32>(), spread_angle);
        let pitch = centered(rng.random::<f32>(), spread_angle);
        let tilt = Quat::from_axis_angle(up, yaw) * Quat::from_axis_angle(right, pitch);
        rays.push(Ray::new(origin, tilt * forward));
    }
    rays
}
