//! Sphere primitive with analytic ray intersection.

use crate::{Ray, Vec3};

/// A sphere given by center and radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    /// Create a new sphere.
    #[inline]
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Distance along `ray` to the first intersection in front of its origin.
    ///
    /// Returns `f64::INFINITY` on a miss, including when the sphere lies
    /// entirely behind the origin. When the origin is inside the sphere the
    /// exit point is returned. Assumes a unit-length ray direction.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> f64 {
        let v = self.center - ray.origin;
        let b = ray.direction.dot(v);
        let disc = b * b - v.length_squared() + self.radius * self.radius;
        if disc < 0.0 {
            return f64::INFINITY;
        }

        let d = disc.sqrt();
        let t2 = b + d;
        let t1 = b - d;
        if t2 < 0.0 {
            f64::INFINITY
        } else if t1 > 0.0 {
            t1
        } else {
            t2
        }
    }

    /// Outward unit normal at a point on the surface.
    #[inline]
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        (point - self.center) * (1.0 / self.radius)
    }
}
