//! Hittable trait and HitRecord for ray-scene intersection.

use flake_core::Scene;
use flake_math::{Ray, Sphere, Vec3};

/// What a traversal is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// Nearest hit and its surface normal
    Primary,
    /// Any hit at all; stops at the first occluder
    Shadow,
}

/// Closest intersection found so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Surface normal at the hit (only filled in primary mode)
    pub normal: Vec3,
    /// Distance along the ray, `f64::INFINITY` when nothing was hit
    pub t: f64,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            normal: Vec3::ZERO,
            t: f64::INFINITY,
        }
    }
}

impl HitRecord {
    /// Whether anything was hit.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.t != f64::INFINITY
    }
}

/// Trait for geometry that rays can be traced against.
pub trait Hittable: Send + Sync {
    /// Tighten `hit` with any intersection closer than `hit.t`.
    fn intersect(&self, ray: &Ray, mode: TraceMode, hit: &mut HitRecord);

    /// Nearest hit along the ray.
    fn closest_hit(&self, ray: &Ray) -> HitRecord {
        let mut hit = HitRecord::default();
        self.intersect(ray, TraceMode::Primary, &mut hit);
        hit
    }

    /// Whether anything blocks the ray.
    fn occluded(&self, ray: &Ray) -> bool {
        let mut hit = HitRecord::default();
        self.intersect(ray, TraceMode::Shadow, &mut hit);
        hit.is_hit()
    }
}

/// A flat list of spheres tested one by one, with no acceleration.
///
/// Serves as the reference the BVH must agree with.
#[derive(Debug, Clone, Default)]
pub struct HittableList {
    spheres: Vec<Sphere>,
}

impl HittableList {
    /// Create a new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every rendered sphere of a scene.
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            spheres: scene.leaves().copied().collect(),
        }
    }

    /// Add a sphere to the list.
    pub fn add(&mut self, sphere: Sphere) {
        self.spheres.push(sphere);
    }

    /// Get the number of spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

impl Hittable for HittableList {
    fn intersect(&self, ray: &Ray, mode: TraceMode, hit: &mut HitRecord) {
        for sphere in &self.spheres {
            let t = sphere.intersect(ray);
            if t < hit.t {
                hit.t = t;
                if mode == TraceMode::Shadow {
                    return;
                }
                hit.normal = sphere.normal_at(ray.at(t));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_spheres() -> HittableList {
        let mut list = HittableList::new();
        list.add(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0));
        list.add(Sphere::new(Vec3::new(0.0, 0.0, 2.0), 0.5));
        list
    }

    #[test]
    fn test_hit_record_default_is_miss() {
        let hit = HitRecord::default();
        assert!(!hit.is_hit());
        assert_eq!(hit.t, f64::INFINITY);
        assert_eq!(hit.normal, Vec3::ZERO);
    }

    #[test]
    fn test_list_finds_nearest() {
        let list = two_spheres();
        assert_eq!(list.len(), 2);

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = list.closest_hit(&ray);

        assert!((hit.t - 1.5).abs() < 1e-12);
        assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_list_occlusion() {
        let list = two_spheres();

        assert!(list.occluded(&Ray::new(Vec3::ZERO, Vec3::Z)));
        assert!(!list.occluded(&Ray::new(Vec3::ZERO, -Vec3::Z)));
        assert!(!HittableList::new().occluded(&Ray::new(Vec3::ZERO, Vec3::Z)));
    }

    #[test]
    fn test_list_respects_existing_hit() {
        let list = two_spheres();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        // Something closer than either sphere was already found
        let mut hit = HitRecord {
            normal: Vec3::X,
            t: 1.0,
        };
        list.intersect(&ray, TraceMode::Primary, &mut hit);
        assert_eq!(hit.t, 1.0);
        assert_eq!(hit.normal, Vec3::X);
    }

    #[test]
    fn test_list_from_scene() {
        let scene = Scene::build(2).unwrap();
        let list = HittableList::from_scene(&scene);
        assert_eq!(list.len(), 10);
    }
}
