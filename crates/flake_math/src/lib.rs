//! Math primitives for the sphereflake tracer.
//!
//! Vector algebra comes straight from glam. Everything is double precision:
//! the shadow offset is tiny and the deepest flake levels shrink spheres by
//! a factor of 3 per level.

// Re-export glam for convenience
pub use glam;

/// 3D vector used throughout the tracer.
pub type Vec3 = glam::DVec3;

mod basis;
mod ray;
mod sphere;

pub use basis::Basis;
pub use ray::Ray;
pub use sphere::Sphere;
