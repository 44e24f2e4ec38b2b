//! Flake Renderer - CPU ray tracing of sphereflakes.
//!
//! Traces a sphereflake through its flattened skip-list BVH, shades it with
//! one directional light and hard shadows, and spreads row blocks over a
//! bounded set of worker threads.

mod bucket;
mod bvh;
mod camera;
mod error;
mod hittable;
mod renderer;

pub use bucket::{
    generate_blocks, render_block, render_blocks, Dispatch, RowBlock, DEFAULT_BLOCK_DIVISOR,
};
pub use bvh::traverse;
pub use camera::{Camera, SUPERSAMPLES};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList, TraceMode};
pub use renderer::{
    ray_trace, render, render_flake, render_into, render_pixel, render_rows, ImageBuffer,
    RenderConfig,
};

/// Re-export the scene and math types renderers work with
pub use flake_core::{Node, Scene, SceneError};
pub use flake_math::{Ray, Sphere, Vec3};
