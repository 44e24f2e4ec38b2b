//! Flake Core - Sphereflake scene generation.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Node`
//! - **Generation**: the recursive sphereflake builder that writes a
//!   flattened, skip-annotated bounding hierarchy in one pass
//!
//! # Example
//!
//! ```ignore
//! use flake_core::Scene;
//!
//! let scene = Scene::build(6)?;
//! println!("{} spheres, {} bytes", scene.len(), scene.memory_bytes());
//! ```

pub mod scene;

// Re-export commonly used types
pub use scene::{node_count, Node, Scene, SceneError, SceneResult};
