//! Sphereflake scene generation.
//!
//! The fractal is written straight into a flat, pre-order array of
//! [`Node`]s. Each node carries a bounding sphere that encloses its whole
//! subtree plus a `skip` count: the number of array slots its subtree
//! occupies. A traversal that rejects a node's bound jumps `skip` slots
//! ahead and lands on the next sibling (or an ancestor's next sibling),
//! so the hierarchy needs no pointers at all.

use std::f64::consts::PI;

use flake_math::{Basis, Sphere, Vec3};
use thiserror::Error;

/// Children spawned by every non-leaf sphere.
pub const CHILDREN: usize = 9;

/// Spheres in the lower ring around a parent.
const LOWER_RING: usize = 6;

/// Spheres in the upper ring around a parent.
const UPPER_RING: usize = 3;

/// Tilt of the lower ring along the parent direction.
const LOWER_TILT: f64 = -0.2;

/// Tilt of the upper ring along the parent direction.
const UPPER_TILT: f64 = 0.6;

/// Errors that can occur while building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Invalid fractal level {0}: must be at least 1")]
    InvalidLevel(u32),

    #[error("Fractal level {0} is too deep: node count overflows")]
    TooDeep(u32),

    #[error("Failed to allocate {nodes} scene nodes")]
    Allocation { nodes: usize },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// One slot of the flattened hierarchy.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Node {
    /// Encloses this sphere and every descendant (twice the leaf radius)
    pub bound: Sphere,

    /// The sphere actually rendered
    pub leaf: Sphere,

    /// Slots covered by this node's subtree, itself included
    pub skip: usize,
}

/// Number of nodes in a flake of the given depth.
///
/// `count(1) = 1`, `count(n) = 1 + 9 * count(n - 1)`.
pub fn node_count(level: u32) -> SceneResult<usize> {
    if level == 0 {
        return Err(SceneError::InvalidLevel(level));
    }

    let mut count: usize = 1;
    for _ in 1..level {
        count = count
            .checked_mul(CHILDREN)
            .and_then(|c| c.checked_add(1))
            .ok_or(SceneError::TooDeep(level))?;
    }
    Ok(count)
}

/// A complete sphereflake, immutable once built.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    level: u32,
}

impl Scene {
    /// Root sphere center.
    pub const ROOT_CENTER: Vec3 = Vec3::ZERO;

    /// Root sphere radius.
    pub const ROOT_RADIUS: f64 = 1.0;

    /// Root growth direction (normalized on use).
    pub const ROOT_DIRECTION: Vec3 = Vec3::new(0.25, 1.0, -0.5);

    /// Build the standard flake of the given depth.
    pub fn build(level: u32) -> SceneResult<Self> {
        Self::build_with(
            level,
            Self::ROOT_CENTER,
            Self::ROOT_DIRECTION,
            Self::ROOT_RADIUS,
        )
    }

    /// Build a flake with an explicit root sphere and growth direction.
    ///
    /// `direction` must be non-zero; only its orientation is used.
    pub fn build_with(
        level: u32,
        center: Vec3,
        direction: Vec3,
        radius: f64,
    ) -> SceneResult<Self> {
        let count = node_count(level)?;

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(count)
            .map_err(|_| SceneError::Allocation { nodes: count })?;

        let direction = direction.normalize();
        let end = write_subtree(&mut nodes, level, count, center, direction, radius);
        debug_assert_eq!(end, count);

        let scene = Self { nodes, level };
        log::info!(
            "Built sphereflake level {}: {} spheres, {:.2} MB",
            level,
            scene.len(),
            scene.memory_bytes() as f64 / (1024.0 * 1024.0)
        );
        Ok(scene)
    }

    /// All nodes in pre-order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Fractal depth this scene was built with.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of nodes (and rendered spheres).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene has no nodes. Never true for a built scene.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the rendered spheres in array order.
    pub fn leaves(&self) -> impl Iterator<Item = &Sphere> + '_ {
        self.nodes.iter().map(|node| &node.leaf)
    }

    /// Size of the node array in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.nodes.len() * std::mem::size_of::<Node>()
    }
}

/// Append the subtree rooted at a sphere and return the next free index.
///
/// `budget` is the number of slots this subtree will occupy; it becomes the
/// node's skip and is split evenly between the children.
fn write_subtree(
    nodes: &mut Vec<Node>,
    level: u32,
    budget: usize,
    center: Vec3,
    direction: Vec3,
    radius: f64,
) -> usize {
    let index = nodes.len();
    nodes.push(Node {
        bound: Sphere::new(center, 2.0 * radius),
        leaf: Sphere::new(center, radius),
        skip: if level > 1 { budget } else { 1 },
    });
    if level <= 1 {
        return index + 1;
    }

    let child_budget = (budget - 1) / CHILDREN;
    let basis = Basis::new(direction);
    let child_radius = radius * (1.0 / 3.0);
    let offset = radius + child_radius;
    let lower_step = 2.0 * PI / LOWER_RING as f64;
    let upper_step = 2.0 * PI / UPPER_RING as f64;

    let mut next = index + 1;
    let mut place = |tilt: f64, angle: f64, nodes: &mut Vec<Node>| {
        let child_dir =
            (direction * tilt + basis.b1 * angle.sin() + basis.b2 * angle.cos()).normalize();
        next = write_subtree(
            nodes,
            level - 1,
            child_budget,
            center + child_dir * offset,
            child_dir,
            child_radius,
        );
    };

    let mut angle = 0.0;
    for _ in 0..LOWER_RING {
        place(LOWER_TILT, angle, nodes);
        angle += lower_step;
    }
    // Upper ring sits between lower ring spheres
    angle -= lower_step / 3.0;
    for _ in 0..UPPER_RING {
        place(UPPER_TILT, angle, nodes);
        angle += upper_step;
    }

    debug_assert_eq!(next - index, nodes[index].skip);
    next
}
