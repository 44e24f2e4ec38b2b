//! Linear-scan traversal of the flattened sphereflake hierarchy.
//!
//! The node array is walked strictly left to right. A node whose bounding
//! sphere is not entered before the current best hit cannot contain anything
//! closer, so its whole subtree is stepped over in one jump of `skip`
//! slots. Otherwise its own sphere is tested and the scan descends into the
//! children, which follow it directly in pre-order.

use crate::{HitRecord, Hittable, TraceMode};
use flake_core::{Node, Scene};
use flake_math::Ray;

/// Trace `ray` through a pre-order node array, tightening `hit`.
///
/// Returns the number of nodes visited.
pub fn traverse(nodes: &[Node], ray: &Ray, mode: TraceMode, hit: &mut HitRecord) -> usize {
    let mut visited = 0;
    let mut i = 0;

    while i < nodes.len() {
        let node = &nodes[i];
        visited += 1;

        if node.bound.intersect(ray) >= hit.t {
            i += node.skip;
            continue;
        }

        let t = node.leaf.intersect(ray);
        if t < hit.t {
            hit.t = t;
            if mode == TraceMode::Shadow {
                break;
            }
            hit.normal = node.leaf.normal_at(ray.at(t));
        }
        i += 1;
    }

    visited
}

impl Hittable for Scene {
    #[inline]
    fn intersect(&self, ray: &Ray, mode: TraceMode, hit: &mut HitRecord) {
        traverse(self.nodes(), ray, mode, hit);
    }
}
