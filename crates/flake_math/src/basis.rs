//! Orthonormal frame around a direction, used to lay out child rings.

use crate::Vec3;

/// Right-handed orthonormal frame whose `up` axis is a given direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Basis {
    pub up: Vec3,
    pub b1: Vec3,
    pub b2: Vec3,
}

impl Basis {
    /// Build a frame around `direction` (must be non-zero).
    ///
    /// The seed vector for the cross products is `up` with its dominant
    /// component negated, or a component rotation of `up` when `up` is
    /// exactly a coordinate axis. The rule is fixed so that the same
    /// direction always yields bit-identical axes.
    pub fn new(direction: Vec3) -> Self {
        let up = direction.normalize();
        let (x2, y2, z2) = (up.x * up.x, up.y * up.y, up.z * up.z);

        let seed = if x2 != 1.0 && y2 != 1.0 && z2 != 1.0 {
            let mut seed = up;
            if y2 > x2 {
                if y2 > z2 {
                    seed.y = -seed.y;
                } else {
                    seed.z = -seed.z;
                }
            } else if z2 > x2 {
                seed.z = -seed.z;
            } else {
                seed.x = -seed.x;
            }
            seed
        } else {
            Vec3::new(up.z, up.x, up.y)
        };

        let b2 = up.cross(seed).normalize();
        let b1 = up.cross(b2);

        Self { up, b1, b2 }
    }
}
