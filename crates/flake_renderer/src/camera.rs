//! Fixed pinhole camera with rotated-grid supersampling.

use flake_math::{Ray, Vec3};

/// Sub-rays traced per pixel.
pub const SUPERSAMPLES: usize = 4;

/// Rotated 2x2 grid, in half-pixel units.
const GRID: [[f64; 2]; SUPERSAMPLES] = [
    [-1.0, -1.0 / 3.0],
    [1.0 / 3.0, -1.0],
    [-1.0 / 3.0, 1.0],
    [1.0, 1.0 / 3.0],
];

/// Camera for generating rays into the scene.
///
/// Sits at `EYE` looking down +Z. The image plane lies `max(width, height)`
/// units in front of the eye, so one pixel is one unit wide.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    plane_distance: f64,
    // Sub-pixel offsets with the image center already subtracted
    offsets: [Vec3; SUPERSAMPLES],
}

impl Camera {
    /// Eye position.
    pub const EYE: Vec3 = Vec3::new(0.0, 0.0, -4.5);

    /// Create a camera for an image of the given size.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        let rcp = 1.0 / 2.0;

        let offsets = GRID.map(|[gx, gy]| Vec3::new(gx * rcp - w / 2.0, gy * rcp - h / 2.0, 0.0));

        Self {
            eye: Self::EYE,
            plane_distance: w.max(h),
            offsets,
        }
    }

    /// Generate the sub-ray `sample` for pixel column `x` of scan row `y`.
    ///
    /// Scan rows count upwards from the bottom of the image.
    #[inline]
    pub fn get_ray(&self, x: u32, y: u32, sample: usize) -> Ray {
        let scan = Vec3::new(f64::from(x), f64::from(y), self.plane_distance);
        Ray::new(self.eye, (scan + self.offsets[sample]).normalize())
    }

    /// All sub-rays for one pixel.
    pub fn sample_rays(&self, x: u32, y: u32) -> impl Iterator<Item = Ray> + '_ {
        (0..SUPERSAMPLES).map(move |sample| self.get_ray(x, y, sample))
    }
}
