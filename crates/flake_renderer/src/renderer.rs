//! Shading and top-level render entry points.
//!
//! Implements single-light Lambertian shading with:
//! - One directional light and optional hard shadows
//! - Rotated-grid supersampling (4 sub-rays per pixel)
//! - 8-bit grayscale output, one byte per pixel

use std::time::Instant;

use crate::bucket::{generate_blocks, render_blocks, Dispatch, DEFAULT_BLOCK_DIVISOR};
use crate::camera::SUPERSAMPLES;
use crate::{Camera, Hittable, RenderError, RenderResult};
use flake_core::Scene;
use flake_math::{Ray, Vec3};

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Direction the light travels in (unit length)
    pub light: Vec3,
    /// Whether lit samples cast a shadow ray
    pub shadows: bool,
    /// Offset along the normal before casting a shadow ray
    pub shadow_epsilon: f64,
    /// Image height is split into this many row blocks
    pub block_divisor: u32,
    /// How row blocks are spread over threads
    pub dispatch: Dispatch,
}

impl RenderConfig {
    /// Default light direction (normalized on use).
    pub const DEFAULT_LIGHT: Vec3 = Vec3::new(-0.5, -0.65, 0.9);

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the light direction. Must be non-zero.
    pub fn with_light(mut self, direction: Vec3) -> Self {
        self.light = direction.normalize();
        self
    }

    /// Enable or disable shadow rays.
    pub fn with_shadows(mut self, shadows: bool) -> Self {
        self.shadows = shadows;
        self
    }

    /// Set how far shadow rays start above the surface.
    pub fn with_shadow_epsilon(mut self, epsilon: f64) -> Self {
        self.shadow_epsilon = epsilon;
        self
    }

    /// Set the number of row blocks the image is split into.
    pub fn with_block_divisor(mut self, divisor: u32) -> Self {
        self.block_divisor = divisor;
        self
    }

    /// Set the thread dispatch strategy.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Total pixels (and bytes) in the output image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that the configuration can be rendered.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.block_divisor == 0 {
            return Err(RenderError::InvalidBlockDivisor(self.block_divisor));
        }
        match self.dispatch {
            Dispatch::Fifo { workers } | Dispatch::Pool { workers } if workers == 0 => {
                Err(RenderError::InvalidWorkers(workers))
            }
            _ => Ok(()),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            light: Self::DEFAULT_LIGHT.normalize(),
            shadows: true,
            shadow_epsilon: 1e-12,
            block_divisor: DEFAULT_BLOCK_DIVISOR,
            dispatch: Dispatch::default(),
        }
    }
}

/// Light contribution of a single sub-ray, in `[0, 1]`.
pub fn ray_trace(world: &dyn Hittable, ray: &Ray, config: &RenderConfig) -> f64 {
    let hit = world.closest_hit(ray);
    let diffuse = if hit.is_hit() {
        -hit.normal.dot(config.light)
    } else {
        0.0
    };
    if diffuse <= 0.0 {
        return 0.0;
    }
    if !config.shadows {
        return diffuse;
    }

    let shadow_ray = Ray::new(
        ray.at(hit.t) + hit.normal * config.shadow_epsilon,
        -config.light,
    );
    if world.occluded(&shadow_ray) {
        0.0
    } else {
        diffuse
    }
}

/// Render a single pixel from its supersampled sub-rays.
pub fn render_pixel(
    world: &dyn Hittable,
    camera: &Camera,
    x: u32,
    y: u32,
    config: &RenderConfig,
) -> u8 {
    let sum: f64 = camera
        .sample_rays(x, y)
        .map(|ray| ray_trace(world, &ray, config))
        .sum();

    (255.0 * sum / SUPERSAMPLES as f64).round().clamp(0.0, 255.0) as u8
}

/// Render consecutive scan rows starting at `start` into `rows`.
///
/// `rows` holds whole image rows, top row first, so scan row `start` lands
/// in the last row of the slice.
pub fn render_rows(
    world: &dyn Hittable,
    camera: &Camera,
    config: &RenderConfig,
    start: u32,
    rows: &mut [u8],
) {
    let width = config.width as usize;
    for (y, row) in (start..).zip(rows.chunks_exact_mut(width).rev()) {
        for (x, pixel) in (0u32..).zip(row.iter_mut()) {
            *pixel = render_pixel(world, camera, x, y, config);
        }
    }
}

/// Grayscale image buffer for storing render output.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Allocate a new black image.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let bytes = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(bytes)
            .map_err(|_| RenderError::Allocation { bytes })?;
        pixels.resize(bytes, 0);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Get the pixel at (x, y), row 0 being the top of the image.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[self.offset(x, y)]
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Raw row-major bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}

/// Render into a caller-provided buffer of exactly `width * height` bytes.
pub fn render_into(
    world: &dyn Hittable,
    config: &RenderConfig,
    out: &mut [u8],
) -> RenderResult<()> {
    config.validate()?;
    render_validated(world, config, out)
}

/// Render the entire scene to a new image buffer.
pub fn render(world: &dyn Hittable, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    config.validate()?;
    render_image(world, config)
}

/// Build a flake of the given depth and render it.
pub fn render_flake(level: u32, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    config.validate()?;
    let scene = Scene::build(level)?;
    render_image(&scene, config)
}

fn render_image(world: &dyn Hittable, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    let mut image = ImageBuffer::new(config.width, config.height)?;
    render_validated(world, config, &mut image.pixels)?;
    Ok(image)
}

/// Render with a config that already passed [`RenderConfig::validate`].
fn render_validated(
    world: &dyn Hittable,
    config: &RenderConfig,
    out: &mut [u8],
) -> RenderResult<()> {
    let expected = config.pixel_count();
    if out.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: out.len(),
        });
    }

    let camera = Camera::new(config.width, config.height);
    let blocks = generate_blocks(config.height, config.block_divisor);

    let start = Instant::now();
    render_blocks(world, &camera, config, &blocks, out)?;
    log::info!(
        "Rendered {}x{} in {} blocks on {} worker(s) ({:?}) in {:?}",
        config.width,
        config.height,
        blocks.len(),
        config.dispatch.workers(),
        config.dispatch,
        start.elapsed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HittableList;
    use flake_math::Sphere;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn small_config(width: u32, height: u32) -> RenderConfig {
        RenderConfig::default()
            .with_resolution(width, height)
            .with_dispatch(Dispatch::Serial)
    }

    #[test]
    fn test_ray_trace_lit_sphere() {
        let scene = Scene::build(1).unwrap();
        let config = RenderConfig::default();
        let ray = Ray::new(Camera::EYE, Vec3::Z);

        // Hit at (0, 0, -1) with normal -Z, nothing else to cast a shadow
        let value = ray_trace(&scene, &ray, &config);
        assert!((value - config.light.z).abs() < 1e-12);
    }

    #[test]
    fn test_ray_trace_miss_is_black() {
        let scene = Scene::build(2).unwrap();
        let ray = Ray::new(Camera::EYE, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(ray_trace(&scene, &ray, &RenderConfig::default()), 0.0);
    }

    #[test]
    fn test_ray_trace_facing_away_from_light() {
        let scene = Scene::build(1).unwrap();
        // Light travels towards the eye, so the visible side is unlit
        let config = RenderConfig::default().with_light(Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::new(Camera::EYE, Vec3::Z);

        assert_eq!(ray_trace(&scene, &ray, &config), 0.0);
    }

    #[test]
    fn test_ray_trace_shadowed() {
        let config = RenderConfig::default();
        let hit_point = Vec3::new(0.0, 0.0, -1.0);

        let mut world = HittableList::new();
        world.add(Sphere::new(Vec3::ZERO, 1.0));
        // Blocker sitting on the path towards the light
        world.add(Sphere::new(hit_point - config.light * 2.0, 0.5));

        let ray = Ray::new(Camera::EYE, Vec3::Z);
        assert_eq!(ray_trace(&world, &ray, &config), 0.0);

        let unshadowed = config.clone().with_shadows(false);
        assert!((ray_trace(&world, &ray, &unshadowed) - config.light.z).abs() < 1e-12);
    }

    #[test]
    fn test_render_pixel_center_is_lit() {
        let scene = Scene::build(1).unwrap();
        let config = small_config(16, 16);
        let camera = Camera::new(16, 16);

        assert!(render_pixel(&scene, &camera, 8, 8, &config) > 0);
        assert_eq!(render_pixel(&scene, &camera, 0, 0, &config), 0);
    }

    #[test]
    fn test_image_buffer_new() {
        let image = ImageBuffer::new(7, 3).unwrap();
        assert_eq!(image.as_bytes().len(), 21);
        assert!(image.pixels.iter().all(|&p| p == 0));
        assert_eq!(image.get(6, 2), 0);
    }

    #[test]
    fn test_image_buffer_offset_is_wide() {
        // Offsets past u32::MAX, computed without allocating the pixels
        let image = ImageBuffer {
            width: 100_000,
            height: 100_000,
            pixels: Vec::new(),
        };
        assert_eq!(image.offset(3, 0), 3);
        assert_eq!(image.offset(7, 99_999), 9_999_900_007);
    }

    #[test]
    fn test_shadow_epsilon_builder() {
        let config = RenderConfig::default().with_shadow_epsilon(1e-6);
        assert_eq!(config.shadow_epsilon, 1e-6);
        assert_eq!(RenderConfig::default().shadow_epsilon, 1e-12);

        // A larger offset still clears the surface of a lone sphere
        let scene = Scene::build(1).unwrap();
        let ray = Ray::new(Camera::EYE, Vec3::Z);
        assert!((ray_trace(&scene, &ray, &config) - config.light.z).abs() < 1e-12);
    }

    #[test]
    fn test_render_output_size() {
        let scene = Scene::build(2).unwrap();

        for dispatch in [
            Dispatch::Serial,
            Dispatch::Fifo { workers: 1 },
            Dispatch::Fifo { workers: 3 },
            Dispatch::Pool { workers: 2 },
        ] {
            let config = small_config(13, 9).with_dispatch(dispatch);
            let image = render(&scene, &config).unwrap();
            assert_eq!(image.as_bytes().len(), 13 * 9);
            assert_eq!((image.width, image.height), (13, 9));
        }
    }

    #[test]
    fn test_render_into_wrong_buffer_size() {
        let scene = Scene::build(2).unwrap();
        let config = small_config(4, 4);
        let mut out = vec![0u8; 15];

        let err = render_into(&scene, &config, &mut out).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        assert!(matches!(
            small_config(0, 4).validate(),
            Err(RenderError::InvalidResolution { width: 0, height: 4 })
        ));
        assert!(matches!(
            small_config(4, 4).with_block_divisor(0).validate(),
            Err(RenderError::InvalidBlockDivisor(0))
        ));
        assert!(matches!(
            small_config(4, 4)
                .with_dispatch(Dispatch::Fifo { workers: 0 })
                .validate(),
            Err(RenderError::InvalidWorkers(0))
        ));
        assert!(matches!(
            small_config(4, 4)
                .with_dispatch(Dispatch::Pool { workers: 0 })
                .validate(),
            Err(RenderError::InvalidWorkers(0))
        ));
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_render_flake_invalid_level() {
        let err = render_flake(0, &small_config(4, 4)).unwrap_err();
        assert!(matches!(err, RenderError::Scene(_)));
    }

    #[test]
    fn test_render_flake_validates_before_building() {
        // Bad config is reported before the scene is touched
        let err = render_flake(0, &small_config(0, 4)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidResolution { .. }));

        let err = render(&Scene::build(1).unwrap(), &small_config(4, 0)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidResolution { .. }));
    }

    #[test]
    fn test_level_two_matches_brute_force() {
        let scene = Scene::build(2).unwrap();
        assert_eq!(scene.len(), 10);
        let reference = HittableList::from_scene(&scene);
        let config = small_config(4, 4).with_dispatch(Dispatch::Fifo { workers: 1 });

        let image = render(&scene, &config).unwrap();

        let camera = Camera::new(4, 4);
        for row in 0..4u32 {
            let scan_y = 3 - row;
            for x in 0..4u32 {
                let expected = render_pixel(&reference, &camera, x, scan_y, &config);
                assert_eq!(image.get(x, row), expected, "pixel ({x}, {row})");
            }
        }
    }

    #[test]
    fn test_render_deterministic_across_dispatch() {
        init_logging();
        let scene = Scene::build(3).unwrap();
        let base = small_config(40, 37);

        let serial = render(&scene, &base).unwrap();
        assert!(serial.pixels.iter().any(|&p| p > 0), "image is all black");

        for dispatch in [
            Dispatch::Fifo { workers: 1 },
            Dispatch::Fifo { workers: 4 },
            Dispatch::Pool { workers: 3 },
        ] {
            let image = render(&scene, &base.clone().with_dispatch(dispatch)).unwrap();
            assert_eq!(image.pixels, serial.pixels, "{dispatch:?}");
        }
    }
}
