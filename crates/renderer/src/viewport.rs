use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::uniforms::UniformStore;

/// Device pixels per logical pixel used when no cap is configured.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 2.0;

/// Maps window resize and pointer events onto the uniform store.
///
/// The drawable is rendered at `min(scale_factor, max_pixel_ratio)` device
/// pixels per logical pixel, so a dense display does not multiply the
/// per-pixel field cost beyond the cap. Pointer positions arrive in window
/// pixels and are rescaled into the same drawable space.
#[derive(Debug, Clone, Copy)]
pub struct ViewportController {
    scale_factor: f64,
    max_pixel_ratio: f64,
    max_dimension: u32,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_MAX_PIXEL_RATIO)
    }
}

impl ViewportController {
    pub fn new(scale_factor: f64, max_pixel_ratio: f32) -> Self {
        Self {
            scale_factor: sanitize_ratio(scale_factor),
            max_pixel_ratio: sanitize_ratio(f64::from(max_pixel_ratio)),
            max_dimension: u32::MAX,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = sanitize_ratio(scale_factor);
    }

    /// Largest edge the GPU accepts for the drawable.
    pub fn set_max_dimension(&mut self, max_dimension: u32) {
        self.max_dimension = max_dimension.max(1);
    }

    /// Effective device pixels per logical pixel.
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    /// Drawable size for a window of `physical` size. Zero edges stay zero.
    pub fn drawable_size(&self, physical: PhysicalSize<u32>) -> PhysicalSize<u32> {
        let scale = self.render_scale();
        let fit = |edge: u32| -> u32 {
            if edge == 0 {
                return 0;
            }
            let scaled = (f64::from(edge) * scale).round().max(1.0);
            (scaled.min(f64::from(self.max_dimension))) as u32
        };
        PhysicalSize::new(fit(physical.width), fit(physical.height))
    }

    /// Records the drawable size for a new window size. Zero-sized viewports,
    /// common while a window is minimised or mid-layout, are ignored.
    /// Returns the drawable size the store accepted.
    pub fn handle_resize(
        &self,
        uniforms: &mut UniformStore,
        size: PhysicalSize<u32>,
    ) -> Option<PhysicalSize<u32>> {
        if size.width == 0 || size.height == 0 {
            tracing::trace!(width = size.width, height = size.height, "ignoring zero-sized viewport");
            return None;
        }
        let drawable = self.drawable_size(size);
        uniforms
            .set_resolution(drawable.width as f32, drawable.height as f32)
            .then_some(drawable)
    }

    /// Converts a top-left-origin window position to the bottom-left-origin
    /// unit square. Positions outside the viewport map outside `[0, 1]`.
    pub fn handle_pointer_moved(&self, uniforms: &mut UniformStore, position: PhysicalPosition<f64>) {
        let [width, height] = uniforms.resolution();
        let scale = self.render_scale();
        let x = (position.x * scale) as f32 / width;
        let y = 1.0 - (position.y * scale) as f32 / height;
        uniforms.set_pointer(x, y);
    }

    /// Drawable pixels per window pixel, in `(0, 1]` once the cap applies.
    fn render_scale(&self) -> f64 {
        self.pixel_ratio() / self.scale_factor
    }
}

fn sanitize_ratio(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
