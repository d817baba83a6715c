//! Live shader parameters, owned by the host and read once per draw.

use crate::gpu::FlowUniforms;
use crate::types::Palette;

/// Pointer position before the first pointer event: the centre of the view.
pub const DEFAULT_POINTER: [f32; 2] = [0.5, 0.5];

/// Parameter state fed to the fragment program each frame.
///
/// Written by the render loop (time) and the viewport controller
/// (resolution, pointer); the palette is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformStore {
    elapsed_time: f32,
    resolution: [f32; 2],
    pointer: [f32; 2],
    palette: Palette,
    reveal: f32,
}

impl UniformStore {
    /// Zero-sized dimensions are raised to one pixel so the resolution is
    /// always positive.
    pub fn new(palette: Palette, width: u32, height: u32) -> Self {
        Self {
            elapsed_time: 0.0,
            resolution: [width.max(1) as f32, height.max(1) as f32],
            pointer: DEFAULT_POINTER,
            palette,
            reveal: 1.0,
        }
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Advances the clock. Values lower than the current time, and non-finite
    /// values, are ignored. Returns the stored time.
    pub fn set_elapsed_time(&mut self, seconds: f32) -> f32 {
        if seconds.is_finite() && seconds > self.elapsed_time {
            self.elapsed_time = seconds;
        }
        self.elapsed_time
    }

    pub fn resolution(&self) -> [f32; 2] {
        self.resolution
    }

    /// Stores a new drawable size in device pixels. Returns `false` and keeps
    /// the previous value when either side is not a positive finite number.
    pub fn set_resolution(&mut self, width: f32, height: f32) -> bool {
        let valid = |value: f32| value.is_finite() && value > 0.0;
        if !valid(width) || !valid(height) {
            return false;
        }
        self.resolution = [width, height];
        true
    }

    pub fn pointer(&self) -> [f32; 2] {
        self.pointer
    }

    /// Callers pass a normalised, bottom-left-origin position. Nothing is
    /// clamped here.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x, y];
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Opacity of the container the field is drawn into.
    pub fn reveal(&self) -> f32 {
        self.reveal
    }

    pub fn set_reveal(&mut self, opacity: f32) {
        self.reveal = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    pub(crate) fn snapshot(&self) -> FlowUniforms {
        FlowUniforms {
            u_color1: self.palette.background,
            u_time: self.elapsed_time,
            u_color2: self.palette.mid,
            u_reveal: self.reveal,
            u_color3: self.palette.accent1,
            _pad0: 0.0,
            u_color4: self.palette.accent2,
            _pad1: 0.0,
            u_resolution: self.resolution,
            u_pointer: self.pointer,
        }
    }
}
