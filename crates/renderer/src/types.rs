use flowconfig::HexColor;
use sequencer::EntranceSequencer;

use crate::viewport::DEFAULT_MAX_PIXEL_RATIO;

/// Linear RGB triple with each channel in `0.0..=1.0`.
pub type Rgb = [f32; 3];

/// The four colour stops blended by the fragment program, in blend order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Rgb,
    pub mid: Rgb,
    pub accent1: Rgb,
    pub accent2: Rgb,
}

impl Palette {
    /// Builds a palette from `0xRRGGBB` values without any colour-space conversion.
    pub fn from_hex(background: u32, mid: u32, accent1: u32, accent2: u32) -> Self {
        Self {
            background: HexColor(background).to_unit_rgb(),
            mid: HexColor(mid).to_unit_rgb(),
            accent1: HexColor(accent1).to_unit_rgb(),
            accent2: HexColor(accent2).to_unit_rgb(),
        }
    }
}

impl Default for Palette {
    /// Dark background, deep teal, electric blue, green.
    fn default() -> Self {
        Self::from_hex(0x0b0c10, 0x00444f, 0x45f3ff, 0x66ff00)
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Write shader values to a non-sRGB swapchain unchanged, like a WebGL canvas.
    #[default]
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Adapter selection hint passed to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    High,
    Low,
}

/// What the adapter turned out to be, for logging and quality fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub window_title: String,
    pub palette: Palette,
    pub antialiasing: Antialiasing,
    pub color_space: ColorSpaceMode,
    pub power_preference: GpuPowerPreference,
    /// FIFO presentation when true; otherwise prefer Immediate, then Mailbox.
    pub vsync: bool,
    /// Maximum frames queued ahead of presentation (1-3).
    pub frame_latency: u32,
    /// Cap on device pixels per logical pixel for the drawable.
    pub max_pixel_ratio: f32,
    /// Entrance reveal to play once the first frame is presented.
    pub entrance: EntranceSequencer,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            window_title: "flowpaper".to_string(),
            palette: Palette::default(),
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            power_preference: GpuPowerPreference::default(),
            vsync: true,
            frame_latency: 2,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
            entrance: EntranceSequencer::default(),
        }
    }
}
