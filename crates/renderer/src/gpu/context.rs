use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::error::DeviceError;
use crate::types::{AdapterProfile, Antialiasing, ColorSpaceMode, GpuPowerPreference};

/// Device-level options resolved from [`crate::RendererConfig`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContextOptions {
    pub antialiasing: Antialiasing,
    pub color_space: ColorSpaceMode,
    pub power: GpuPowerPreference,
    pub vsync: bool,
    pub frame_latency: u32,
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub adapter_profile: AdapterProfile,
    pub max_dimension: u32,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: T,
        initial_size: PhysicalSize<u32>,
        options: ContextOptions,
    ) -> Result<Self, DeviceError>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance.create_surface(target)?;

        let power_preference = match options.power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter_info, &limits);
        let is_software = adapter_profile.is_software();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software,
            "selected GPU adapter"
        );

        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            return Err(DeviceError::SurfaceTooLarge {
                max: max_dimension,
                width: requested_width,
                height: requested_height,
            });
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let first_format = *surface_caps
            .formats
            .first()
            .ok_or(DeviceError::NoSurfaceFormat)?;
        let wants_srgb = matches!(options.color_space, ColorSpaceMode::Linear);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb() == wants_srgb)
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    requested = ?options.color_space,
                    "no surface format for the requested colour handling; falling back"
                );
                first_format
            });

        let format_features = adapter.get_texture_format_features(surface_format);
        let sample_count = choose_sample_count(
            options.antialiasing,
            format_features.flags.supported_sample_counts(),
            format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE),
            is_software,
        );

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("flowpaper device"),
            required_features,
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))?;

        let desired_maximum_frame_latency = options.frame_latency.clamp(1, 3);
        if desired_maximum_frame_latency != options.frame_latency {
            tracing::warn!(
                requested = options.frame_latency,
                clamped = desired_maximum_frame_latency,
                "GPU frame latency clamped to valid range (1-3)"
            );
        }

        let present_mode = choose_present_mode(&surface_caps.present_modes, options.vsync);
        tracing::debug!(?present_mode, vsync = options.vsync, ?surface_format, sample_count, "using present mode");

        let size = PhysicalSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
            adapter_profile,
            max_dimension,
        })
    }

    /// Reconfigures the swapchain and returns the size actually applied,
    /// which is clamped to the adapter's texture limit.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> PhysicalSize<u32> {
        if new_size.width == 0 || new_size.height == 0 {
            return self.size;
        }

        let fitted = fit_to_texture_limit(new_size, self.max_dimension);
        if fitted != new_size {
            tracing::warn!(
                width = new_size.width,
                height = new_size.height,
                max = self.max_dimension,
                "surface size exceeds the GPU texture limit; clamping"
            );
        }

        self.size = fitted;
        self.config.width = fitted.width;
        self.config.height = fitted.height;
        self.surface.configure(&self.device, &self.config);
        fitted
    }

    /// Re-applies the current configuration after the swapchain was lost or
    /// went out of date.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

pub(crate) fn fit_to_texture_limit(size: PhysicalSize<u32>, max: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.min(max), size.height.min(max))
}

/// Picks the MSAA sample count for `requested`, falling back to what the
/// surface format can actually resolve.
pub(crate) fn choose_sample_count(
    requested: Antialiasing,
    mut supported: Vec<u32>,
    can_resolve: bool,
    is_software: bool,
) -> u32 {
    if !supported.contains(&1) {
        supported.push(1);
    }
    supported.sort_unstable();
    supported.dedup();

    let mut sample_count = match requested {
        Antialiasing::Auto => supported.last().copied().unwrap_or(1),
        Antialiasing::Off => 1,
        Antialiasing::Samples(requested) => {
            if supported.contains(&requested) {
                requested
            } else {
                let fallback = supported
                    .iter()
                    .copied()
                    .filter(|&count| count <= requested)
                    .max()
                    .unwrap_or(1);
                tracing::warn!(
                    requested,
                    fallback,
                    ?supported,
                    "requested MSAA sample count not supported; falling back"
                );
                fallback
            }
        }
    };

    if sample_count > 1 && !can_resolve {
        tracing::warn!("surface format does not support MSAA resolve; disabling MSAA");
        sample_count = 1;
    }

    if is_software && sample_count > 1 {
        tracing::warn!(
            sample_count,
            "software rasterizer detected; disabling MSAA for performance"
        );
        sample_count = 1;
    }

    sample_count
}

/// FIFO when `vsync` is set; otherwise Immediate, then Mailbox, then FIFO.
pub(crate) fn choose_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let has = |mode: wgpu::PresentMode| modes.contains(&mode);
    if !vsync {
        if has(wgpu::PresentMode::Immediate) {
            return wgpu::PresentMode::Immediate;
        }
        if has(wgpu::PresentMode::Mailbox) {
            return wgpu::PresentMode::Mailbox;
        }
    }
    if has(wgpu::PresentMode::Fifo) || modes.is_empty() {
        wgpu::PresentMode::Fifo
    } else {
        modes[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_takes_highest_supported_count() {
        assert_eq!(choose_sample_count(Antialiasing::Auto, vec![1, 4, 8], true, false), 8);
    }

    #[test]
    fn unsupported_request_falls_back_downwards() {
        assert_eq!(
            choose_sample_count(Antialiasing::Samples(8), vec![1, 4], true, false),
            4
        );
        assert_eq!(
            choose_sample_count(Antialiasing::Samples(2), vec![4], true, false),
            1
        );
    }

    #[test]
    fn msaa_disabled_without_resolve_or_on_software() {
        assert_eq!(choose_sample_count(Antialiasing::Auto, vec![1, 4], false, false), 1);
        assert_eq!(choose_sample_count(Antialiasing::Samples(4), vec![1, 4], true, true), 1);
        assert_eq!(choose_sample_count(Antialiasing::Off, vec![1, 4], true, false), 1);
    }

    #[test]
    fn oversize_surfaces_are_clamped_per_edge() {
        assert_eq!(
            fit_to_texture_limit(PhysicalSize::new(20_000, 1080), 8192),
            PhysicalSize::new(8192, 1080)
        );
        assert_eq!(
            fit_to_texture_limit(PhysicalSize::new(1920, 1080), 8192),
            PhysicalSize::new(1920, 1080)
        );
    }

    #[test]
    fn present_mode_prefers_fifo_with_vsync() {
        use wgpu::PresentMode::*;
        assert_eq!(choose_present_mode(&[Mailbox, Fifo, Immediate], true), Fifo);
        assert_eq!(choose_present_mode(&[Fifo, Mailbox, Immediate], false), Immediate);
        assert_eq!(choose_present_mode(&[Fifo, Mailbox], false), Mailbox);
        assert_eq!(choose_present_mode(&[Fifo], false), Fifo);
    }
}
