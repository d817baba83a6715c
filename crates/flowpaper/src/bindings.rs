use anyhow::{Context, Result};
use flowconfig::{
    AntialiasSetting, ColorSpaceSetting, EntranceConfig, FlowConfig, PaletteConfig, PowerSetting,
};
use renderer::{Antialiasing, ColorSpaceMode, GpuPowerPreference, Palette, RendererConfig};
use sequencer::EntranceSequencer;

use crate::cli::RunArgs;

pub fn map_palette(palette: &PaletteConfig) -> Palette {
    Palette {
        background: palette.background.to_unit_rgb(),
        mid: palette.mid.to_unit_rgb(),
        accent1: palette.accent1.to_unit_rgb(),
        accent2: palette.accent2.to_unit_rgb(),
    }
}

pub fn map_antialias(setting: AntialiasSetting) -> Antialiasing {
    match setting {
        AntialiasSetting::Auto => Antialiasing::Auto,
        AntialiasSetting::Off => Antialiasing::Off,
        AntialiasSetting::Samples2 => Antialiasing::Samples(2),
        AntialiasSetting::Samples4 => Antialiasing::Samples(4),
        AntialiasSetting::Samples8 => Antialiasing::Samples(8),
        AntialiasSetting::Samples16 => Antialiasing::Samples(16),
    }
}

pub fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

pub fn map_power(setting: PowerSetting) -> GpuPowerPreference {
    match setting {
        PowerSetting::High => GpuPowerPreference::High,
        PowerSetting::Low => GpuPowerPreference::Low,
    }
}

/// Combines the loaded configuration with command-line overrides.
pub fn renderer_config(config: &FlowConfig, args: &RunArgs) -> Result<RendererConfig> {
    let render = &config.render;
    let surface_size = args
        .size
        .unwrap_or((render.size.width, render.size.height));

    let entrance = if args.no_entrance {
        EntranceSequencer::from_config(&EntranceConfig {
            enabled: false,
            ..config.entrance.clone()
        })
    } else {
        EntranceSequencer::from_config(&config.entrance)
    }
    .context("invalid entrance configuration")?;

    Ok(RendererConfig {
        surface_size,
        palette: map_palette(&config.palette),
        antialiasing: args.antialias.unwrap_or(map_antialias(render.antialias)),
        color_space: args.color_space.unwrap_or(map_color_space(render.color_space)),
        power_preference: map_power(render.power),
        vsync: render.vsync && !args.no_vsync,
        frame_latency: render.frame_latency,
        max_pixel_ratio: render.max_pixel_ratio,
        entrance,
        ..RendererConfig::default()
    })
}
