//! TOML configuration for the flow-field background.
//!
//! The file is small and versioned: a palette of four colour stops, a handful
//! of GPU/presentation knobs, and the timings of the entrance reveal. Every
//! section is optional and falls back to the values the background ships with.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Most text elements an entrance may stagger.
pub const MAX_TEXT_ELEMENTS: u32 = 64;

/// Bundled configuration written by `flowpaper config init`.
pub const DEFAULT_CONFIG: &str = r##"version = 1

[palette]
background = "#0b0c10"
mid = "#00444f"
accent1 = "#45f3ff"
accent2 = "#66ff00"

[render]
antialias = "auto"
color_space = "gamma"
power = "high"
vsync = true
frame_latency = 2
size = "1280x720"
max_pixel_ratio = 2.0

[entrance]
enabled = true

[entrance.container]
duration = "2s"
ease = "power2.inOut"

[entrance.text]
count = 3
delay = "500ms"
duration = "1200ms"
stagger = "200ms"
offset = 50.0
ease = "power3.out"

[entrance.nav]
delay = "1s"
duration = "1s"
offset = -50.0
ease = "power3.out"
"##;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowConfig {
    pub version: u32,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub entrance: EntranceConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            version: 1,
            palette: PaletteConfig::default(),
            render: RenderConfig::default(),
            entrance: EntranceConfig::default(),
        }
    }
}

/// A `0xRRGGBB` colour as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub u32);

impl HexColor {
    /// Channels scaled into `0.0..=1.0`, used as-is by the shader.
    pub fn to_unit_rgb(self) -> [f32; 3] {
        let r = (self.0 >> 16) & 0xff;
        let g = (self.0 >> 8) & 0xff;
        let b = self.0 & 0xff;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = HexColor;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a colour as \"#rrggbb\", \"0xrrggbb\", or an integer")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse_hex_color(v).map_err(E::custom)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v > 0xff_ffff {
                    return Err(E::custom(format!("colour {v:#x} exceeds 0xffffff")));
                }
                Ok(HexColor(v as u32))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v < 0 {
                    return Err(E::custom("colour must be non-negative"));
                }
                self.visit_u64(v as u64)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

pub fn parse_hex_color(raw: &str) -> Result<HexColor, String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 6 {
        return Err(format!("invalid colour '{trimmed}'; expected #rrggbb"));
    }
    u32::from_str_radix(digits, 16)
        .map(HexColor)
        .map_err(|_| format!("invalid colour '{trimmed}'; expected #rrggbb"))
}

/// The four colour stops, in blend order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub background: HexColor,
    pub mid: HexColor,
    pub accent1: HexColor,
    pub accent2: HexColor,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            background: HexColor(0x0b0c10),
            mid: HexColor(0x00444f),
            accent1: HexColor(0x45f3ff),
            accent2: HexColor(0x66ff00),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AntialiasSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Str(String),
            Num(i64),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Str(raw) => parse_antialias(&raw).map_err(de::Error::custom),
            Helper::Num(value) => {
                if value < 0 {
                    return Err(de::Error::custom("antialias value must be non-negative"));
                }
                parse_antialias(&value.to_string()).map_err(de::Error::custom)
            }
        }
    }
}

pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    High,
    Low,
}

/// Window size in physical pixels, written as `"WIDTHxHEIGHT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl<'de> Deserialize<'de> for SurfaceSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_surface_size(&raw).map_err(de::Error::custom)
    }
}

pub fn parse_surface_size(value: &str) -> Result<SurfaceSize, String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width in size '{value}'"))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height in size '{value}'"))?;
    if width == 0 || height == 0 {
        return Err("size dimensions must be greater than zero".into());
    }
    Ok(SurfaceSize { width, height })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub antialias: AntialiasSetting,
    pub color_space: ColorSpaceSetting,
    pub power: PowerSetting,
    pub vsync: bool,
    pub frame_latency: u32,
    pub size: SurfaceSize,
    /// Upper bound on device pixels per logical pixel for the drawable.
    pub max_pixel_ratio: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            antialias: AntialiasSetting::Auto,
            color_space: ColorSpaceSetting::Gamma,
            power: PowerSetting::High,
            vsync: true,
            frame_latency: 2,
            size: SurfaceSize {
                width: 1280,
                height: 720,
            },
            max_pixel_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EasingSetting {
    Linear,
    Smoothstep,
    /// Cubic in-out.
    Power2InOut,
    /// Quartic out.
    Power3Out,
}

impl<'de> Deserialize<'de> for EasingSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_easing(&raw).map_err(de::Error::custom)
    }
}

pub fn parse_easing(raw: &str) -> Result<EasingSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "linear" | "none" => Ok(EasingSetting::Linear),
        "smoothstep" => Ok(EasingSetting::Smoothstep),
        "power2.inout" | "ease-in-out" | "easeinout" => Ok(EasingSetting::Power2InOut),
        "power3.out" | "ease-out" | "easeout" => Ok(EasingSetting::Power3Out),
        other => Err(format!(
            "unknown easing '{other}'; expected linear, smoothstep, power2.inOut, or power3.out"
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntranceConfig {
    pub enabled: bool,
    pub container: ContainerTrackConfig,
    pub text: TextTrackConfig,
    pub nav: NavTrackConfig,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            container: ContainerTrackConfig::default(),
            text: TextTrackConfig::default(),
            nav: NavTrackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerTrackConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: Duration,
    pub ease: EasingSetting,
}

impl Default for ContainerTrackConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2),
            ease: EasingSetting::Power2InOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextTrackConfig {
    pub count: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub delay: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub stagger: Duration,
    pub offset: f32,
    pub ease: EasingSetting,
}

impl Default for TextTrackConfig {
    fn default() -> Self {
        Self {
            count: 3,
            delay: Duration::from_millis(500),
            duration: Duration::from_millis(1200),
            stagger: Duration::from_millis(200),
            offset: 50.0,
            ease: EasingSetting::Power3Out,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavTrackConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub delay: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: Duration,
    pub offset: f32,
    pub ease: EasingSetting,
}

impl Default for NavTrackConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            duration: Duration::from_secs(1),
            offset: -50.0,
            ease: EasingSetting::Power3Out,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl FlowConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FlowConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads `path`, or returns the defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if !(1..=3).contains(&self.render.frame_latency) {
            return Err(ConfigError::Invalid(format!(
                "render.frame_latency must be between 1 and 3 (got {})",
                self.render.frame_latency
            )));
        }

        let ratio = self.render.max_pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "render.max_pixel_ratio must be a positive number (got {ratio})"
            )));
        }

        let entrance = &self.entrance;
        if entrance.text.count > MAX_TEXT_ELEMENTS {
            return Err(ConfigError::Invalid(format!(
                "entrance.text.count must be at most {MAX_TEXT_ELEMENTS} (got {})",
                entrance.text.count
            )));
        }
        if entrance.container.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "entrance.container.duration must be greater than zero".into(),
            ));
        }
        if entrance.text.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "entrance.text.duration must be greater than zero".into(),
            ));
        }
        if entrance.nav.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "entrance.nav.duration must be greater than zero".into(),
            ));
        }
        if !entrance.text.offset.is_finite() || !entrance.nav.offset.is_finite() {
            return Err(ConfigError::Invalid(
                "entrance offsets must be finite numbers".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_default_matches_builtin_defaults() {
        let parsed = FlowConfig::from_toml_str(DEFAULT_CONFIG).expect("parse bundled config");
        assert_eq!(parsed, FlowConfig::default());
    }

    #[test]
    fn sections_are_optional() {
        let config = FlowConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.palette, PaletteConfig::default());
        assert!(config.entrance.enabled);
        assert_eq!(config.render.frame_latency, 2);
    }

    #[test]
    fn parses_overrides() {
        let config = FlowConfig::from_toml_str(
            r#"
version = 1

[palette]
background = "0x000000"
accent2 = 16711680

[render]
antialias = 4
color_space = "linear"
power = "low"
vsync = false
size = "800x600"

[entrance.text]
count = 5
stagger = 0.1
ease = "linear"
"#,
        )
        .unwrap();

        assert_eq!(config.palette.background, HexColor(0));
        assert_eq!(config.palette.accent2, HexColor(0xff0000));
        assert_eq!(config.palette.mid, HexColor(0x00444f));
        assert_eq!(config.render.antialias, AntialiasSetting::Samples4);
        assert_eq!(config.render.color_space, ColorSpaceSetting::Linear);
        assert_eq!(config.render.power, PowerSetting::Low);
        assert!(!config.render.vsync);
        assert_eq!(
            config.render.size,
            SurfaceSize {
                width: 800,
                height: 600
            }
        );
        assert_eq!(config.entrance.text.count, 5);
        assert_eq!(config.entrance.text.stagger, Duration::from_millis(100));
        assert_eq!(config.entrance.text.ease, EasingSetting::Linear);
        assert_eq!(config.entrance.text.delay, Duration::from_millis(500));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = FlowConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_duration_and_bad_latency() {
        let err = FlowConfig::from_toml_str(
            r#"
version = 1
[entrance.container]
duration = "0s"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = FlowConfig::from_toml_str(
            r#"
version = 1
[render]
frame_latency = 7
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(FlowConfig::from_toml_str("version = 1\n[palette]\nmid = \"#12345\"").is_err());
        assert!(FlowConfig::from_toml_str("version = 1\n[render]\nsize = \"0x600\"").is_err());
        assert!(
            FlowConfig::from_toml_str("version = 1\n[entrance.nav]\nease = \"bounce\"").is_err()
        );
        assert!(FlowConfig::from_toml_str("version = 1\n[render]\nantialias = 3").is_err());
    }

    #[test]
    fn pixel_ratio_and_text_count_are_bounded() {
        let config =
            FlowConfig::from_toml_str("version = 1\n[render]\nmax_pixel_ratio = 1.5").unwrap();
        assert_eq!(config.render.max_pixel_ratio, 1.5);
        assert_eq!(FlowConfig::default().render.max_pixel_ratio, 2.0);

        assert!(FlowConfig::from_toml_str("version = 1\n[render]\nmax_pixel_ratio = 0.0").is_err());
        assert!(FlowConfig::from_toml_str("version = 1\n[render]\nmax_pixel_ratio = -2.0").is_err());
        assert!(FlowConfig::from_toml_str("version = 1\n[entrance.text]\ncount = 65").is_err());
        assert!(FlowConfig::from_toml_str("version = 1\n[entrance.text]\ncount = 64").is_ok());
    }

    #[test]
    fn oversized_float_duration_is_an_error() {
        let err =
            FlowConfig::from_toml_str("version = 1\n[entrance.nav]\ndelay = 1e300").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
    }

    #[test]
    fn hex_color_scales_channels() {
        let color = parse_hex_color("#ff8000").unwrap();
        assert_eq!(color.to_unit_rgb(), [1.0, 128.0 / 255.0, 0.0]);
        assert_eq!(color.to_string(), "#ff8000");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = Path::new("/nonexistent/flowpaper/flowpaper.toml");
        let config = FlowConfig::load_or_default(path).unwrap();
        assert_eq!(config, FlowConfig::default());
    }
}
