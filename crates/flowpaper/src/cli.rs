use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{Antialiasing, ColorSpaceMode};

use crate::bindings::map_antialias;

#[derive(Parser, Debug)]
#[command(
    name = "flowpaper",
    author,
    version,
    about = "Animated flow-field background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file; defaults to `flowpaper.toml` in the config directory.
    #[arg(long, global = true, value_name = "PATH", env = "FLOWPAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Window (or still export) size in physical pixels, e.g. `1280x720`.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Output color space handling: `gamma` or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Show the field immediately instead of fading it in.
    #[arg(long)]
    pub no_entrance: bool,

    /// Stop the render loop after this many seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub exit_after: Option<Duration>,

    /// Render a single frame on the CPU to the given PNG path, then exit.
    #[arg(long, value_name = "PATH", value_parser = parse_png_path)]
    pub still_export: Option<PathBuf>,

    /// Timestamp in seconds evaluated by `--still-export`.
    #[arg(long, value_name = "SECONDS", default_value = "0", value_parser = parse_still_time)]
    pub still_time: f32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or create the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration file path.
    Where,
    /// Write the bundled default configuration.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration after loading.
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    flowconfig::parse_surface_size(value).map(|size| (size.width, size.height))
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    if value.trim().is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }
    flowconfig::parse_antialias(value).map(map_antialias)
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "gamma" | "srgb-off" | "webgl" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected gamma or linear"
        )),
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds '{value}'"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("seconds must be a positive number".into());
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn parse_still_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid still time '{value}'"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err("still time must be a non-negative number of seconds".into());
    }
    Ok(seconds)
}

fn parse_png_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match extension_of(&path).as_deref() {
        Some("png") => Ok(path),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_variants() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias(" OFF ").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("8").unwrap(), Antialiasing::Samples(8));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_color_space_aliases() {
        assert_eq!(parse_color_space("Gamma").unwrap(), ColorSpaceMode::Gamma);
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert!(parse_color_space("auto").is_err());
    }

    #[test]
    fn size_and_times_are_validated() {
        assert_eq!(parse_size("1920x1080").unwrap(), (1920, 1080));
        assert!(parse_size("0x10").is_err());
        assert_eq!(parse_seconds("1.5").unwrap(), Duration::from_millis(1500));
        assert!(parse_seconds("0").is_err());
        assert_eq!(parse_still_time("0").unwrap(), 0.0);
        assert!(parse_still_time("-1").is_err());
    }

    #[test]
    fn still_export_requires_png() {
        assert!(parse_png_path("frame.PNG").is_ok());
        assert!(parse_png_path("frame.exr").is_err());
        assert!(parse_png_path("frame").is_err());
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = Cli::try_parse_from(["flowpaper", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Init { force: true }
            }))
        ));
    }

    #[test]
    fn run_flags_parse_without_subcommand() {
        let cli = Cli::try_parse_from([
            "flowpaper",
            "--size",
            "640x360",
            "--no-vsync",
            "--antialias",
            "4",
            "--exit-after",
            "2",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.size, Some((640, 360)));
        assert!(cli.run.no_vsync);
        assert_eq!(cli.run.antialias, Some(Antialiasing::Samples(4)));
        assert_eq!(cli.run.exit_after, Some(Duration::from_secs(2)));
    }
}
