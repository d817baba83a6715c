use std::thread;

use anyhow::{Context, Result};
use flowconfig::FlowConfig;
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::bindings::{map_palette, renderer_config};
use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn load_config(paths: &AppPaths) -> Result<FlowConfig> {
    let config = FlowConfig::load_or_default(paths.config_file()).with_context(|| {
        format!(
            "failed to load configuration from {}",
            paths.config_file().display()
        )
    })?;
    tracing::debug!(
        config = %paths.config_file().display(),
        exists = paths.config_file().exists(),
        "resolved configuration"
    );
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.config.as_deref())?;
    let config = load_config(&paths)?;

    if let Some(path) = args.still_export.as_ref() {
        let (width, height) = args
            .size
            .unwrap_or((config.render.size.width, config.render.size.height));
        return renderer::export::write_still_png(
            path,
            &map_palette(&config.palette),
            width,
            height,
            args.still_time,
        );
    }

    let renderer = Renderer::new(renderer_config(&config, &args)?);

    if let Some(limit) = args.exit_after {
        let stop = renderer.stop_handle();
        thread::Builder::new()
            .name("flowpaper-exit-timer".into())
            .spawn(move || {
                thread::sleep(limit);
                tracing::info!(after = ?limit, "exit timer elapsed; stopping");
                stop.request_stop();
            })
            .context("failed to spawn exit timer")?;
    }

    tracing::info!(config = %paths.config_file().display(), "starting flowpaper");
    renderer.run().context("renderer failed")
}
