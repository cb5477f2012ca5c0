use anyhow::Context;
use model_viewer::{ViewerApp, ViewerConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from_env();
    log::info!("Starting {} with {:?}", config.title, config.asset_path);

    ViewerApp::new(config)
        .context("Failed to start the viewer")?
        .run()
}
