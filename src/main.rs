mod app;
mod color;
mod config;
mod data;
mod session;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::DashboardApp;
use config::{DashboardConfig, CONFIG_ENV};
use eframe::egui;
use session::SessionCache;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::resolve(
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        std::env::args_os().nth(1).map(PathBuf::from),
    )?;

    let session = SessionCache::new(config.data_path.clone(), config.columns.clone());
    let dataset = session
        .get_or_load()
        .inspect_err(|e| log::error!("Could not load {}: {e}", session.path().display()))
        .with_context(|| format!("loading {}", session.path().display()))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    let state = AppState::new(dataset, config);
    eframe::run_native(
        "PM2.5 Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
