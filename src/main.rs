mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::{anyhow, Context};
use app::InsightsApp;
use clap::Parser;
use config::{Args, DashboardConfig};
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from(Args::parse());
    let state = startup_state(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.inner_size)
            .with_min_inner_size(config.min_inner_size),
        ..Default::default()
    };

    eframe::run_native(
        &config.window_title,
        options,
        Box::new(move |_cc| Ok(Box::new(InsightsApp::new(state)))),
    )
    .map_err(|e| anyhow!("failed to start the viewer: {e}"))
}

/// A source named on the command line must load before the window opens.
fn startup_state(config: &DashboardConfig) -> anyhow::Result<AppState> {
    let mut state = AppState::new(config.preview_rows);
    if let Some(path) = &config.source {
        state
            .open_path(path)
            .with_context(|| format!("loading {}", path.display()))
            .inspect_err(|e| log::error!("Failed to load startup source: {e:#}"))?;
    }
    Ok(state)
}
