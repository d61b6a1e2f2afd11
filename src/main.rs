mod app;
mod color;
mod config;
mod data;
mod format;
mod headless;
mod state;
mod ui;

use anyhow::anyhow;
use app::SalesDashboardApp;
use clap::Parser;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::parse();
    if config.is_headless() {
        return headless::run(&config);
    }

    let mut state = AppState::new(config.top_n);
    if let Some(path) = config.startup_file() {
        state.load_path(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("failed to start the UI: {e}"))
}
