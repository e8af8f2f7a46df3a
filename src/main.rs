mod app;
mod color;
mod config;
mod state;
mod ui;

use anyhow::Context;
use app::DashboardApp;
use bos311_dashboard::data::loader::load_file;
use clap::Parser;
use config::Cli;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // The table is loaded once up front; a bad file is fatal.
    let dataset = load_file(&cli.data)
        .with_context(|| format!("loading {}", cli.data.display()))?;

    let mut state = AppState::new(cli.layout);
    state.set_dataset(dataset);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        cli.layout.window_title(),
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}
