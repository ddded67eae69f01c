//! CO2 Dashboard - regional emissions, emissions vs GDP and per-country trends
//!
//! Loads the emissions CSV once at startup and shows it as an interactive
//! single-page dashboard.

mod charts;
mod config;
mod dashboard;
mod data;
mod gui;

use anyhow::{anyhow, Context};
use config::DashboardConfig;
use dashboard::{AppContext, Dashboard};
use data::{DataLoader, DataSource};
use eframe::egui;
use env_logger::Env;
use gui::DashboardApp;
use log::error;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::load().context("Invalid dashboard configuration")?;

    let loader = DataLoader::new(DataSource::parse(&config.data_source))
        .with_timeout(config.request_timeout());

    let dataset = match loader.get_data() {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to load data from {}: {}", loader.source(), e);
            return Err(e).context("Could not load the emissions data");
        }
    };

    let context = AppContext::new(config, dataset);
    let dashboard = Dashboard::new(&context).context("Could not build the dashboard views")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([context.config.window_width, context.config.window_height])
            .with_min_inner_size([900.0, 600.0])
            .with_title("CO2 Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "CO2 Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, context, dashboard)))),
    )
    .map_err(|e| anyhow!("Window error: {}", e))
}
