//! CO2 Dashboard Main Application
//! One scrolling page with the regional, scatter and country sections.

use crate::charts::StaticChartRenderer;
use crate::dashboard::{AppContext, Dashboard, DashboardEvent, Section};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use log::{debug, error, info, warn};
use std::path::Path;

/// Main application window.
pub struct DashboardApp {
    context: AppContext,
    dashboard: Dashboard,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        context: AppContext,
        dashboard: Dashboard,
    ) -> Self {
        Self {
            context,
            dashboard,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::Dashboard(event) => self.handle_event(event),
            ControlPanelAction::Export(section) => self.handle_export(section),
            ControlPanelAction::OpenExport => self.handle_open_export(),
            ControlPanelAction::None => {}
        }
    }

    fn handle_event(&mut self, event: DashboardEvent) {
        match self.dashboard.dispatch(&self.context, event) {
            Ok(Some(section)) => {
                debug!(
                    "{:?} redrawn, generation {}",
                    section,
                    self.dashboard.generation(section)
                );
                if section == Section::Scatter {
                    self.chart_viewer.reset_scatter_selection();
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to update dashboard: {}", e);
                self.control_panel.set_error(&format!("Error: {}", e));
            }
        }
    }

    /// Ask for a target file and render the section with plotters.
    fn handle_export(&mut self, section: Section) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .add_filter("SVG image", &["svg"])
            .set_file_name(format!("{}.png", section.file_stem()))
            .save_file()
        else {
            return; // User cancelled
        };

        let size = (
            self.context.config.export_width,
            self.context.config.export_height,
        );
        let result = match section {
            Section::Regional => {
                StaticChartRenderer::render_regional(self.dashboard.regional(), &path, size)
            }
            Section::Scatter => StaticChartRenderer::render_scatter(
                self.dashboard.scatter(),
                &self.context.palette,
                &path,
                size,
            ),
            Section::TimeSeries => match self.dashboard.time_series() {
                Some(view) => StaticChartRenderer::render_time_series(view, &path, size),
                None => {
                    self.control_panel.set_error("No country data to export");
                    return;
                }
            },
        };

        match result {
            Ok(()) => {
                info!("Exported {:?} chart to {}", section, path.display());
                self.control_panel
                    .set_status(&format!("Saved {}", path.display()));
                self.control_panel.last_export = Some(path);
            }
            Err(e) => {
                warn!("Export to {} failed: {:#}", path.display(), e);
                self.control_panel.set_error(&format!("Export failed: {:#}", e));
            }
        }
    }

    fn handle_open_export(&mut self) {
        let Some(path) = self.control_panel.last_export.clone() else {
            return;
        };
        if let Err(e) = open::that(&path) {
            warn!("Could not open {}: {}", path.display(), e);
            self.control_panel
                .set_error(&format!("Could not open {}", display_name(&path)));
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut action = ControlPanelAction::None;

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            action = self.control_panel.show_status(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let dataset = self.context.dataset.clone();

                    ui.heading(egui::RichText::new("CO2-Emissions").size(28.0).strong());
                    ui.add_space(10.0);

                    ui.heading("CO2-Emissions per region in most recent year");
                    ui.add_space(5.0);
                    action.merge(self.chart_viewer.show_regional(
                        ui,
                        &self.control_panel,
                        self.dashboard.regional(),
                    ));
                    ui.add_space(15.0);

                    ui.heading("CO2-Emissions vs Gross Domestic Product");
                    ui.add_space(5.0);
                    action.merge(self.control_panel.show_year_slider(
                        ui,
                        self.dashboard.selection().year,
                        dataset.year_bounds(),
                    ));
                    action.merge(self.chart_viewer.show_scatter(
                        ui,
                        &self.control_panel,
                        self.dashboard.scatter(),
                        &self.context.palette,
                    ));
                    ui.add_space(15.0);

                    ui.separator();
                    ui.add_space(10.0);

                    ui.heading("CO2-Emissions and GDP for Country of Interest");
                    ui.add_space(5.0);
                    action.merge(self.control_panel.show_country_selector(
                        ui,
                        self.dashboard.selection().country.as_deref(),
                        dataset.countries(),
                    ));
                    action.merge(self.chart_viewer.show_time_series(
                        ui,
                        &self.control_panel,
                        self.dashboard.time_series(),
                    ));
                    ui.add_space(20.0);
                });
        });

        self.handle_action(action);
    }
}
