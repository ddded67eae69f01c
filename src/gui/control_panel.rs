//! Control Panel Widgets
//! Year slider, country selector and the export status line.

use crate::dashboard::{DashboardEvent, Section};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

const LABEL_WIDTH: f32 = 130.0;
const COMBO_WIDTH: f32 = 220.0;

/// Widget state that is not part of the dashboard selection.
pub struct ControlPanel {
    pub status: String,
    pub status_is_error: bool,
    /// Last successfully exported chart.
    pub last_export: Option<PathBuf>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            status_is_error: false,
            last_export: None,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// "Select a Year" slider over `bounds`, step 1.
    pub fn show_year_slider(
        &self,
        ui: &mut egui::Ui,
        year: i64,
        bounds: Option<(i64, i64)>,
    ) -> ControlPanelAction {
        let Some((min, max)) = bounds else {
            ui.label(RichText::new("No years available").color(Color32::GRAY));
            return ControlPanelAction::None;
        };

        let mut value = year;
        let mut action = ControlPanelAction::None;
        ui.horizontal(|ui| {
            ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("Select a Year"));
            let slider = egui::Slider::new(&mut value, min..=max)
                .step_by(1.0)
                .integer();
            if ui.add(slider).changed() && value != year {
                action = ControlPanelAction::Dashboard(DashboardEvent::YearChanged(value));
            }
        });
        action
    }

    /// "Select a country" dropdown over the dataset's countries.
    pub fn show_country_selector(
        &self,
        ui: &mut egui::Ui,
        selected: Option<&str>,
        countries: &[String],
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        ui.horizontal(|ui| {
            ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new("Select a country"));
            ComboBox::from_id_salt("country_selector")
                .width(COMBO_WIDTH)
                .selected_text(selected.unwrap_or_default())
                .show_ui(ui, |ui| {
                    for country in countries {
                        let is_selected = selected == Some(country.as_str());
                        if ui.selectable_label(is_selected, country).clicked() && !is_selected {
                            action = ControlPanelAction::Dashboard(
                                DashboardEvent::CountryChanged(country.clone()),
                            );
                        }
                    }
                });
        });
        action
    }

    /// Per-chart export button.
    pub fn show_export_button(
        &self,
        ui: &mut egui::Ui,
        section: Section,
        enabled: bool,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        ui.add_enabled_ui(enabled, |ui| {
            if ui
                .small_button("💾 Export")
                .on_hover_text("Save this chart as PNG or SVG")
                .clicked()
            {
                action = ControlPanelAction::Export(section);
            }
        });
        action
    }

    /// Status line with an "Open" button for the last export.
    pub fn show_status(&self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        ui.horizontal(|ui| {
            let color = if self.status_is_error {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(color));

            if self.last_export.is_some() && ui.small_button("📂 Open").clicked() {
                action = ControlPanelAction::OpenExport;
            }
        });
        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, status: &str) {
        self.status = status.to_string();
        self.status_is_error = true;
    }
}

/// Actions triggered by the control widgets
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Dashboard(DashboardEvent),
    Export(Section),
    OpenExport,
}

impl ControlPanelAction {
    /// Keeps the first non-empty action of a frame.
    pub fn merge(&mut self, other: ControlPanelAction) {
        if *self == ControlPanelAction::None {
            *self = other;
        }
    }
}
