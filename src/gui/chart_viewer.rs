//! Chart Viewer Widget
//! Lays out the three dashboard sections and keeps their per-frame UI state.

use crate::charts::{
    ChartPlotter, RegionPalette, RegionalView, ScatterInteraction, ScatterTool, ScatterView,
    TimeSeriesView,
};
use crate::dashboard::Section;
use crate::gui::{ControlPanel, ControlPanelAction};
use egui::{Color32, RichText};

const CHART_HEIGHT: f32 = 420.0;
const TABLE_HEIGHT: f32 = 380.0;

/// Interactive chart area.
#[derive(Default)]
pub struct ChartViewer {
    /// Region table search box.
    pub table_search: String,
    pub scatter: ScatterInteraction,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lasso selection belongs to one year's points.
    pub fn reset_scatter_selection(&mut self) {
        self.scatter.clear_selection();
    }

    /// Table on the left, bar chart on the right.
    pub fn show_regional(
        &mut self,
        ui: &mut egui::Ui,
        panel: &ControlPanel,
        view: &RegionalView,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.columns(2, |columns| {
            let left = &mut columns[0];
            left.label(RichText::new("DataFrame display").size(18.0).strong());
            left.horizontal(|ui| {
                ui.label("🔍");
                ui.add(
                    egui::TextEdit::singleline(&mut self.table_search)
                        .hint_text("Region or total")
                        .desired_width(200.0),
                );
            });
            left.label(
                RichText::new("Type to search the table")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
            left.add_space(4.0);

            let rows = view.search(&self.table_search);
            egui::ScrollArea::vertical()
                .id_salt("region_table_scroll")
                .max_height(TABLE_HEIGHT)
                .show(left, |ui| {
                    ChartPlotter::draw_region_table(ui, &rows);
                });

            let right = &mut columns[1];
            right.label(RichText::new("Chart display").size(18.0).strong());
            right.horizontal(|ui| {
                ui.label(RichText::new(view.title()).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    action = panel.show_export_button(ui, Section::Regional, true);
                });
            });
            ChartPlotter::draw_region_bars(right, view, CHART_HEIGHT);
        });

        action
    }

    /// Scatter with a toolbar that only shows while the pointer is over the
    /// plot or the toolbar row itself.
    pub fn show_scatter(
        &mut self,
        ui: &mut egui::Ui,
        panel: &ControlPanel,
        view: &ScatterView,
        palette: &RegionPalette,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        let section = ui.scope(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(view.title()).strong());

                if self.scatter.hovered {
                    ui.separator();
                    ui.selectable_value(&mut self.scatter.tool, ScatterTool::Pan, "✋ Pan")
                        .on_hover_text("Drag to pan, scroll to zoom");
                    ui.selectable_value(&mut self.scatter.tool, ScatterTool::Lasso, "➰ Lasso")
                        .on_hover_text("Drag around points to select them");
                    if ui.small_button("⟲ Reset").clicked() {
                        self.scatter.reset_view = true;
                        self.scatter.clear_selection();
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    action = panel.show_export_button(ui, Section::Scatter, true);
                    if !self.scatter.selected.is_empty() {
                        ui.label(
                            RichText::new(format!("{} selected", self.scatter.selected.len()))
                                .color(Color32::GRAY),
                        );
                    }
                });
            });

            if view.is_empty() {
                ui.label(RichText::new("No data for this year").color(Color32::GRAY));
            }

            ChartPlotter::draw_scatter(ui, view, palette, &mut self.scatter, CHART_HEIGHT);
        });
        self.scatter.hovered = ui.rect_contains_pointer(section.response.rect);

        action
    }

    /// Dual-axis country chart, or a placeholder when the country has no rows.
    pub fn show_time_series(
        &mut self,
        ui: &mut egui::Ui,
        panel: &ControlPanel,
        view: Option<&TimeSeriesView>,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        match view {
            Some(view) => {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(view.title()).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        action = panel.show_export_button(ui, Section::TimeSeries, true);
                    });
                });
                ChartPlotter::draw_time_series(ui, view, CHART_HEIGHT);
            }
            None => {
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        panel.show_export_button(ui, Section::TimeSeries, false);
                    });
                });
                ui.allocate_ui(egui::vec2(ui.available_width(), CHART_HEIGHT), |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("No data for the selected country")
                                .size(16.0)
                                .color(Color32::GRAY),
                        );
                    });
                });
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_dataset;
    use egui::{pos2, vec2, Event, Modifiers, PointerButton, Pos2, RawInput, Rect};

    fn run_frame(
        ctx: &egui::Context,
        events: Vec<Event>,
        mut add_contents: impl FnMut(&mut egui::Ui),
    ) -> egui::FullOutput {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))),
            events,
            ..Default::default()
        };
        ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| add_contents(ui));
        })
    }

    fn button(pos: Pos2, pressed: bool) -> Event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        }
    }

    fn painted_text(shapes: &[egui::epaint::ClippedShape]) -> Vec<String> {
        fn collect(shape: &egui::Shape, out: &mut Vec<String>) {
            match shape {
                egui::Shape::Text(text) => out.push(text.galley.text().to_string()),
                egui::Shape::Vec(shapes) => shapes.iter().for_each(|s| collect(s, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        for clipped in shapes {
            collect(&clipped.shape, &mut out);
        }
        out
    }

    #[test]
    fn scatter_toolbar_stays_usable_after_leaving_the_plot() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();
        let panel = ControlPanel::new();
        let ctx = egui::Context::default();
        let mut viewer = ChartViewer::new();
        let frame = |events: Vec<Event>, viewer: &mut ChartViewer| {
            let _ = run_frame(&ctx, events, |ui| {
                viewer.show_scatter(ui, &panel, &view, &palette);
            });
        };

        frame(Vec::new(), &mut viewer);
        assert!(!viewer.scatter.hovered);

        let over_plot = pos2(400.0, 250.0);
        frame(vec![Event::PointerMoved(over_plot)], &mut viewer);
        assert!(viewer.scatter.hovered);

        // Walk the toolbar row, coming from the plot each time like a user would,
        // until a click lands on the Lasso toggle.
        let mut picked_lasso = false;
        'rows: for y in (10..40).step_by(6) {
            for x in (0..800).step_by(8) {
                let target = pos2(x as f32, y as f32);
                frame(vec![Event::PointerMoved(over_plot)], &mut viewer);
                frame(vec![Event::PointerMoved(target)], &mut viewer);
                if !viewer.scatter.hovered {
                    continue;
                }
                frame(vec![button(target, true)], &mut viewer);
                frame(vec![button(target, false)], &mut viewer);
                if viewer.scatter.tool == ScatterTool::Lasso {
                    picked_lasso = true;
                    break 'rows;
                }
            }
        }

        assert!(picked_lasso);
        assert!(viewer.scatter.hovered);

        frame(vec![Event::PointerMoved(pos2(400.0, 590.0))], &mut viewer);
        assert!(!viewer.scatter.hovered);
    }

    #[test]
    fn regional_columns_have_subheaders() {
        let view = RegionalView::build(&sample_dataset()).unwrap();
        let panel = ControlPanel::new();
        let ctx = egui::Context::default();
        let mut viewer = ChartViewer::new();

        // The second frame is laid out with the sizes measured by the first.
        let mut output = None;
        for _ in 0..2 {
            output = Some(run_frame(&ctx, Vec::new(), |ui| {
                viewer.show_regional(ui, &panel, &view);
            }));
        }
        let output = output.unwrap();

        let text = painted_text(&output.shapes);
        assert!(text.iter().any(|t| t == "DataFrame display"));
        assert!(text.iter().any(|t| t == "Chart display"));
        assert!(text.iter().any(|t| t == "CO2 Emissions per Region in 2000"));
    }

    #[test]
    fn resetting_selection_clears_lasso() {
        let mut viewer = ChartViewer::new();
        viewer.scatter.selected.insert(3);
        viewer.scatter.lasso_path.push([0.0, 0.0]);

        viewer.reset_scatter_selection();

        assert!(viewer.scatter.selected.is_empty());
        assert!(viewer.scatter.lasso_path.is_empty());
    }
}
