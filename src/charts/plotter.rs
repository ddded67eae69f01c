//! Chart Plotter Module
//! Draws the interactive dashboard charts with egui_plot.

use crate::charts::palette::RegionPalette;
use crate::charts::views::{
    format_total, RegionalView, ScatterView, TimeSeriesView, BAR_COLOR, CO2_AXIS_LABEL,
    GDP_AXIS_LABEL, LEGEND_TITLE, PRIMARY_LINE_COLOR, REGION_AXIS_LABEL, SECONDARY_COLOR,
    YEAR_AXIS_LABEL,
};
use crate::data::RegionAggregate;
use egui::{Color32, RichText};
use egui_plot::{
    AxisHints, Bar, BarChart, Corner, GridMark, HPlacement, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points, VPlacement,
};
use std::collections::BTreeSet;

/// Tooltip pick radius, as a fraction of the visible plot extent.
const HOVER_RADIUS: f64 = 0.03;
const SCATTER_RADIUS: f32 = 3.5;
const LASSO_COLOR: Color32 = Color32::from_rgb(90, 90, 90);

/// Active scatter tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScatterTool {
    #[default]
    Pan,
    Lasso,
}

/// UI-side scatter state that survives between frames.
#[derive(Debug, Default)]
pub struct ScatterInteraction {
    pub tool: ScatterTool,
    /// Lasso stroke in plot coordinates while dragging.
    pub lasso_path: Vec<[f64; 2]>,
    /// Indices into `ScatterView::points`.
    pub selected: BTreeSet<usize>,
    /// Reset zoom/pan on the next frame.
    pub reset_view: bool,
    /// Pointer was over the scatter toolbar or plot last frame.
    pub hovered: bool,
}

impl ScatterInteraction {
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.lasso_path.clear();
    }
}

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Horizontal bars, smallest total at the bottom, value axis on top.
    pub fn draw_region_bars(ui: &mut egui::Ui, view: &RegionalView, height: f32) {
        let axis_view = view.clone();
        let bar_count = view.aggregates.len();

        Plot::new("regional_bars")
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show_x(false)
            .show_y(false)
            .include_x(0.0)
            .custom_x_axes(vec![AxisHints::new_x()
                .label(CO2_AXIS_LABEL)
                .placement(VPlacement::Top)])
            .y_axis_label(REGION_AXIS_LABEL)
            .y_axis_formatter(move |mark, _range| {
                axis_view.label_at(mark.value).unwrap_or_default().to_string()
            })
            .y_grid_spacer(move |_input| {
                (0..bar_count)
                    .map(|i| GridMark {
                        value: i as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = view
                    .aggregates
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        Bar::new(i as f64, a.total_co2)
                            .name(&a.region)
                            .width(0.7)
                    })
                    .collect();

                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .horizontal()
                        .color(BAR_COLOR)
                        .name("Total CO2"),
                );
            });
    }

    /// Two-column table of the regional totals.
    pub fn draw_region_table(ui: &mut egui::Ui, rows: &[&RegionAggregate]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let col_width = (ui.available_width() / 2.0 - 8.0).max(60.0);
                egui::Grid::new("region_table")
                    .striped(true)
                    .num_columns(2)
                    .min_col_width(col_width)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Region").strong());
                        ui.label(RichText::new("Total CO2").strong());
                        ui.end_row();

                        for row in rows {
                            ui.label(&row.region);
                            ui.label(format_total(row.total_co2));
                            ui.end_row();
                        }
                    });

                if rows.is_empty() {
                    ui.label(RichText::new("No matching rows").color(Color32::GRAY));
                }
            });
    }

    /// Log-y scatter colored by region; returns the plot response.
    pub fn draw_scatter(
        ui: &mut egui::Ui,
        view: &ScatterView,
        palette: &RegionPalette,
        interaction: &mut ScatterInteraction,
        height: f32,
    ) -> egui::Response {
        let series = view.series(palette);
        let tool = interaction.tool;
        let dim_unselected = !interaction.selected.is_empty();

        let mut plot = Plot::new("scatter")
            .height(height)
            .legend(Legend::default().position(Corner::RightBottom))
            .x_axis_label(GDP_AXIS_LABEL)
            .y_axis_label(CO2_AXIS_LABEL)
            .y_axis_formatter(|mark, _range| log_tick_label(mark.value))
            .show_x(false)
            .show_y(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_drag(tool == ScatterTool::Pan);
        if interaction.reset_view {
            plot = plot.reset();
            interaction.reset_view = false;
        }

        let plot_response = plot.show(ui, |plot_ui| {
            // Wheel zoom around the pointer. Consumes the delta: the page must not scroll too.
            if plot_ui.response().hovered() {
                let scroll = plot_ui.ctx().input_mut(|i| {
                    let delta = i.smooth_scroll_delta;
                    i.smooth_scroll_delta = egui::Vec2::ZERO;
                    i.raw_scroll_delta = egui::Vec2::ZERO;
                    delta.y
                });
                if scroll != 0.0 {
                    let factor = (scroll / 200.0).exp();
                    plot_ui.zoom_bounds_around_hovered(egui::Vec2::splat(factor));
                }
            }

            for s in &series {
                let points: PlotPoints = s.points.iter().map(|(_, p)| *p).collect();
                let color = if dim_unselected {
                    s.color.gamma_multiply(0.25)
                } else {
                    s.color.gamma_multiply(0.8)
                };
                plot_ui.points(
                    Points::new(points)
                        .radius(SCATTER_RADIUS)
                        .filled(true)
                        .color(color)
                        .name(s.region),
                );

                if dim_unselected {
                    let selected: PlotPoints = s
                        .points
                        .iter()
                        .filter(|(i, _)| interaction.selected.contains(i))
                        .map(|(_, p)| *p)
                        .collect();
                    plot_ui.points(
                        Points::new(selected)
                            .radius(SCATTER_RADIUS + 1.0)
                            .filled(true)
                            .color(s.color),
                    );
                }
            }

            if tool == ScatterTool::Lasso {
                let (started, dragging, stopped) = {
                    let r = plot_ui.response();
                    (r.drag_started(), r.dragged(), r.drag_stopped())
                };
                if started {
                    interaction.lasso_path.clear();
                }
                if dragging {
                    if let Some(p) = plot_ui.pointer_coordinate() {
                        interaction.lasso_path.push([p.x, p.y]);
                    }
                }
                if stopped {
                    interaction.selected = view.lasso_select(&interaction.lasso_path);
                    interaction.lasso_path.clear();
                }
            }

            let bounds = plot_ui.plot_bounds();
            plot_ui.pointer_coordinate().and_then(|p| {
                view.nearest([p.x, p.y], [bounds.width(), bounds.height()], HOVER_RADIUS)
            })
        });

        let response = plot_response.response;
        if !series.is_empty() {
            paint_legend_title(ui, response.rect, series.len());
        }

        // Screen-space overlay; a plot item would widen the auto bounds.
        if interaction.lasso_path.len() > 1 {
            let outline: Vec<egui::Pos2> = interaction
                .lasso_path
                .iter()
                .map(|p| {
                    plot_response
                        .transform
                        .position_from_point(&PlotPoint::new(p[0], p[1]))
                })
                .collect();
            ui.painter_at(response.rect).add(egui::Shape::closed_line(
                outline,
                egui::Stroke::new(1.5, LASSO_COLOR),
            ));
        }

        match plot_response.inner.and_then(|i| view.points.get(i)) {
            Some(point) => response.on_hover_ui_at_pointer(|ui| {
                ui.label(RichText::new(&point.country).strong());
                ui.label(format!("GDP: {}", format_axis_value(point.gdp)));
                ui.label(format!("CO2 Emission: {:.3}", point.co2));
            }),
            None => response,
        }
    }

    /// CO2 on the left axis, GDP mapped onto it with its own right-hand axis.
    pub fn draw_time_series(
        ui: &mut egui::Ui,
        view: &TimeSeriesView,
        height: f32,
    ) -> egui::Response {
        let mapping = view.gdp_mapping();
        let (co2_lo, co2_hi) = view.co2_display_range();
        let (first_year, last_year) = view.year_range();

        let co2_axis = AxisHints::new_y().label(CO2_AXIS_LABEL);
        let gdp_axis = AxisHints::new_y()
            .label(RichText::new(GDP_AXIS_LABEL).color(SECONDARY_COLOR))
            .formatter(move |mark, _range| format_axis_value(mapping.inverse(mark.value)))
            .placement(HPlacement::Right);

        let plot_response = Plot::new("country_time_series")
            .height(height)
            .legend(Legend::default().position(Corner::LeftTop))
            .x_axis_label(YEAR_AXIS_LABEL)
            .x_axis_formatter(|mark, _range| format!("{:.0}", mark.value))
            .custom_y_axes(vec![co2_axis, gdp_axis])
            .include_x(first_year as f64)
            .include_x(last_year as f64)
            .include_y(co2_lo)
            .include_y(co2_hi)
            .show_x(false)
            .show_y(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                // Runs share a name, so each line keeps one legend entry.
                for run in view.co2_segments() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(run))
                            .color(PRIMARY_LINE_COLOR)
                            .width(3.0)
                            .name("CO2"),
                    );
                }
                for run in view.gdp_segments_on_primary() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(run))
                            .color(SECONDARY_COLOR)
                            .width(3.0)
                            .name("GDP"),
                    );
                }

                let hovered = plot_ui
                    .pointer_coordinate()
                    .and_then(|p| view.nearest_year(p.x))
                    .copied();
                if let Some(point) = hovered {
                    let x = point.year as f64;
                    let markers: Vec<[f64; 2]> = [
                        point.co2.map(|co2| [x, co2]),
                        point.gdp.map(|gdp| [x, mapping.forward(gdp)]),
                    ]
                    .into_iter()
                    .flatten()
                    .collect();
                    plot_ui.points(
                        Points::new(markers)
                            .radius(5.0)
                            .color(Color32::DARK_GRAY),
                    );
                }
                hovered
            });

        match plot_response.inner {
            Some(point) => plot_response.response.on_hover_ui_at_pointer(|ui| {
                ui.label(RichText::new(format!("Year: {}", point.year)).strong());
                ui.label(format!("GDP: {}", format_optional(point.gdp, format_axis_value)));
                ui.label(format!(
                    "CO2 Emission: {}",
                    format_optional(point.co2, |v| format!("{:.3}", v))
                ));
            }),
            None => plot_response.response,
        }
    }
}

/// "Region:" heading painted just above the lower-right legend box.
fn paint_legend_title(ui: &egui::Ui, frame: egui::Rect, entries: usize) {
    let row_height =
        ui.text_style_height(&egui::TextStyle::Body) + ui.spacing().item_spacing.y;
    let anchor = legend_title_anchor(frame, entries, row_height);
    ui.painter_at(frame).text(
        anchor,
        egui::Align2::RIGHT_BOTTOM,
        LEGEND_TITLE,
        egui::FontId::proportional(12.0),
        ui.visuals().strong_text_color(),
    );
}

/// Bottom-right corner for the legend heading: the legend stacks `entries`
/// rows up from the frame's lower-right corner inside a small margin.
pub fn legend_title_anchor(frame: egui::Rect, entries: usize, row_height: f32) -> egui::Pos2 {
    const LEGEND_MARGIN: f32 = 12.0;
    let legend_height = entries as f32 * row_height + LEGEND_MARGIN;
    egui::pos2(
        frame.right() - LEGEND_MARGIN,
        (frame.bottom() - legend_height - 2.0).max(frame.top()),
    )
}

fn format_optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "n/a".to_string())
}

/// Tick label for a log10 axis position.
pub fn log_tick_label(exponent: f64) -> String {
    let value = 10f64.powf(exponent);
    if value >= 1.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.4}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Compact number for axis ticks and tooltips.
pub fn format_axis_value(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.0}k", value / 1e3)
    } else if abs >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
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

    /// Top-left corners of every painted text equal to `needle`.
    fn text_positions(output: &egui::FullOutput, needle: &str) -> Vec<Pos2> {
        output
            .shapes
            .iter()
            .filter_map(|clipped| match &clipped.shape {
                egui::Shape::Text(text) if text.galley.text() == needle => Some(text.pos),
                _ => None,
            })
            .collect()
    }

    fn button(pos: Pos2, pressed: bool) -> Event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        }
    }

    fn scatter_view() -> (ScatterView, RegionPalette) {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();
        (view, palette)
    }

    #[test]
    fn log_ticks_print_linear_values() {
        assert_eq!(log_tick_label(0.0), "1");
        assert_eq!(log_tick_label(2.0), "100");
        assert_eq!(log_tick_label(-1.0), "0.1");
        assert_eq!(log_tick_label(-2.0), "0.01");
    }

    #[test]
    fn axis_values_are_compact() {
        assert_eq!(format_axis_value(2_500_000.0), "2.5M");
        assert_eq!(format_axis_value(45_000.0), "45k");
        assert_eq!(format_axis_value(950.0), "950");
        assert_eq!(format_axis_value(1.5), "1.50");
    }

    #[test]
    fn clearing_selection_drops_lasso_state() {
        let mut interaction = ScatterInteraction {
            tool: ScatterTool::Lasso,
            lasso_path: vec![[0.0, 0.0], [1.0, 1.0]],
            selected: [1, 2].into_iter().collect(),
            ..Default::default()
        };
        interaction.clear_selection();
        assert!(interaction.selected.is_empty());
        assert!(interaction.lasso_path.is_empty());
        assert_eq!(interaction.tool, ScatterTool::Lasso);
    }

    #[test]
    fn legend_title_sits_above_the_legend_rows() {
        let frame = Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 300.0));
        let anchor = legend_title_anchor(frame, 3, 20.0);
        assert_eq!(anchor.x, 388.0);
        assert_eq!(anchor.y, 300.0 - 72.0 - 2.0);

        // A legend taller than the plot pins the heading to the top edge.
        assert_eq!(legend_title_anchor(frame, 50, 20.0).y, 0.0);
    }

    #[test]
    fn legend_heading_is_painted_inside_the_plot() {
        let (view, palette) = scatter_view();
        let ctx = egui::Context::default();
        let mut interaction = ScatterInteraction::default();
        let mut plot_rect = Rect::NOTHING;

        let mut output = None;
        for _ in 0..2 {
            output = Some(run_frame(&ctx, Vec::new(), |ui| {
                plot_rect =
                    ChartPlotter::draw_scatter(ui, &view, &palette, &mut interaction, 300.0).rect;
            }));
        }

        let positions = text_positions(&output.unwrap(), LEGEND_TITLE);
        assert_eq!(positions.len(), 1);
        assert!(plot_rect.contains(positions[0]));
        assert!(positions[0].x > plot_rect.center().x);
        assert!(positions[0].y > plot_rect.center().y);
    }

    #[test]
    fn lasso_drag_selects_enclosed_points() {
        let (view, palette) = scatter_view();
        let ctx = egui::Context::default();
        let mut interaction = ScatterInteraction {
            tool: ScatterTool::Lasso,
            ..Default::default()
        };
        let frame = |events: Vec<Event>, interaction: &mut ScatterInteraction| {
            let mut plot_rect = Rect::NOTHING;
            let _ = run_frame(&ctx, events, |ui| {
                plot_rect =
                    ChartPlotter::draw_scatter(ui, &view, &palette, interaction, 300.0).rect;
            });
            plot_rect
        };

        let r = frame(Vec::new(), &mut interaction).shrink(4.0);
        let corners = [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom()];

        frame(vec![Event::PointerMoved(corners[0])], &mut interaction);
        frame(vec![button(corners[0], true)], &mut interaction);
        for corner in corners.iter().skip(1).chain(std::iter::once(&corners[0])) {
            frame(vec![Event::PointerMoved(*corner)], &mut interaction);
        }
        assert!(interaction.lasso_path.len() >= 3);
        assert!(interaction.selected.is_empty());

        frame(vec![button(corners[0], false)], &mut interaction);
        assert_eq!(interaction.selected.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(interaction.lasso_path.is_empty());
    }

    #[test]
    fn wheel_over_scatter_does_not_scroll_the_page() {
        let (view, palette) = scatter_view();
        let ctx = egui::Context::default();
        let mut interaction = ScatterInteraction::default();
        // Returns the plot rect and the page scroll offset.
        let mut frame = |events: Vec<Event>| {
            let mut measured = (Rect::NOTHING, 0.0f32);
            let _ = run_frame(&ctx, events, |ui| {
                let output = egui::ScrollArea::vertical().show(ui, |ui| {
                    let rect =
                        ChartPlotter::draw_scatter(ui, &view, &palette, &mut interaction, 300.0)
                            .rect;
                    ui.add_space(2000.0);
                    rect
                });
                measured = (output.inner, output.state.offset.y);
            });
            measured
        };

        let (plot_rect, _) = frame(Vec::new());
        let center = plot_rect.center();
        frame(vec![Event::PointerMoved(center)]);
        let (_, offset) = frame(vec![
            Event::PointerMoved(center),
            Event::MouseWheel {
                unit: egui::MouseWheelUnit::Point,
                delta: vec2(0.0, -120.0),
                modifiers: Modifiers::NONE,
            },
        ]);
        assert_eq!(offset, 0.0);

        for _ in 0..20 {
            let (_, offset) = frame(Vec::new());
            assert_eq!(offset, 0.0);
        }
    }
}
