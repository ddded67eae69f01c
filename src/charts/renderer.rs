//! Static Chart Renderer
//! Exports the dashboard charts as PNG or SVG files with plotters.
//!
//! Layouts:
//! 1. Regional totals: horizontal bars, value axis on top, region labels on the left
//! 2. Scatter: GDP vs log-scale CO2, one colored series per region, legend lower right
//! 3. Time series: CO2 on the left axis, GDP on a secondary right axis in orange

use crate::charts::palette::RegionPalette;
use crate::charts::views::{
    RegionalView, ScatterView, TimeSeriesView, BAR_COLOR, CO2_AXIS_LABEL, GDP_AXIS_LABEL,
    LEGEND_TITLE, PRIMARY_LINE_COLOR, REGION_AXIS_LABEL, SECONDARY_COLOR, YEAR_AXIS_LABEL,
};
use anyhow::{Context, Result};
use egui::Color32;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 24;
const LABEL_SIZE: u32 = 14;

/// Output format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ExportFormat::Svg,
            _ => ExportFormat::Png,
        }
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    pub fn render_regional(view: &RegionalView, path: &Path, size: (u32, u32)) -> Result<()> {
        match ExportFormat::from_path(path) {
            ExportFormat::Svg => {
                Self::draw_regional(SVGBackend::new(path, size).into_drawing_area(), view)
            }
            ExportFormat::Png => {
                Self::draw_regional(BitMapBackend::new(path, size).into_drawing_area(), view)
            }
        }
        .with_context(|| format!("Failed to render {}", path.display()))
    }

    pub fn render_scatter(
        view: &ScatterView,
        palette: &RegionPalette,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        match ExportFormat::from_path(path) {
            ExportFormat::Svg => Self::draw_scatter(
                SVGBackend::new(path, size).into_drawing_area(),
                view,
                palette,
            ),
            ExportFormat::Png => Self::draw_scatter(
                BitMapBackend::new(path, size).into_drawing_area(),
                view,
                palette,
            ),
        }
        .with_context(|| format!("Failed to render {}", path.display()))
    }

    pub fn render_time_series(
        view: &TimeSeriesView,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        match ExportFormat::from_path(path) {
            ExportFormat::Svg => {
                Self::draw_time_series(SVGBackend::new(path, size).into_drawing_area(), view)
            }
            ExportFormat::Png => {
                Self::draw_time_series(BitMapBackend::new(path, size).into_drawing_area(), view)
            }
        }
        .with_context(|| format!("Failed to render {}", path.display()))
    }

    fn draw_regional<DB>(root: DrawingArea<DB, Shift>, view: &RegionalView) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let bar_count = view.aggregates.len().max(1);
        let x_max = if view.max_total() > 0.0 {
            view.max_total() * 1.05
        } else {
            1.0
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(view.title(), (FONT, TITLE_SIZE))
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Top, 40)
            .set_label_area_size(LabelAreaPosition::Left, 160)
            .build_cartesian_2d(0.0..x_max, (0..bar_count).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(bar_count)
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => view
                    .aggregates
                    .get(*i)
                    .map(|a| a.region.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(CO2_AXIS_LABEL)
            .y_desc(REGION_AXIS_LABEL)
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        let fill = rgb(BAR_COLOR).filled();
        chart.draw_series(view.aggregates.iter().enumerate().map(|(i, a)| {
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (a.total_co2, SegmentValue::Exact(i + 1)),
                ],
                fill,
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_scatter<DB>(
        root: DrawingArea<DB, Shift>,
        view: &ScatterView,
        palette: &RegionPalette,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (x_lo, x_hi) = view
            .gdp_bounds()
            .map(|(lo, hi)| {
                let margin = ((hi - lo) * 0.05).max(1.0);
                (lo - margin, hi + margin)
            })
            .unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = view
            .co2_bounds()
            .map(|(lo, hi)| (lo / 1.5, hi * 1.5))
            .unwrap_or((0.01, 100.0));

        let mut chart = ChartBuilder::on(&root)
            .caption(view.title(), (FONT, TITLE_SIZE))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())?;

        chart
            .configure_mesh()
            .x_desc(GDP_AXIS_LABEL)
            .y_desc(CO2_AXIS_LABEL)
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        // Legend heading, drawn as an entry without a marker.
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(LEGEND_TITLE)
            .legend(|(x, y)| EmptyElement::at((x, y)));

        for series in view.series(palette) {
            let style = rgb(series.color).mix(0.8).filled();
            chart
                .draw_series(series.points.iter().map(|(i, _)| {
                    let p = &view.points[*i];
                    Circle::new((p.gdp, p.co2), 4, style)
                }))?
                .label(series.region)
                .legend(move |(x, y)| Circle::new((x, y), 4, style));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK)
            .label_font((FONT, LABEL_SIZE))
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_time_series<DB>(root: DrawingArea<DB, Shift>, view: &TimeSeriesView) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (first, last) = view.year_range();
        let (x_lo, x_hi) = if first == last {
            (first as f64 - 0.5, last as f64 + 0.5)
        } else {
            (first as f64, last as f64)
        };
        let (co2_lo, co2_hi) = view.co2_display_range();
        let (gdp_lo, gdp_hi) = view.gdp_display_range();

        let primary = rgb(PRIMARY_LINE_COLOR);
        let secondary = rgb(SECONDARY_COLOR);
        let secondary_font =
            FontDesc::new(FontFamily::SansSerif, LABEL_SIZE as f64, FontStyle::Normal);

        let mut chart = ChartBuilder::on(&root)
            .caption(view.title(), (FONT, TITLE_SIZE))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .right_y_label_area_size(90)
            .build_cartesian_2d(x_lo..x_hi, co2_lo..co2_hi)?
            .set_secondary_coord(x_lo..x_hi, gdp_lo..gdp_hi);

        chart
            .configure_mesh()
            .x_desc(YEAR_AXIS_LABEL)
            .y_desc(CO2_AXIS_LABEL)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        chart
            .configure_secondary_axes()
            .y_desc(GDP_AXIS_LABEL)
            .label_style(secondary_font.clone().color(&secondary))
            .axis_desc_style(secondary_font.color(&secondary))
            .draw()?;

        // Missing years break a line; only the first run carries the legend entry.
        for (i, run) in view.co2_segments().into_iter().enumerate() {
            let series = chart.draw_series(LineSeries::new(
                run.into_iter().map(|[x, y]| (x, y)),
                primary.stroke_width(3),
            ))?;
            if i == 0 {
                series.label("CO2").legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], primary.stroke_width(3))
                });
            }
        }

        for (i, run) in view.gdp_segments().into_iter().enumerate() {
            let series = chart.draw_secondary_series(LineSeries::new(
                run.into_iter().map(|[x, y]| (x, y)),
                secondary.stroke_width(3),
            ))?;
            if i == 0 {
                series.label("GDP").legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], secondary.stroke_width(3))
                });
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK)
            .label_font((FONT, LABEL_SIZE))
            .draw()?;

        root.present()?;
        Ok(())
    }
}

fn rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}
