//! Chart View Models
//! Data-dependent content of the three dashboard charts, shared by the
//! interactive plots and the static exporter.

use crate::charts::palette::RegionPalette;
use crate::data::{DataProcessor, Dataset, DatasetError, RegionAggregate};
use egui::Color32;
use std::collections::BTreeSet;

pub const CO2_AXIS_LABEL: &str = "CO2 Emissions (tons per person)";
pub const GDP_AXIS_LABEL: &str = "GDP";
pub const YEAR_AXIS_LABEL: &str = "Year";
pub const REGION_AXIS_LABEL: &str = "Region";
pub const LEGEND_TITLE: &str = "Region:";

pub const PRIMARY_LINE_COLOR: Color32 = Color32::from_rgb(31, 119, 180);
/// GDP line and its axis label.
pub const SECONDARY_COLOR: Color32 = Color32::from_rgb(255, 165, 0);
pub const BAR_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

// ===== Regional bar chart / table =====

/// Latest-year totals per region, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalView {
    pub year: Option<i64>,
    pub aggregates: Vec<RegionAggregate>,
}

impl RegionalView {
    pub fn build(dataset: &Dataset) -> Result<Self, DatasetError> {
        Ok(Self {
            year: dataset.latest_year(),
            aggregates: DataProcessor::aggregate_latest_year(dataset)?,
        })
    }

    pub fn title(&self) -> String {
        match self.year {
            Some(year) => format!("CO2 Emissions per Region in {}", year),
            None => "CO2 Emissions per Region".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    pub fn max_total(&self) -> f64 {
        self.aggregates
            .iter()
            .map(|a| a.total_co2)
            .fold(0.0, f64::max)
    }

    /// Region drawn at a categorical axis position (bar `i` sits at `i`).
    pub fn label_at(&self, position: f64) -> Option<&str> {
        let rounded = position.round();
        if rounded < 0.0 || (position - rounded).abs() > 1e-6 {
            return None;
        }
        self.aggregates
            .get(rounded as usize)
            .map(|a| a.region.as_str())
    }

    /// Rows whose region or formatted total contains `query` (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&RegionAggregate> {
        let needle = query.trim().to_lowercase();
        self.aggregates
            .iter()
            .filter(|a| {
                needle.is_empty()
                    || a.region.to_lowercase().contains(&needle)
                    || format_total(a.total_co2).contains(&needle)
            })
            .collect()
    }
}

pub fn format_total(value: f64) -> String {
    format!("{:.3}", value)
}

// ===== Scatter =====

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub country: String,
    pub region: String,
    pub gdp: f64,
    pub co2: f64,
    pub color: Color32,
}

impl ScatterPoint {
    /// Position on the log-y plot: `[gdp, log10(co2)]`.
    /// `None` when co2 is not positive.
    pub fn plot_position(&self) -> Option<[f64; 2]> {
        (self.co2 > 0.0 && self.gdp.is_finite()).then(|| [self.gdp, self.co2.log10()])
    }
}

/// Plottable points of one region; `(index into ScatterView::points, position)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries<'a> {
    pub region: &'a str,
    pub color: Color32,
    pub points: Vec<(usize, [f64; 2])>,
}

/// Emissions vs GDP for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterView {
    pub year: i64,
    pub points: Vec<ScatterPoint>,
}

impl ScatterView {
    /// Rows of `year` that carry both measurements.
    pub fn build(
        dataset: &Dataset,
        palette: &RegionPalette,
        year: i64,
    ) -> Result<Self, DatasetError> {
        let points = dataset
            .filter_year(year)?
            .into_iter()
            .filter_map(|r| {
                Some(ScatterPoint {
                    color: palette.color(&r.region),
                    gdp: r.gdp?,
                    co2: r.co2?,
                    country: r.country,
                    region: r.region,
                })
            })
            .collect();

        Ok(Self { year, points })
    }

    pub fn title(&self) -> String {
        format!("CO2 Emissions vs GDP in {}", self.year)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Plottable points grouped per region, in palette order.
    pub fn series(&self, palette: &RegionPalette) -> Vec<RegionSeries<'_>> {
        let mut groups: Vec<RegionSeries<'_>> = Vec::new();

        for (i, point) in self.points.iter().enumerate() {
            let Some(position) = point.plot_position() else {
                continue;
            };
            match groups.iter_mut().find(|g| g.region == point.region) {
                Some(group) => group.points.push((i, position)),
                None => groups.push(RegionSeries {
                    region: &point.region,
                    color: point.color,
                    points: vec![(i, position)],
                }),
            }
        }

        groups.sort_by(|a, b| {
            let ka = palette.index_of(a.region).unwrap_or(usize::MAX);
            let kb = palette.index_of(b.region).unwrap_or(usize::MAX);
            ka.cmp(&kb).then_with(|| a.region.cmp(b.region))
        });
        groups
    }

    /// Smallest and largest positive co2.
    pub fn co2_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.co2).filter(|v| *v > 0.0))
    }

    pub fn gdp_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.gdp))
    }

    /// Index of the point closest to `target` in plot coordinates.
    ///
    /// Distances are measured relative to `span` (the visible width and height)
    /// and must not exceed `max_distance` in those units.
    pub fn nearest(&self, target: [f64; 2], span: [f64; 2], max_distance: f64) -> Option<usize> {
        let sx = if span[0] > 0.0 { span[0] } else { 1.0 };
        let sy = if span[1] > 0.0 { span[1] } else { 1.0 };

        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let [x, y] = p.plot_position()?;
                let dx = (x - target[0]) / sx;
                let dy = (y - target[1]) / sy;
                Some((i, (dx * dx + dy * dy).sqrt()))
            })
            .filter(|(_, d)| *d <= max_distance)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Indices of the plotted points inside a lasso polygon given in plot coordinates.
    pub fn lasso_select(&self, polygon: &[[f64; 2]]) -> BTreeSet<usize> {
        if polygon.len() < 3 {
            return BTreeSet::new();
        }
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let position = p.plot_position()?;
                point_in_polygon(position, polygon).then_some(i)
            })
            .collect()
    }
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: [f64; 2], polygon: &[[f64; 2]]) -> bool {
    let [px, py] = point;
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);

    for i in 0..polygon.len() {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

// ===== Country time series =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub year: i64,
    pub co2: Option<f64>,
    pub gdp: Option<f64>,
}

/// Linear map from a secondary axis range onto the primary one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    source: (f64, f64),
    target: (f64, f64),
}

impl AxisMapping {
    pub fn new(source: (f64, f64), target: (f64, f64)) -> Self {
        Self { source, target }
    }

    /// Secondary value -> primary coordinate. A flat source maps to the target midpoint.
    pub fn forward(&self, value: f64) -> f64 {
        let span = self.source.1 - self.source.0;
        if span == 0.0 {
            return (self.target.0 + self.target.1) / 2.0;
        }
        self.target.0 + (value - self.source.0) / span * (self.target.1 - self.target.0)
    }

    /// Primary coordinate -> secondary value.
    pub fn inverse(&self, value: f64) -> f64 {
        let span = self.target.1 - self.target.0;
        if span == 0.0 {
            return (self.source.0 + self.source.1) / 2.0;
        }
        self.source.0 + (value - self.target.0) / span * (self.source.1 - self.source.0)
    }
}

/// CO2 and GDP of one country over time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesView {
    pub country: String,
    /// Sorted by year.
    pub points: Vec<TimePoint>,
    /// `None` when the series has no value at all.
    pub co2_range: Option<(f64, f64)>,
    pub gdp_range: Option<(f64, f64)>,
}

impl TimeSeriesView {
    /// `None` when the country has no rows.
    pub fn build(dataset: &Dataset, country: &str) -> Result<Option<Self>, DatasetError> {
        let points = dataset
            .filter_country(country)?
            .into_iter()
            .map(|r| TimePoint {
                year: r.year,
                co2: r.co2,
                gdp: r.gdp,
            })
            .collect();
        Ok(Self::from_points(country, points))
    }

    pub fn from_points(country: &str, mut points: Vec<TimePoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        points.sort_by_key(|p| p.year);
        let co2_range = bounds(points.iter().filter_map(|p| p.co2));
        let gdp_range = bounds(points.iter().filter_map(|p| p.gdp));

        Some(Self {
            country: country.to_string(),
            points,
            co2_range,
            gdp_range,
        })
    }

    pub fn title(&self) -> String {
        format!("CO2 Emissions and GDP of {}", self.country)
    }

    pub fn year_range(&self) -> (i64, i64) {
        let first = self.points.first().map(|p| p.year).unwrap_or_default();
        let last = self.points.last().map(|p| p.year).unwrap_or(first);
        (first, last)
    }

    /// Primary axis extent; a flat series is padded so the axis keeps some height.
    pub fn co2_display_range(&self) -> (f64, f64) {
        self.co2_range.map(pad_flat).unwrap_or((0.0, 1.0))
    }

    pub fn gdp_display_range(&self) -> (f64, f64) {
        self.gdp_range.map(pad_flat).unwrap_or((0.0, 1.0))
    }

    /// Places GDP values on the primary (co2) axis.
    pub fn gdp_mapping(&self) -> AxisMapping {
        AxisMapping::new(self.gdp_display_range(), self.co2_display_range())
    }

    /// CO2 line, split into runs of consecutive years that have a value.
    pub fn co2_segments(&self) -> Vec<Vec<[f64; 2]>> {
        segments(self.points.iter().map(|p| (p.year, p.co2)))
    }

    /// GDP line in its own units, split like [`Self::co2_segments`].
    pub fn gdp_segments(&self) -> Vec<Vec<[f64; 2]>> {
        segments(self.points.iter().map(|p| (p.year, p.gdp)))
    }

    /// GDP segments placed on the primary axis.
    pub fn gdp_segments_on_primary(&self) -> Vec<Vec<[f64; 2]>> {
        let mapping = self.gdp_mapping();
        let mut runs = self.gdp_segments();
        for point in runs.iter_mut().flatten() {
            point[1] = mapping.forward(point[1]);
        }
        runs
    }

    pub fn nearest_year(&self, x: f64) -> Option<&TimePoint> {
        self.points.iter().min_by(|a, b| {
            let da = (a.year as f64 - x).abs();
            let db = (b.year as f64 - x).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Break a year series wherever the value is missing.
fn segments(values: impl Iterator<Item = (i64, Option<f64>)>) -> Vec<Vec<[f64; 2]>> {
    let mut runs: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();

    for (year, value) in values {
        match value.filter(|v| v.is_finite()) {
            Some(v) => current.push([year as f64, v]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn pad_flat((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        return (lo, hi);
    }
    let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{sample_dataset, Record};

    #[test]
    fn regional_view_is_idempotent() {
        let ds = sample_dataset();
        let first = RegionalView::build(&ds).unwrap();
        let second = RegionalView::build(&ds).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.year, Some(2000));
        assert_eq!(first.title(), "CO2 Emissions per Region in 2000");
        assert_eq!(first.max_total(), 2.0);
    }

    #[test]
    fn regional_labels_only_at_bar_positions() {
        let view = RegionalView::build(&sample_dataset()).unwrap();
        assert_eq!(view.label_at(0.0), Some("X"));
        assert_eq!(view.label_at(1.0), Some("Y"));
        assert_eq!(view.label_at(0.5), None);
        assert_eq!(view.label_at(-1.0), None);
        assert_eq!(view.label_at(2.0), None);
    }

    #[test]
    fn regional_search_matches_region_and_value() {
        let view = RegionalView::build(&sample_dataset()).unwrap();
        assert_eq!(view.search("").len(), 2);
        assert_eq!(view.search(" y ")[0].region, "Y");
        assert_eq!(view.search("2.000")[0].region, "Y");
        assert!(view.search("europe").is_empty());
    }

    #[test]
    fn empty_regional_view() {
        let view = RegionalView::build(&Dataset::from_records(Vec::new()).unwrap()).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.year, None);
        assert_eq!(view.max_total(), 0.0);
    }

    #[test]
    fn scatter_points_for_selected_year() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);

        let y1999 = ScatterView::build(&ds, &palette, 1999).unwrap();
        assert_eq!(y1999.points.len(), 1);
        assert_eq!(y1999.points[0].country, "A");
        assert_eq!(y1999.points[0].gdp, 90.0);
        assert_eq!(y1999.points[0].co2, 5.0);
        assert_eq!(y1999.title(), "CO2 Emissions vs GDP in 1999");

        let y2000 = ScatterView::build(&ds, &palette, 2000).unwrap();
        assert_eq!(y2000.points.len(), 2);
    }

    #[test]
    fn scatter_for_missing_year_is_empty() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 1850).unwrap();
        assert!(view.is_empty());
        assert!(view.series(&palette).is_empty());
        assert_eq!(view.co2_bounds(), None);
    }

    #[test]
    fn region_colors_are_stable_across_years() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let y1999 = ScatterView::build(&ds, &palette, 1999).unwrap();
        let y2000 = ScatterView::build(&ds, &palette, 2000).unwrap();

        let color_of = |view: &ScatterView, region: &str| {
            view.points
                .iter()
                .find(|p| p.region == region)
                .map(|p| p.color)
        };
        assert_eq!(color_of(&y1999, "X"), color_of(&y2000, "X"));
        assert_eq!(color_of(&y2000, "X"), Some(palette.color("X")));
        assert_ne!(color_of(&y2000, "X"), color_of(&y2000, "Y"));
    }

    #[test]
    fn series_group_by_region_and_skip_non_positive_co2() {
        let ds = Dataset::from_records(vec![
            Record::new("C", "Y", 2000, 3.0, 300.0),
            Record::new("A", "X", 2000, 1.0, 100.0),
            Record::new("B", "Y", 2000, 0.0, 200.0),
            Record::new("D", "X", 2000, 10.0, 50.0),
        ])
        .unwrap();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();

        let series = view.series(&palette);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].region, "X");
        assert_eq!(series[0].points, vec![(1, [100.0, 0.0]), (3, [50.0, 1.0])]);
        assert_eq!(series[1].region, "Y");
        assert_eq!(series[1].points.len(), 1);
        assert_eq!(view.co2_bounds(), Some((1.0, 10.0)));
    }

    #[test]
    fn nearest_point_respects_distance_limit() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();
        // A at [100, 0], B at [200, log10(2)]
        let span = [100.0, 1.0];

        assert_eq!(view.nearest([105.0, 0.01], span, 0.1), Some(0));
        assert_eq!(view.nearest([195.0, 0.3], span, 0.1), Some(1));
        assert_eq!(view.nearest([150.0, 0.9], span, 0.1), None);
    }

    #[test]
    fn lasso_selects_points_inside_polygon() {
        let ds = sample_dataset();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();

        let around_a = [[50.0, -1.0], [150.0, -1.0], [150.0, 0.2], [50.0, 0.2]];
        assert_eq!(view.lasso_select(&around_a).into_iter().collect::<Vec<_>>(), vec![0]);

        let around_both = [[0.0, -1.0], [300.0, -1.0], [300.0, 1.0], [0.0, 1.0]];
        assert_eq!(view.lasso_select(&around_both).len(), 2);

        assert!(view.lasso_select(&[[0.0, 0.0], [1.0, 1.0]]).is_empty());
    }

    #[test]
    fn point_in_triangle() {
        let triangle = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
        assert!(point_in_polygon([1.0, 1.0], &triangle));
        assert!(!point_in_polygon([3.0, 3.0], &triangle));
        assert!(!point_in_polygon([-1.0, 1.0], &triangle));
    }

    #[test]
    fn time_series_for_country() {
        let view = TimeSeriesView::build(&sample_dataset(), "A")
            .unwrap()
            .unwrap();

        assert_eq!(view.title(), "CO2 Emissions and GDP of A");
        assert_eq!(
            view.points.iter().map(|p| p.year).collect::<Vec<_>>(),
            vec![1999, 2000]
        );
        assert_eq!(view.co2_segments(), vec![vec![[1999.0, 5.0], [2000.0, 1.0]]]);
        assert_eq!(view.co2_range, Some((1.0, 5.0)));
        assert_eq!(view.gdp_range, Some((90.0, 100.0)));
        assert_eq!(view.year_range(), (1999, 2000));
    }

    #[test]
    fn time_series_for_unknown_country_is_none() {
        assert!(TimeSeriesView::build(&sample_dataset(), "Atlantis")
            .unwrap()
            .is_none());
    }

    #[test]
    fn gdp_is_mapped_onto_co2_axis() {
        let view = TimeSeriesView::build(&sample_dataset(), "A")
            .unwrap()
            .unwrap();
        let mapping = view.gdp_mapping();

        assert_eq!(mapping.forward(90.0), 1.0);
        assert_eq!(mapping.forward(100.0), 5.0);
        assert_eq!(mapping.inverse(3.0), 95.0);
        assert_eq!(
            view.gdp_segments_on_primary(),
            vec![vec![[1999.0, 1.0], [2000.0, 5.0]]]
        );
    }

    #[test]
    fn flat_series_are_padded_for_display() {
        let view = TimeSeriesView::from_points(
            "Flat",
            vec![
                TimePoint {
                    year: 2001,
                    co2: Some(2.0),
                    gdp: Some(500.0),
                },
                TimePoint {
                    year: 2000,
                    co2: Some(2.0),
                    gdp: Some(400.0),
                },
            ],
        )
        .unwrap();

        assert_eq!(view.co2_range, Some((2.0, 2.0)));
        assert_eq!(view.co2_display_range(), (1.8, 2.2));
        assert_eq!(view.nearest_year(2000.4).map(|p| p.year), Some(2000));
        assert!(view
            .gdp_segments_on_primary()
            .iter()
            .flatten()
            .all(|p| p[1].is_finite()));
    }

    #[test]
    fn scatter_leaves_out_rows_missing_a_measurement() {
        let ds = Dataset::from_records(vec![
            Record::new("A", "X", 2000, 1.0, 100.0),
            Record::with_gaps("B", "X", 2000, Some(2.0), None),
            Record::with_gaps("C", "Y", 2000, None, Some(300.0)),
        ])
        .unwrap();
        let palette = RegionPalette::from_dataset(&ds);
        let view = ScatterView::build(&ds, &palette, 2000).unwrap();

        assert_eq!(view.points.len(), 1);
        assert_eq!(view.points[0].country, "A");
        assert_eq!(view.gdp_bounds(), Some((100.0, 100.0)));
    }

    #[test]
    fn time_series_breaks_each_line_at_its_own_gaps() {
        let ds = Dataset::from_records(vec![
            Record::new("A", "X", 1990, 1.0, 10.0),
            Record::with_gaps("A", "X", 1991, Some(2.0), None),
            Record::with_gaps("A", "X", 1992, None, Some(30.0)),
            Record::new("A", "X", 1993, 4.0, 40.0),
        ])
        .unwrap();
        let view = TimeSeriesView::build(&ds, "A").unwrap().unwrap();

        assert_eq!(view.year_range(), (1990, 1993));
        assert_eq!(
            view.co2_segments(),
            vec![vec![[1990.0, 1.0], [1991.0, 2.0]], vec![[1993.0, 4.0]]]
        );
        assert_eq!(
            view.gdp_segments(),
            vec![vec![[1990.0, 10.0]], vec![[1992.0, 30.0], [1993.0, 40.0]]]
        );
        assert_eq!(view.co2_range, Some((1.0, 4.0)));
        assert_eq!(view.gdp_range, Some((10.0, 40.0)));
    }

    #[test]
    fn time_series_without_gdp_keeps_co2() {
        let ds = Dataset::from_records(vec![
            Record::with_gaps("A", "X", 2000, Some(1.0), None),
            Record::with_gaps("A", "X", 2001, Some(3.0), None),
        ])
        .unwrap();
        let view = TimeSeriesView::build(&ds, "A").unwrap().unwrap();

        assert_eq!(view.gdp_range, None);
        assert!(view.gdp_segments().is_empty());
        assert_eq!(view.co2_segments().len(), 1);
        assert_eq!(view.gdp_display_range(), (0.0, 1.0));
    }

    #[test]
    fn flat_source_maps_to_target_midpoint() {
        let mapping = AxisMapping::new((3.0, 3.0), (0.0, 10.0));
        assert_eq!(mapping.forward(3.0), 5.0);
        let mapping = AxisMapping::new((0.0, 10.0), (1.0, 1.0));
        assert_eq!(mapping.inverse(1.0), 5.0);
    }
}
