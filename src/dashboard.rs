//! Dashboard state and event dispatch.
//!
//! Widget changes arrive as [`DashboardEvent`]s. Each event recomputes only the
//! section bound to that widget; the others keep their views untouched.

use crate::charts::{RegionPalette, RegionalView, ScatterView, TimeSeriesView};
use crate::config::DashboardConfig;
use crate::data::{Dataset, DatasetError};
use log::{debug, warn};
use std::sync::Arc;

/// Everything loaded once at startup and shared read-only afterwards.
pub struct AppContext {
    pub config: DashboardConfig,
    pub dataset: Arc<Dataset>,
    pub palette: RegionPalette,
}

impl AppContext {
    pub fn new(config: DashboardConfig, dataset: Arc<Dataset>) -> Self {
        let palette = RegionPalette::from_dataset(&dataset);
        Self {
            config,
            dataset,
            palette,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub year: i64,
    /// `None` only when the dataset has no countries.
    pub country: Option<String>,
}

impl SelectionState {
    pub fn initial(dataset: &Dataset, default_year: i64) -> Self {
        Self {
            year: clamp_year(dataset, default_year),
            country: dataset.countries().first().cloned(),
        }
    }
}

/// Clamps `year` into the dataset's year bounds.
pub fn clamp_year(dataset: &Dataset, year: i64) -> i64 {
    match dataset.year_bounds() {
        Some((min, max)) => year.clamp(min, max),
        None => year,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    YearChanged(i64),
    CountryChanged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Regional,
    Scatter,
    TimeSeries,
}

impl Section {
    fn index(self) -> usize {
        match self {
            Section::Regional => 0,
            Section::Scatter => 1,
            Section::TimeSeries => 2,
        }
    }

    /// Default file name for an exported chart.
    pub fn file_stem(self) -> &'static str {
        match self {
            Section::Regional => "co2_per_region",
            Section::Scatter => "co2_vs_gdp",
            Section::TimeSeries => "co2_gdp_country",
        }
    }
}

pub struct Dashboard {
    selection: SelectionState,
    regional: RegionalView,
    scatter: ScatterView,
    time_series: Option<TimeSeriesView>,
    generations: [u64; 3],
}

impl Dashboard {
    pub fn new(ctx: &AppContext) -> Result<Self, DatasetError> {
        let dataset = ctx.dataset.as_ref();
        let selection = SelectionState::initial(dataset, ctx.config.default_year);

        let regional = RegionalView::build(dataset)?;
        let scatter = ScatterView::build(dataset, &ctx.palette, selection.year)?;
        let time_series = match &selection.country {
            Some(country) => TimeSeriesView::build(dataset, country)?,
            None => None,
        };

        debug!(
            "Dashboard initialized: year {}, country {:?}",
            selection.year, selection.country
        );

        Ok(Self {
            selection,
            regional,
            scatter,
            time_series,
            generations: [0; 3],
        })
    }

    /// Applies a widget event. Returns the section that was recomputed, or
    /// `None` when the event left the selection unchanged or was rejected.
    pub fn dispatch(
        &mut self,
        ctx: &AppContext,
        event: DashboardEvent,
    ) -> Result<Option<Section>, DatasetError> {
        debug!("Dispatching {:?}", event);

        let section = match event {
            DashboardEvent::YearChanged(requested) => {
                let year = clamp_year(&ctx.dataset, requested);
                if year != requested {
                    warn!("Year {} outside the data, using {}", requested, year);
                }
                if year == self.selection.year {
                    return Ok(None);
                }
                self.scatter = ScatterView::build(&ctx.dataset, &ctx.palette, year)?;
                self.selection.year = year;
                Section::Scatter
            }
            DashboardEvent::CountryChanged(country) => {
                if !ctx.dataset.contains_country(&country) {
                    warn!("Ignoring unknown country {:?}", country);
                    return Ok(None);
                }
                if self.selection.country.as_deref() == Some(country.as_str()) {
                    return Ok(None);
                }
                self.time_series = TimeSeriesView::build(&ctx.dataset, &country)?;
                self.selection.country = Some(country);
                Section::TimeSeries
            }
        };

        self.generations[section.index()] += 1;
        debug!("Recomputed {:?}", section);
        Ok(Some(section))
    }

    /// Number of times `section` has been recomputed since startup.
    pub fn generation(&self, section: Section) -> u64 {
        self.generations[section.index()]
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn regional(&self) -> &RegionalView {
        &self.regional
    }

    pub fn scatter(&self) -> &ScatterView {
        &self.scatter
    }

    pub fn time_series(&self) -> Option<&TimeSeriesView> {
        self.time_series.as_ref()
    }
}
