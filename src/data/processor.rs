//! Data Processor Module
//! Regional aggregation of emissions for the most recent year.

use crate::data::dataset::{Dataset, DatasetError, CO2, REGION, YEAR};
use polars::prelude::*;

const TOTAL_CO2: &str = "total_co2";

/// Summed emissions of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub region: String,
    pub total_co2: f64,
}

/// Handles grouping and aggregation over the dataset.
pub struct DataProcessor;

impl DataProcessor {
    /// Sum co2 per region over the rows of the latest year, sorted ascending by total.
    ///
    /// Regions with equal totals keep the order in which they first appear.
    /// An empty dataset yields an empty vector.
    pub fn aggregate_latest_year(dataset: &Dataset) -> Result<Vec<RegionAggregate>, DatasetError> {
        let Some(max_year) = dataset.latest_year() else {
            return Ok(Vec::new());
        };

        let grouped = dataset
            .frame()
            .clone()
            .lazy()
            .filter(col(YEAR).eq(lit(max_year)))
            .group_by_stable([col(REGION)])
            .agg([col(CO2).sum().alias(TOTAL_CO2)])
            .collect()?;

        let regions = grouped.column(REGION)?.str()?;
        let totals = grouped.column(TOTAL_CO2)?.cast(&DataType::Float64)?;
        let totals = totals.f64()?;

        let mut aggregates: Vec<RegionAggregate> = regions
            .into_iter()
            .zip(totals.into_iter())
            .filter_map(|(region, total)| {
                Some(RegionAggregate {
                    region: region?.to_string(),
                    total_co2: total.unwrap_or(0.0),
                })
            })
            .collect();

        aggregates.sort_by(|a, b| {
            a.total_co2
                .partial_cmp(&b.total_co2)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(aggregates)
    }
}
