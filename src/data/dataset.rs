//! Dataset Module
//! Canonical in-memory table of per-country CO2 / GDP records, backed by a Polars DataFrame.

use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

pub const COUNTRY: &str = "country";
pub const REGION: &str = "region";
pub const YEAR: &str = "year";
pub const CO2: &str = "co2";
pub const GDP: &str = "gdp";

/// Columns every source CSV must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [COUNTRY, REGION, YEAR, CO2, GDP];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// One row of the source table.
///
/// A row needs a country, region and year. Either measurement may be missing;
/// each view skips the values it cannot use.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub region: String,
    pub year: i64,
    /// Tons per person.
    pub co2: Option<f64>,
    pub gdp: Option<f64>,
}

impl Record {
    pub fn new(country: &str, region: &str, year: i64, co2: f64, gdp: f64) -> Self {
        Self::with_gaps(country, region, year, Some(co2), Some(gdp))
    }

    /// Record whose measurements may be missing. NaN counts as missing.
    pub fn with_gaps(
        country: &str,
        region: &str,
        year: i64,
        co2: Option<f64>,
        gdp: Option<f64>,
    ) -> Self {
        Self {
            country: country.to_string(),
            region: region.to_string(),
            year,
            co2: co2.filter(|v| !v.is_nan()),
            gdp: gdp.filter(|v| !v.is_nan()),
        }
    }
}

/// Read-only table of records plus the lookups the widgets need.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    year_bounds: Option<(i64, i64)>,
    countries: Vec<String>,
    regions: Vec<String>,
}

impl Dataset {
    /// Build a dataset from already-typed records (row order is kept).
    pub fn from_records(records: Vec<Record>) -> Result<Self, DatasetError> {
        let n = records.len();
        let mut countries: Vec<String> = Vec::with_capacity(n);
        let mut regions: Vec<String> = Vec::with_capacity(n);
        let mut years: Vec<i64> = Vec::with_capacity(n);
        let mut co2: Vec<Option<f64>> = Vec::with_capacity(n);
        let mut gdp: Vec<Option<f64>> = Vec::with_capacity(n);

        for record in records {
            countries.push(record.country);
            regions.push(record.region);
            years.push(record.year);
            co2.push(record.co2);
            gdp.push(record.gdp);
        }

        let frame = DataFrame::new(vec![
            Column::new(COUNTRY.into(), countries),
            Column::new(REGION.into(), regions),
            Column::new(YEAR.into(), years),
            Column::new(CO2.into(), co2),
            Column::new(GDP.into(), gdp),
        ])?;

        Ok(Self::index(frame))
    }

    /// Build a dataset from a freshly parsed CSV frame.
    ///
    /// Extra columns are ignored. Rows without a country, region or year are
    /// skipped and counted; a null or NaN co2/gdp is kept as a missing value.
    pub fn from_raw_frame(raw: &DataFrame) -> Result<(Self, usize), DatasetError> {
        for name in REQUIRED_COLUMNS {
            if raw.get_column_index(name).is_none() {
                return Err(DatasetError::MissingColumn(name.to_string()));
            }
        }

        let (records, skipped) = extract_records(raw)?;
        Ok((Self::from_records(records)?, skipped))
    }

    fn index(frame: DataFrame) -> Self {
        let mut year_bounds: Option<(i64, i64)> = None;
        let mut countries: Vec<String> = Vec::new();
        let mut regions: BTreeSet<String> = BTreeSet::new();

        if let (Ok(years), Ok(country_col), Ok(region_col)) = (
            frame.column(YEAR).and_then(|c| c.i64()),
            frame.column(COUNTRY).and_then(|c| c.str()),
            frame.column(REGION).and_then(|c| c.str()),
        ) {
            for year in years.into_iter().flatten() {
                year_bounds = Some(match year_bounds {
                    None => (year, year),
                    Some((lo, hi)) => (lo.min(year), hi.max(year)),
                });
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for country in country_col.into_iter().flatten() {
                if seen.insert(country) {
                    countries.push(country.to_string());
                }
            }

            regions.extend(region_col.into_iter().flatten().map(str::to_string));
        }

        Self {
            frame,
            year_bounds,
            countries,
            regions: regions.into_iter().collect(),
        }
    }

    /// Underlying frame with the canonical columns.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// `(min, max)` year, `None` for an empty dataset.
    pub fn year_bounds(&self) -> Option<(i64, i64)> {
        self.year_bounds
    }

    pub fn latest_year(&self) -> Option<i64> {
        self.year_bounds.map(|(_, max)| max)
    }

    /// Unique countries in first-appearance order.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Sorted unique regions.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    #[allow(dead_code)]
    pub fn records(&self) -> Result<Vec<Record>, DatasetError> {
        Ok(extract_records(&self.frame)?.0)
    }

    /// Rows with `year == year`, in dataset order.
    pub fn filter_year(&self, year: i64) -> Result<Vec<Record>, DatasetError> {
        let filtered = self
            .frame
            .clone()
            .lazy()
            .filter(col(YEAR).eq(lit(year)))
            .collect()?;
        Ok(extract_records(&filtered)?.0)
    }

    /// Rows with `country == country`, in dataset order.
    pub fn filter_country(&self, country: &str) -> Result<Vec<Record>, DatasetError> {
        let filtered = self
            .frame
            .clone()
            .lazy()
            .filter(col(COUNTRY).eq(lit(country)))
            .collect()?;
        Ok(extract_records(&filtered)?.0)
    }
}

/// Pull typed records out of a frame holding the required columns.
fn extract_records(df: &DataFrame) -> Result<(Vec<Record>, usize), DatasetError> {
    let country = df.column(COUNTRY)?.cast(&DataType::String)?;
    let country = country.str()?;
    let region = df.column(REGION)?.cast(&DataType::String)?;
    let region = region.str()?;
    let year = df.column(YEAR)?.cast(&DataType::Int64)?;
    let year = year.i64()?;
    let co2 = df.column(CO2)?.cast(&DataType::Float64)?;
    let co2 = co2.f64()?;
    let gdp = df.column(GDP)?.cast(&DataType::Float64)?;
    let gdp = gdp.f64()?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    let rows = country
        .into_iter()
        .zip(region.into_iter())
        .zip(year.into_iter())
        .zip(co2.into_iter())
        .zip(gdp.into_iter());

    for ((((country, region), year), co2), gdp) in rows {
        match (country, region, year) {
            (Some(country), Some(region), Some(year)) => {
                records.push(Record::with_gaps(country, region, year, co2, gdp));
            }
            _ => skipped += 1,
        }
    }

    Ok((records, skipped))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The three-row table used throughout the view tests.
    pub(crate) fn sample_dataset() -> Dataset {
        Dataset::from_records(vec![
            Record::new("A", "X", 2000, 1.0, 100.0),
            Record::new("B", "Y", 2000, 2.0, 200.0),
            Record::new("A", "X", 1999, 5.0, 90.0),
        ])
        .unwrap()
    }

    #[test]
    fn indexes_bounds_countries_and_regions() {
        let ds = Dataset::from_records(vec![
            Record::new("Chad", "Africa", 1970, 0.1, 900.0),
            Record::new("Peru", "America", 1965, 0.9, 4000.0),
            Record::new("Chad", "Africa", 2010, 0.05, 1500.0),
            Record::new("Iraq", "Asia", 1990, 3.0, 12000.0),
        ])
        .unwrap();

        assert_eq!(ds.len(), 4);
        assert_eq!(ds.year_bounds(), Some((1965, 2010)));
        assert_eq!(ds.latest_year(), Some(2010));
        assert_eq!(ds.countries(), ["Chad", "Peru", "Iraq"]);
        assert_eq!(ds.regions(), ["Africa", "America", "Asia"]);
        assert!(ds.contains_country("Peru"));
        assert!(!ds.contains_country("Oman"));
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = Dataset::from_records(Vec::new()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.year_bounds(), None);
        assert!(ds.countries().is_empty());
        assert!(ds.filter_year(2000).unwrap().is_empty());
    }

    #[test]
    fn filters_keep_dataset_order() {
        let ds = sample_dataset();

        let y2000 = ds.filter_year(2000).unwrap();
        assert_eq!(y2000.len(), 2);
        assert_eq!(y2000[0].country, "A");
        assert_eq!(y2000[1].country, "B");

        let a = ds.filter_country("A").unwrap();
        assert_eq!(a.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2000, 1999]);
        assert!(ds.filter_country("Z").unwrap().is_empty());
    }

    #[test]
    fn raw_frame_skips_rows_without_keys_and_ignores_extra_columns() {
        let raw = DataFrame::new(vec![
            Column::new("country".into(), vec![Some("A"), Some("B"), None]),
            Column::new("region".into(), vec!["X", "Y", "Y"]),
            Column::new("year".into(), vec![2000i64, 2000, 2000]),
            Column::new("co2".into(), vec![Some(1.5), None, Some(2.0)]),
            Column::new("gdp".into(), vec![100i64, 200, 300]),
            Column::new("population".into(), vec![10i64, 20, 30]),
        ])
        .unwrap();

        let (ds, skipped) = Dataset::from_raw_frame(&raw).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(
            ds.records().unwrap(),
            vec![
                Record::new("A", "X", 2000, 1.5, 100.0),
                Record::with_gaps("B", "Y", 2000, None, Some(200.0)),
            ]
        );
        assert_eq!(ds.countries(), ["A", "B"]);
    }

    #[test]
    fn nan_measurements_become_missing() {
        let raw = DataFrame::new(vec![
            Column::new("country".into(), vec!["A", "B"]),
            Column::new("region".into(), vec!["X", "X"]),
            Column::new("year".into(), vec![2000i64, 2001]),
            Column::new("co2".into(), vec![f64::NAN, 2.0]),
            Column::new("gdp".into(), vec![100.0, f64::NAN]),
        ])
        .unwrap();

        let (ds, skipped) = Dataset::from_raw_frame(&raw).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(ds.year_bounds(), Some((2000, 2001)));

        let records = ds.records().unwrap();
        assert_eq!(records[0].co2, None);
        assert_eq!(records[0].gdp, Some(100.0));
        assert_eq!(records[1].co2, Some(2.0));
        assert_eq!(records[1].gdp, None);
    }

    #[test]
    fn raw_frame_without_required_column_is_rejected() {
        let raw = DataFrame::new(vec![
            Column::new("country".into(), vec!["A"]),
            Column::new("region".into(), vec!["X"]),
            Column::new("year".into(), vec![2000i64]),
            Column::new("co2".into(), vec![1.0]),
        ])
        .unwrap();

        let err = Dataset::from_raw_frame(&raw).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "gdp"));
    }
}
