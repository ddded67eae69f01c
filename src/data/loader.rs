//! CSV Data Loader Module
//! Fetches the emissions CSV once per process and parses it with Polars.

use crate::data::dataset::{Dataset, DatasetError};
use log::{debug, info, warn};
use polars::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to download CSV: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Failed to read CSV file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Invalid dataset: {0}")]
    DatasetError(#[from] DatasetError),
}

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Remote(String),
    LocalFile(PathBuf),
}

impl DataSource {
    /// `http(s)://` is remote; anything else is a path, with an optional `file://` prefix.
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            DataSource::Remote(source.to_string())
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            DataSource::LocalFile(PathBuf::from(path))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Remote(url) => write!(f, "{}", url),
            DataSource::LocalFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads the dataset at most once and hands out the cached copy afterwards.
pub struct DataLoader {
    source: DataSource,
    timeout: Option<Duration>,
    cache: OnceLock<Arc<Dataset>>,
}

impl DataLoader {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            timeout: None,
            cache: OnceLock::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    #[allow(dead_code)]
    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Return the dataset, fetching and parsing it on the first call only.
    ///
    /// Errors are not cached: a failed first call leaves the loader empty.
    pub fn get_data(&self) -> Result<Arc<Dataset>, LoaderError> {
        if let Some(dataset) = self.cache.get() {
            debug!("Dataset cache hit for {}", self.source);
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(self.load()?);
        Ok(Arc::clone(self.cache.get_or_init(|| dataset)))
    }

    fn load(&self) -> Result<Dataset, LoaderError> {
        info!("Loading dataset from {}", self.source);

        let bytes = match &self.source {
            DataSource::Remote(url) => self.fetch_remote(url)?,
            DataSource::LocalFile(path) => std::fs::read(path)?,
        };

        let raw = Self::parse_csv(bytes)?;
        let (dataset, skipped) = Dataset::from_raw_frame(&raw)?;
        if skipped > 0 {
            warn!("Skipped {} rows without country, region or year", skipped);
        }
        if dataset.is_empty() {
            warn!("Dataset from {} has no usable rows", self.source);
        }

        info!(
            "Loaded {} rows, {} countries, {} regions",
            dataset.len(),
            dataset.countries().len(),
            dataset.regions().len()
        );
        Ok(dataset)
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, LoaderError> {
        let mut builder =
            reqwest::blocking::Client::builder().user_agent("co2-dashboard/0.1");
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let response = client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Parse CSV bytes with a header row.
    pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }
}
