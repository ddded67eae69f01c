//! Data module - dataset loading, filtering and aggregation

mod dataset;
mod loader;
mod processor;

pub use dataset::{Dataset, DatasetError, Record};
pub use loader::{DataLoader, DataSource, LoaderError};
pub use processor::{DataProcessor, RegionAggregate};

#[cfg(test)]
pub(crate) use dataset::tests::sample_dataset;
