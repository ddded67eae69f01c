//! Region color palette.

use crate::data::Dataset;
use egui::Color32;

/// Six-color "Spectral" categorical palette.
pub const SPECTRAL6: [Color32; 6] = [
    Color32::from_rgb(50, 136, 189),  // #3288bd
    Color32::from_rgb(153, 213, 148), // #99d594
    Color32::from_rgb(230, 245, 152), // #e6f598
    Color32::from_rgb(254, 224, 139), // #fee08b
    Color32::from_rgb(252, 141, 89),  // #fc8d59
    Color32::from_rgb(213, 62, 79),   // #d53e4f
];

/// Color for regions the palette was not built with.
pub const UNKNOWN_REGION_COLOR: Color32 = Color32::GRAY;

/// Fixed region -> color mapping derived once from the sorted unique region list.
///
/// Regions beyond the sixth reuse colors from the start of the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPalette {
    regions: Vec<String>,
}

impl RegionPalette {
    pub fn new(mut regions: Vec<String>) -> Self {
        regions.sort();
        regions.dedup();
        Self { regions }
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::new(dataset.regions().to_vec())
    }

    /// Regions in palette (legend) order.
    #[allow(dead_code)]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn index_of(&self, region: &str) -> Option<usize> {
        self.regions.binary_search_by(|r| r.as_str().cmp(region)).ok()
    }

    pub fn color(&self, region: &str) -> Color32 {
        self.index_of(region)
            .map(|i| SPECTRAL6[i % SPECTRAL6.len()])
            .unwrap_or(UNKNOWN_REGION_COLOR)
    }
}
