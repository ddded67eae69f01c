//! Charts module - view models, interactive plots and static export

mod palette;
mod plotter;
mod renderer;
mod views;

pub use palette::RegionPalette;
pub use plotter::{ChartPlotter, ScatterInteraction, ScatterTool};
pub use renderer::StaticChartRenderer;
pub use views::{RegionalView, ScatterView, TimeSeriesView};
