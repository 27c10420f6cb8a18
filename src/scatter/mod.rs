//! Scatter-plot data pipeline.
//!
//! Binds chart dimensions to variables, matches observations to timeline
//! years within each dimension's tolerance, and assembles the series,
//! domains and legend data shown for a time window.

pub mod aggregate;
pub mod color;
pub mod dimension;
pub mod memo;
pub mod view;

pub use aggregate::{
    DataByEntityAndYear, EntityYearRecord, ScatterPoint, ScatterSeries, SourceYears, TimeSeriesAggregator,
    filter_incomplete_entities, select_current_window,
};
pub use color::{COLOR_SCHEME, ColorScale, LegendEntry};
pub use dimension::{DEFAULT_AXIS_TOLERANCE, Dimension, DimensionProperty, Tolerance};
pub use memo::{Aggregation, AggregationCache, AggregationKey};
pub use view::{ChartConfig, ChartDimension, Interaction, ScatterFrame, ScatterView};
