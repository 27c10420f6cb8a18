//! Year-tolerant aggregation of scatter dimensions into per-entity series.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`TimeSeriesAggregator::build_by_entity_and_year`] picks, for every
//!    entity and target year, the closest observation of each dimension
//!    within that dimension's tolerance.
//! 2. [`filter_incomplete_entities`] drops records lacking an x or a y value.
//! 3. [`select_current_window`] concatenates each entity's records inside a
//!    `[start, end]` year window into one series.
//!
//! [`TimeSeriesAggregator::available_target_years`] computes the timeline
//! the first step is run over.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::scatter::dimension::{Dimension, DimensionProperty, year_distance};
use crate::variables::{EntityId, EntityKey, VariableValue, Year, entity_label};

/// Source year actually used for each positional property of a point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceYears {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Year>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Year>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Year>,
}

/// One entity's matched values for one target year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    /// The target year this point was built for.
    pub year: Year,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<VariableValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<VariableValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<VariableValue>,
    pub time: SourceYears,
}

impl ScatterPoint {
    pub fn value(&self, property: DimensionProperty) -> Option<&VariableValue> {
        match property {
            DimensionProperty::X => self.x.as_ref(),
            DimensionProperty::Y => self.y.as_ref(),
            DimensionProperty::Size => self.size.as_ref(),
            DimensionProperty::Color => None,
        }
    }

    /// `true` when both axes have a value.
    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// Immutable record for one `(entity, target year)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityYearRecord {
    pub entity_id: EntityId,
    pub label: String,
    /// Raw value of the color dimension, resolved to a color by the view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_value: Option<VariableValue>,
    pub point: ScatterPoint,
}

/// entity → target year → record, both levels ordered ascending.
pub type DataByEntityAndYear = BTreeMap<EntityId, BTreeMap<Year, EntityYearRecord>>;

/// The points of one entity inside the current window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub entity_id: EntityId,
    pub label: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_value: Option<VariableValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub values: Vec<ScatterPoint>,
}

#[derive(Debug, Clone)]
struct Slot {
    year: Year,
    value: VariableValue,
}

#[derive(Debug)]
struct RecordBuilder {
    label: String,
    color_value: Option<VariableValue>,
    x: Option<Slot>,
    y: Option<Slot>,
    size: Option<Slot>,
}

impl RecordBuilder {
    fn new(label: String) -> Self {
        Self {
            label,
            color_value: None,
            x: None,
            y: None,
            size: None,
        }
    }

    /// Offers an eligible observation for `property` at `target`.
    ///
    /// Color is overwritten unconditionally. Positional properties keep the
    /// observation closest to `target`; on equal distance the one already
    /// kept stays.
    fn offer(&mut self, property: DimensionProperty, target: Year, year: Year, value: &VariableValue) {
        let slot = match property {
            DimensionProperty::Color => {
                self.color_value = Some(value.clone());
                return;
            }
            DimensionProperty::X => &mut self.x,
            DimensionProperty::Y => &mut self.y,
            DimensionProperty::Size => &mut self.size,
        };

        if let Some(kept) = slot {
            if year_distance(kept.year, target) <= year_distance(year, target) {
                return;
            }
        }
        *slot = Some(Slot {
            year,
            value: value.clone(),
        });
    }

    fn build(self, entity_id: EntityId, target: Year) -> EntityYearRecord {
        let (x, x_year) = split(self.x);
        let (y, y_year) = split(self.y);
        let (size, size_year) = split(self.size);

        EntityYearRecord {
            entity_id,
            label: self.label,
            color_value: self.color_value,
            point: ScatterPoint {
                year: target,
                x,
                y,
                size,
                time: SourceYears {
                    x: x_year,
                    y: y_year,
                    size: size_year,
                },
            },
        }
    }
}

fn split(slot: Option<Slot>) -> (Option<VariableValue>, Option<Year>) {
    match slot {
        Some(Slot { year, value }) => (Some(value), Some(year)),
        None => (None, None),
    }
}

/// Aggregates a chart's dimensions over a shared timeline.
pub struct TimeSeriesAggregator<'a> {
    dimensions: &'a [Dimension<'a>],
    entity_key: &'a EntityKey,
}

impl<'a> TimeSeriesAggregator<'a> {
    pub fn new(dimensions: &'a [Dimension<'a>], entity_key: &'a EntityKey) -> Self {
        Self {
            dimensions,
            entity_key,
        }
    }

    /// Years on the timeline for which every x/y dimension has an
    /// observation within its tolerance, ascending.
    ///
    /// Each observed year is widened by the dimension's tolerance and
    /// clamped to the overall year range of the x/y dimensions. The
    /// resulting sets are intersected across dimensions. Returns an empty
    /// list when there is no x/y dimension or one of them has no data.
    pub fn available_target_years(&self) -> Vec<Year> {
        let axes: Vec<&Dimension> = self
            .dimensions
            .iter()
            .filter(|d| d.property.is_axis())
            .collect();

        let years = axes.iter().flat_map(|d| d.variable.years.iter().copied());
        let (Some(min), Some(max)) = (years.clone().min(), years.max()) else {
            return Vec::new();
        };

        let mut common: Option<BTreeSet<Year>> = None;
        for dimension in axes {
            let mut reachable = BTreeSet::new();
            for year in dimension.variable.years_uniq() {
                if let Some((lo, hi)) = dimension.tolerance.window(year, min, max) {
                    reachable.extend(lo..=hi);
                }
            }

            common = Some(match common {
                None => reachable,
                Some(c) => c.intersection(&reachable).copied().collect(),
            });
        }

        common.unwrap_or_default().into_iter().collect()
    }

    /// Matches every dimension's observations to every target year.
    ///
    /// Observations are scanned in their original array order. Records are
    /// created for any entity with at least one eligible observation, so the
    /// result may contain records missing an axis; see
    /// [`filter_incomplete_entities`].
    pub fn build_by_entity_and_year(&self, target_years: &[Year]) -> DataByEntityAndYear {
        let mut builders: BTreeMap<EntityId, BTreeMap<Year, RecordBuilder>> = BTreeMap::new();

        for dimension in self.dimensions {
            for &target in target_years {
                for obs in dimension.variable.observations() {
                    if !dimension.tolerance.admits(obs.year, target) {
                        continue;
                    }

                    builders
                        .entry(obs.entity_id)
                        .or_default()
                        .entry(target)
                        .or_insert_with(|| RecordBuilder::new(entity_label(self.entity_key, obs.entity_id)))
                        .offer(dimension.property, target, obs.year, obs.value);
                }
            }
        }

        builders
            .into_iter()
            .map(|(entity_id, by_year)| {
                let records = by_year
                    .into_iter()
                    .map(|(year, builder)| (year, builder.build(entity_id, year)))
                    .collect();
                (entity_id, records)
            })
            .collect()
    }

    /// Runs [`Self::build_by_entity_and_year`] then [`filter_incomplete_entities`].
    pub fn aggregate(&self, target_years: &[Year]) -> DataByEntityAndYear {
        let data = filter_incomplete_entities(self.build_by_entity_and_year(target_years));
        debug!(
            dimensions = self.dimensions.len(),
            target_years = target_years.len(),
            entities = data.values().filter(|by_year| !by_year.is_empty()).count(),
            "Scatter data aggregated"
        );
        data
    }
}

/// Drops every record that lacks an x or a y value.
///
/// Entities left with no records stay in the map with an empty inner map.
pub fn filter_incomplete_entities(data: DataByEntityAndYear) -> DataByEntityAndYear {
    data.into_iter()
        .map(|(entity_id, by_year)| {
            let complete = by_year
                .into_iter()
                .filter(|(_, record)| record.point.is_complete())
                .collect();
            (entity_id, complete)
        })
        .collect()
}

/// Concatenates each entity's records with `start <= year <= end` into one
/// series, in ascending year order. Entities with no record in the window
/// are left out.
pub fn select_current_window(data: &DataByEntityAndYear, start: Year, end: Year) -> Vec<ScatterSeries> {
    if start > end {
        return Vec::new();
    }

    data.values()
        .filter_map(|by_year| {
            let mut series: Option<ScatterSeries> = None;
            for record in by_year.range(start..=end).map(|(_, r)| r) {
                series
                    .get_or_insert_with(|| ScatterSeries {
                        entity_id: record.entity_id,
                        label: record.label.clone(),
                        key: record.label.clone(),
                        color_value: record.color_value.clone(),
                        color: None,
                        values: Vec::new(),
                    })
                    .values
                    .push(record.point.clone());
            }
            series.filter(|s| !s.values.is_empty())
        })
        .collect()
}
