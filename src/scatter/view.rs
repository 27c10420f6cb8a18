//! A scatter chart bound to loaded variable data.
//!
//! [`ScatterView::render`] produces a [`ScatterFrame`]: everything a renderer
//! needs for the chart's current time range. Aggregation results are kept
//! in an [`AggregationCache`] so moving the time window does not redo the
//! per-year matching.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scatter::aggregate::{EntityYearRecord, ScatterPoint, ScatterSeries, TimeSeriesAggregator, select_current_window};
use crate::scatter::color::{ColorScale, LegendEntry, legend_entries};
use crate::scatter::dimension::{Dimension, DimensionProperty};
use crate::scatter::memo::{Aggregation, AggregationCache, AggregationKey};
use crate::variables::{VariableId, VariableSet, Year};

/// One dimension of a saved chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDimension {
    pub property: DimensionProperty,
    pub variable_id: VariableId,
    /// Year tolerance for x/y; ignored for color and size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

/// The scatter-relevant part of a chart definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub title: String,
    pub dimensions: Vec<ChartDimension>,
    pub time_range: (Option<Year>, Option<Year>),
    pub x_domain: (Option<f64>, Option<f64>),
    pub y_domain: (Option<f64>, Option<f64>),
    pub selected_entities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_tag: Option<String>,
}

impl ChartConfig {
    /// Distinct variable ids in dimension order.
    pub fn variable_ids(&self) -> Vec<VariableId> {
        let mut ids = Vec::new();
        for d in &self.dimensions {
            if !ids.contains(&d.variable_id) {
                ids.push(d.variable_id);
            }
        }
        ids
    }

    pub fn set_time_range(&mut self, start: Year, end: Year) {
        self.time_range = (Some(start), Some(end));
    }

    /// Legend click: selects `focus_keys`, or clears the selection if it
    /// already equals them.
    pub fn toggle_selection(&mut self, focus_keys: &[String]) {
        if self.selected_entities == focus_keys {
            self.selected_entities.clear();
        } else {
            self.selected_entities = focus_keys.to_vec();
        }
    }
}

/// Transient pointer state over the chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    pub focus_color: Option<String>,
    pub hover_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeLegendEntry {
    pub shape: Shape,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub label: String,
    pub points: Vec<ScatterPoint>,
}

/// Everything derived from a chart and its data for one time range.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterFrame {
    pub timeline_years: Vec<Year>,
    pub time_range: Option<(Year, Year)>,
    pub current_data: Vec<ScatterSeries>,
    pub x_domain: Option<(f64, f64)>,
    pub y_domain: Option<(f64, f64)>,
    pub colors_in_use: Vec<String>,
    pub legend: Vec<LegendEntry>,
    /// One single-point series per retained (entity, year) record.
    #[serde(skip)]
    pub all_series: Vec<ScatterSeries>,
}

impl ScatterFrame {
    pub fn is_empty(&self) -> bool {
        self.current_data.is_empty()
    }

    /// Keys of the series with the focused color, else the chart selection.
    pub fn focus_keys(&self, chart: &ChartConfig, interaction: &Interaction) -> Vec<String> {
        let Some(color) = &interaction.focus_color else {
            return chart.selected_entities.clone();
        };

        let mut keys = Vec::new();
        for series in &self.all_series {
            if series.color.as_ref() == Some(color) && !keys.contains(&series.key) {
                keys.push(series.key.clone());
            }
        }
        keys
    }

    /// Start/end year markers, shown only when nothing is focused or hovered
    /// and the range spans more than one year.
    pub fn shape_legend(&self, focus_keys: &[String], interaction: &Interaction) -> Option<Vec<ShapeLegendEntry>> {
        if !focus_keys.is_empty() || interaction.hover_key.is_some() {
            return None;
        }
        let (start, end) = self.time_range?;
        if start == end {
            return None;
        }

        Some(vec![
            ShapeLegendEntry {
                shape: Shape::Circle,
                text: start.to_string(),
            },
            ShapeLegendEntry {
                shape: Shape::Triangle,
                text: end.to_string(),
            },
        ])
    }

    /// The hovered series, else the only focused series, with its first and
    /// last points.
    pub fn tooltip(&self, focus_keys: &[String], interaction: &Interaction) -> Option<Tooltip> {
        let key = match (&interaction.hover_key, focus_keys) {
            (Some(key), _) => key,
            (None, [only]) => only,
            _ => return None,
        };
        let series = self.current_data.iter().find(|s| &s.key == key)?;

        let mut points: Vec<ScatterPoint> = series.values.first().cloned().into_iter().collect();
        if series.values.len() > 1 {
            points.extend(series.values.last().cloned());
        }

        Some(Tooltip {
            label: series.label.clone(),
            points,
        })
    }
}

/// A chart's dimensions bound to the variables they reference.
pub struct ScatterView<'a> {
    chart: &'a ChartConfig,
    variables: &'a VariableSet,
    dimensions: Vec<Dimension<'a>>,
}

impl<'a> ScatterView<'a> {
    /// Dimensions whose variable is not loaded are left out.
    pub fn new(chart: &'a ChartConfig, variables: &'a VariableSet) -> Self {
        let dimensions = chart
            .dimensions
            .iter()
            .filter_map(|d| match variables.get(d.variable_id) {
                Some(variable) => Some(Dimension::new(d.property, variable, d.tolerance)),
                None => {
                    debug!(variable_id = d.variable_id, "Dimension variable not loaded");
                    None
                }
            })
            .collect();

        Self {
            chart,
            variables,
            dimensions,
        }
    }

    pub fn dimensions(&self) -> &[Dimension<'a>] {
        &self.dimensions
    }

    pub fn cache_key(&self) -> AggregationKey {
        AggregationKey {
            revision: self.variables.revision(),
            dimensions: self.dimensions.iter().map(Dimension::key).collect(),
        }
    }

    /// Timeline years for the bound dimensions.
    pub fn timeline_years(&self) -> Vec<Year> {
        TimeSeriesAggregator::new(&self.dimensions, self.variables.entity_key()).available_target_years()
    }

    /// The chart's time range, defaulting to the full timeline when either
    /// bound is unset.
    pub fn time_range(&self, timeline_years: &[Year]) -> Option<(Year, Year)> {
        match self.chart.time_range {
            (Some(start), Some(end)) => Some((start, end)),
            _ => Some((*timeline_years.first()?, *timeline_years.last()?)),
        }
    }

    /// Ordinal scale seeded with the color variable's categories.
    pub fn color_scale(&self) -> ColorScale {
        let domain = self
            .dimensions
            .iter()
            .find(|d| d.property == DimensionProperty::Color)
            .map(|d| d.variable.categorical_values())
            .unwrap_or_default();
        ColorScale::new(domain)
    }

    pub fn render(&self, cache: &mut AggregationCache) -> ScatterFrame {
        let key = self.cache_key();
        let aggregation = cache.aggregation(&key, || {
            let aggregator = TimeSeriesAggregator::new(&self.dimensions, self.variables.entity_key());
            let timeline_years = aggregator.available_target_years();
            let data = aggregator.aggregate(&timeline_years);
            Aggregation {
                timeline_years,
                data,
            }
        });

        let time_range = self.time_range(&aggregation.timeline_years);
        let mut scale = self.color_scale();

        let all_series: Vec<ScatterSeries> = aggregation
            .data
            .values()
            .flat_map(|by_year| by_year.values())
            .map(|record| record_series(record, &mut scale))
            .collect();

        let current_data = match time_range {
            Some((start, end)) => {
                let window = cache.window(&key, (start, end), || {
                    let mut series = select_current_window(&aggregation.data, start, end);
                    for s in &mut series {
                        s.color = s.color_value.as_ref().and_then(|v| scale.color(v));
                    }
                    series
                });
                window.as_ref().clone()
            }
            None => Vec::new(),
        };

        let x_default = extent(all_series.iter().flat_map(|s| numeric(s, DimensionProperty::X)));
        let y_default = extent(all_series.iter().flat_map(|s| numeric(s, DimensionProperty::Y)));

        let mut colors_in_use: Vec<String> = Vec::new();
        for color in all_series.iter().filter_map(|s| s.color.as_ref()) {
            if !colors_in_use.contains(color) {
                colors_in_use.push(color.clone());
            }
        }
        let legend = legend_entries(&colors_in_use, &scale);

        debug!(
            timeline_years = aggregation.timeline_years.len(),
            series = current_data.len(),
            "Scatter frame rendered"
        );

        ScatterFrame {
            timeline_years: aggregation.timeline_years.clone(),
            time_range,
            current_data,
            x_domain: resolve_domain(self.chart.x_domain, x_default),
            y_domain: resolve_domain(self.chart.y_domain, y_default),
            colors_in_use,
            legend,
            all_series,
        }
    }
}

fn record_series(record: &EntityYearRecord, scale: &mut ColorScale) -> ScatterSeries {
    ScatterSeries {
        entity_id: record.entity_id,
        label: record.label.clone(),
        key: record.label.clone(),
        color: record.color_value.as_ref().and_then(|v| scale.color(v)),
        color_value: record.color_value.clone(),
        values: vec![record.point.clone()],
    }
}

fn numeric(series: &ScatterSeries, property: DimensionProperty) -> impl Iterator<Item = f64> + '_ {
    series
        .values
        .iter()
        .filter_map(move |p| p.value(property).and_then(|v| v.as_f64()))
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn resolve_domain(overrides: (Option<f64>, Option<f64>), default: Option<(f64, f64)>) -> Option<(f64, f64)> {
    let lo = overrides.0.or(default.map(|d| d.0))?;
    let hi = overrides.1.or(default.map(|d| d.1))?;
    Some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariablesResponse;

    const DATA: &str = r#"{
        "variables": {
            "1": { "name": "GDP", "years": [2000, 2001, 2002, 2000, 2002], "entities": [1, 1, 1, 2, 2], "values": [1, 2, 3, 10, 30] },
            "2": { "name": "Life", "years": [2000, 2001, 2002, 2000], "entities": [1, 1, 1, 2], "values": [50, 60, 70, 40] },
            "3": { "name": "Continent", "years": [2015, 2015], "entities": [1, 2], "values": ["Europe", "Asia"] }
        },
        "entityKey": {
            "1": { "name": "Spain", "code": "ESP" },
            "2": { "name": "Japan", "code": "JPN" }
        }
    }"#;

    fn variables() -> VariableSet {
        let mut set = VariableSet::new();
        let response: VariablesResponse = serde_json::from_str(DATA).unwrap();
        set.receive(response);
        set
    }

    fn chart() -> ChartConfig {
        ChartConfig {
            dimensions: vec![
                ChartDimension { property: DimensionProperty::X, variable_id: 1, tolerance: Some(0) },
                ChartDimension { property: DimensionProperty::Y, variable_id: 2, tolerance: Some(0) },
                ChartDimension { property: DimensionProperty::Color, variable_id: 3, tolerance: None },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_defaults_to_full_timeline() {
        let variables = variables();
        let chart = chart();
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());

        assert_eq!(frame.timeline_years, vec![2000, 2001, 2002]);
        assert_eq!(frame.time_range, Some((2000, 2002)));
        assert_eq!(frame.current_data.len(), 2);

        let spain = frame.current_data.iter().find(|s| s.key == "Spain").unwrap();
        assert_eq!(spain.values.len(), 3);
        assert_eq!(spain.color.as_deref(), Some("#5675c1"));

        // Japan lacks y in 2002, so only 2000 survives
        let japan = frame.current_data.iter().find(|s| s.key == "Japan").unwrap();
        assert_eq!(japan.values.len(), 1);
        assert_eq!(japan.color.as_deref(), Some("#aec7e8"));
    }

    #[test]
    fn test_domains_and_overrides() {
        let variables = variables();
        let mut chart = chart();
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());
        assert_eq!(frame.x_domain, Some((1.0, 10.0)));
        assert_eq!(frame.y_domain, Some((40.0, 70.0)));

        chart.x_domain = (Some(0.0), None);
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());
        assert_eq!(frame.x_domain, Some((0.0, 10.0)));
    }

    #[test]
    fn test_legend_and_focus() {
        let variables = variables();
        let chart = chart();
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());

        assert_eq!(frame.colors_in_use, vec!["#5675c1".to_string(), "#aec7e8".to_string()]);
        assert_eq!(frame.legend[0].label, "Europe");
        assert_eq!(frame.legend[1].label, "Asia");

        let interaction = Interaction {
            focus_color: Some("#aec7e8".into()),
            hover_key: None,
        };
        assert_eq!(frame.focus_keys(&chart, &interaction), vec!["Japan".to_string()]);
    }

    #[test]
    fn test_window_respects_chart_range() {
        let variables = variables();
        let mut chart = chart();
        chart.set_time_range(2001, 2002);
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());

        assert_eq!(frame.current_data.len(), 1);
        let years: Vec<Year> = frame.current_data[0].values.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2001, 2002]);
    }

    #[test]
    fn test_shape_legend_and_tooltip() {
        let variables = variables();
        let chart = chart();
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());
        let idle = Interaction::default();

        let shapes = frame.shape_legend(&[], &idle).unwrap();
        assert_eq!(shapes[0].text, "2000");
        assert_eq!(shapes[1].shape, Shape::Triangle);
        assert!(frame.shape_legend(&["Spain".to_string()], &idle).is_none());

        let tooltip = frame.tooltip(&["Spain".to_string()], &idle).unwrap();
        assert_eq!(tooltip.label, "Spain");
        let years: Vec<Year> = tooltip.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2000, 2002]);

        assert!(frame.tooltip(&[], &idle).is_none());
    }

    #[test]
    fn test_missing_variables_render_empty() {
        let variables = VariableSet::new();
        let chart = chart();
        let frame = ScatterView::new(&chart, &variables).render(&mut AggregationCache::new());

        assert!(frame.is_empty());
        assert!(frame.timeline_years.is_empty());
        assert_eq!(frame.time_range, None);
        assert_eq!(frame.x_domain, None);
    }

    #[test]
    fn test_shared_cache_tracks_variable_set() {
        let first = variables();
        let mut second = VariableSet::new();
        second.receive(
            serde_json::from_str(
                r#"{
                    "variables": {
                        "1": { "name": "GDP", "years": [2010], "entities": [5], "values": [8] },
                        "2": { "name": "Life", "years": [2010], "entities": [5], "values": [80] },
                        "3": { "name": "Continent", "years": [2015], "entities": [5], "values": ["South America"] }
                    },
                    "entityKey": { "5": { "name": "Chile", "code": "CHL" } }
                }"#,
            )
            .unwrap(),
        );
        let chart = chart();
        let mut cache = AggregationCache::new();

        ScatterView::new(&chart, &first).render(&mut cache);
        let shared = ScatterView::new(&chart, &second).render(&mut cache);
        let fresh = ScatterView::new(&chart, &second).render(&mut AggregationCache::new());

        assert_eq!(shared.timeline_years, vec![2010]);
        assert_eq!(shared.timeline_years, fresh.timeline_years);
        let keys: Vec<&str> = shared.current_data.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Chile"]);
    }

    #[test]
    fn test_toggle_selection() {
        let mut chart = chart();
        let keys = vec!["Spain".to_string()];
        chart.toggle_selection(&keys);
        assert_eq!(chart.selected_entities, keys);
        chart.toggle_selection(&keys);
        assert!(chart.selected_entities.is_empty());
    }

    #[test]
    fn test_chart_config_from_json() {
        let json = r#"{
            "title": "Life vs GDP",
            "dimensions": [
                { "property": "x", "variableId": 1, "tolerance": 2 },
                { "property": "y", "variableId": 2 },
                { "property": "color", "variableId": 1 }
            ],
            "timeRange": [null, 2010]
        }"#;
        let chart: ChartConfig = serde_json::from_str(json).unwrap();
        assert_eq!(chart.variable_ids(), vec![1, 2]);
        assert_eq!(chart.time_range, (None, Some(2010)));
        assert_eq!(chart.dimensions[0].tolerance, Some(2));
    }
}
