//! Variable data as served by the variables endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

pub type EntityId = i64;
pub type VariableId = i64;
pub type Year = i32;

/// Entity metadata keyed by entity id.
pub type EntityKey = HashMap<EntityId, EntityMeta>;

/// A single data value. The endpoint mixes numbers and strings in one array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Number(f64),
    Text(String),
}

impl VariableValue {
    /// Returns the value as a finite number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VariableValue::Text(s) => Some(s),
            VariableValue::Number(_) => None,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Number(n) => write!(f, "{n}"),
            VariableValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for VariableValue {
    fn from(n: f64) -> Self {
        VariableValue::Number(n)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

/// Per-variable display overrides edited in the admin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableDisplaySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_projection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_decimal_places: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableSource {
    pub id: i64,
    pub name: String,
    pub data_published_by: String,
    pub data_publisher_source: String,
    pub link: String,
    pub retrieved_date: String,
    pub additional_info: String,
}

/// Entity metadata from the response's `entityKey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityMeta {
    pub id: EntityId,
    pub name: String,
    pub code: Option<String>,
}

/// One `(entity, year, value)` triple borrowed from a variable's parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    pub entity_id: EntityId,
    pub year: Year,
    pub value: &'a VariableValue,
}

/// A variable with its data in parallel `years` / `entities` / `values` arrays.
///
/// Observations whose value is `null` on the wire are dropped while parsing,
/// keeping the three arrays aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "VariableRepr")]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub short_unit: Option<String>,
    pub coverage: String,
    pub timespan: String,
    pub dataset_name: String,
    pub dataset_id: Option<String>,
    pub display: VariableDisplaySettings,
    pub source: Option<VariableSource>,
    pub years: Vec<Year>,
    pub entities: Vec<EntityId>,
    pub values: Vec<VariableValue>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct VariableRepr {
    id: VariableId,
    name: String,
    description: String,
    unit: String,
    short_unit: Option<String>,
    coverage: String,
    timespan: String,
    dataset_name: String,
    #[serde(deserialize_with = "string_or_number")]
    dataset_id: Option<String>,
    display: VariableDisplaySettings,
    source: Option<VariableSource>,
    years: Vec<Year>,
    entities: Vec<EntityId>,
    values: Vec<Option<VariableValue>>,
}

impl From<VariableRepr> for Variable {
    fn from(repr: VariableRepr) -> Self {
        let len = repr.years.len().min(repr.entities.len()).min(repr.values.len());
        let mut years = Vec::with_capacity(len);
        let mut entities = Vec::with_capacity(len);
        let mut values = Vec::with_capacity(len);

        for ((year, entity), value) in repr.years.into_iter().zip(repr.entities).zip(repr.values) {
            if let Some(value) = value {
                years.push(year);
                entities.push(entity);
                values.push(value);
            }
        }
        if values.len() < len {
            debug!(variable_id = repr.id, skipped = len - values.len(), "Dropped null observations");
        }

        Self {
            id: repr.id,
            name: repr.name,
            description: repr.description,
            unit: repr.unit,
            short_unit: repr.short_unit,
            coverage: repr.coverage,
            timespan: repr.timespan,
            dataset_name: repr.dataset_name,
            dataset_id: repr.dataset_id,
            display: repr.display,
            source: repr.source,
            years,
            entities,
            values,
        }
    }
}

impl Variable {
    /// Iterates the observations in their original array order.
    ///
    /// Arrays of unequal length are truncated to the shortest one.
    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> {
        self.years
            .iter()
            .zip(&self.entities)
            .zip(&self.values)
            .map(|((&year, &entity_id), value)| Observation {
                entity_id,
                year,
                value,
            })
    }

    pub fn has_numeric_values(&self) -> bool {
        self.values.iter().any(|v| v.as_f64().is_some())
    }

    pub fn has_categorical_values(&self) -> bool {
        self.values.iter().any(|v| v.as_text().is_some())
    }

    pub fn is_numeric(&self) -> bool {
        self.has_numeric_values() && !self.has_categorical_values()
    }

    /// Finite numeric values, sorted ascending.
    pub fn numeric_values(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.values.iter().filter_map(VariableValue::as_f64).collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Distinct string values in first-seen order.
    pub fn categorical_values(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for text in self.values.iter().filter_map(VariableValue::as_text) {
            if !seen.iter().any(|s| s == text) {
                seen.push(text.to_string());
            }
        }
        seen
    }

    /// Distinct entity ids in first-seen order.
    pub fn entities_uniq(&self) -> Vec<EntityId> {
        let mut seen = Vec::new();
        for id in &self.entities {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }

    /// Distinct years, sorted ascending.
    pub fn years_uniq(&self) -> Vec<Year> {
        let mut years = self.years.clone();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn min_year(&self) -> Option<Year> {
        self.years.iter().copied().min()
    }

    pub fn max_year(&self) -> Option<Year> {
        self.years.iter().copied().max()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.numeric_values().first().copied()
    }

    pub fn max_value(&self) -> Option<f64> {
        self.numeric_values().last().copied()
    }
}

/// Body of `GET /api/data/variables/{ids}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariablesResponse {
    pub variables: HashMap<VariableId, Variable>,
    pub entity_key: EntityKey,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|r| match r {
        Repr::Number(n) => n.to_string(),
        Repr::Text(s) => s,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(years: Vec<Year>, values: Vec<VariableValue>) -> Variable {
        Variable {
            entities: vec![1; years.len()],
            years,
            values,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_mixed_values() {
        let json = r#"{
            "id": 7,
            "name": "Population",
            "datasetId": 12,
            "display": { "tolerance": 3, "unit": "people" },
            "years": [2000, 2001],
            "entities": [1, 2],
            "values": [10.5, "n/a"]
        }"#;
        let v: Variable = serde_json::from_str(json).unwrap();

        assert_eq!(v.id, 7);
        assert_eq!(v.dataset_id.as_deref(), Some("12"));
        assert_eq!(v.display.tolerance, Some(3));
        assert_eq!(v.values[0], VariableValue::Number(10.5));
        assert_eq!(v.values[1], VariableValue::Text("n/a".to_string()));
    }

    #[test]
    fn test_null_values_drop_their_observations() {
        let json = r#"{
            "variables": {
                "3": {
                    "name": "Life expectancy",
                    "years": [2000, 2001, 2002],
                    "entities": [1, 2, 3],
                    "values": [71.2, null, 68.0]
                }
            },
            "entityKey": {}
        }"#;
        let response: VariablesResponse = serde_json::from_str(json).unwrap();
        let v = &response.variables[&3];

        assert_eq!(v.years, vec![2000, 2002]);
        assert_eq!(v.entities, vec![1, 3]);
        assert_eq!(v.values, vec![VariableValue::Number(71.2), VariableValue::Number(68.0)]);
    }

    #[test]
    fn test_observations_truncate_to_shortest_array() {
        let mut v = variable(vec![2000, 2001, 2002], vec![1.0.into(), 2.0.into(), 3.0.into()]);
        v.entities = vec![5, 6];

        let obs: Vec<_> = v.observations().collect();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].entity_id, 6);
        assert_eq!(obs[1].year, 2001);
    }

    #[test]
    fn test_numeric_and_categorical_stats() {
        let v = variable(
            vec![2003, 2001, 2001, 2002],
            vec![3.0.into(), "Asia".into(), 1.0.into(), "Asia".into()],
        );

        assert!(v.has_numeric_values());
        assert!(v.has_categorical_values());
        assert!(!v.is_numeric());
        assert_eq!(v.numeric_values(), vec![1.0, 3.0]);
        assert_eq!(v.categorical_values(), vec!["Asia".to_string()]);
        assert_eq!(v.years_uniq(), vec![2001, 2002, 2003]);
        assert_eq!(v.min_year(), Some(2001));
        assert_eq!(v.max_value(), Some(3.0));
    }

    #[test]
    fn test_empty_variable_has_no_extent() {
        let v = Variable::default();
        assert_eq!(v.min_year(), None);
        assert_eq!(v.min_value(), None);
        assert!(!v.is_numeric());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(VariableValue::Number(5.0).to_string(), "5");
        assert_eq!(VariableValue::Number(2.5).to_string(), "2.5");
        assert_eq!(VariableValue::from("x").to_string(), "x");
    }
}
