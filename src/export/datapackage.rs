//! `datapackage.json` describing a dataset's CSV export.

use serde::Serialize;

use crate::export::dataset::DatasetDump;
use crate::variables::VariableDisplaySettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "owidDisplaySettings", skip_serializing_if = "Option::is_none")]
    pub display_settings: Option<VariableDisplaySettings>,
}

impl Field {
    fn fixed(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            description: None,
            display_settings: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub path: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub id: i64,
    pub name: String,
    pub description: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPackage {
    pub name: String,
    pub title: String,
    pub id: i64,
    pub description: String,
    pub sources: Vec<SourceEntry>,
    pub resources: Vec<Resource>,
}

impl DataPackage {
    /// Builds the package for `dump`. Fields list `Entity` and `Year` first,
    /// then every variable in the same order as the CSV columns.
    pub fn from_dump(dump: &DatasetDump) -> Self {
        let dataset = &dump.dataset;

        let mut fields = vec![Field::fixed("Entity", "string"), Field::fixed("Year", "year")];
        fields.extend(dump.ordered_variables().into_iter().map(|v| Field {
            name: v.name.clone(),
            kind: "any".to_string(),
            description: Some(v.description.clone()),
            display_settings: Some(v.display.clone()),
        }));

        Self {
            name: dataset.name.clone(),
            title: dataset.name.clone(),
            id: dataset.id,
            description: dataset.description.clone(),
            sources: dump
                .sources
                .iter()
                .map(|s| SourceEntry {
                    id: s.id,
                    name: s.name.clone(),
                    description: s.description.clone(),
                })
                .collect(),
            resources: vec![Resource {
                path: format!("{}.csv", dataset.name),
                schema: Schema { fields },
            }],
        }
    }
}
