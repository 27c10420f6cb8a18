//! A dataset with its variables, sources and data values, as loaded from a
//! JSON dump.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::variables::{VariableDisplaySettings, VariableId, VariableValue, Year};

fn default_namespace() -> String {
    "owid".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_private: bool,
}

impl Dataset {
    /// The name with characters that are unsafe in file names replaced by `!`.
    pub fn filename(&self) -> String {
        filenamify(&self.name)
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVariable {
    pub id: VariableId,
    pub name: String,
    #[serde(default)]
    pub column_order: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display: VariableDisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub id: i64,
    pub name: String,
    /// Free-form source metadata, passed through to the datapackage.
    #[serde(default)]
    pub description: serde_json::Value,
}

/// One stored value: the join of a data value with its entity name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub entity: String,
    pub year: Year,
    pub variable_id: VariableId,
    pub value: VariableValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDump {
    pub dataset: Dataset,
    #[serde(default)]
    pub variables: Vec<DatasetVariable>,
    #[serde(default)]
    pub sources: Vec<DatasetSource>,
    #[serde(default)]
    pub values: Vec<DataValue>,
}

impl DatasetDump {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset dump {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset dump {}", path.display()))
    }

    /// Variables in export column order: `columnOrder`, then id.
    pub fn ordered_variables(&self) -> Vec<&DatasetVariable> {
        let mut variables: Vec<&DatasetVariable> = self.variables.iter().collect();
        variables.sort_by_key(|v| (v.column_order, v.id));
        variables
    }

    /// Values in export row order: entity name, year, variable id.
    pub fn ordered_values(&self) -> Vec<&DataValue> {
        let mut values: Vec<&DataValue> = self.values.iter().collect();
        values.sort_by(|a, b| {
            a.entity
                .cmp(&b.entity)
                .then(a.year.cmp(&b.year))
                .then(a.variable_id.cmp(&b.variable_id))
        });
        values
    }
}

/// Replaces reserved and control characters with `!` and trims surrounding
/// whitespace and dots.
pub fn filenamify(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '!',
            c if c.is_control() => '!',
            c => c,
        })
        .collect();
    replaced.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
