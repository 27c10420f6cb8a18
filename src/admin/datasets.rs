use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagBadge {
    pub id: i64,
    pub name: String,
}

/// A row of the admin dataset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListItem {
    pub id: i64,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<TagBadge>,
}

impl DatasetListItem {
    /// Admin page path for this dataset.
    pub fn path(&self) -> String {
        format!("/datasets/{}", self.id)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }

    /// Case-insensitive match on name, namespace, description or tag names.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.name, &self.namespace, &self.description]
            .into_iter()
            .chain(self.tags.iter().map(|t| &t.name))
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DatasetListItem {
        serde_json::from_str(
            r#"{
                "id": 8,
                "name": "World Bank WDI",
                "namespace": "wdi",
                "description": "Development indicators",
                "createdAt": "2018-01-02T03:04:05Z",
                "updatedAt": "2018-02-02T03:04:05Z",
                "tags": [{ "id": 1, "name": "Economy" }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_path_and_tags() {
        let item = item();
        assert_eq!(item.path(), "/datasets/8");
        assert_eq!(item.tag_names(), vec!["Economy"]);
    }

    #[test]
    fn test_matches() {
        let item = item();
        assert!(item.matches("wdi"));
        assert!(item.matches("economy"));
        assert!(!item.matches("health"));
    }
}
