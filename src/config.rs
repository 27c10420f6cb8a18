//! Runtime settings read from the environment (after `.env` is loaded).

use crate::fetch::DataEndpoint;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3030/admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the admin and data APIs (`DATAPUB_BASE_URL`).
    pub base_url: String,
    /// Cache tag for published data requests (`DATAPUB_CACHE_TAG`).
    pub cache_tag: Option<String>,
    /// Editor mode skips the cache tag (`DATAPUB_EDITOR`).
    pub is_editor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_tag: None,
            is_editor: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            base_url: get("DATAPUB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            cache_tag: get("DATAPUB_CACHE_TAG"),
            is_editor: get("DATAPUB_EDITOR")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Data endpoint for these settings; a chart's own cache tag wins over
    /// the configured one.
    pub fn data_endpoint(&self, chart_cache_tag: Option<&str>) -> DataEndpoint {
        let cache_tag = chart_cache_tag
            .map(str::to_string)
            .or_else(|| self.cache_tag.clone());
        DataEndpoint::new(self.base_url.clone())
            .with_cache_tag(cache_tag)
            .editor(self.is_editor)
    }
}
