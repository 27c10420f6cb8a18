use anyhow::Result;
use tracing::{debug, info};

use super::{HttpClient, fetch_json};
use crate::variables::{VariableId, VariableSet, VariablesResponse};

/// Where variable data is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEndpoint {
    pub base_url: String,
    /// Appended as `?v=` so published charts hit the CDN cache.
    pub cache_tag: Option<String>,
    /// Editors always fetch fresh data, so the cache tag is dropped.
    pub is_editor: bool,
}

impl DataEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_tag: None,
            is_editor: false,
        }
    }

    pub fn with_cache_tag(mut self, cache_tag: Option<String>) -> Self {
        self.cache_tag = cache_tag;
        self
    }

    pub fn editor(mut self, is_editor: bool) -> Self {
        self.is_editor = is_editor;
        self
    }

    fn effective_cache_tag(&self) -> Option<&str> {
        if self.is_editor {
            None
        } else {
            self.cache_tag.as_deref().filter(|t| !t.is_empty())
        }
    }

    /// `{base}/api/data/variables/{id1+id2+…}.json[?v=tag]`
    pub fn variables_url(&self, ids: &[VariableId]) -> String {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        let base = self.base_url.trim_end_matches('/');
        match self.effective_cache_tag() {
            Some(tag) => format!("{base}/api/data/variables/{joined}.json?v={tag}"),
            None => format!("{base}/api/data/variables/{joined}.json"),
        }
    }
}

/// Loaded variables plus the client used to fetch more.
///
/// Concurrent updates for the same ids are not coalesced; callers that
/// share a store should serialize their updates.
pub struct VariableStore<C> {
    client: C,
    endpoint: DataEndpoint,
    data: VariableSet,
}

impl<C: HttpClient> VariableStore<C> {
    pub fn new(client: C, endpoint: DataEndpoint) -> Self {
        Self {
            client,
            endpoint,
            data: VariableSet::new(),
        }
    }

    pub fn data(&self) -> &VariableSet {
        &self.data
    }

    pub fn endpoint(&self) -> &DataEndpoint {
        &self.endpoint
    }

    /// Fetches `ids` in one request and merges the result.
    ///
    /// Duplicate ids are dropped, keeping first occurrences. An empty id set
    /// is a no-op. On failure the previously loaded data is left untouched.
    #[tracing::instrument(skip_all, fields(ids = ?ids))]
    pub async fn update(&mut self, ids: &[VariableId]) -> Result<()> {
        let mut unique: Vec<VariableId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            debug!("No variables requested");
            return Ok(());
        }

        let url = self.endpoint.variables_url(&unique);
        let response: VariablesResponse = fetch_json(&self.client, &url).await?;
        info!(
            url = %url,
            variables = response.variables.len(),
            entities = response.entity_key.len(),
            "Variable data received"
        );
        self.data.receive(response);
        Ok(())
    }

    /// Fetches only the ids that are not loaded yet.
    pub async fn ensure(&mut self, ids: &[VariableId]) -> Result<()> {
        let missing: Vec<VariableId> = ids.iter().copied().filter(|id| !self.data.contains(*id)).collect();
        self.update(&missing).await
    }
}
