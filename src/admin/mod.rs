//! Client for the admin JSON API.

pub mod datasets;
pub mod tags;

pub use datasets::{DatasetListItem, TagBadge};
pub use tags::{TagEditable, TagEditor, TagPageData};

use anyhow::Result;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::fetch::{HttpClient, fetch_json, send_json};

/// `{ "success": bool }` reply of admin mutations. A missing flag counts as failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

pub struct AdminClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> AdminClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        fetch_json(&self.client, &self.url(path)).await
    }

    pub async fn request_json<B, T>(&self, path: &str, body: &B, method: Method) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send_json(&self.client, method, &self.url(path), body).await
    }
}
