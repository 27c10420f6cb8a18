//! Tag edit page: load, rename and delete a tag.

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AdminClient, SuccessResponse};
use crate::admin::datasets::DatasetListItem;
use crate::fetch::HttpClient;

pub const LEAVE_PROMPT: &str = "Are you sure you want to leave? Unsaved changes will be lost.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPageData {
    pub id: i64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub datasets: Vec<DatasetListItem>,
}

#[derive(Debug, Deserialize)]
struct TagEnvelope {
    tag: TagPageData,
}

#[derive(Serialize)]
struct TagUpdate<'a> {
    tag: &'a TagEditable,
}

/// The user-editable fields of a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEditable {
    pub name: String,
}

impl From<&TagPageData> for TagEditable {
    fn from(tag: &TagPageData) -> Self {
        Self {
            name: tag.name.clone(),
        }
    }
}

/// `GET /api/tags/{id}.json`
pub async fn load_tag<C: HttpClient>(admin: &AdminClient<C>, id: i64) -> Result<TagPageData> {
    let envelope: TagEnvelope = admin.get_json(&format!("/api/tags/{id}.json")).await?;
    Ok(envelope.tag)
}

/// Edits to one tag against its last-saved state.
#[derive(Debug, Clone)]
pub struct TagEditor {
    tag: TagPageData,
    draft: TagEditable,
    is_deleted: bool,
}

impl TagEditor {
    pub fn new(tag: TagPageData) -> Self {
        let draft = TagEditable::from(&tag);
        Self {
            tag,
            draft,
            is_deleted: false,
        }
    }

    pub fn tag(&self) -> &TagPageData {
        &self.tag
    }

    pub fn draft(&self) -> &TagEditable {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut TagEditable {
        &mut self.draft
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Whether the draft differs from the last-saved tag.
    pub fn is_modified(&self) -> bool {
        self.draft != TagEditable::from(&self.tag)
    }

    /// Message to confirm before navigating away with unsaved edits.
    pub fn leave_prompt(&self) -> Option<&'static str> {
        self.is_modified().then_some(LEAVE_PROMPT)
    }

    pub fn delete_confirmation(&self) -> String {
        format!(
            "Really delete the tag {}? This action cannot be undone!",
            self.tag.name
        )
    }

    /// `PUT /api/tags/{id}` with the draft. Returns the server's success flag.
    ///
    /// On success the saved tag takes the draft's fields and a fresh
    /// `updatedAt`; otherwise nothing changes.
    #[tracing::instrument(skip_all, fields(tag_id = self.tag.id))]
    pub async fn save<C: HttpClient>(&mut self, admin: &AdminClient<C>) -> Result<bool> {
        let reply: SuccessResponse = admin
            .request_json(
                &format!("/api/tags/{}", self.tag.id),
                &TagUpdate { tag: &self.draft },
                Method::PUT,
            )
            .await?;

        if reply.success {
            self.tag.name = self.draft.name.clone();
            self.tag.updated_at = Utc::now();
            info!(name = %self.tag.name, "Tag saved");
        } else {
            warn!("Tag save was not accepted");
        }
        Ok(reply.success)
    }

    /// `DELETE /api/tags/{id}/delete`. Returns the server's success flag.
    #[tracing::instrument(skip_all, fields(tag_id = self.tag.id))]
    pub async fn delete<C: HttpClient>(&mut self, admin: &AdminClient<C>) -> Result<bool> {
        let reply: SuccessResponse = admin
            .request_json(
                &format!("/api/tags/{}/delete", self.tag.id),
                &serde_json::json!({}),
                Method::DELETE,
            )
            .await?;

        if reply.success {
            self.is_deleted = true;
            info!("Tag deleted");
        } else {
            warn!("Tag delete was not accepted");
        }
        Ok(reply.success)
    }
}
