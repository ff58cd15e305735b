//! Core data models for the search pipeline.
//!
//! These types represent the per-query result records held in the
//! [`ResultStore`](crate::store::ResultStore) and the segments produced by
//! the [`annotate`](crate::annotate::annotate) pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one query key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// One scored snippet from `responseSet[0].response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnippet {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub document_index: usize,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One source document from `responseSet[0].document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl SourceDocument {
    /// Looks up a metadata value by name (e.g. `"title"`, `"url"`).
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }
}

/// Extracted payload of a successful backend call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchAnswer {
    pub summary: String,
    pub references: Vec<ResponseSnippet>,
    pub documents: Vec<SourceDocument>,
}

/// Per-query state record.
///
/// `summary` is meaningful only when `status == Loaded`, `error` only when
/// `status == Error`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResult {
    pub status: SearchStatus,
    pub summary: String,
    pub error: Option<String>,
    pub references: Vec<ResponseSnippet>,
    pub documents: Vec<SourceDocument>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One renderable unit of an annotated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    PlainText { content: String },
    ReferenceLink { label: String, target: String },
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Segment::PlainText {
            content: content.into(),
        }
    }

    pub fn link(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Segment::ReferenceLink {
            label: reference.clone(),
            target: reference,
        }
    }
}
