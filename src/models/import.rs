use serde::{Deserialize, Serialize};

use super::deserialize_flag;

/// Import body: either a bare list of groups or an export document
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Document { data: Vec<ImportGroup> },
    Groups(Vec<ImportGroup>),
}

impl ImportPayload {
    pub fn into_groups(self) -> Vec<ImportGroup> {
        match self {
            ImportPayload::Document { data } => data,
            ImportPayload::Groups(groups) => groups,
        }
    }
}

/// A category name with the links to place in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportGroup {
    #[serde(alias = "categoryName", alias = "name")]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_private: bool,
    #[serde(default)]
    pub items: Vec<ImportItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportItem {
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_private: bool,
}

/// An item the importer left out, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub created_categories: usize,
    pub created_links: usize,
    pub skipped_count: usize,
    /// First few skipped items only
    pub skipped_examples: Vec<SkippedItem>,
    /// Link batches committed
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMeta {
    pub version: u32,
    pub date: String,
}

/// Export body; `data` is accepted back by the importer unchanged
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub meta: ExportMeta,
    pub data: Vec<ImportGroup>,
}
