use serde::{Deserialize, Serialize};

use super::clip;
use crate::constants::{DEFAULT_CATEGORY_TITLE, SNAPSHOT_TITLE_CHARS, SNAPSHOT_URL_CHARS};

/// The whole dataset of the single-blob deployment, paired with its version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: i64,
    pub data: Vec<SnapshotGroup>,
}

/// One category and its links, in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Outcome of a compare-and-swap write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Committed {
        new_version: i64,
    },
    /// The stored version moved on; nothing was written
    Conflict {
        current_version: i64,
        pending: Vec<SnapshotGroup>,
    },
}

/// Clean up a client-supplied snapshot before it is stored
///
/// - group titles fall back to `Default` and are cut to 50 characters
/// - item titles are cut to 50 characters
/// - `javascript:` URLs are dropped, scheme-less URLs get `https://`
/// - URLs are cut to 500 characters; items left without a URL are removed
pub fn sanitize_groups(groups: Vec<SnapshotGroup>) -> Vec<SnapshotGroup> {
    groups
        .into_iter()
        .map(|group| {
            let title = clip(&group.category, SNAPSHOT_TITLE_CHARS);
            SnapshotGroup {
                category: if title.is_empty() {
                    DEFAULT_CATEGORY_TITLE.to_string()
                } else {
                    title
                },
                items: group
                    .items
                    .into_iter()
                    .filter_map(|item| {
                        let url = sanitize_url(&item.url)?;
                        Some(SnapshotItem {
                            title: clip(&item.title, SNAPSHOT_TITLE_CHARS),
                            url,
                        })
                    })
                    .collect(),
            }
        })
        .collect()
}

fn sanitize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() || url.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }

    let url = if has_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    Some(url.chars().take(SNAPSHOT_URL_CHARS).collect())
}

/// `scheme:` where scheme is `[A-Za-z0-9.+-]+`
fn has_scheme(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
        }
        None => false,
    }
}
