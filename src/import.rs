//! Bulk import and export of the category/link catalog.
//!
//! Import runs in two phases. Missing categories are created first, in one
//! batch, so that every link can be resolved to a category id. Links are then
//! validated one by one and committed in fixed-size chunks. Invalid links
//! are reported, never fatal. A failure part-way leaves earlier chunks in
//! place.

use std::collections::HashMap;

use chrono::Utc;

use crate::constants::{
    MAX_BATCH_STATEMENTS, MAX_DESCRIPTION_CHARS, MAX_SKIPPED_EXAMPLES, MAX_TITLE_CHARS,
};
use crate::db::CatalogRepo;
use crate::error::Result;
use crate::models::{
    clip, CategoryWithLinks, ExportDocument, ExportMeta, ImportGroup, ImportItem, ImportReport,
    NewCategory, NewLink, SkippedItem,
};
use crate::security::validate_url;

/// Current export document format
const EXPORT_FORMAT_VERSION: u32 = 1;

pub struct BulkImporter<'a> {
    catalog: &'a dyn CatalogRepo,
    chunk_size: usize,
}

/// Category names are matched after trimming and the title length cut
fn group_name(raw: &str) -> String {
    clip(raw, MAX_TITLE_CHARS)
}

impl<'a> BulkImporter<'a> {
    /// `chunk_size` is clamped to what one batch may hold
    pub fn new(catalog: &'a dyn CatalogRepo, chunk_size: usize) -> Self {
        Self {
            catalog,
            chunk_size: chunk_size.clamp(1, MAX_BATCH_STATEMENTS),
        }
    }

    pub async fn import(&self, groups: Vec<ImportGroup>) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        let (ids, created) = self.ensure_categories(&groups).await?;
        report.created_categories = created;

        let mut pending = Vec::new();
        for group in groups {
            let category_id = match ids.get(&group_name(&group.category)) {
                Some(&id) => id,
                None => {
                    for item in group.items {
                        skip(&mut report, item.url, "missing category name");
                    }
                    continue;
                }
            };

            for item in group.items {
                match prepare_link(category_id, item) {
                    Ok(link) => pending.push(link),
                    Err((url, reason)) => skip(&mut report, url, reason),
                }
            }
        }

        for chunk in pending.chunks(self.chunk_size) {
            report.created_links += self.catalog.create_links(chunk).await?;
            report.chunks += 1;
            tracing::debug!("Import chunk {} committed ({} links)", report.chunks, chunk.len());
        }

        tracing::info!(
            "Import finished: {} categories, {} links in {} chunks, {} skipped",
            report.created_categories,
            report.created_links,
            report.chunks,
            report.skipped_count
        );
        Ok(report)
    }

    /// Resolve every group name to a category id, creating the unknown ones
    async fn ensure_categories(
        &self,
        groups: &[ImportGroup],
    ) -> Result<(HashMap<String, i64>, usize)> {
        let ids = self.category_ids().await?;

        let mut queued: Vec<NewCategory> = Vec::new();
        for group in groups {
            let name = group_name(&group.category);
            if name.is_empty() || ids.contains_key(&name) || queued.iter().any(|c| c.title == name)
            {
                continue;
            }
            queued.push(NewCategory::new(name, group.is_private));
        }

        if queued.is_empty() {
            return Ok((ids, 0));
        }

        let created = self.catalog.create_categories(&queued).await?;
        Ok((self.category_ids().await?, created))
    }

    /// Title -> id; the first category in display order wins
    async fn category_ids(&self) -> Result<HashMap<String, i64>> {
        let mut ids = HashMap::new();
        for category in self.catalog.list_categories().await? {
            ids.entry(category.title).or_insert(category.id);
        }
        Ok(ids)
    }
}

fn skip(report: &mut ImportReport, url: String, reason: &str) {
    report.skipped_count += 1;
    if report.skipped_examples.len() < MAX_SKIPPED_EXAMPLES {
        report.skipped_examples.push(SkippedItem {
            url,
            reason: reason.to_string(),
        });
    }
}

/// Validate one import item; a rejected item comes back as `(url, reason)`
fn prepare_link(
    category_id: i64,
    item: ImportItem,
) -> std::result::Result<NewLink, (String, &'static str)> {
    let url = item.url.trim().to_string();
    if let Err(rejection) = validate_url(&url) {
        return Err((item.url, rejection.as_str()));
    }

    let mut title = clip(&item.title, MAX_TITLE_CHARS);
    if title.is_empty() {
        title = clip(&url, MAX_TITLE_CHARS);
    }

    Ok(NewLink {
        category_id,
        title,
        url,
        description: clip(item.description.as_deref().unwrap_or(""), MAX_DESCRIPTION_CHARS),
        icon: clip(item.icon.as_deref().unwrap_or(""), MAX_DESCRIPTION_CHARS),
        is_private: item.is_private,
    })
}

/// Build an export document the importer accepts unchanged
pub fn export_document(dashboard: Vec<CategoryWithLinks>) -> ExportDocument {
    let data = dashboard
        .into_iter()
        .map(|entry| ImportGroup {
            category: entry.category.title,
            is_private: entry.category.is_private,
            items: entry
                .items
                .into_iter()
                .map(|link| ImportItem {
                    title: link.title,
                    url: link.url,
                    description: Some(link.description).filter(|d| !d.is_empty()),
                    icon: Some(link.icon).filter(|i| !i.is_empty()),
                    is_private: link.is_private,
                })
                .collect(),
        })
        .collect();

    ExportDocument {
        meta: ExportMeta {
            version: EXPORT_FORMAT_VERSION,
            date: Utc::now().to_rfc3339(),
        },
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RelationalStore;
    use crate::models::ImportPayload;

    fn item(title: &str, url: &str) -> ImportItem {
        ImportItem {
            title: title.to_string(),
            url: url.to_string(),
            description: None,
            icon: None,
            is_private: false,
        }
    }

    fn group(category: &str, items: Vec<ImportItem>) -> ImportGroup {
        ImportGroup {
            category: category.to_string(),
            is_private: false,
            items,
        }
    }

    async fn link_urls(store: &RelationalStore) -> Vec<(String, Vec<String>)> {
        store
            .load_dashboard(true)
            .await
            .unwrap()
            .into_iter()
            .map(|c| {
                (
                    c.category.title,
                    c.items.into_iter().map(|l| l.url).collect(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_duplicate_groups_merge_into_one_category() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let importer = BulkImporter::new(&store, 50);

        let report = importer
            .import(vec![
                group("Dev", vec![item("Rust", "https://rust-lang.org")]),
                group("Dev", vec![item("Crates", "https://crates.io")]),
            ])
            .await
            .unwrap();

        assert_eq!(report.created_categories, 1);
        assert_eq!(report.created_links, 2);
        assert_eq!(
            link_urls(&store).await,
            vec![(
                "Dev".to_string(),
                vec![
                    "https://rust-lang.org".to_string(),
                    "https://crates.io".to_string()
                ]
            )]
        );
    }

    #[tokio::test]
    async fn test_invalid_urls_are_skipped_not_fatal() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let importer = BulkImporter::new(&store, 50);

        let report = importer
            .import(vec![group(
                "Mixed",
                vec![
                    item("Good", "https://example.com"),
                    item("Ftp", "ftp://x.com"),
                    item("Also good", "http://example.org/path"),
                ],
            )])
            .await
            .unwrap();

        assert_eq!(report.created_links, 2);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.skipped_examples[0].url, "ftp://x.com");

        let urls = &link_urls(&store).await[0].1;
        assert!(!urls.iter().any(|u| u.starts_with("ftp")));
    }

    #[tokio::test]
    async fn test_links_committed_in_chunks() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let importer = BulkImporter::new(&store, 2);

        let items = (0..5)
            .map(|i| item(&format!("L{}", i), &format!("https://l{}.example", i)))
            .collect();
        let report = importer.import(vec![group("Bulk", items)]).await.unwrap();

        assert_eq!(report.created_links, 5);
        assert_eq!(report.chunks, 3);

        let positions: Vec<i64> = store.load_dashboard(true).await.unwrap()[0]
            .items
            .iter()
            .map(|l| l.sort_order)
            .collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_chunk_size_is_clamped() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        assert_eq!(BulkImporter::new(&store, 0).chunk_size, 1);
        assert_eq!(
            BulkImporter::new(&store, 10_000).chunk_size,
            MAX_BATCH_STATEMENTS
        );
    }

    #[tokio::test]
    async fn test_reimport_reuses_categories_but_duplicates_links() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let importer = BulkImporter::new(&store, 50);
        let groups = vec![group("Dev", vec![item("Rust", "https://rust-lang.org")])];

        importer.import(groups.clone()).await.unwrap();
        let second = importer.import(groups).await.unwrap();

        assert_eq!(second.created_categories, 0);
        assert_eq!(second.created_links, 1);
        let state = link_urls(&store).await;
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_skipped_examples_are_capped() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let importer = BulkImporter::new(&store, 50);

        let items = (0..12)
            .map(|i| item("bad", &format!("javascript:alert({})", i)))
            .collect();
        let report = importer.import(vec![group("Bad", items)]).await.unwrap();

        assert_eq!(report.skipped_count, 12);
        assert_eq!(report.skipped_examples.len(), MAX_SKIPPED_EXAMPLES);
        assert_eq!(report.created_links, 0);
        assert_eq!(report.chunks, 0);
    }

    #[tokio::test]
    async fn test_empty_title_falls_back_to_url() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        BulkImporter::new(&store, 50)
            .import(vec![group("Dev", vec![item("  ", "https://docs.rs")])])
            .await
            .unwrap();

        let dashboard = store.load_dashboard(true).await.unwrap();
        assert_eq!(dashboard[0].items[0].title, "https://docs.rs");
    }

    #[tokio::test]
    async fn test_export_roundtrips_through_import() {
        let source = RelationalStore::open_in_memory().await.unwrap();
        BulkImporter::new(&source, 50)
            .import(vec![
                group("A", vec![item("One", "https://one.example")]),
                group("B", vec![item("Two", "https://two.example")]),
            ])
            .await
            .unwrap();

        let exported = export_document(source.load_dashboard(true).await.unwrap());
        assert_eq!(exported.meta.version, 1);

        let json = serde_json::to_string(&exported).unwrap();
        let payload: ImportPayload = serde_json::from_str(&json).unwrap();

        let target = RelationalStore::open_in_memory().await.unwrap();
        BulkImporter::new(&target, 50)
            .import(payload.into_groups())
            .await
            .unwrap();

        assert_eq!(link_urls(&target).await, link_urls(&source).await);
    }
}
