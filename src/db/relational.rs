use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::patch::apply_patch;
use super::pool::{create_memory_pool, create_pool};
use super::{AttemptRepo, CatalogRepo, Store, TokenRepo};
use crate::config::StoreBackend;
use crate::error::{AppError, Result};
use crate::models::{
    Category, CategoryPatch, CategoryWithLinks, Link, LinkPatch, LoginAttempt, NewCategory,
    NewLink, Token,
};
use crate::ordering::{
    LinkMove, OrderScope, ReorderItem, ReorderOutcome, APPEND_CATEGORY_ORDER, APPEND_LINK_ORDER,
};
use crate::security::now_ms;

/// SQLite-backed store with row-level operations
#[derive(Clone)]
pub struct RelationalStore {
    pool: SqlitePool,
}

fn insert_category_sql() -> String {
    format!(
        "INSERT INTO categories (title, sort_order, is_private, created_at, updated_at) \
         VALUES (?, {}, ?, ?, ?) RETURNING *",
        APPEND_CATEGORY_ORDER
    )
}

fn insert_link_sql() -> String {
    format!(
        "INSERT INTO links \
         (category_id, title, url, description, icon, is_private, sort_order, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, {}, ?, ?) RETURNING *",
        APPEND_LINK_ORDER
    )
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// A link referencing a missing category surfaces as `ScopeNotFound`
fn link_write_error(err: sqlx::Error, category_id: Option<i64>) -> AppError {
    match category_id {
        Some(id) if is_foreign_key_violation(&err) => {
            AppError::ScopeNotFound(format!("Category {} does not exist", id))
        }
        _ => AppError::Database(err),
    }
}

impl RelationalStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = create_pool(path.as_ref()).await?;
        Ok(Self { pool })
    }

    pub async fn open_in_memory() -> Result<Self> {
        let pool = create_memory_pool().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn category_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn require_category(&self, id: i64) -> Result<()> {
        if self.category_exists(id).await? {
            Ok(())
        } else {
            Err(AppError::ScopeNotFound(format!(
                "Category {} does not exist",
                id
            )))
        }
    }
}

#[async_trait]
impl Store for RelationalStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Relational
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn attempts(&self) -> &dyn AttemptRepo {
        self
    }

    fn tokens(&self) -> Option<&dyn TokenRepo> {
        Some(self)
    }

    fn catalog(&self) -> Option<&dyn CatalogRepo> {
        Some(self)
    }
}

#[async_trait]
impl AttemptRepo for RelationalStore {
    async fn load_attempt(&self, identity: &str) -> Result<Option<LoginAttempt>> {
        let record = sqlx::query_as::<_, LoginAttempt>(
            "SELECT identity, attempts, first_attempt, locked_until \
             FROM login_attempts WHERE identity = ?",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn save_attempt(&self, attempt: &LoginAttempt) -> Result<()> {
        sqlx::query(
            "INSERT INTO login_attempts (identity, attempts, first_attempt, locked_until) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(identity) DO UPDATE SET \
                 attempts = excluded.attempts, \
                 first_attempt = excluded.first_attempt, \
                 locked_until = excluded.locked_until",
        )
        .bind(&attempt.identity)
        .bind(attempt.attempts)
        .bind(attempt.first_attempt)
        .bind(attempt.locked_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_attempt(&self, identity: &str) -> Result<()> {
        sqlx::query("DELETE FROM login_attempts WHERE identity = ?")
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenRepo for RelationalStore {
    async fn create_token(&self, name: &str, token_hash: &str) -> Result<Token> {
        let token = sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (name, token_hash, created_at) VALUES (?, ?, ?) \
             RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(token_hash)
        .bind(now_ms())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created API token {} ({})", token.id, token.name);
        Ok(token)
    }

    async fn token_hash_exists(&self, token_hash: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn list_tokens(&self) -> Result<Vec<Token>> {
        let tokens =
            sqlx::query_as::<_, Token>("SELECT id, name, created_at FROM tokens ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(tokens)
    }

    async fn delete_token(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CatalogRepo for RelationalStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY sort_order, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn load_dashboard(&self, include_private: bool) -> Result<Vec<CategoryWithLinks>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE ? OR is_private = 0 ORDER BY sort_order, id",
        )
        .bind(include_private)
        .fetch_all(&self.pool)
        .await?;

        let links = sqlx::query_as::<_, Link>(
            "SELECT * FROM links WHERE ? OR is_private = 0 ORDER BY category_id, sort_order, id",
        )
        .bind(include_private)
        .fetch_all(&self.pool)
        .await?;

        let mut by_category: HashMap<i64, Vec<Link>> = HashMap::new();
        for link in links {
            by_category.entry(link.category_id).or_default().push(link);
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let items = by_category.remove(&category.id).unwrap_or_default();
                CategoryWithLinks { category, items }
            })
            .collect())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let now = now_ms();
        let created = sqlx::query_as::<_, Category>(&insert_category_sql())
            .bind(&category.title)
            .bind(category.is_private)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            "Created category {} at position {}",
            created.id,
            created.sort_order
        );
        Ok(created)
    }

    async fn create_categories(&self, categories: &[NewCategory]) -> Result<usize> {
        if categories.is_empty() {
            return Ok(0);
        }

        let sql = insert_category_sql();
        let now = now_ms();
        let mut tx = self.pool.begin().await?;
        for category in categories {
            sqlx::query(&sql)
                .bind(&category.title)
                .bind(category.is_private)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(categories.len())
    }

    async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let changed = apply_patch(&mut conn, "categories", id, patch.fields(), now_ms()).await?;
        Ok(changed)
    }

    async fn delete_category(&self, id: i64, cascade: bool) -> Result<u64> {
        if !cascade {
            return match sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
            {
                Ok(result) => Ok(result.rows_affected()),
                Err(err) if is_foreign_key_violation(&err) => Err(AppError::CategoryNotEmpty),
                Err(err) => Err(err.into()),
            };
        }

        let mut tx = self.pool.begin().await?;
        let links = sqlx::query("DELETE FROM links WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!("Deleted category {} with {} links", id, links);
        }
        Ok(deleted)
    }

    async fn create_link(&self, link: &NewLink) -> Result<Link> {
        let now = now_ms();
        let created = sqlx::query_as::<_, Link>(&insert_link_sql())
            .bind(link.category_id)
            .bind(&link.title)
            .bind(&link.url)
            .bind(&link.description)
            .bind(&link.icon)
            .bind(link.is_private)
            .bind(link.category_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| link_write_error(e, Some(link.category_id)))?;

        tracing::info!(
            "Created link {} in category {} at position {}",
            created.id,
            created.category_id,
            created.sort_order
        );
        Ok(created)
    }

    async fn create_links(&self, links: &[NewLink]) -> Result<usize> {
        if links.is_empty() {
            return Ok(0);
        }

        let sql = insert_link_sql();
        let now = now_ms();
        let mut tx = self.pool.begin().await?;
        for link in links {
            sqlx::query(&sql)
                .bind(link.category_id)
                .bind(&link.title)
                .bind(&link.url)
                .bind(&link.description)
                .bind(&link.icon)
                .bind(link.is_private)
                .bind(link.category_id)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| link_write_error(e, Some(link.category_id)))?;
        }
        tx.commit().await?;

        Ok(links.len())
    }

    async fn update_link(&self, id: i64, patch: &LinkPatch) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        apply_patch(&mut conn, "links", id, patch.fields(), now_ms())
            .await
            .map_err(|e| link_write_error(e, patch.category_id))
    }

    async fn delete_link(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_visit(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE links SET visits = visits + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, scope: OrderScope, items: &[ReorderItem]) -> Result<ReorderOutcome> {
        if let OrderScope::Links { category_id } = scope {
            self.require_category(category_id).await?;
        }

        let now = now_ms();
        let mut outcome = ReorderOutcome::default();
        for item in items {
            let query = match scope {
                OrderScope::Categories => {
                    sqlx::query("UPDATE categories SET sort_order = ?, updated_at = ? WHERE id = ?")
                        .bind(item.sort_order)
                        .bind(now)
                        .bind(item.id)
                }
                OrderScope::Links { category_id } => sqlx::query(
                    "UPDATE links SET sort_order = ?, updated_at = ? \
                     WHERE id = ? AND category_id = ?",
                )
                .bind(item.sort_order)
                .bind(now)
                .bind(item.id)
                .bind(category_id),
            };
            let result = query.execute(&self.pool).await?;
            outcome.record(item.id, result.rows_affected());
        }

        if !outcome.missing.is_empty() {
            tracing::warn!(
                "Reorder of {} skipped unknown ids {:?}",
                scope,
                outcome.missing
            );
        }
        Ok(outcome)
    }

    async fn reorder_with_scope_change(&self, moves: &[LinkMove]) -> Result<ReorderOutcome> {
        let targets: BTreeSet<i64> = moves.iter().filter_map(|m| m.category_id).collect();
        for category_id in targets {
            self.require_category(category_id).await?;
        }

        let now = now_ms();
        let mut outcome = ReorderOutcome::default();
        for item in moves {
            let query = match item.category_id {
                Some(category_id) => sqlx::query(
                    "UPDATE links SET sort_order = ?, category_id = ?, updated_at = ? WHERE id = ?",
                )
                .bind(item.sort_order)
                .bind(category_id)
                .bind(now)
                .bind(item.id),
                None => sqlx::query("UPDATE links SET sort_order = ?, updated_at = ? WHERE id = ?")
                    .bind(item.sort_order)
                    .bind(now)
                    .bind(item.id),
            };
            let result = query.execute(&self.pool).await?;
            outcome.record(item.id, result.rows_affected());
        }
        Ok(outcome)
    }

    async fn settings(&self) -> Result<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM configs ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO configs (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store() -> RelationalStore {
        RelationalStore::open_in_memory().await.unwrap()
    }

    fn new_link(category_id: i64, title: &str) -> NewLink {
        NewLink {
            category_id,
            title: title.to_string(),
            url: format!("https://{}.example", title.to_lowercase()),
            description: String::new(),
            icon: String::new(),
            is_private: false,
        }
    }

    #[tokio::test]
    async fn test_append_then_reorder() {
        let store = store().await;

        let first = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let second = store.create_category(&NewCategory::new("B", false)).await.unwrap();
        assert_eq!(first.sort_order, 1);
        assert_eq!(second.sort_order, 2);

        let outcome = store
            .reorder(
                OrderScope::Categories,
                &[
                    ReorderItem { id: second.id, sort_order: 0 },
                    ReorderItem { id: first.id, sort_order: 1 },
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.updated, 2);

        let ids: Vec<i64> = store
            .list_categories()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_distinct_positions() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RelationalStore::open(dir.path().join("nav.db")).await.unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_category(&NewCategory::new(format!("c{}", i), false))
                        .await
                        .unwrap()
                        .sort_order
                })
            })
            .collect();

        let mut orders = Vec::new();
        for handle in handles {
            orders.push(handle.await.unwrap());
        }
        orders.sort_unstable();

        assert_eq!(orders, (1..=16).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_link_positions_are_scoped_per_category() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let b = store.create_category(&NewCategory::new("B", false)).await.unwrap();

        let a1 = store.create_link(&new_link(a.id, "One")).await.unwrap();
        let a2 = store.create_link(&new_link(a.id, "Two")).await.unwrap();
        let b1 = store.create_link(&new_link(b.id, "Three")).await.unwrap();

        assert_eq!((a1.sort_order, a2.sort_order, b1.sort_order), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_link_into_missing_category() {
        let store = store().await;
        let err = store.create_link(&new_link(42, "Orphan")).await.unwrap_err();
        assert!(matches!(err, AppError::ScopeNotFound(_)));
    }

    #[tokio::test]
    async fn test_reorder_skips_unknown_and_foreign_ids() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let b = store.create_category(&NewCategory::new("B", false)).await.unwrap();
        let own = store.create_link(&new_link(a.id, "Own")).await.unwrap();
        let other = store.create_link(&new_link(b.id, "Other")).await.unwrap();

        let outcome = store
            .reorder(
                OrderScope::Links { category_id: a.id },
                &[
                    ReorderItem { id: own.id, sort_order: 10 },
                    ReorderItem { id: other.id, sort_order: 11 },
                    ReorderItem { id: 999, sort_order: 12 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.missing, vec![other.id, 999]);
    }

    #[tokio::test]
    async fn test_reorder_in_missing_category_changes_nothing() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let link = store.create_link(&new_link(a.id, "Keep")).await.unwrap();

        let err = store
            .reorder_with_scope_change(&[
                LinkMove { id: link.id, sort_order: 5, category_id: None },
                LinkMove { id: link.id, sort_order: 6, category_id: Some(77) },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ScopeNotFound(_)));

        let dashboard = store.load_dashboard(true).await.unwrap();
        assert_eq!(dashboard[0].items[0].sort_order, 1);
    }

    #[tokio::test]
    async fn test_move_link_between_categories() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let b = store.create_category(&NewCategory::new("B", false)).await.unwrap();
        let link = store.create_link(&new_link(a.id, "Mover")).await.unwrap();

        let outcome = store
            .reorder_with_scope_change(&[LinkMove {
                id: link.id,
                sort_order: 3,
                category_id: Some(b.id),
            }])
            .await
            .unwrap();
        assert_eq!(outcome.updated, 1);

        let dashboard = store.load_dashboard(true).await.unwrap();
        assert!(dashboard[0].items.is_empty());
        assert_eq!(dashboard[1].items[0].id, link.id);
        assert_eq!(dashboard[1].items[0].sort_order, 3);
    }

    #[tokio::test]
    async fn test_delete_non_empty_category() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        store.create_link(&new_link(a.id, "Child")).await.unwrap();

        let err = store.delete_category(a.id, false).await.unwrap_err();
        assert!(matches!(err, AppError::CategoryNotEmpty));
        assert_eq!(store.list_categories().await.unwrap().len(), 1);

        assert_eq!(store.delete_category(a.id, true).await.unwrap(), 1);
        assert!(store.load_dashboard(true).await.unwrap().is_empty());
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_patch_touches_only_supplied_fields() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", true)).await.unwrap();

        assert_eq!(
            store.update_category(a.id, &CategoryPatch::default()).await.unwrap(),
            0
        );

        let patch = CategoryPatch {
            title: Some("Renamed".to_string()),
            is_private: None,
        };
        assert_eq!(store.update_category(a.id, &patch).await.unwrap(), 1);

        let updated = &store.list_categories().await.unwrap()[0];
        assert_eq!(updated.title, "Renamed");
        assert!(updated.is_private);
        assert_eq!(updated.sort_order, a.sort_order);
    }

    #[tokio::test]
    async fn test_update_link_to_missing_category() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let link = store.create_link(&new_link(a.id, "L")).await.unwrap();

        let patch = LinkPatch {
            category_id: Some(404),
            ..LinkPatch::default()
        };
        let err = store.update_link(link.id, &patch).await.unwrap_err();
        assert!(matches!(err, AppError::ScopeNotFound(_)));
    }

    #[tokio::test]
    async fn test_foreign_key_error_without_category_is_not_a_scope_error() {
        let store = store().await;
        let err = sqlx::query(
            "INSERT INTO links (category_id, title, url, sort_order, created_at, updated_at) \
             VALUES (999, 't', 'https://t.example', 1, 0, 0)",
        )
        .execute(store.pool())
        .await
        .unwrap_err();
        assert!(is_foreign_key_violation(&err));

        assert!(matches!(link_write_error(err, None), AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_anonymous_dashboard_hides_private_rows() {
        let store = store().await;
        let public = store.create_category(&NewCategory::new("Public", false)).await.unwrap();
        let hidden = store.create_category(&NewCategory::new("Hidden", true)).await.unwrap();
        store.create_link(&new_link(public.id, "Open")).await.unwrap();
        store
            .create_link(&NewLink {
                is_private: true,
                ..new_link(public.id, "Secret")
            })
            .await
            .unwrap();
        store.create_link(&new_link(hidden.id, "Inner")).await.unwrap();

        let anonymous = store.load_dashboard(false).await.unwrap();
        assert_eq!(anonymous.len(), 1);
        assert_eq!(anonymous[0].items.len(), 1);
        assert_eq!(anonymous[0].items[0].title, "Open");

        let full = store.load_dashboard(true).await.unwrap();
        assert_eq!(full.len(), 2);
        assert_eq!(full[0].items.len(), 2);
    }

    #[tokio::test]
    async fn test_record_visit() {
        let store = store().await;
        let a = store.create_category(&NewCategory::new("A", false)).await.unwrap();
        let link = store.create_link(&new_link(a.id, "Hit")).await.unwrap();

        assert!(store.record_visit(link.id).await.unwrap());
        assert!(store.record_visit(link.id).await.unwrap());
        assert!(!store.record_visit(link.id + 1).await.unwrap());

        let dashboard = store.load_dashboard(true).await.unwrap();
        assert_eq!(dashboard[0].items[0].visits, 2);
    }

    #[tokio::test]
    async fn test_batch_inserts_append_in_order() {
        let store = store().await;
        store.create_category(&NewCategory::new("First", false)).await.unwrap();

        let created = store
            .create_categories(&[NewCategory::new("X", false), NewCategory::new("Y", false)])
            .await
            .unwrap();
        assert_eq!(created, 2);

        let orders: Vec<(String, i64)> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.title, c.sort_order))
            .collect();
        assert_eq!(
            orders,
            vec![
                ("First".to_string(), 1),
                ("X".to_string(), 2),
                ("Y".to_string(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_settings_upsert() {
        let store = store().await;
        store.put_setting("site_title", "Old").await.unwrap();
        store.put_setting("site_title", "New").await.unwrap();

        let settings = store.settings().await.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings["site_title"], "New");
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let store = store().await;
        let token = store.create_token("ci", "abc123").await.unwrap();

        assert!(store.token_hash_exists("abc123").await.unwrap());
        assert!(!store.token_hash_exists("other").await.unwrap());
        assert_eq!(store.list_tokens().await.unwrap(), vec![token.clone()]);

        assert!(store.delete_token(token.id).await.unwrap());
        assert!(!store.delete_token(token.id).await.unwrap());
        assert!(!store.token_hash_exists("abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_attempt_roundtrip() {
        let store = store().await;
        let mut record = LoginAttempt::first("10.0.0.1", 1_000);
        store.save_attempt(&record).await.unwrap();

        record.attempts = 3;
        store.save_attempt(&record).await.unwrap();
        assert_eq!(store.load_attempt("10.0.0.1").await.unwrap(), Some(record));

        store.delete_attempt("10.0.0.1").await.unwrap();
        assert_eq!(store.load_attempt("10.0.0.1").await.unwrap(), None);
    }
}
