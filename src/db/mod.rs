//! Storage backends.
//!
//! One [`Store`] interface with two implementations chosen at startup:
//! [`RelationalStore`] (SQLite, per-row updates) and [`SnapshotStore`]
//! (one versioned document, compare-and-swap writes). The two are not
//! drop-in equivalents, so each advertises the capabilities it has and
//! callers get [`AppError::Unsupported`] for the rest.

pub mod patch;
pub mod pool;
pub mod relational;
pub mod snapshot;
pub mod tables;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, Result};
use crate::models::{
    Category, CategoryPatch, CategoryWithLinks, Link, LinkPatch, LoginAttempt, NewCategory,
    NewLink, Snapshot, SnapshotGroup, Token, WriteOutcome,
};
use crate::ordering::{LinkMove, OrderScope, ReorderItem, ReorderOutcome};

pub use relational::RelationalStore;
pub use snapshot::SnapshotStore;

/// Per-identity failed-login records
#[async_trait]
pub trait AttemptRepo: Send + Sync {
    async fn load_attempt(&self, identity: &str) -> Result<Option<LoginAttempt>>;
    async fn save_attempt(&self, attempt: &LoginAttempt) -> Result<()>;
    async fn delete_attempt(&self, identity: &str) -> Result<()>;
}

/// Hashed API tokens
#[async_trait]
pub trait TokenRepo: Send + Sync {
    async fn create_token(&self, name: &str, token_hash: &str) -> Result<Token>;
    async fn token_hash_exists(&self, token_hash: &str) -> Result<bool>;
    async fn list_tokens(&self) -> Result<Vec<Token>>;
    async fn delete_token(&self, id: i64) -> Result<bool>;
}

/// Row-level categories, links and site settings
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// All categories ordered by `(sort_order, id)`
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Categories with their links; private rows only when `include_private`
    async fn load_dashboard(&self, include_private: bool) -> Result<Vec<CategoryWithLinks>>;

    /// Insert at the end of the category list; the returned row carries the
    /// allocated `sort_order`
    async fn create_category(&self, category: &NewCategory) -> Result<Category>;

    /// Insert several categories in one batch, each appended in turn
    async fn create_categories(&self, categories: &[NewCategory]) -> Result<usize>;

    /// Apply only the supplied fields; returns rows changed
    async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<u64>;

    /// Without `cascade`, a category that still owns links is refused
    async fn delete_category(&self, id: i64, cascade: bool) -> Result<u64>;

    /// Insert at the end of the link's category
    async fn create_link(&self, link: &NewLink) -> Result<Link>;

    /// Insert several links in one batch, each appended to its category
    async fn create_links(&self, links: &[NewLink]) -> Result<usize>;

    async fn update_link(&self, id: i64, patch: &LinkPatch) -> Result<u64>;
    async fn delete_link(&self, id: i64) -> Result<u64>;

    /// Bump the visit counter; false when the link does not exist
    async fn record_visit(&self, id: i64) -> Result<bool>;

    /// Apply each pair independently (not atomic across the list)
    async fn reorder(&self, scope: OrderScope, items: &[ReorderItem]) -> Result<ReorderOutcome>;

    /// Like [`CatalogRepo::reorder`] on links, moving category where given
    async fn reorder_with_scope_change(&self, moves: &[LinkMove]) -> Result<ReorderOutcome>;

    async fn settings(&self) -> Result<BTreeMap<String, String>>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Whole-dataset read and compare-and-swap write
#[async_trait]
pub trait SnapshotRepo: Send + Sync {
    async fn read_snapshot(&self) -> Result<Snapshot>;

    /// Replace the dataset iff `expected_version` is still current
    async fn write_snapshot(
        &self,
        data: Vec<SnapshotGroup>,
        expected_version: i64,
    ) -> Result<WriteOutcome>;
}

/// A configured storage backend
#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Cheap connectivity probe
    async fn health_check(&self) -> Result<()>;

    fn attempts(&self) -> &dyn AttemptRepo;

    fn tokens(&self) -> Option<&dyn TokenRepo> {
        None
    }

    fn catalog(&self) -> Option<&dyn CatalogRepo> {
        None
    }

    fn snapshots(&self) -> Option<&dyn SnapshotRepo> {
        None
    }
}

/// Store handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<dyn Store>;

/// Open the backend selected by `config.store_backend`
pub async fn open_store(config: &Config) -> Result<Db> {
    let store: Db = match config.store_backend {
        StoreBackend::Relational => Arc::new(RelationalStore::open(&config.database_path).await?),
        StoreBackend::Snapshot => Arc::new(SnapshotStore::open(&config.snapshot_path).await?),
    };
    tracing::info!("Using {:?} store", store.backend());
    Ok(store)
}

pub(crate) fn catalog_of(store: &dyn Store) -> Result<&dyn CatalogRepo> {
    store
        .catalog()
        .ok_or(AppError::Unsupported("categories and links (use /api/snapshot)"))
}

pub(crate) fn snapshots_of(store: &dyn Store) -> Result<&dyn SnapshotRepo> {
    store
        .snapshots()
        .ok_or(AppError::Unsupported("snapshot reads and writes"))
}

pub(crate) fn tokens_of(store: &dyn Store) -> Result<&dyn TokenRepo> {
    store.tokens().ok_or(AppError::Unsupported("API tokens"))
}
