//! Display-order allocation for categories and links.
//!
//! Appends are the only race-free ordering operation: the next position is
//! computed by a subquery inside the same INSERT that creates the row, so
//! two concurrent appenders can never read the same maximum. Reorders are
//! applied pair by pair and are best-effort; a caller that sees `missing`
//! ids or a partial failure should re-fetch and retry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sibling set within which `sort_order` values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Categories,
    Links { category_id: i64 },
}

impl fmt::Display for OrderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderScope::Categories => write!(f, "categories"),
            OrderScope::Links { category_id } => write!(f, "links of category {}", category_id),
        }
    }
}

/// Next append position in the category list: `max + 1`, or 1 when empty
pub(crate) const APPEND_CATEGORY_ORDER: &str =
    "(SELECT COALESCE(MAX(sort_order), 0) + 1 FROM categories)";

/// Next append position among one category's links (binds `category_id`)
pub(crate) const APPEND_LINK_ORDER: &str =
    "(SELECT COALESCE(MAX(sort_order), 0) + 1 FROM links WHERE category_id = ?)";

/// One `(id, new_order)` pair of a client-computed permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: i64,
    #[serde(alias = "order")]
    pub sort_order: i64,
}

/// A reorder pair that may also move the link to another category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMove {
    pub id: i64,
    #[serde(alias = "order")]
    pub sort_order: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// What a reorder managed to apply
///
/// Unknown ids are skipped, never fatal, and listed in `missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderOutcome {
    pub updated: usize,
    pub missing: Vec<i64>,
}

impl ReorderOutcome {
    pub(crate) fn record(&mut self, id: i64, rows_affected: u64) {
        if rows_affected > 0 {
            self.updated += 1;
        } else {
            self.missing.push(id);
        }
    }
}
