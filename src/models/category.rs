use serde::{Deserialize, Serialize};

use super::patch::{push_field, PatchValue};
use super::{deserialize_flag, deserialize_optional_flag, Link};
use crate::constants::MAX_TITLE_CHARS;
use crate::error::{AppError, Result};

/// Category row; `sort_order` is scoped to the whole category list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub sort_order: i64,
    pub is_private: bool,
    /// Epoch milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

/// A category together with its links, as served to the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithLinks {
    #[serde(flatten)]
    pub category: Category,
    pub items: Vec<Link>,
}

/// Payload for creating a category (its position is assigned by the store)
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_private: bool,
}

impl NewCategory {
    pub fn new(title: impl Into<String>, is_private: bool) -> Self {
        Self {
            title: title.into(),
            is_private,
        }
    }

    /// Trim the title and reject empty or oversized ones
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            title: validate_title(&self.title)?,
            is_private: self.is_private,
        })
    }
}

/// Partial update of a category; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub is_private: Option<bool>,
}

impl CategoryPatch {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            title: self.title.as_deref().map(validate_title).transpose()?,
            is_private: self.is_private,
        })
    }

    /// Column assignments for the supplied fields only
    pub fn fields(&self) -> Vec<(&'static str, PatchValue)> {
        let mut fields = Vec::new();
        push_field(&mut fields, "title", &self.title, |v| PatchValue::Text(v.clone()));
        push_field(&mut fields, "is_private", &self.is_private, |v| PatchValue::Bool(*v));
        fields
    }
}

pub(crate) fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_has_no_fields() {
        assert!(CategoryPatch::default().fields().is_empty());
    }

    #[test]
    fn test_patch_fields_only_supplied() {
        let patch: CategoryPatch = serde_json::from_str(r#"{"is_private": 1}"#).unwrap();
        assert_eq!(patch.fields(), vec![("is_private", PatchValue::Bool(true))]);
    }

    #[test]
    fn test_new_category_title_validation() {
        let ok = NewCategory::new("  Dev  ", false).validated().unwrap();
        assert_eq!(ok.title, "Dev");

        assert!(NewCategory::new("   ", false).validated().is_err());
        assert!(NewCategory::new("x".repeat(MAX_TITLE_CHARS + 1), false)
            .validated()
            .is_err());
    }
}
