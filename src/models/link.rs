use serde::{Deserialize, Serialize};

use super::category::validate_title;
use super::patch::{push_field, PatchValue};
use super::{deserialize_flag, deserialize_optional_flag};
use crate::constants::MAX_DESCRIPTION_CHARS;
use crate::error::{AppError, Result};
use crate::security::validate_url;

/// Link row; `sort_order` is scoped to links sharing `category_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub icon: String,
    /// Independent of the owning category's privacy
    pub is_private: bool,
    pub sort_order: i64,
    pub visits: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payload for creating a link at the end of its category
#[derive(Debug, Clone, Deserialize)]
pub struct NewLink {
    pub category_id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_private: bool,
}

impl NewLink {
    /// Trim fields and enforce the title, URL and length rules
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            category_id: self.category_id,
            title: validate_title(&self.title)?,
            url: checked_url(&self.url)?,
            description: checked_text("Description", &self.description)?,
            icon: checked_text("Icon", &self.icon)?,
            is_private: self.is_private,
        })
    }
}

/// Partial update of a link; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkPatch {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub is_private: Option<bool>,
}

impl LinkPatch {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            category_id: self.category_id,
            title: self.title.as_deref().map(validate_title).transpose()?,
            url: self.url.as_deref().map(checked_url).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| checked_text("Description", d))
                .transpose()?,
            icon: self
                .icon
                .as_deref()
                .map(|i| checked_text("Icon", i))
                .transpose()?,
            is_private: self.is_private,
        })
    }

    /// Column assignments for the supplied fields only
    pub fn fields(&self) -> Vec<(&'static str, PatchValue)> {
        let mut fields = Vec::new();
        push_field(&mut fields, "category_id", &self.category_id, |v| PatchValue::Int(*v));
        push_field(&mut fields, "title", &self.title, |v| PatchValue::Text(v.clone()));
        push_field(&mut fields, "url", &self.url, |v| PatchValue::Text(v.clone()));
        push_field(&mut fields, "description", &self.description, |v| {
            PatchValue::Text(v.clone())
        });
        push_field(&mut fields, "icon", &self.icon, |v| PatchValue::Text(v.clone()));
        push_field(&mut fields, "is_private", &self.is_private, |v| PatchValue::Bool(*v));
        fields
    }
}

fn checked_url(url: &str) -> Result<String> {
    validate_url(url)
        .map_err(|reason| AppError::Validation(format!("Invalid url: {}", reason.as_str())))?;
    Ok(url.trim().to_string())
}

fn checked_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(value.to_string())
}
