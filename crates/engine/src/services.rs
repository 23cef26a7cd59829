//! Service catalog entries.
//!
//! The fee is copied onto every request at creation time, so editing a
//! service never changes what an existing request or task is worth.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Highest fee a service may carry: ₹1,00,00,000.
pub const MAX_FEE_MINOR: i64 = 1_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Stable slug, e.g. `income-cert`.
    pub id: String,
    pub name: String,
    pub category: String,
    pub fee_minor: i64,
}

/// Canonical form used for the uniqueness check on names.
///
/// NFKC folds compatibility characters, whitespace runs collapse to one
/// space and letters are lowercased.
pub(crate) fn normalize_service_name(name: &str) -> String {
    name.nfkc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Slug derived from a display name: lowercase ascii alphanumerics joined by `-`.
pub(crate) fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for ch in name.nfkd().filter(char::is_ascii) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub name_norm: String,
    pub category: String,
    pub fee_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Service> for ActiveModel {
    fn from(service: &Service) -> Self {
        Self {
            id: ActiveValue::Set(service.id.clone()),
            name: ActiveValue::Set(service.name.clone()),
            name_norm: ActiveValue::Set(normalize_service_name(&service.name)),
            category: ActiveValue::Set(service.category.clone()),
            fee_minor: ActiveValue::Set(service.fee_minor),
        }
    }
}

impl From<Model> for Service {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            fee_minor: model.fee_minor,
        }
    }
}
