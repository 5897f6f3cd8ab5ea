use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validated fields for creating or replacing a category.
#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub icon_name: String,
}

impl CategoryFields {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Lowercases, drops anything that is not an ASCII word character,
/// whitespace or hyphen, then joins the remaining words with single hyphens.
pub fn slugify(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_sep = false;
    for c in cleaned.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !slug.is_empty() {
            slug.push('-');
        }
        pending_sep = false;
        slug.push(c);
    }
    slug
}
