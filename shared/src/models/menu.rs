//! Menu Model

use serde::{Deserialize, Serialize};

/// Category assigned when staff leave the field empty
pub const DEFAULT_CATEGORY: &str = "Makanan";

/// Shown in place of a missing or broken image reference
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x300?text=No+Image";

/// Menu item entity (a dish or drink on the catalog)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    /// Price in the smallest currency unit, never negative
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: i64,
}

impl MenuItem {
    /// Image to render, falling back to the placeholder for empty references
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// Update menu item payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(image_url: Option<&str>) -> MenuItem {
        MenuItem {
            id: 1,
            name: "Es Teh".into(),
            price: 5000,
            category: "Minuman".into(),
            image_url: image_url.map(Into::into),
            is_available: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_image_fallback() {
        assert_eq!(item(None).image_or_placeholder(), PLACEHOLDER_IMAGE);
        assert_eq!(item(Some("  ")).image_or_placeholder(), PLACEHOLDER_IMAGE);
        assert_eq!(
            item(Some("https://cdn.example/teh.jpg")).image_or_placeholder(),
            "https://cdn.example/teh.jpg"
        );
    }
}
