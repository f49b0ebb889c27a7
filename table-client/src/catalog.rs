//! Menu catalog: fetch plus client-side search and category filtering

use shared::models::MenuItem;

use crate::error::ClientResult;
use crate::gateway::CatalogGateway;

/// Pseudo-category that matches everything, always listed first
pub const ALL_CATEGORIES: &str = "All";

/// Search box + category chip state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuFilter {
    pub query: String,
    pub category: String,
}

impl Default for MenuFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
        }
    }
}

impl MenuFilter {
    pub fn new(query: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: category.into(),
        }
    }

    /// Case-insensitive name substring match within the selected category
    pub fn matches(&self, item: &MenuItem) -> bool {
        let query = self.query.trim().to_lowercase();
        let name_ok = query.is_empty() || item.name.to_lowercase().contains(&query);
        let category_ok = self.category == ALL_CATEGORIES || item.category == self.category;
        name_ok && category_ok
    }
}

/// `"All"` followed by the distinct non-blank categories in first-seen order
pub fn categories(items: &[MenuItem]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for item in items {
        let category = item.category.trim();
        if !category.is_empty() && !out.iter().any(|c| c == category) {
            out.push(category.to_string());
        }
    }
    out
}

/// Cached menu for the customer screens
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<MenuItem>,
    loaded: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<MenuItem>) -> Self {
        Self {
            items,
            loaded: true,
        }
    }

    /// Reload available items; on failure the previous items stay
    pub async fn refresh(&mut self, gateway: &dyn CatalogGateway) -> ClientResult<()> {
        self.items = gateway.list_menus(true).await?;
        self.loaded = true;
        tracing::debug!(count = self.items.len(), "Menu refreshed");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&MenuItem> {
        self.items.iter().find(|m| m.id == id)
    }

    pub fn categories(&self) -> Vec<String> {
        categories(&self.items)
    }

    pub fn filtered(&self, filter: &MenuFilter) -> Vec<&MenuItem> {
        self.items.iter().filter(|m| filter.matches(m)).collect()
    }
}
