//! Menu Repository

use super::{RepoError, RepoResult};
use shared::models::{DEFAULT_CATEGORY, MenuItem, MenuItemCreate, MenuItemUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, price, category, image_url, is_available, created_at";

/// All menu items, newest first
pub async fn find_all(pool: &SqlitePool, available_only: bool) -> RepoResult<Vec<MenuItem>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM menus WHERE (?1 = 0 OR is_available = 1) ORDER BY id DESC"
    );
    let rows = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(available_only)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("SELECT {COLUMNS} FROM menus WHERE id = ?");
    let row = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create a menu item; empty category falls back to the default
pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> RepoResult<MenuItem> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    let category = data
        .category
        .as_deref()
        .and_then(shared::util::non_blank)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let image_url = data.image_url.as_deref().and_then(shared::util::non_blank);

    sqlx::query(
        "INSERT INTO menus (id, name, price, category, image_url, is_available, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(data.price)
    .bind(category)
    .bind(image_url)
    .bind(data.is_available.unwrap_or(true))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

/// Partial update; `None` fields keep their value
pub async fn update(pool: &SqlitePool, id: i64, data: MenuItemUpdate) -> RepoResult<MenuItem> {
    let name = data.name.as_deref().map(str::trim);
    let category = data.category.as_deref().and_then(shared::util::non_blank);

    let rows = sqlx::query(
        "UPDATE menus SET name = COALESCE(?1, name), price = COALESCE(?2, price), category = COALESCE(?3, category), image_url = COALESCE(?4, image_url), is_available = COALESCE(?5, is_available) WHERE id = ?6",
    )
    .bind(name)
    .bind(data.price)
    .bind(category)
    .bind(data.image_url)
    .bind(data.is_available)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu item {id} not found")));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
}

/// Flip `is_available` and return the new row
pub async fn toggle_availability(pool: &SqlitePool, id: i64) -> RepoResult<MenuItem> {
    let rows = sqlx::query("UPDATE menus SET is_available = NOT is_available WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu item {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
}

/// Hard delete; order items keep their snapshot with `menu_id` set to NULL
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM menus WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn create_dto(name: &str, price: i64, category: Option<&str>) -> MenuItemCreate {
        MenuItemCreate {
            name: name.into(),
            price,
            category: category.map(Into::into),
            image_url: None,
            is_available: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let db = DbService::in_memory().await.unwrap();
        let item = create(&db.pool, create_dto("Nasi Goreng", 20000, Some("  ")))
            .await
            .unwrap();

        assert_eq!(item.name, "Nasi Goreng");
        assert_eq!(item.category, DEFAULT_CATEGORY);
        assert!(item.is_available);
        assert!(item.image_url.is_none());
    }

    #[tokio::test]
    async fn test_find_all_newest_first_and_available_filter() {
        let db = DbService::in_memory().await.unwrap();
        let first = create(&db.pool, create_dto("Es Teh", 5000, Some("Minuman")))
            .await
            .unwrap();
        let second = create(&db.pool, create_dto("Sate", 25000, None)).await.unwrap();
        toggle_availability(&db.pool, first.id).await.unwrap();

        let all = find_all(&db.pool, false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id > all[1].id);

        let available = find_all(&db.pool, true).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, second.id);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = DbService::in_memory().await.unwrap();
        let item = create(&db.pool, create_dto("Mie Ayam", 15000, None)).await.unwrap();

        let updated = update(
            &db.pool,
            item.id,
            MenuItemUpdate {
                price: Some(17000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, 17000);
        assert_eq!(updated.name, "Mie Ayam");

        let missing = update(&db.pool, 42, MenuItemUpdate::default()).await;
        assert!(matches!(missing, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_negative_price_rejected_by_schema() {
        let db = DbService::in_memory().await.unwrap();
        assert!(create(&db.pool, create_dto("Bad", -1, None)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = DbService::in_memory().await.unwrap();
        let item = create(&db.pool, create_dto("Kopi", 8000, None)).await.unwrap();
        assert!(delete(&db.pool, item.id).await.unwrap());
        assert!(!delete(&db.pool, item.id).await.unwrap());
        assert!(find_by_id(&db.pool, item.id).await.unwrap().is_none());
    }
}
