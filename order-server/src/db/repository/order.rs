//! Order Repository
//!
//! Orders and their items. Writes that touch both tables take an open
//! transaction so the caller controls the unit of work.

use std::collections::HashMap;

use super::{RepoError, RepoResult};
use shared::models::{CartLine, Order, OrderDetail, OrderItem, UNKNOWN_MENU_NAME};
use shared::order::OrderStatus;
use sqlx::{Sqlite, SqlitePool, Transaction};

const ORDER_COLUMNS: &str =
    "id, customer_name, table_id, total_price, payment_method, status, created_at, updated_at";

/// Shared WHERE clause for header and item queries, bound as ?1..?3
const FILTER_SQL: &str = "(?1 IS NULL OR o.created_at >= ?1) AND (?2 IS NULL OR o.created_at < ?2) AND (?3 = 0 OR o.status != 'completed')";

/// List filter
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Inclusive lower bound on `created_at` (Unix millis)
    pub start: Option<i64>,
    /// Exclusive upper bound on `created_at`
    pub end: Option<i64>,
    /// Hide completed orders
    pub active_only: bool,
}

/// Insert the header row
pub async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, customer_name, table_id, total_price, payment_method, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(order.id)
    .bind(&order.customer_name)
    .bind(&order.table_id)
    .bind(order.total_price)
    .bind(&order.payment_method)
    .bind(order.status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Insert one item row per cart line, snapshotting name and price
pub async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    lines: &[CartLine],
) -> RepoResult<Vec<OrderItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let quantity = i64::from(line.quantity);
        let result = sqlx::query(
            "INSERT INTO order_items (order_id, menu_id, name_at_order, quantity, price_at_order, note) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(order_id)
        .bind(line.menu_id)
        .bind(&line.name)
        .bind(quantity)
        .bind(line.price)
        .bind(line.note.as_deref())
        .execute(&mut **tx)
        .await?;

        items.push(OrderItem {
            id: result.last_insert_rowid(),
            order_id,
            menu_id: Some(line.menu_id),
            name: line.name.clone(),
            quantity,
            price_at_order: line.price,
            note: line.note.clone(),
        });
    }
    Ok(items)
}

/// Availability of one menu item, `None` if it does not exist
pub async fn menu_availability(
    tx: &mut Transaction<'_, Sqlite>,
    menu_id: i64,
) -> RepoResult<Option<bool>> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT is_available FROM menus WHERE id = ?")
        .bind(menu_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|(available,)| available))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let Some(order) = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT oi.id, oi.order_id, oi.menu_id, COALESCE(oi.name_at_order, m.name, ?1) AS name, oi.quantity, oi.price_at_order, oi.note FROM order_items oi LEFT JOIN menus m ON m.id = oi.menu_id WHERE oi.order_id = ?2 ORDER BY oi.id",
    )
    .bind(UNKNOWN_MENU_NAME)
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(OrderDetail { order, items }))
}

/// Orders with items, newest first
pub async fn list(pool: &SqlitePool, filter: OrderFilter) -> RepoResult<Vec<OrderDetail>> {
    let orders = list_headers(pool, filter).await?;

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let item_sql = format!(
        "SELECT oi.id, oi.order_id, oi.menu_id, COALESCE(oi.name_at_order, m.name, ?4) AS name, oi.quantity, oi.price_at_order, oi.note FROM order_items oi JOIN orders o ON o.id = oi.order_id LEFT JOIN menus m ON m.id = oi.menu_id WHERE {FILTER_SQL} ORDER BY oi.id"
    );
    let items = sqlx::query_as::<_, OrderItem>(&item_sql)
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.active_only)
        .bind(UNKNOWN_MENU_NAME)
        .fetch_all(pool)
        .await?;

    let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderDetail { order, items }
        })
        .collect())
}

/// Order headers only, for aggregation
pub async fn list_headers(pool: &SqlitePool, filter: OrderFilter) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders o WHERE {FILTER_SQL} ORDER BY o.created_at DESC, o.id DESC"
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.active_only)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Compare-and-swap status update
///
/// Returns `false` when the row is missing or its status is no longer `from`.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4")
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() == 1)
}

/// Current status, `None` if the order does not exist
pub async fn find_status(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderStatus>> {
    let row: Option<(OrderStatus,)> = sqlx::query_as("SELECT status FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(status,)| status))
}

/// Load a detail that must exist
pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<OrderDetail> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::menu;
    use shared::models::MenuItemCreate;

    fn header(id: i64, created_at: i64, status: OrderStatus) -> Order {
        Order {
            id,
            customer_name: "Sobat".into(),
            table_id: "7".into(),
            total_price: 21000,
            payment_method: "Gopay".into(),
            status,
            created_at,
            updated_at: created_at,
        }
    }

    fn line(menu_id: i64, name: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            menu_id,
            name: name.into(),
            price,
            image_url: None,
            quantity,
            note: None,
        }
    }

    async fn seed(pool: &SqlitePool, order: &Order, lines: &[CartLine]) -> Vec<OrderItem> {
        let mut tx = pool.begin().await.unwrap();
        insert_order(&mut tx, order).await.unwrap();
        let items = insert_items(&mut tx, order.id, lines).await.unwrap();
        tx.commit().await.unwrap();
        items
    }

    async fn menu_item(pool: &SqlitePool, name: &str, price: i64) -> i64 {
        menu::create(
            pool,
            MenuItemCreate {
                name: name.into(),
                price,
                category: None,
                image_url: None,
                is_available: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = DbService::in_memory().await.unwrap();
        let teh = menu_item(&db.pool, "Es Teh", 5000).await;
        let kopi = menu_item(&db.pool, "Kopi", 8000).await;
        let mut with_note = line(kopi, "Kopi", 8000, 1);
        with_note.note = Some("tanpa gula".into());
        let inserted = seed(
            &db.pool,
            &header(1, 1_000, OrderStatus::Pending),
            &[line(teh, "Es Teh", 5000, 4), with_note],
        )
        .await;

        let detail = find_by_id(&db.pool, 1).await.unwrap().unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
        // Rows returned by the insert match what a later read sees
        assert_eq!(detail.items, inserted);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].quantity, 4);
        assert_eq!(detail.items[0].price_at_order, 5000);
        assert_eq!(detail.items[0].menu_id, Some(teh));
    }

    #[tokio::test]
    async fn test_deleted_menu_keeps_item_snapshot() {
        let db = DbService::in_memory().await.unwrap();
        let sate = menu_item(&db.pool, "Sate Ayam", 25000).await;
        seed(&db.pool, &header(1, 1_000, OrderStatus::Pending), &[line(sate, "Sate Ayam", 25000, 1)]).await;

        menu::delete(&db.pool, sate).await.unwrap();

        let detail = find_by_id(&db.pool, 1).await.unwrap().unwrap();
        assert_eq!(detail.items[0].menu_id, None);
        assert_eq!(detail.items[0].name, "Sate Ayam");
        assert_eq!(detail.items[0].price_at_order, 25000);
    }

    #[tokio::test]
    async fn test_unknown_name_fallback() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool, &header(1, 1_000, OrderStatus::Pending), &[]).await;
        sqlx::query("INSERT INTO order_items (order_id, menu_id, name_at_order, quantity, price_at_order) VALUES (1, NULL, NULL, 1, 100)")
            .execute(&db.pool)
            .await
            .unwrap();

        let detail = find_by_id(&db.pool, 1).await.unwrap().unwrap();
        assert_eq!(detail.items[0].name, UNKNOWN_MENU_NAME);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filters() {
        let db = DbService::in_memory().await.unwrap();
        let kopi = menu_item(&db.pool, "Kopi", 8000).await;
        seed(&db.pool, &header(1, 1_000, OrderStatus::Completed), &[line(kopi, "Kopi", 8000, 1)]).await;
        seed(&db.pool, &header(2, 2_000, OrderStatus::Pending), &[line(kopi, "Kopi", 8000, 1)]).await;
        seed(&db.pool, &header(3, 3_000, OrderStatus::Cooking), &[line(kopi, "Kopi", 8000, 2)]).await;

        let all = list(&db.pool, OrderFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|d| d.order.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(all[0].items[0].quantity, 2);

        let active = list(
            &db.pool,
            OrderFilter {
                active_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(active.len(), 2);

        let windowed = list_headers(
            &db.pool,
            OrderFilter {
                start: Some(1_500),
                end: Some(3_000),
                active_only: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].id, 2);
    }

    #[tokio::test]
    async fn test_status_compare_and_swap() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool, &header(1, 1_000, OrderStatus::Pending), &[]).await;

        assert!(update_status(&db.pool, 1, OrderStatus::Pending, OrderStatus::Cooking, 2_000).await.unwrap());
        // Stale `from`
        assert!(!update_status(&db.pool, 1, OrderStatus::Pending, OrderStatus::Completed, 3_000).await.unwrap());
        assert_eq!(find_status(&db.pool, 1).await.unwrap(), Some(OrderStatus::Cooking));
        assert_eq!(find_status(&db.pool, 99).await.unwrap(), None);
    }
}
