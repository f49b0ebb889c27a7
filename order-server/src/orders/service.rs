use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{ORDER_RESOURCE, OrderChange};
use shared::models::{Order, OrderDetail, OrderSubmission, PaymentMethod, StatusUpdate};
use shared::order::{OrderStatus, order_totals};

use crate::core::ServerState;
use crate::db::repository::order;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_ORDER_LINES, MAX_TABLE_ID_LEN, validate_optional_text,
    validate_price, validate_quantity,
};

/// Check a submission before touching the database
///
/// Returns the resolved payment method.
pub fn validate_submission(submission: &OrderSubmission) -> AppResult<&'static PaymentMethod> {
    let name = submission.customer_name.trim();
    if name.is_empty() {
        return Err(AppError::new(ErrorCode::CustomerNameRequired));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("customer_name is too long (max {MAX_NAME_LEN} characters)"),
        ));
    }

    let table = submission.table_id.trim();
    if table.is_empty() {
        return Err(AppError::new(ErrorCode::TableRequired));
    }
    if table.chars().count() > MAX_TABLE_ID_LEN {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("table_id is too long (max {MAX_TABLE_ID_LEN} characters)"),
        ));
    }

    let method = PaymentMethod::find(&submission.payment_method).ok_or_else(|| {
        AppError::new(ErrorCode::PaymentInvalidMethod)
            .with_detail("payment_method", submission.payment_method.clone())
    })?;

    if submission.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if submission.items.len() > MAX_ORDER_LINES {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Too many order lines (max {MAX_ORDER_LINES})"),
        ));
    }
    for line in &submission.items {
        validate_quantity(line.quantity)?;
        validate_price(line.price)?;
        validate_optional_text(&line.note, "note", MAX_NOTE_LEN)?;
    }

    Ok(method)
}

/// Persist a checkout as a pending order
///
/// Header and items are written in one transaction; any failure rolls both
/// back. Lines referring to a deleted or unavailable menu item are rejected.
pub async fn submit(state: &ServerState, submission: OrderSubmission) -> AppResult<OrderDetail> {
    let method = validate_submission(&submission)?;
    let totals = order_totals(&submission.items, method);

    let now = shared::util::now_millis();
    let header = Order {
        id: shared::util::snowflake_id(),
        customer_name: submission.customer_name.trim().to_string(),
        table_id: submission.table_id.trim().to_string(),
        total_price: totals.total,
        payment_method: method.name.to_string(),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    let mut tx = state
        .pool()
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    for line in &submission.items {
        match order::menu_availability(&mut tx, line.menu_id).await? {
            Some(true) => {}
            Some(false) => {
                return Err(AppError::with_message(
                    ErrorCode::MenuItemUnavailable,
                    format!("{} is not available", line.name),
                )
                .with_detail("menu_id", line.menu_id));
            }
            None => {
                return Err(AppError::new(ErrorCode::MenuItemNotFound)
                    .with_detail("menu_id", line.menu_id));
            }
        }
    }

    order::insert_order(&mut tx, &header).await?;
    let items = order::insert_items(&mut tx, header.id, &submission.items).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    // Built from the rows just written, not re-read
    let detail = OrderDetail {
        order: header,
        items,
    };
    tracing::info!(
        order_id = detail.order.id,
        table_id = %detail.order.table_id,
        total = detail.order.total_price,
        lines = detail.items.len(),
        "Order submitted"
    );

    state
        .broadcast_sync(
            ORDER_RESOURCE,
            OrderChange::Inserted.as_str(),
            &detail.order.id.to_string(),
            Some(&detail),
        )
        .await;

    Ok(detail)
}

/// Move an order from `update.from` to `update.to`
///
/// Fails with `OrderStatusConflict` when the stored status is no longer
/// `update.from`.
pub async fn transition(state: &ServerState, id: i64, update: StatusUpdate) -> AppResult<OrderDetail> {
    update.from.transition_to(update.to)?;

    let now = shared::util::now_millis();
    let swapped = order::update_status(state.pool(), id, update.from, update.to, now).await?;
    if !swapped {
        return Err(match order::find_status(state.pool(), id).await? {
            None => AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id),
            Some(actual) => AppError::new(ErrorCode::OrderStatusConflict)
                .with_detail("expected", update.from.as_str())
                .with_detail("actual", actual.as_str()),
        });
    }

    let detail = order::get(state.pool(), id).await?;
    tracing::info!(order_id = id, from = %update.from, to = %update.to, "Order status changed");

    state
        .broadcast_sync(
            ORDER_RESOURCE,
            OrderChange::Updated.as_str(),
            &id.to_string(),
            Some(&detail),
        )
        .await;

    Ok(detail)
}
