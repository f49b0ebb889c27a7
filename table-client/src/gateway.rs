//! Remote operations the client logic depends on
//!
//! [`crate::HttpClient`] implements both traits against the order server;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use shared::models::{
    MenuItem, MenuItemCreate, MenuItemUpdate, OrderDetail, OrderSubmission, PaymentMethodInfo,
    StatusUpdate,
};
use shared::stats::{StatisticsReport, TimeWindow};

use crate::error::ClientResult;

/// Order list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderQuery {
    /// Restrict to a reporting window; `None` lists everything
    pub window: Option<TimeWindow>,
    /// Hide completed orders
    pub active_only: bool,
}

impl OrderQuery {
    pub fn window(window: TimeWindow) -> Self {
        Self {
            window: Some(window),
            active_only: false,
        }
    }

    pub fn active() -> Self {
        Self {
            window: None,
            active_only: true,
        }
    }

    /// Query parameters for `GET /api/orders`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = window_params(self.window.as_ref());
        if self.active_only {
            params.push(("active", "true".to_string()));
        }
        params
    }
}

/// `range`, `start` and `end` parameters for a window
pub fn window_params(window: Option<&TimeWindow>) -> Vec<(&'static str, String)> {
    match window {
        None => Vec::new(),
        Some(TimeWindow::Today) => vec![("range", "today".into())],
        Some(TimeWindow::Week) => vec![("range", "week".into())],
        Some(TimeWindow::Month) => vec![("range", "month".into())],
        Some(TimeWindow::Custom { start, end }) => vec![
            ("range", "custom".into()),
            ("start", start.to_string()),
            ("end", end.to_string()),
        ],
    }
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_menus(&self, available_only: bool) -> ClientResult<Vec<MenuItem>>;

    async fn create_menu(&self, data: &MenuItemCreate) -> ClientResult<MenuItem>;

    async fn update_menu(&self, id: i64, data: &MenuItemUpdate) -> ClientResult<MenuItem>;

    async fn toggle_availability(&self, id: i64) -> ClientResult<MenuItem>;

    async fn delete_menu(&self, id: i64) -> ClientResult<()>;

    async fn payment_methods(&self) -> ClientResult<Vec<PaymentMethodInfo>>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit_order(&self, submission: &OrderSubmission) -> ClientResult<OrderDetail>;

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderDetail>>;

    async fn get_order(&self, id: i64) -> ClientResult<OrderDetail>;

    async fn update_status(&self, id: i64, update: &StatusUpdate) -> ClientResult<OrderDetail>;

    async fn statistics(&self, window: &TimeWindow) -> ClientResult<StatisticsReport>;
}
