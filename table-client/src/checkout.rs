//! Checkout: turn the cart into one submitted order

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderSubmission, PaymentMethod, TransactionSummary};
use shared::order::{OrderTotals, order_totals};

use crate::cart::CartStore;
use crate::error::{ClientError, ClientResult};
use crate::gateway::OrderGateway;
use crate::session::Session;
use crate::storage::{LAST_TRANSACTION_KEY, SessionStorage, load_json, save_json};

#[derive(Debug, Clone)]
pub struct Checkout {
    storage: Arc<dyn SessionStorage>,
    session: Session,
}

impl Checkout {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            session: Session::new(storage.clone()),
            storage,
        }
    }

    /// Subtotal, fee and total for the payment screen
    pub fn quote(&self, cart: &CartStore, payment_method: &str) -> ClientResult<OrderTotals> {
        let method = resolve_method(payment_method)?;
        Ok(order_totals(cart.lines().unwrap_or_default(), method))
    }

    /// Submit the cart for `table_id`
    ///
    /// Rejects an empty cart, blank table or unknown payment method before
    /// any request. On success the summary is stored under
    /// [`LAST_TRANSACTION_KEY`] and the cart is cleared; on failure the cart
    /// is left intact for a retry.
    ///
    /// When the order was placed but the stored cart could not be deleted,
    /// the in-memory cart is still empty and a [`ClientError::Storage`]
    /// naming the placed order is returned.
    pub async fn submit(
        &self,
        gateway: &dyn OrderGateway,
        cart: &mut CartStore,
        table_id: &str,
        payment_method: &str,
    ) -> ClientResult<TransactionSummary> {
        if !cart.is_hydrated() {
            cart.hydrate();
        }
        if cart.is_empty() {
            return Err(ClientError::validation(ErrorCode::OrderEmpty));
        }
        let Some(table_id) = shared::util::non_blank(table_id) else {
            return Err(ClientError::validation(ErrorCode::TableRequired));
        };
        let method = resolve_method(payment_method)?;

        let items = cart.snapshot();
        let totals = order_totals(&items, method);
        let submission = OrderSubmission {
            customer_name: self.session.customer_name(),
            table_id: table_id.clone(),
            payment_method: method.id.to_string(),
            items: items.clone(),
        };

        let detail = gateway.submit_order(&submission).await.map_err(|e| {
            tracing::warn!(table_id = %table_id, "Order submission failed: {}", e);
            e
        })?;

        if detail.order.total_price != totals.total {
            tracing::warn!(
                order_id = detail.order.id,
                expected = totals.total,
                actual = detail.order.total_price,
                "Server total differs from cart total"
            );
        }

        let summary = TransactionSummary {
            order_id: detail.order.id,
            table_id,
            customer_name: detail.order.customer_name.clone(),
            total: detail.order.total_price,
            method: method.name.to_string(),
            items,
            submitted_at: detail.order.created_at,
        };

        if let Err(e) = save_json(self.storage.as_ref(), LAST_TRANSACTION_KEY, &summary) {
            tracing::warn!("Failed to store last transaction: {}", e);
        }
        tracing::info!(order_id = summary.order_id, total = summary.total, "Order placed");
        if let Err(e) = cart.clear() {
            tracing::error!(order_id = summary.order_id, "Order placed but cart not cleared: {}", e);
            return Err(ClientError::Storage(format!(
                "Order {} was placed but the saved cart could not be cleared: {}",
                summary.order_id, e
            )));
        }

        Ok(summary)
    }

    /// Summary of the most recent successful submission
    pub fn last_transaction(&self) -> Option<TransactionSummary> {
        match load_json(self.storage.as_ref(), LAST_TRANSACTION_KEY) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Ignoring unreadable last transaction: {}", e);
                None
            }
        }
    }

    /// Read the last transaction and delete it, for the success screen
    pub fn take_last_transaction(&self) -> ClientResult<Option<TransactionSummary>> {
        let summary = self.last_transaction();
        self.storage.remove(LAST_TRANSACTION_KEY)?;
        Ok(summary)
    }
}

fn resolve_method(id: &str) -> ClientResult<&'static PaymentMethod> {
    PaymentMethod::find(id).ok_or_else(|| {
        ClientError::Validation(
            AppError::new(ErrorCode::PaymentInvalidMethod).with_detail("payment_method", id),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OrderQuery;
    use crate::storage::{CART_KEY, MemoryStorage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared::models::{MenuItem, Order, OrderDetail, OrderItem, StatusUpdate};
    use shared::order::OrderStatus;
    use shared::stats::{StatisticsReport, TimeWindow};

    /// Records submissions and answers like the server would
    #[derive(Default)]
    struct FakeOrders {
        submitted: Mutex<Vec<OrderSubmission>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderGateway for FakeOrders {
        async fn submit_order(&self, submission: &OrderSubmission) -> ClientResult<OrderDetail> {
            if self.fail {
                return Err(ClientError::Api(AppError::new(ErrorCode::DatabaseError)));
            }
            self.submitted.lock().push(submission.clone());
            let method = PaymentMethod::find(&submission.payment_method).unwrap();
            let totals = order_totals(&submission.items, method);
            Ok(OrderDetail {
                order: Order {
                    id: 77,
                    customer_name: submission.customer_name.clone(),
                    table_id: submission.table_id.clone(),
                    total_price: totals.total,
                    payment_method: method.name.into(),
                    status: OrderStatus::Pending,
                    created_at: 1_000,
                    updated_at: 1_000,
                },
                items: submission
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, l)| OrderItem {
                        id: i as i64,
                        order_id: 77,
                        menu_id: Some(l.menu_id),
                        name: l.name.clone(),
                        quantity: i64::from(l.quantity),
                        price_at_order: l.price,
                        note: l.note.clone(),
                    })
                    .collect(),
            })
        }

        async fn list_orders(&self, _query: &OrderQuery) -> ClientResult<Vec<OrderDetail>> {
            Ok(Vec::new())
        }

        async fn get_order(&self, _id: i64) -> ClientResult<OrderDetail> {
            Err(ClientError::Api(AppError::new(ErrorCode::OrderNotFound)))
        }

        async fn update_status(&self, _id: i64, _update: &StatusUpdate) -> ClientResult<OrderDetail> {
            Err(ClientError::Api(AppError::new(ErrorCode::OrderNotFound)))
        }

        async fn statistics(&self, _window: &TimeWindow) -> ClientResult<StatisticsReport> {
            Err(ClientError::Api(AppError::new(ErrorCode::InternalError)))
        }
    }

    fn menu(id: i64, name: &str, price: i64) -> MenuItem {
        MenuItem {
            id,
            name: name.into(),
            price,
            category: "Makanan".into(),
            image_url: None,
            is_available: true,
            created_at: 0,
        }
    }

    fn filled_cart(storage: Arc<dyn SessionStorage>) -> CartStore {
        let mut cart = CartStore::load(storage);
        let nasi = menu(1, "Nasi Goreng", 20000);
        cart.add(&nasi).unwrap();
        cart.add(&nasi).unwrap();
        cart.add(&menu(2, "Es Teh", 5000)).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_submit_stores_summary_and_clears_cart() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let checkout = Checkout::new(storage.clone());
        let mut cart = filled_cart(storage.clone());
        let gateway = FakeOrders::default();

        let quote = checkout.quote(&cart, "gopay").unwrap();
        assert_eq!((quote.subtotal, quote.fee, quote.total), (45000, 1000, 46000));

        let summary = checkout.submit(&gateway, &mut cart, " 4 ", "gopay").await.unwrap();
        assert_eq!(summary.total, 46000);
        assert_eq!(summary.method, "Gopay");
        assert_eq!(summary.table_id, "4");
        assert_eq!(summary.customer_name, "Sobat");
        assert_eq!(summary.items.len(), 2);

        assert!(cart.is_empty());
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
        assert_eq!(checkout.last_transaction(), Some(summary.clone()));
        assert_eq!(checkout.take_last_transaction().unwrap(), Some(summary));
        assert_eq!(checkout.take_last_transaction().unwrap(), None);

        let sent = gateway.submitted.lock();
        assert_eq!(sent[0].payment_method, "gopay");
        assert_eq!(sent[0].items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_request() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let checkout = Checkout::new(storage.clone());
        let mut cart = CartStore::load(storage);
        let gateway = FakeOrders::default();

        let err = checkout.submit(&gateway, &mut cart, "4", "qris").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OrderEmpty));
        assert!(gateway.submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_method_and_blank_table() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let checkout = Checkout::new(storage.clone());
        let mut cart = filled_cart(storage);
        let gateway = FakeOrders::default();

        let err = checkout.submit(&gateway, &mut cart, "4", "cash").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PaymentInvalidMethod));

        let err = checkout.submit(&gateway, &mut cart, "  ", "qris").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TableRequired));
        assert_eq!(cart.total_items(), 3);
    }

    #[tokio::test]
    async fn test_failure_keeps_cart() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let checkout = Checkout::new(storage.clone());
        let mut cart = filled_cart(storage);
        let gateway = FakeOrders {
            fail: true,
            ..Default::default()
        };

        let err = checkout.submit(&gateway, &mut cart, "4", "va").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
        assert_eq!(cart.total_items(), 3);
        assert!(checkout.last_transaction().is_none());
    }

    /// Memory storage that refuses to delete the cart key
    #[derive(Debug, Default)]
    struct StickyCart {
        inner: MemoryStorage,
    }

    impl SessionStorage for StickyCart {
        fn get(&self, key: &str) -> ClientResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> ClientResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> ClientResult<()> {
            if key == CART_KEY {
                return Err(ClientError::Storage("read-only".into()));
            }
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_uncleared_cart_after_placed_order_is_reported() {
        let storage: Arc<dyn SessionStorage> = Arc::new(StickyCart::default());
        let checkout = Checkout::new(storage.clone());
        let mut cart = filled_cart(storage);
        let gateway = FakeOrders::default();

        let err = checkout.submit(&gateway, &mut cart, "4", "qris").await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(ref msg) if msg.contains("77")));
        assert!(cart.is_empty());
        assert_eq!(gateway.submitted.lock().len(), 1);
        assert_eq!(checkout.last_transaction().map(|t| t.order_id), Some(77));

        // The in-memory cart cannot be submitted twice
        let again = checkout.submit(&gateway, &mut cart, "4", "qris").await.unwrap_err();
        assert_eq!(again.code(), Some(ErrorCode::OrderEmpty));
    }
}
