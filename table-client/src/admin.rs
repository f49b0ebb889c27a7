//! Staff views that follow the order feed
//!
//! A [`LiveView`] pairs a [`ViewLoader`] with an [`OrderFeed`]: inserted
//! orders fire the [`Alert`] and trigger a refetch, updates refetch
//! silently. Each refresh takes a generation number and a response older
//! than the last applied one is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::message::{OrderChange, OrderEvent};
use shared::models::{OrderDetail, StatusUpdate};
use shared::order::{OrderStatus, StatusAction};
use shared::stats::{StatisticsReport, TimeWindow};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::gateway::{OrderGateway, OrderQuery};
use crate::realtime::{OrderFeed, Subscription};

// ========== Ports ==========

/// Audible or haptic cue for a new order
pub trait Alert: Send + Sync {
    fn new_order(&self, order_id: i64);
}

/// Alert that does nothing (headless clients, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlert;

impl Alert for NoopAlert {
    fn new_order(&self, _order_id: i64) {}
}

/// Fetches the data a view displays
#[async_trait]
pub trait ViewLoader: Send + Sync + 'static {
    type Data: Clone + Send + 'static;

    async fn load(&self) -> ClientResult<Self::Data>;
}

// ========== Generations ==========

/// Refresh ordering guard
#[derive(Debug, Default, Clone, Copy)]
pub struct Generations {
    issued: u64,
    applied: u64,
}

impl Generations {
    /// Number for a new refresh
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accept `generation` unless a newer one already landed
    pub fn try_apply(&mut self, generation: u64) -> bool {
        if generation <= self.applied {
            return false;
        }
        self.applied = generation;
        true
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

// ========== LiveView ==========

struct ViewState<T> {
    data: Option<T>,
    generations: Generations,
    last_error: Option<String>,
}

pub struct LiveView<L: ViewLoader> {
    loader: Arc<L>,
    alert: Arc<dyn Alert>,
    state: Arc<Mutex<ViewState<L::Data>>>,
    events_tx: mpsc::UnboundedSender<OrderEvent>,
    events_rx: mpsc::UnboundedReceiver<OrderEvent>,
    subscriptions: Vec<Subscription>,
}

impl<L: ViewLoader> std::fmt::Debug for LiveView<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LiveView")
            .field("loaded", &state.data.is_some())
            .field("generation", &state.generations.applied())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl<L: ViewLoader> LiveView<L> {
    pub fn new(loader: L, alert: Arc<dyn Alert>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            loader: Arc::new(loader),
            alert,
            state: Arc::new(Mutex::new(ViewState {
                data: None,
                generations: Generations::default(),
                last_error: None,
            })),
            events_tx,
            events_rx,
            subscriptions: Vec::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Listen for inserted and updated orders on `feed`
    pub fn subscribe(&mut self, feed: &dyn OrderFeed) {
        let tx = self.events_tx.clone();
        self.subscriptions.push(feed.on_insert(Arc::new(move |e: &OrderEvent| {
            let _ = tx.send(e.clone());
        })));
        let tx = self.events_tx.clone();
        self.subscriptions.push(feed.on_update(Arc::new(move |e: &OrderEvent| {
            let _ = tx.send(e.clone());
        })));
    }

    /// Drop every feed subscription
    pub fn unsubscribe(&mut self) {
        self.subscriptions.clear();
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    /// Refetch and store the result
    ///
    /// Returns `Ok(false)` when a newer refresh finished first and this
    /// response was discarded.
    pub async fn refresh(&self) -> ClientResult<bool> {
        let generation = self.state.lock().generations.begin();
        let result = self.loader.load().await;

        let mut state = self.state.lock();
        match result {
            Ok(data) => {
                if !state.generations.try_apply(generation) {
                    tracing::debug!(generation, "Discarding stale view response");
                    return Ok(false);
                }
                state.data = Some(data);
                state.last_error = None;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(generation, "View refresh failed: {}", e);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Handle the next feed event
    ///
    /// `None` once the channel is closed.
    pub async fn process_next(&mut self) -> Option<ClientResult<OrderChange>> {
        let event = self.events_rx.recv().await?;
        Some(self.handle(event).await)
    }

    /// Handle already-queued events without waiting
    pub async fn process_pending(&mut self) -> Vec<ClientResult<OrderChange>> {
        let mut results = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            results.push(self.handle(event).await);
        }
        results
    }

    async fn handle(&self, event: OrderEvent) -> ClientResult<OrderChange> {
        if event.change == OrderChange::Inserted {
            self.alert.new_order(event.order_id);
        }
        self.refresh().await?;
        Ok(event.change)
    }

    /// Follow the feed until `shutdown` is cancelled
    pub async fn run(&mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.process_next() => {
                    if next.is_none() {
                        break;
                    }
                }
            }
        }
    }

    /// Last applied data
    pub fn data(&self) -> Option<L::Data> {
        self.state.lock().data.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }
}

// ========== Dashboard ==========

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub report: StatisticsReport,
    /// Orders in the window with their items, newest first
    pub orders: Vec<OrderDetail>,
}

pub struct DashboardLoader {
    gateway: Arc<dyn OrderGateway>,
    window: TimeWindow,
}

impl DashboardLoader {
    pub fn new(gateway: Arc<dyn OrderGateway>, window: TimeWindow) -> Self {
        Self { gateway, window }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

#[async_trait]
impl ViewLoader for DashboardLoader {
    type Data = DashboardData;

    async fn load(&self) -> ClientResult<DashboardData> {
        let query = OrderQuery::window(self.window);
        let (report, orders) = tokio::try_join!(
            self.gateway.statistics(&self.window),
            self.gateway.list_orders(&query),
        )?;
        Ok(DashboardData { report, orders })
    }
}

pub type DashboardView = LiveView<DashboardLoader>;

// ========== Kitchen ==========

#[derive(Debug, Clone, PartialEq)]
pub struct KitchenTicket {
    pub detail: OrderDetail,
    /// Actions legal for the current status
    pub actions: Vec<StatusAction>,
}

impl KitchenTicket {
    pub fn new(detail: OrderDetail) -> Self {
        let actions = detail.order.status.available_actions();
        Self { detail, actions }
    }

    pub fn status(&self) -> OrderStatus {
        self.detail.order.status
    }
}

pub struct KitchenLoader {
    gateway: Arc<dyn OrderGateway>,
    active_only: bool,
}

impl KitchenLoader {
    pub fn new(gateway: Arc<dyn OrderGateway>, active_only: bool) -> Self {
        Self {
            gateway,
            active_only,
        }
    }
}

#[async_trait]
impl ViewLoader for KitchenLoader {
    type Data = Vec<KitchenTicket>;

    async fn load(&self) -> ClientResult<Vec<KitchenTicket>> {
        let query = OrderQuery {
            window: None,
            active_only: self.active_only,
        };
        let orders = self.gateway.list_orders(&query).await?;
        Ok(orders.into_iter().map(KitchenTicket::new).collect())
    }
}

pub type KitchenView = LiveView<KitchenLoader>;

impl LiveView<KitchenLoader> {
    /// Apply `action` to an order the operator sees in `seen` status
    ///
    /// The local list is not touched; it is refetched after the server
    /// answers, including when the update lost a race.
    pub async fn apply(
        &self,
        order_id: i64,
        seen: OrderStatus,
        action: StatusAction,
    ) -> ClientResult<OrderDetail> {
        let to = seen.apply(action).map_err(ClientError::Validation)?;
        let result = self
            .loader
            .gateway
            .update_status(order_id, &StatusUpdate { from: seen, to })
            .await;

        if let Err(e) = self.refresh().await {
            tracing::warn!(order_id, "Refetch after status change failed: {}", e);
        }
        result
    }
}
