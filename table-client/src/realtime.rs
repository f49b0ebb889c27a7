//! Order change feeds
//!
//! Views register handlers for `inserted` and `updated` order events and
//! keep the returned [`Subscription`]; dropping it (or calling
//! [`Subscription::unsubscribe`]) stops delivery.
//!
//! ```text
//! MessageClient ──Sync──▶ BusFeed ──OrderEvent──▶ handlers
//! MemoryFeed::emit ─────────────────────────────▶ handlers
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared::message::{
    EventType, ORDER_RESOURCE, OrderChange, OrderEvent, RESYNC_ACTION, SyncPayload,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::message::MessageClient;

pub type EventHandler = Arc<dyn Fn(&OrderEvent) + Send + Sync>;

/// Source of order change notifications
pub trait OrderFeed: Send + Sync {
    fn on_insert(&self, handler: EventHandler) -> Subscription;

    fn on_update(&self, handler: EventHandler) -> Subscription;
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: Vec<(u64, OrderChange, EventHandler)>,
}

/// Handler table shared by a feed and its subscriptions
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

impl HandlerRegistry {
    pub fn register(&self, change: OrderChange, handler: EventHandler) -> Subscription {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.handlers.push((id, change, handler));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Call every handler registered for `event.change`
    ///
    /// Handlers run outside the lock, so they may unsubscribe.
    pub fn dispatch(&self, event: &OrderEvent) {
        let handlers: Vec<EventHandler> = self
            .inner
            .lock()
            .handlers
            .iter()
            .filter(|(_, change, _)| *change == event.change)
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration handle; delivery stops when dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<RegistryInner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.lock().handlers.iter().any(|(id, _, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().handlers.retain(|(id, _, _)| *id != self.id);
        }
    }
}

/// In-process feed driven by [`MemoryFeed::emit`]
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    registry: HandlerRegistry,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: OrderEvent) {
        self.registry.dispatch(&event);
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }
}

impl OrderFeed for MemoryFeed {
    fn on_insert(&self, handler: EventHandler) -> Subscription {
        self.registry.register(OrderChange::Inserted, handler)
    }

    fn on_update(&self, handler: EventHandler) -> Subscription {
        self.registry.register(OrderChange::Updated, handler)
    }
}

/// Feed backed by the message bus
///
/// A `resync` signal (the server dropped messages for this client) is
/// delivered to update handlers as an event with `order_id == 0` and no
/// snapshot, which means "refetch everything".
#[derive(Debug)]
pub struct BusFeed {
    registry: HandlerRegistry,
    shutdown: CancellationToken,
}

impl BusFeed {
    /// Start decoding `client`'s messages
    pub fn start(client: &MessageClient) -> Self {
        let registry = HandlerRegistry::default();
        let shutdown = CancellationToken::new();

        let rx = client.subscribe();
        let task_client = client.clone();
        let task_registry = registry.clone();
        let task_shutdown = shutdown.clone();
        tokio::spawn(async move {
            run_feed(rx, task_client, task_registry, task_shutdown).await;
        });

        Self { registry, shutdown }
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for BusFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl OrderFeed for BusFeed {
    fn on_insert(&self, handler: EventHandler) -> Subscription {
        self.registry.register(OrderChange::Inserted, handler)
    }

    fn on_update(&self, handler: EventHandler) -> Subscription {
        self.registry.register(OrderChange::Updated, handler)
    }
}

async fn run_feed(
    mut rx: broadcast::Receiver<shared::message::BusMessage>,
    client: MessageClient,
    registry: HandlerRegistry,
    shutdown: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = client.closed() => {
                tracing::warn!("Order feed stopped: message bus disconnected");
                break;
            }
            msg = rx.recv() => msg,
        };

        match msg {
            Ok(msg) if msg.event_type == EventType::Sync => match msg.parse_payload::<SyncPayload>() {
                Ok(payload) => {
                    if let Some(event) = decode_event(&payload) {
                        registry.dispatch(&event);
                    }
                }
                Err(e) => tracing::warn!("Ignoring malformed sync payload: {}", e),
            },
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Order feed lagged by {} messages, resyncing", n);
                registry.dispatch(&resync_event(0));
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn resync_event(version: u64) -> OrderEvent {
    OrderEvent {
        change: OrderChange::Updated,
        order_id: 0,
        version,
        order: None,
    }
}

/// Order event for a sync payload, `None` for other resources
pub fn decode_event(payload: &SyncPayload) -> Option<OrderEvent> {
    if payload.resource == ORDER_RESOURCE && payload.action == RESYNC_ACTION {
        return Some(resync_event(payload.version));
    }
    OrderEvent::from_sync(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(change: OrderChange, order_id: i64) -> OrderEvent {
        OrderEvent {
            change,
            order_id,
            version: 1,
            order: None,
        }
    }

    fn counter() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_handlers_filtered_by_change() {
        let feed = MemoryFeed::new();
        let (inserts, on_insert) = counter();
        let (updates, on_update) = counter();
        let _a = feed.on_insert(on_insert);
        let _b = feed.on_update(on_update);

        feed.emit(event(OrderChange::Inserted, 1));
        feed.emit(event(OrderChange::Updated, 1));
        feed.emit(event(OrderChange::Updated, 2));

        assert_eq!(inserts.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let feed = MemoryFeed::new();
        let (count, handler) = counter();
        let sub = feed.on_insert(handler);
        assert!(sub.is_active());

        sub.unsubscribe();
        assert_eq!(feed.handler_count(), 0);

        feed.emit(event(OrderChange::Inserted, 1));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decode_event() {
        let mut payload = SyncPayload {
            resource: ORDER_RESOURCE.into(),
            version: 9,
            action: "updated".into(),
            id: "12".into(),
            data: None,
        };
        assert_eq!(decode_event(&payload).unwrap().order_id, 12);

        payload.action = RESYNC_ACTION.into();
        payload.id = String::new();
        let resync = decode_event(&payload).unwrap();
        assert_eq!(resync.change, OrderChange::Updated);
        assert_eq!(resync.order_id, 0);

        payload.resource = "menu".into();
        assert!(decode_event(&payload).is_none());
    }

    #[tokio::test]
    async fn test_bus_feed_dispatches_sync() {
        let (server_tx, _) = broadcast::channel(16);
        let client = MessageClient::memory(&server_tx);
        let feed = BusFeed::start(&client);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = feed.on_insert(Arc::new(move |e: &OrderEvent| {
            let _ = tx.send(e.order_id);
        }));

        // Give the feed task a chance to subscribe
        tokio::task::yield_now().await;
        let payload = SyncPayload {
            resource: ORDER_RESOURCE.into(),
            version: 1,
            action: "inserted".into(),
            id: "31".into(),
            data: None,
        };
        server_tx
            .send(shared::message::BusMessage::sync(&payload).unwrap())
            .unwrap();

        let id = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, 31);
    }
}
