//! 厨房广播 Actor
//!
//! ```text
//! OrderService / PaymentService
//!        │ broadcast() (try_send, 满则丢弃)
//!        ▼
//!   bounded queue ──► dispatch loop ──► subscriber channels (read lock)
//!                                          │ closed → 同一轮移除 (write lock)
//!                                          ▼
//!                                   WebSocket writer tasks
//! ```
//!
//! - 生产者从不等待消费者
//! - 订阅者集合由 `RwLock` 保护: 广播持读锁，订阅/退订持写锁
//! - 单个 dispatch 任务，由 `CancellationToken` 停止

use parking_lot::{Mutex, RwLock};
use shared::message::KitchenMessage;
use shared::models::Order;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::db::{Storage, StorageResult};

pub type SubscriberId = u64;

/// Per-connection buffer; a display that falls this far behind misses events
pub const SUBSCRIBER_BUFFER: usize = 64;

type Subscribers = HashMap<SubscriberId, mpsc::Sender<KitchenMessage>>;

/// Kitchen display fan-out
///
/// Cheap to clone; all clones share one subscriber set and one queue.
#[derive(Clone)]
pub struct KitchenNotifier {
    storage: Storage,
    subscribers: Arc<RwLock<Subscribers>>,
    queue_tx: mpsc::Sender<KitchenMessage>,
    /// Taken by the dispatch loop on `run`
    queue_rx: Arc<Mutex<Option<mpsc::Receiver<KitchenMessage>>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for KitchenNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitchenNotifier")
            .field("clients", &self.client_count())
            .finish_non_exhaustive()
    }
}

impl KitchenNotifier {
    pub fn new(storage: Storage, queue_capacity: usize) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity.max(1));
        Self {
            storage,
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            queue_tx,
            queue_rx: Arc::new(Mutex::new(Some(queue_rx))),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a display and queue its initial snapshot
    ///
    /// The snapshot is read while holding the write lock, so no broadcast
    /// can be fanned out between the snapshot and the registration.
    pub fn subscribe(&self) -> StorageResult<(SubscriberId, mpsc::Receiver<KitchenMessage>)> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.subscribers.write();
        let orders = self.storage.kitchen_orders()?;
        let count = orders.len();
        // Fresh channel, cannot be full
        let _ = tx.try_send(KitchenMessage::InitialOrders { orders });
        subscribers.insert(id, tx);
        let clients = subscribers.len();
        drop(subscribers);

        tracing::info!(subscriber = id, orders = count, clients, "Kitchen display connected");
        Ok((id, rx))
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            tracing::info!(subscriber = id, "Kitchen display disconnected");
        }
        removed
    }

    pub fn client_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Queue an event for fan-out without waiting
    ///
    /// Returns `false` when the event was dropped (queue full or dispatcher
    /// gone). Callers never treat that as an error.
    pub fn broadcast(&self, message: KitchenMessage) -> bool {
        match self.queue_tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    event = message.type_name(),
                    order_id = ?message.order_id(),
                    "Kitchen queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                tracing::warn!(
                    event = message.type_name(),
                    order_id = ?message.order_id(),
                    "Kitchen dispatcher stopped, event dropped"
                );
                false
            }
        }
    }

    /// Broadcast an order at its current status
    pub fn notify_order(&self, order: &Order) -> bool {
        self.broadcast(KitchenMessage::for_order(order.clone()))
    }

    /// Dispatch loop; runs until `shutdown` fires or every sender is gone
    pub async fn run(self, shutdown: CancellationToken) {
        let Some(mut queue_rx) = self.queue_rx.lock().take() else {
            tracing::error!("Kitchen dispatcher already running");
            return;
        };

        tracing::info!("Kitchen dispatcher started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = queue_rx.recv() => match message {
                    Some(message) => {
                        self.fan_out(&message);
                    }
                    None => break,
                },
            }
        }
        tracing::info!("Kitchen dispatcher stopped");
    }

    /// Push one event to every subscriber, pruning closed ones in the same pass
    ///
    /// Returns the number of subscribers that accepted the event.
    pub(crate) fn fan_out(&self, message: &KitchenMessage) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, tx) in subscribers.iter() {
                match tx.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            subscriber = id,
                            event = message.type_name(),
                            "Kitchen display lagging, event skipped"
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in &closed {
                subscribers.remove(id);
            }
            tracing::warn!(removed = ?closed, remaining = subscribers.len(), "Pruned closed kitchen displays");
        }

        tracing::debug!(event = message.type_name(), order_id = ?message.order_id(), delivered, "Kitchen event dispatched");
        delivered
    }
}
