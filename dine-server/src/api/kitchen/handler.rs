//! Kitchen API Handlers

use axum::{
    Json,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use shared::message::{KitchenEventKind, KitchenMessage};
use shared::models::Order;
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::kitchen::SubscriberId;
use crate::utils::{AppError, AppResult};

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
pub struct KitchenSnapshot {
    pub orders: Vec<Order>,
    pub client_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub order_id: i64,
    #[serde(default)]
    pub update_type: Option<KitchenEventKind>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub order_id: i64,
    pub update_type: &'static str,
    /// `false` when the event was dropped (queue full)
    pub queued: bool,
    pub client_count: usize,
}

/// Orders currently on the kitchen display
pub async fn snapshot(State(state): State<ServerState>) -> AppResult<Json<KitchenSnapshot>> {
    Ok(Json(KitchenSnapshot {
        orders: state.orders.kitchen_orders()?,
        client_count: state.kitchen.client_count(),
    }))
}

/// Re-send the current state of one order
pub async fn broadcast(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BroadcastRequest>,
) -> AppResult<Json<BroadcastResponse>> {
    let (order, queued) = state.orders.rebroadcast(payload.order_id, payload.update_type)?;
    let kind = payload
        .update_type
        .unwrap_or_else(|| KitchenEventKind::for_status(order.status));
    let update_type = KitchenMessage::with_kind(kind, order).type_name();
    tracing::info!(order_id = payload.order_id, update_type, queued, by = user.id, "Kitchen broadcast requested");

    Ok(Json(BroadcastResponse {
        order_id: payload.order_id,
        update_type,
        queued,
        client_count: state.kitchen.client_count(),
    }))
}

/// GET /api/kitchen/updates
///
/// 订阅在升级前完成，存储错误以普通错误响应返回。
pub async fn updates(
    State(state): State<ServerState>,
    user: CurrentUser,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let (subscriber, rx) = state.kitchen.subscribe()?;
    tracing::debug!(subscriber, user_id = user.id, "Kitchen display upgrading");
    Ok(ws.on_upgrade(move |socket| kitchen_ws_session(socket, state, subscriber, rx)))
}

async fn kitchen_ws_session(
    socket: WebSocket,
    state: ServerState,
    subscriber: SubscriberId,
    mut rx: mpsc::Receiver<KitchenMessage>,
) {
    let (mut sink, mut stream) = socket.split();

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = rx.recv() => {
                match event {
                    Some(message) => {
                        if send_message(&mut sink, &message).await.is_err() {
                            break;
                        }
                    }
                    // Pruned by the dispatcher
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.as_str().trim().eq_ignore_ascii_case("ping")
                            && sink.send(Message::Text("pong".into())).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.kitchen.unsubscribe(subscriber);
}

async fn send_message<S>(sink: &mut S, message: &KitchenMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize kitchen message");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
