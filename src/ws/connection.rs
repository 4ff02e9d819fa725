//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::{SubscriptionManager, TOPICS};
use crate::api::dto::MatchStatusResponse;
use crate::domain::EngineEvent;
use crate::service::CompanionService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events of subscribed topics from the [`broadcast::Receiver`].
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<EngineEvent>,
    service: Arc<CompanionService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &service).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(engine_event) => {
                        if let Some(json) = event_json(&engine_event, &subs)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Wraps an event in the envelope if the client subscribed to its topic.
fn event_json(event: &EngineEvent, subs: &SubscriptionManager) -> Option<String> {
    if !subs.matches(event.topic()) {
        return None;
    }
    let msg = WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        serde_json::json!({
            "topic": event.topic(),
            "event": serde_json::to_value(event).unwrap_or_default(),
        }),
    );
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    service: &CompanionService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let payload = match command {
        WsCommand::Subscribe { topics } => {
            let unknown = subs.subscribe(&topics);
            serde_json::json!({
                "subscribed": subs.topics(),
                "wildcard": subs.is_subscribed_all(),
                "unknown": unknown,
                "available": TOPICS,
            })
        }
        WsCommand::Unsubscribe { topics } => {
            subs.unsubscribe(&topics);
            serde_json::json!({
                "subscribed": subs.topics(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::GetState => {
            let status = MatchStatusResponse::from(service.status().await);
            serde_json::to_value(status).unwrap_or_default()
        }
    };
    let response = WsMessage::new(msg.id, WsMessageType::Response, payload);
    serde_json::to_string(&response).ok()
}
