use std::sync::Arc;
use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{info, warn, error};
use futures_util::{StreamExt, SinkExt};
use uuid::Uuid;

use crate::models::{ClientInvocation, ServerEvent};
use crate::state::AppState;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {

    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4().to_string();
    info!("WebSocket connection established with connection_id: {}", connection_id);

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Everything addressed to this connection goes through its outbox
    let (outbox, mut inbox) = mpsc::unbounded_channel::<Arc<ServerEvent>>();
    if app_state.sessions.on_connect(&connection_id, outbox).is_none() {
        error!("Connection id {} collided, closing socket", connection_id);
        return;
    }

    // Forward queued events to the client
    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let text = match serde_json::to_string(&*event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize event for {}: {}", send_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Apply incoming invocations in arrival order. Durable writes they start
    // run on their own tasks and outlive this one.
    let hub = app_state.hub.clone();
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!("WebSocket error on {}: {}", recv_id, e);
                    break;
                }
            };

            // Parse the incoming message as JSON
            let invocation: ClientInvocation = match serde_json::from_str(&text) {
                Ok(invocation) => invocation,
                Err(e) => {
                    error!("Failed to parse message from {}: {}", recv_id, e);
                    continue;
                }
            };

            if let Err(e) = hub.invoke(&recv_id, invocation) {
                warn!("Rejected invocation from {}: {}", recv_id, e);
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    let reason = tokio::select! {
        _ = (&mut send_task) => { recv_task.abort(); "send failed" },
        _ = (&mut recv_task) => { send_task.abort(); "client closed" },
    };

    app_state.sessions.on_disconnect(&connection_id, Some(reason));
    info!("WebSocket connection {} terminated", connection_id);
}
