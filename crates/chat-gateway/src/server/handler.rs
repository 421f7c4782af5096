//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.

use crate::broadcast::Broadcaster;
use crate::connection::Connection;
use crate::handlers::{LifecycleController, MessageDispatcher};
use crate::protocol::Envelope;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel::<String>(state.config().gateway.outbound_buffer.max(1));
    let connection = Connection::new(Connection::generate_id(), tx);
    let connection_id = connection.id().to_string();

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Queued ahead of anything a handler can send
    Broadcaster::send_to(&connection, &Envelope::welcome());

    let (mut ws_sink, ws_stream) = socket.split();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn task to receive messages from WebSocket
    let mut recv_task = tokio::spawn(receive_frames(
        state.clone(),
        connection.clone(),
        ws_stream,
        shutdown_rx,
    ));

    // Clone for send task
    let connection_id_send = connection_id.clone();

    // Spawn task to send messages to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sink.send(Message::Text(text)).await.is_err() {
                tracing::warn!(
                    connection_id = %connection_id_send,
                    "Failed to send message to WebSocket"
                );
                break;
            }
        }

        let _ = ws_sink.close().await;
    });

    // Clone for idle monitor
    let connection_idle = connection.clone();
    let idle_timeout = state.config().gateway.idle_timeout();

    // Spawn idle monitoring task
    let mut idle_task = tokio::spawn(async move {
        let Some(timeout) = idle_timeout else {
            std::future::pending::<()>().await;
            return;
        };

        let mut check_interval = interval(timeout / 2);
        loop {
            check_interval.tick().await;

            let idle_for = connection_idle.idle_for();
            if idle_for > timeout {
                tracing::warn!(
                    connection_id = %connection_idle.id(),
                    idle_ms = idle_for.as_millis(),
                    "Connection idle too long"
                );
                break;
            }
        }
    });

    // Wait for any task to complete
    let recv_finished = tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
            true
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            false
        }
        _ = &mut idle_task => {
            tracing::debug!(connection_id = %connection_id, "Idle monitor ended");
            false
        }
    };

    // The receive loop stops between frames, so a running handler completes
    // before teardown starts
    let _ = shutdown_tx.send(true);
    if !recv_finished {
        if let Err(e) = recv_task.await {
            tracing::warn!(connection_id = %connection_id, error = %e, "Receive task failed");
        }
    }
    send_task.abort();
    idle_task.abort();

    LifecycleController::close(&state, &connection).await;
}

/// Feed inbound frames to the dispatcher until the client goes away or
/// `shutdown` fires.
///
/// `shutdown` is only observed while waiting for the next frame.
async fn receive_frames<S>(
    state: GatewayState,
    connection: Arc<Connection>,
    mut frames: S,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let connection_id = connection.id().to_string();

    loop {
        let msg = tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!(connection_id = %connection_id, "Receive loop stopped");
                break;
            }
            msg = frames.next() => msg,
        };

        let Some(msg) = msg else {
            break;
        };

        match msg {
            Ok(Message::Text(text)) => {
                connection.touch();
                MessageDispatcher::handle_frame(&state, &connection, &text).await;
            }
            Ok(Message::Binary(_)) => {
                connection.touch();
                tracing::debug!(connection_id = %connection_id, "Binary messages not supported");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                connection.touch();
                tracing::trace!(connection_id = %connection_id, "Transport ping/pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}
