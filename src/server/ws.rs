//! WebSocket push channel
//!
//! Each accepted viewer connection becomes two tasks:
//!
//! - a read loop that drains inbound frames and exits on a close frame or a
//!   transport error (viewers send nothing meaningful; the loop exists to
//!   observe liveness),
//! - a write loop that pulls payloads from the connection's registry queue
//!   and puts each on the socket under the configured deadline.
//!
//! Whichever side finishes first ends the connection, and `unregister` runs
//! on every exit path, so the registry never leaks an entry.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::registry::ConnectionRegistry;
use crate::store::ReadingStore;

use super::http::AppState;

/// Upgrade handler: hands the established socket to the registry
pub(crate) async fn upgrade<S: ReadingStore + 'static>(
    State(state): State<AppState<S>>,
    ws: WebSocketUpgrade,
) -> Response {
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| serve_connection(socket, registry))
}

/// Drive one viewer connection from registration to removal
async fn serve_connection(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let send_timeout = registry.config().send_timeout;
    let (id, outbound) = registry.register().await;
    let (sink, stream) = socket.split();

    let mut write_task = tokio::spawn(write_loop(sink, outbound, send_timeout));
    let mut read_task = tokio::spawn(read_loop(stream));

    // First side to finish decides the connection is over
    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => {}
    }

    // Every exit path lands here: close frame, transport error, write
    // deadline overrun. Unregistering drops the queue sender, which lets a
    // still-running write task flush and send the close frame.
    registry.unregister(id).await;
}

async fn read_loop(mut stream: SplitStream<WebSocket>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Bytes>,
    deadline: Duration,
) {
    while let Some(payload) = outbound.recv().await {
        match tokio::time::timeout(deadline, sink.send(text_message(payload))).await {
            Ok(Ok(())) => {}
            // Transport failure or deadline overrun: the peer is dead or too
            // slow, the read side gets aborted and removal follows
            Ok(Err(_)) | Err(_) => return,
        }
    }

    // Queue closed cleanly: we were unregistered or the server is draining
    let _ = sink.send(Message::Close(None)).await;
}

/// Broadcast payloads are serde_json output, so text; anything else goes out
/// as a binary frame unchanged
fn text_message(payload: Bytes) -> Message {
    match String::from_utf8(payload.to_vec()) {
        Ok(text) => Message::Text(text),
        Err(raw) => Message::Binary(raw.into_bytes()),
    }
}
