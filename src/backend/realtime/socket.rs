/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket. Each connection gets a `Session`; inbound
 * text frames are decoded as `ClientMessage` and dispatched, and everything
 * the session produces is written back as JSON text frames.
 *
 * A frame that does not decode is answered with an `invalid_message` error
 * and the connection stays open. Binary, ping and pong frames are ignored.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::backend::realtime::dispatch::dispatch;
use crate::backend::realtime::session::Session;
use crate::backend::server::state::AppState;
use crate::shared::{ClientMessage, ServerMessage};

/// Handle realtime connection upgrade (GET /ws)
pub async fn handle_socket_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut session = Session::new(state.hub.clone()).with_registry(state.registry.clone());
    tracing::info!(
        "[Realtime] Session {} connected ({} open)",
        session.id(),
        state.hub.connection_count()
    );

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => match ClientMessage::decode(text.as_str()) {
                    Ok(message) => dispatch(&state, &mut session, message).await,
                    Err(e) => {
                        tracing::warn!("[Realtime] Session {} sent an undecodable frame: {}", session.id(), e);
                        session.reply(ServerMessage::error("invalid_message", e.to_string()));
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Realtime] Session {} receive error: {}", session.id(), e);
                    break;
                }
            },
            outbound = session.next_outbound() => {
                let Some(message) = outbound else { break };
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("[Realtime] Failed to encode {}: {}", message.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::debug!("[Realtime] Session {} send failed: {}", session.id(), e);
                    break;
                }
            }
        }
    }

    tracing::info!("[Realtime] Session {} disconnected", session.id());
}
