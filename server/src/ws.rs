//! WebSocket upgrade and per-connection event loop.
//!
//! Reads and writes run on separate tasks: this task only consumes
//! incoming frames and decides what to send; a spawned writer task
//! drains the outbound channel (fed both by direct replies and by the
//! broker delivering messages from the other side of a farm pairing)
//! and forwards them to the socket. Grounded on the writer-task/mpsc
//! split used by gateway-style WebSocket relays.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::Instrument;

use farm_core::model::FARM_GROUP;

use crate::broker::client_topic;
use crate::command;
use crate::connection::ConnectionState;
use crate::handlers;
use crate::reply::Reply;
use crate::state::AppState;

pub async fn ws_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let span = tracing::info_span!("connection", %peer, user = tracing::field::Empty);
    ws.on_upgrade(move |socket| handle_socket(state, socket).instrument(span))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if ws_tx.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let mut conn = ConnectionState::new();

    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        // Farm-origin short circuit: a socket signed in as a farm has
        // its raw frames relayed to its owner, never parsed as a verb.
        if let Some(user_id) = conn.user {
            if matches!(state.store.is_in_group(user_id, FARM_GROUP), Ok(true)) {
                relay_from_farm(&state, user_id, &text);
                continue;
            }
        }

        let reply = match command::parse(&text) {
            Ok(cmd) => handlers::handle(&*state.store, &state.broker, &mut conn, &out_tx, cmd),
            Err(crate::errors::ProtocolError::Unparseable(verb)) => Reply::ParseError { verb },
        };
        tracing::debug!(%reply, "command processed");

        if let Some(user_id) = conn.user {
            tracing::Span::current().record("user", tracing::field::display(user_id));
        }

        if out_tx.send(reply.to_string()).is_err() {
            break;
        }
    }

    if conn.is_signed_in() {
        let reply = handlers::handle(
            &*state.store,
            &state.broker,
            &mut conn,
            &out_tx,
            command::Command::SignOut,
        );
        tracing::debug!(%reply, "sign_out on close");
    }

    writer.abort();
}

fn relay_from_farm(state: &AppState, farm_user_id: i64, message: &str) {
    let owner = match state.store.farm_owner(farm_user_id) {
        Ok(Some(owner)) => owner,
        _ => return,
    };
    let Ok(Some(owner_session)) = state.store.active_session(owner) else {
        return;
    };
    state
        .broker
        .publish(&client_topic(owner_session), message.to_string());
}
