//! WebSocket Connection Handler
//!
//! Handles individual WebSocket connections: Hello/Identify handshake,
//! heartbeats, and the command loop. Every client command is answered with
//! a correlated Ack frame.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use uuid::Uuid;

use crate::domain::UserRepository;
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::PgUserRepository;
use crate::presentation::websocket::gateway::{ConnectionHandle, DirectMessageTarget};
use crate::startup::AppState;

use super::messages::{
    GatewayReceive, GatewaySend, HelloPayload, IdentifyPayload, JoinChannelPayload,
    JoinConversationPayload, LeaveRoomPayload, OpCode, ReadyPayload, SendChannelMessagePayload,
    SendDirectMessagePayload,
};
use super::registry::{channel_room, dm_room};
use super::session::SessionState;

/// JWT claims for token validation
#[derive(Debug, serde::Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Decrements a connection gauge when the connection task exits, on every
/// return path.
struct ConnectionGauge(&'static str);

impl ConnectionGauge {
    fn new(state: &'static str) -> Self {
        metrics::inc_gateway_connections(state);
        Self(state)
    }
}

impl Drop for ConnectionGauge {
    fn drop(&mut self) {
        metrics::dec_gateway_connections(self.0);
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let mut session_state = SessionState::new(connection_id.clone());
    let _connected_gauge = ConnectionGauge::new("connected");

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing frames; the registry holds clones of this sender
    let (tx, mut rx) = mpsc::unbounded_channel::<GatewaySend>();

    // Send Hello immediately
    let hello = GatewaySend {
        op: OpCode::Hello as u8,
        d: serde_json::to_value(HelloPayload {
            heartbeat_interval: state.gateway.heartbeat_interval(),
        })
        .ok(),
        n: None,
        t: None,
    };

    if let Err(e) = send_frame(&mut sender, &hello).await {
        tracing::error!("Failed to send Hello: {}", e);
        return;
    }

    // Forward queued frames to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Wait for Identify (with timeout)
    let identify_timeout = Duration::from_secs(state.settings.websocket.identify_timeout_secs);
    let identify_result = timeout(identify_timeout, async {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(frame) = serde_json::from_str::<GatewayReceive>(&text) {
                        if frame.op == OpCode::Identify as u8 {
                            if let Some(d) = frame.d {
                                if let Ok(identify) =
                                    serde_json::from_value::<IdentifyPayload>(d)
                                {
                                    return Some(identify);
                                }
                            }
                        }
                    }
                }
                Ok(Message::Close(_)) => return None,
                Err(_) => return None,
                _ => continue,
            }
        }
        None
    })
    .await;

    let identify = match identify_result {
        Ok(Some(identify)) => identify,
        _ => {
            tracing::debug!(connection_id = %connection_id, "No Identify before timeout or close");
            let _ = tx.send(GatewaySend {
                op: OpCode::InvalidSession as u8,
                d: Some(json!(false)),
                n: None,
                t: None,
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
            sender_task.abort();
            return;
        }
    };

    // Validate token and resolve the caller's identity
    let user_id = match validate_token(&identify.token, &state) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Invalid token");
            let _ = tx.send(GatewaySend {
                op: OpCode::InvalidSession as u8,
                d: Some(json!(false)),
                n: None,
                t: None,
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
            sender_task.abort();
            return;
        }
    };

    let user_info = match load_user_info(user_id, &state).await {
        Ok(info) => info,
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Failed to load user");
            let _ = tx.send(GatewaySend {
                op: OpCode::InvalidSession as u8,
                d: Some(json!(false)),
                n: None,
                t: None,
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
            sender_task.abort();
            return;
        }
    };

    session_state.user_id = user_id;
    session_state.identified = true;
    let _identified_gauge = ConnectionGauge::new("identified");

    let conn = ConnectionHandle {
        connection_id: connection_id.clone(),
        user_id,
        sender: tx.clone(),
    };

    // Send READY
    let ready = GatewaySend::dispatch(
        "READY",
        serde_json::to_value(ReadyPayload {
            user: user_info,
            session_id: connection_id.clone(),
        })
        .unwrap_or_default(),
    );
    if tx.send(ready).is_err() {
        sender_task.abort();
        return;
    }

    tracing::info!(user_id = user_id, connection_id = %connection_id, "User connected and identified");

    // Heartbeat liveness check with a grace period
    let heartbeat_interval_ms = state.gateway.heartbeat_interval();
    let mut heartbeat_check = interval(Duration::from_millis(heartbeat_interval_ms + 10000));
    heartbeat_check.tick().await; // Skip first immediate tick

    // Main command loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&text, &mut session_state, &conn, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Pong is handled automatically by axum
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }

            _ = heartbeat_check.tick() => {
                let timeout_ms = heartbeat_interval_ms + 10000;
                if !session_state.is_alive(timeout_ms) {
                    tracing::info!(connection_id = %connection_id, "Heartbeat timeout, closing connection");
                    break;
                }
            }
        }
    }

    // Cleanup: leave every joined room; in-flight persists still complete
    state.gateway.disconnect(&connection_id);
    sender_task.abort();

    tracing::info!(user_id = user_id, connection_id = %connection_id, "User disconnected");
}

/// Handle one incoming frame; commands are answered with a correlated Ack.
async fn handle_frame(
    text: &str,
    session_state: &mut SessionState,
    conn: &ConnectionHandle,
    state: &AppState,
) {
    let frame = match serde_json::from_str::<GatewayReceive>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(connection_id = %conn.connection_id, error = %e, "Unparseable frame");
            let _ = conn
                .sender
                .send(GatewaySend::ack(None, Err("Invalid frame".into())));
            return;
        }
    };
    let nonce = frame.n;

    match frame.op {
        op if op == OpCode::Heartbeat as u8 => {
            session_state.heartbeat();
            let _ = conn.sender.send(GatewaySend {
                op: OpCode::HeartbeatAck as u8,
                d: None,
                n: None,
                t: None,
            });
        }

        op if op == OpCode::JoinConversation as u8 => {
            let result = match parse_payload::<JoinConversationPayload>(frame.d) {
                Ok(payload) => state
                    .gateway
                    .join_conversation(conn, &payload.room_key)
                    .await
                    .map(|room| json!({ "room": room }))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            let _ = conn.sender.send(GatewaySend::ack(nonce, result));
        }

        op if op == OpCode::JoinChannel as u8 => {
            let result = match parse_payload::<JoinChannelPayload>(frame.d) {
                Ok(payload) => match payload.channel_id.parse::<i64>() {
                    Ok(channel_id) => state
                        .gateway
                        .join_channel(conn, channel_id)
                        .await
                        .map(|room| json!({ "room": room }))
                        .map_err(|e| e.to_string()),
                    Err(_) => Err("Invalid channel id".into()),
                },
                Err(e) => Err(e),
            };
            let _ = conn.sender.send(GatewaySend::ack(nonce, result));
        }

        op if op == OpCode::LeaveRoom as u8 => {
            let result = match parse_payload::<LeaveRoomPayload>(frame.d) {
                Ok(payload) => {
                    let room = match (payload.room_key, payload.channel_id) {
                        (Some(key), _) => Some(dm_room(&key)),
                        (None, Some(id)) => id.parse::<i64>().ok().map(channel_room),
                        (None, None) => None,
                    };
                    match room {
                        Some(room) => {
                            state.gateway.leave(conn, &room);
                            Ok(json!({ "room": room }))
                        }
                        None => Err("Missing room".into()),
                    }
                }
                Err(e) => Err(e),
            };
            let _ = conn.sender.send(GatewaySend::ack(nonce, result));
        }

        op if op == OpCode::SendDirectMessage as u8 => {
            let result = match parse_payload::<SendDirectMessagePayload>(frame.d) {
                Ok(payload) => {
                    let target = match (payload.room_key, payload.recipient_id) {
                        (Some(key), _) => Some(DirectMessageTarget::RoomKey(key)),
                        (None, Some(id)) => {
                            id.parse::<i64>().ok().map(DirectMessageTarget::Recipient)
                        }
                        (None, None) => None,
                    };
                    match target {
                        Some(target) => state
                            .gateway
                            .send_direct_message(conn, target, &payload.content)
                            .await
                            .map(|dto| json!({ "id": dto.id, "room_key": dto.room_key }))
                            .map_err(|e| e.to_string()),
                        None => Err("Missing target".into()),
                    }
                }
                Err(e) => Err(e),
            };
            let _ = conn.sender.send(GatewaySend::ack(nonce, result));
        }

        op if op == OpCode::SendChannelMessage as u8 => {
            let result = match parse_payload::<SendChannelMessagePayload>(frame.d) {
                Ok(payload) => match payload.channel_id.parse::<i64>() {
                    Ok(channel_id) => state
                        .gateway
                        .send_channel_message(conn, channel_id, &payload.content, payload.attachments)
                        .await
                        .map(|dto| json!({ "id": dto.id, "channel_id": dto.channel_id }))
                        .map_err(|e| e.to_string()),
                    Err(_) => Err("Invalid channel id".into()),
                },
                Err(e) => Err(e),
            };
            let _ = conn.sender.send(GatewaySend::ack(nonce, result));
        }

        op => {
            tracing::debug!(connection_id = %conn.connection_id, op = op, "Unknown opcode");
            let _ = conn
                .sender
                .send(GatewaySend::ack(nonce, Err("Unknown opcode".into())));
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    d: Option<serde_json::Value>,
) -> Result<T, String> {
    let d = d.ok_or("Missing payload")?;
    serde_json::from_value(d).map_err(|e| format!("Invalid payload: {}", e))
}

/// Validate JWT token and return user ID
fn validate_token(token: &str, state: &AppState) -> Result<i64, String> {
    let secret = &state.settings.jwt.secret;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| format!("Invalid token: {}", e))?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|e| format!("Invalid user ID in token: {}", e))
}

/// Load user info for the READY payload
async fn load_user_info(user_id: i64, state: &AppState) -> Result<serde_json::Value, String> {
    let user_repo = PgUserRepository::new(state.db.clone());

    let user = user_repo
        .find_by_id(user_id)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or("User not found")?;

    Ok(json!({
        "id": user.id.to_string(),
        "username": user.username,
        "display_name": user.display_name,
        "avatar_url": user.avatar_url,
    }))
}
