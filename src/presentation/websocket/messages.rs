//! WebSocket Message Types
//!
//! Gateway frame formats. Every client command may carry a numeric nonce
//! (`n`); the server answers each command with a correlated Ack frame so
//! callers can distinguish delivered from dropped.

use serde::{Deserialize, Serialize};

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Event dispatch (server -> client)
    Dispatch = 0,
    /// Heartbeat
    Heartbeat = 1,
    /// Identify
    Identify = 2,
    /// Join a conversation room
    JoinConversation = 3,
    /// Join a channel room
    JoinChannel = 4,
    /// Leave a room
    LeaveRoom = 5,
    /// Send a direct message
    SendDirectMessage = 6,
    /// Send a channel message
    SendChannelMessage = 7,
    /// Command acknowledgment (server -> client)
    Ack = 8,
    /// Invalid session
    InvalidSession = 9,
    /// Hello
    Hello = 10,
    /// Heartbeat ACK
    HeartbeatAck = 11,
}

/// Incoming gateway frame
#[derive(Debug, Deserialize)]
pub struct GatewayReceive {
    pub op: u8,
    pub d: Option<serde_json::Value>,
    /// Client-chosen nonce echoed back on the Ack
    pub n: Option<u64>,
}

/// Outgoing gateway frame
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySend {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewaySend {
    /// Build a Dispatch frame carrying a named event.
    pub fn dispatch(event_name: &str, data: serde_json::Value) -> Self {
        Self {
            op: OpCode::Dispatch as u8,
            d: Some(data),
            n: None,
            t: Some(event_name.to_string()),
        }
    }

    /// Build an Ack frame correlated to a client nonce.
    pub fn ack(nonce: Option<u64>, result: Result<serde_json::Value, String>) -> Self {
        let payload = match result {
            Ok(data) => serde_json::json!({ "ok": true, "data": data }),
            Err(error) => serde_json::json!({ "ok": false, "error": error }),
        };
        Self {
            op: OpCode::Ack as u8,
            d: Some(payload),
            n: nonce,
            t: None,
        }
    }
}

/// Hello payload (op 10)
#[derive(Debug, Serialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

/// Ready payload (dispatch READY)
#[derive(Debug, Serialize)]
pub struct ReadyPayload {
    pub user: serde_json::Value,
    pub session_id: String,
}

/// Identify payload (op 2)
#[derive(Debug, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
}

/// Join conversation payload (op 3)
#[derive(Debug, Deserialize)]
pub struct JoinConversationPayload {
    pub room_key: String,
}

/// Join channel payload (op 4)
#[derive(Debug, Deserialize)]
pub struct JoinChannelPayload {
    pub channel_id: String,
}

/// Leave room payload (op 5); exactly one of the fields is set
#[derive(Debug, Deserialize)]
pub struct LeaveRoomPayload {
    pub room_key: Option<String>,
    pub channel_id: Option<String>,
}

/// Send direct message payload (op 6); the target is either an existing
/// room key or a recipient id
#[derive(Debug, Deserialize)]
pub struct SendDirectMessagePayload {
    pub room_key: Option<String>,
    pub recipient_id: Option<String>,
    pub content: String,
}

/// Send channel message payload (op 7)
#[derive(Debug, Deserialize)]
pub struct SendChannelMessagePayload {
    pub channel_id: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Dispatch event name for new direct messages
pub const DIRECT_MESSAGE_CREATE: &str = "DIRECT_MESSAGE_CREATE";

/// Dispatch event name for new channel messages
pub const CHANNEL_MESSAGE_CREATE: &str = "CHANNEL_MESSAGE_CREATE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_success_shape() {
        let frame = GatewaySend::ack(Some(7), Ok(serde_json::json!({"id": "1"})));
        let text = serde_json::to_string(&frame).unwrap();
        assert!(text.contains("\"ok\":true"));
        assert!(text.contains("\"n\":7"));
    }

    #[test]
    fn test_ack_error_shape() {
        let frame = GatewaySend::ack(None, Err("Not a participant".into()));
        let text = serde_json::to_string(&frame).unwrap();
        assert!(text.contains("\"ok\":false"));
        assert!(text.contains("Not a participant"));
        assert!(!text.contains("\"n\":"));
    }

    #[test]
    fn test_receive_frame_parses_nonce() {
        let frame: GatewayReceive =
            serde_json::from_str(r#"{"op":6,"d":{"content":"hi"},"n":42}"#).unwrap();
        assert_eq!(frame.op, OpCode::SendDirectMessage as u8);
        assert_eq!(frame.n, Some(42));
    }
}
