//! Room Membership Registry
//!
//! Ephemeral room subscriptions behind an injectable trait, so the backing
//! implementation can be swapped without touching call sites. The in-memory
//! implementation is process-local: membership is rebuilt per connection and
//! lost on restart, and a second gateway process would have its own,
//! disjoint registry.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::infrastructure::metrics;

use super::messages::GatewaySend;

/// Room id for a conversation pair key.
pub fn dm_room(room_key: &str) -> String {
    format!("dm:{}", room_key)
}

/// Room id for a channel.
pub fn channel_room(channel_id: i64) -> String {
    format!("channel:{}", channel_id)
}

fn room_kind(room: &str) -> &'static str {
    if room.starts_with("dm:") {
        "dm"
    } else {
        "channel"
    }
}

/// Room membership service: subscribe, unsubscribe, publish-to-room.
///
/// Connections are identified by an opaque id; each carries the sender half
/// of its outgoing frame queue.
pub trait RoomRegistry: Send + Sync {
    /// Add a connection to a room. Joining the same room twice from the
    /// same connection leaves exactly one subscription.
    fn subscribe(&self, room: &str, connection_id: &str, sender: mpsc::UnboundedSender<GatewaySend>);

    /// Remove a connection from a room; idempotent.
    fn unsubscribe(&self, room: &str, connection_id: &str);

    /// Send a frame to every connection currently in the room. Returns the
    /// number of connections the frame was queued for.
    fn publish(&self, room: &str, frame: GatewaySend) -> usize;

    /// Remove a connection from every room it had joined.
    fn drop_connection(&self, connection_id: &str);

    /// Number of connections in a room.
    fn room_size(&self, room: &str) -> usize;
}

/// Process-local registry backed by DashMap.
#[derive(Default)]
pub struct InMemoryRoomRegistry {
    /// room id -> connection id -> outgoing frame sender
    rooms: DashMap<String, HashMap<String, mpsc::UnboundedSender<GatewaySend>>>,
    /// connection id -> room ids it joined
    connections: DashMap<String, HashSet<String>>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomRegistry for InMemoryRoomRegistry {
    fn subscribe(
        &self,
        room: &str,
        connection_id: &str,
        sender: mpsc::UnboundedSender<GatewaySend>,
    ) {
        let fresh = self
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id.to_string(), sender)
            .is_none();
        self.connections
            .entry(connection_id.to_string())
            .or_default()
            .insert(room.to_string());

        // Re-joins replace the sender in place and must not inflate the gauge
        if fresh {
            metrics::inc_room_subscriptions(room_kind(room));
        }

        tracing::debug!(room = %room, connection_id = %connection_id, "Subscribed to room");
    }

    fn unsubscribe(&self, room: &str, connection_id: &str) {
        let removed = self
            .rooms
            .get_mut(room)
            .map(|mut members| members.remove(connection_id).is_some())
            .unwrap_or(false);
        if let Some(mut rooms) = self.connections.get_mut(connection_id) {
            rooms.remove(room);
        }

        if removed {
            metrics::dec_room_subscriptions(room_kind(room));
        }
    }

    fn publish(&self, room: &str, frame: GatewaySend) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        if let Some(members) = self.rooms.get(room) {
            for (connection_id, sender) in members.iter() {
                if sender.send(frame.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(connection_id.clone());
                }
            }
        }

        // Connections whose receive half is gone are pruned lazily
        for connection_id in dead {
            self.unsubscribe(room, &connection_id);
        }

        delivered
    }

    fn drop_connection(&self, connection_id: &str) {
        if let Some((_, rooms)) = self.connections.remove(connection_id) {
            for room in rooms {
                let removed = self
                    .rooms
                    .get_mut(&room)
                    .map(|mut members| members.remove(connection_id).is_some())
                    .unwrap_or(false);
                if removed {
                    metrics::dec_room_subscriptions(room_kind(&room));
                }
            }
        }
    }

    fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::websocket::messages::OpCode;

    fn test_frame() -> GatewaySend {
        GatewaySend {
            op: OpCode::Dispatch as u8,
            d: Some(serde_json::json!({"content": "hello"})),
            n: None,
            t: Some("TEST".into()),
        }
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let registry = InMemoryRoomRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        registry.subscribe("channel:1", "conn-a", tx_a);
        registry.subscribe("channel:1", "conn-b", tx_b);

        let delivered = registry.publish("channel:1", test_frame());
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_double_join_leaves_single_subscription() {
        let registry = InMemoryRoomRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.subscribe("dm:1_2", "conn-a", tx.clone());
        registry.subscribe("dm:1_2", "conn-a", tx);

        assert_eq!(registry.room_size("dm:1_2"), 1);
        let delivered = registry.publish("dm:1_2", test_frame());
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
        // No duplicate delivery of a single broadcast
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_misses_non_subscribers() {
        let registry = InMemoryRoomRegistry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        registry.subscribe("channel:1", "conn-a", tx_a);
        registry.subscribe("channel:2", "conn-b", tx_b);

        registry.publish("channel:1", test_frame());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = InMemoryRoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.subscribe("channel:1", "conn-a", tx);
        registry.unsubscribe("channel:1", "conn-a");
        registry.unsubscribe("channel:1", "conn-a");

        assert_eq!(registry.room_size("channel:1"), 0);
        assert_eq!(registry.publish("channel:1", test_frame()), 0);
    }

    #[test]
    fn test_drop_connection_clears_all_rooms() {
        let registry = InMemoryRoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.subscribe("channel:1", "conn-a", tx.clone());
        registry.subscribe("dm:1_2", "conn-a", tx);

        registry.drop_connection("conn-a");

        assert_eq!(registry.room_size("channel:1"), 0);
        assert_eq!(registry.room_size("dm:1_2"), 0);
    }

    #[test]
    fn test_dead_receivers_are_pruned_on_publish() {
        let registry = InMemoryRoomRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        registry.subscribe("channel:1", "conn-a", tx);
        assert_eq!(registry.publish("channel:1", test_frame()), 0);
        assert_eq!(registry.room_size("channel:1"), 0);
    }

    #[test]
    fn test_room_id_helpers() {
        assert_eq!(dm_room("13_7"), "dm:13_7");
        assert_eq!(channel_room(42), "channel:42");
    }
}
