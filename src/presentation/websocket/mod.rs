//! WebSocket Gateway
//!
//! Real-time communication via WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod session;

pub use gateway::{ConnectionHandle, DirectMessageTarget, Gateway, GatewayError};
pub use handler::ws_handler;
pub use messages::{GatewayReceive, GatewaySend, OpCode};
pub use registry::{channel_room, dm_room, InMemoryRoomRegistry, RoomRegistry};
pub use session::SessionState;
