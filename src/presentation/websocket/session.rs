//! WebSocket Session Management

use std::time::Instant;

/// WebSocket session state
#[derive(Debug)]
pub struct SessionState {
    pub user_id: i64,
    pub connection_id: String,
    pub last_heartbeat: Instant,
    pub identified: bool,
}

impl SessionState {
    pub fn new(connection_id: String) -> Self {
        Self {
            user_id: 0,
            connection_id,
            last_heartbeat: Instant::now(),
            identified: false,
        }
    }

    pub fn heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn is_alive(&self, timeout_ms: u64) -> bool {
        self.last_heartbeat.elapsed().as_millis() < timeout_ms as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_is_alive() {
        let session = SessionState::new("conn-1".into());
        assert!(session.is_alive(1000));
        assert!(!session.identified);
    }

    #[test]
    fn test_heartbeat_refreshes_liveness() {
        let mut session = SessionState::new("conn-1".into());
        session.heartbeat();
        assert!(session.is_alive(1000));
    }
}
