//! Session registry mapping session ids to live transports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, info, warn};

use crate::bridge::EventStreamTransport;

struct SessionEntry {
    transport: Arc<EventStreamTransport>,
    last_seen: Instant,
}

/// Process-wide mapping from session id to its active transport.
///
/// Owned by the composition root and shared through `AppState` rather than
/// accessed as ambient global state. Backed by a concurrent map so every
/// `put`/`get`/`remove` is a single atomic step; no operation holds a lock
/// across an await point.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Insert or replace the transport registered under `id`.
    ///
    /// Id uniqueness is the transport constructor's guarantee; a
    /// replacement only happens if that guarantee is violated, so it is
    /// logged.
    pub fn put(&self, id: &str, transport: Arc<EventStreamTransport>) {
        let entry = SessionEntry {
            transport,
            last_seen: Instant::now(),
        };
        if self.sessions.insert(id.to_string(), entry).is_some() {
            warn!("Replaced existing transport for session {}", id);
        } else {
            debug!("Registered session {}", id);
        }
    }

    /// Look up the transport for `id`, refreshing its activity stamp.
    ///
    /// Absence is a normal outcome: the session expired, was closed, or
    /// never existed.
    pub fn get(&self, id: &str) -> Option<Arc<EventStreamTransport>> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.transport.clone()
        })
    }

    /// Remove the entry for `id` if present. Idempotent.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!("Deregistered session {}", id);
        }
        removed
    }

    /// Remove every session idle longer than `ttl`. Returns the count.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            info!("Swept {} idle session(s)", swept);
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the background reaper that expires idle sessions.
///
/// Keeps expiry off the hot path of open/deliver; a session that sees no
/// delivery for `ttl` is deregistered on the next sweep.
pub fn spawn_reaper(
    registry: Arc<SessionRegistry>,
    ttl: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            registry.sweep_idle(ttl);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BufferedSink;

    fn transport() -> Arc<EventStreamTransport> {
        Arc::new(EventStreamTransport::new("/messages", BufferedSink::new()))
    }

    #[test]
    fn test_put_get_remove() {
        let registry = SessionRegistry::new();
        let t = transport();
        let id = t.session_id().to_string();

        registry.put(&id, t.clone());
        assert_eq!(registry.len(), 1);

        let found = registry.get(&id).unwrap();
        assert_eq!(found.session_id(), id);

        assert!(registry.remove(&id));
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_absent_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let t = transport();
        let id = t.session_id().to_string();
        registry.put(&id, t);

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let registry = SessionRegistry::new();
        let first = transport();
        let second = transport();

        registry.put("same-id", first);
        registry.put("same-id", second.clone());

        assert_eq!(registry.len(), 1);
        let found = registry.get("same-id").unwrap();
        assert_eq!(found.session_id(), second.session_id());
    }

    #[test]
    fn test_sweep_idle_removes_only_stale_entries() {
        let registry = SessionRegistry::new();
        let stale = transport();
        let fresh = transport();
        let stale_id = stale.session_id().to_string();
        let fresh_id = fresh.session_id().to_string();

        registry.put(&stale_id, stale);
        std::thread::sleep(Duration::from_millis(30));
        registry.put(&fresh_id, fresh);

        let swept = registry.sweep_idle(Duration::from_millis(20));
        assert_eq!(swept, 1);
        assert!(registry.get(&stale_id).is_none());
        assert!(registry.get(&fresh_id).is_some());
    }

    #[test]
    fn test_get_refreshes_activity() {
        let registry = SessionRegistry::new();
        let t = transport();
        let id = t.session_id().to_string();
        registry.put(&id, t);

        std::thread::sleep(Duration::from_millis(30));
        registry.get(&id).unwrap();

        assert_eq!(registry.sweep_idle(Duration::from_millis(20)), 0);
        assert!(registry.get(&id).is_some());
    }
}
