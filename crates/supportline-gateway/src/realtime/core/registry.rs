use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use std::sync::atomic::{AtomicU64, Ordering};

/// One session's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

struct Registered {
    conn: Connection,
    generation: u64,
}

/// Connection registry: `user_id -> Connection`, one connection per user.
///
/// A newer registration for the same user displaces the older one. Each
/// registration carries a generation so a stale session tearing down late
/// cannot deregister its replacement.
#[derive(Default)]
pub struct ConnectionRegistry {
    online: DashMap<String, Registered>,
    generations: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            online: DashMap::new(),
            generations: AtomicU64::new(1),
        }
    }

    /// Register `conn` for `user_id`. Returns the registration's generation
    /// and the displaced connection, if the user was already online.
    pub fn register(&self, user_id: &str, conn: Connection) -> (u64, Option<Connection>) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let displaced = self
            .online
            .insert(user_id.to_string(), Registered { conn, generation })
            .map(|r| r.conn);
        (generation, displaced)
    }

    /// Deregister only if `generation` still matches the registered entry.
    /// Returns true when an entry was actually removed (the user went
    /// offline), false for stale teardowns.
    pub fn deregister(&self, user_id: &str, generation: u64) -> bool {
        self.online
            .remove_if(user_id, |_, r| r.generation == generation)
            .is_some()
    }

    pub fn get(&self, user_id: &str) -> Option<Connection> {
        self.online.get(user_id).map(|r| r.conn.clone())
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.online.contains_key(user_id)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    /// Snapshot of every registered connection except `exclude`.
    pub fn peers_of(&self, exclude: &str) -> Vec<(String, Connection)> {
        self.online
            .iter()
            .filter(|r| r.key() != exclude)
            .map(|r| (r.key().clone(), r.value().conn.clone()))
            .collect()
    }
}
