//! Connected-client registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Pre-serialized text frame queued for one client.
pub type Frame = Arc<str>;

/// Receiving end of a client's outbound queue; drained by the connection's writer task.
pub type Outbox = mpsc::Receiver<Frame>;

/// Frames a client may have queued before it counts as stalled and is dropped.
pub const OUTBOX_CAPACITY: usize = 256;

/// Identity of one connection. Carries no other attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Set of connected clients, each reachable through its outbound queue.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ClientId, mpsc::Sender<Frame>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and hand back the queue its writer drains.
    pub fn register(&mut self) -> (ClientId, Outbox) {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        let id = ClientId::new();
        self.clients.insert(id, tx);
        (id, rx)
    }

    /// Idempotent. Returns whether the client was still registered.
    pub fn unregister(&mut self, id: ClientId) -> bool {
        self.clients.remove(&id).is_some()
    }

    pub fn has_clients(&self) -> bool {
        !self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queue a frame for a single client without waiting. Fails if its writer
    /// has gone away or its queue is full.
    pub fn send_to(&self, id: ClientId, frame: Frame) -> bool {
        match self.clients.get(&id) {
            Some(tx) => tx.try_send(frame).is_ok(),
            None => false,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ClientId, &mpsc::Sender<Frame>)> {
        self.clients.iter()
    }

    /// Drop every outbound queue. Writers observe the closed queue and hang up.
    pub fn clear(&mut self) -> usize {
        let n = self.clients.len();
        self.clients.clear();
        n
    }
}
