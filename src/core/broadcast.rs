//! Publish/subscribe fan-out of serial chunks.
//!
//! Every subscriber owns an unbounded FIFO queue. Publishing never waits on
//! a consumer: a stalled subscriber only grows its own queue.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::domain::error::{SerconError, SerconResult};

/// One immutable batch of bytes from a single device read
pub type Chunk = Bytes;

/// Subscriber identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Registry {
    queues: HashMap<SubscriberId, (&'static str, mpsc::UnboundedSender<Chunk>)>,
}

/// Publish/subscribe hub. Clones share one registry.
#[derive(Debug, Clone, Default)]
pub struct Broadcaster {
    registry: Arc<Mutex<Registry>>,
}

/// Independent consumer of the published chunk stream
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    name: &'static str,
    receiver: mpsc::UnboundedReceiver<Chunk>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. It observes every chunk published from
    /// now on, in publish order.
    pub fn subscribe(&self, name: &'static str) -> Subscriber {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SubscriberId::new();

        self.lock().queues.insert(id, (name, sender));
        debug!(%id, name, "Subscriber registered");

        Subscriber { id, name, receiver }
    }

    /// Remove a subscriber. Its pending chunks stay readable, after which
    /// reads fail with [`SerconError::SubscriberClosed`].
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().queues.remove(&id);
        if let Some((name, _)) = &removed {
            debug!(%id, name, "Subscriber removed");
        }
        removed.is_some()
    }

    /// Deliver `chunk` to every current subscriber's queue
    pub fn publish(&self, chunk: Chunk) {
        // Delivery happens outside the registry lock.
        let targets: Vec<_> = self
            .lock()
            .queues
            .iter()
            .map(|(id, (_, sender))| (*id, sender.clone()))
            .collect();

        let mut gone = Vec::new();
        for (id, sender) in targets {
            if sender.send(chunk.clone()).is_err() {
                gone.push(id);
            }
        }
        trace!(len = chunk.len(), "Chunk published");

        if !gone.is_empty() {
            let mut registry = self.lock();
            for id in gone {
                if let Some((name, _)) = registry.queues.remove(&id) {
                    debug!(%id, name, "Dropping subscriber whose consumer went away");
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().queues.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        // The registry stays consistent even if a holder panicked.
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Subscriber {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait up to `timeout` for the next chunk.
    ///
    /// `Ok(None)` means the wait timed out, which is not an error: callers
    /// use it to re-check the process state.
    pub async fn get(&mut self, timeout: Duration) -> SerconResult<Option<Chunk>> {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(chunk)) => Ok(Some(chunk)),
            Ok(None) => Err(SerconError::SubscriberClosed),
            Err(_) => Ok(None),
        }
    }

    /// Take the next chunk if one is already queued
    pub fn try_get(&mut self) -> SerconResult<Option<Chunk>> {
        match self.receiver.try_recv() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SerconError::SubscriberClosed),
        }
    }
}
