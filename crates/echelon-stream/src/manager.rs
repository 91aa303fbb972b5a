use echelon_core::ExecutionEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

struct StreamEntry {
    tx: mpsc::UnboundedSender<ExecutionEvent>,
    // Taken by the single consumer; None once claimed.
    rx: Option<mpsc::UnboundedReceiver<ExecutionEvent>>,
}

/// Registry of per-client event queues.
///
/// Each stream has exactly one producer (the task driver) and exactly one
/// consumer (the SSE response for that connection); the consumer claims the
/// receiving half via [`take_receiver`](StreamManager::take_receiver), so a
/// second consumer cannot attach. The registry lock only guards
/// create/lookup/remove; queue traffic goes through the channel itself.
///
/// The manager is an injectable service object — construct one per process
/// and share it via `Arc`.
pub struct StreamManager {
    streams: RwLock<HashMap<String, StreamEntry>>,
}

impl StreamManager {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            streams: RwLock::new(HashMap::new()),
        })
    }

    /// Allocates a fresh stream with an empty queue and returns its id.
    pub fn create(&self) -> String {
        let id = format!("stream_{}", Uuid::new_v4().simple());
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams
            .write()
            .insert(id.clone(), StreamEntry { tx, rx: Some(rx) });
        info!(stream_id = %id, "Stream created");
        id
    }

    /// Enqueues an event on the given stream.
    ///
    /// Returns `false` — and does nothing else — when the stream no longer
    /// exists; sending to a removed stream must never fail the producer.
    /// Producers use the return value as their cancellation signal.
    pub fn send(&self, id: &str, event: ExecutionEvent) -> bool {
        let streams = self.streams.read();
        match streams.get(id) {
            Some(entry) => entry.tx.send(event).is_ok(),
            None => {
                debug!(stream_id = %id, "Dropped event for missing stream");
                false
            }
        }
    }

    /// Enqueues the terminal `end` event. The queue itself stays registered;
    /// the consumer removes it after delivery.
    pub fn close(&self, id: &str) {
        self.send(id, ExecutionEvent::end("Stream completed"));
    }

    /// Claims the consuming half of the stream's queue.
    ///
    /// Returns `None` when the stream does not exist or a consumer already
    /// claimed it.
    pub fn take_receiver(&self, id: &str) -> Option<mpsc::UnboundedReceiver<ExecutionEvent>> {
        self.streams.write().get_mut(id).and_then(|e| e.rx.take())
    }

    /// Deletes the stream. Idempotent; never fails on a missing id.
    pub fn remove(&self, id: &str) {
        if self.streams.write().remove(id).is_some() {
            info!(stream_id = %id, "Stream removed");
        }
    }

    /// Whether the stream is still registered.
    pub fn contains(&self, id: &str) -> bool {
        self.streams.read().contains_key(id)
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}
