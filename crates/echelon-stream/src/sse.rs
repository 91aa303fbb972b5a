use crate::manager::StreamManager;
use echelon_core::ExecutionEvent;
use futures_util::Stream;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Encodes one event as a single SSE frame:
/// `data: ` + compact single-line JSON + two newlines.
pub fn format_frame(event: &ExecutionEvent) -> serde_json::Result<String> {
    let json = serde_json::to_string(event)?;
    Ok(format!("data: {json}\n\n"))
}

enum DeliveryState {
    /// The bootstrap `connection` frame has not been written yet.
    Bootstrap,
    /// Draining queued events.
    Draining,
    /// Terminal; no further frames.
    Done,
}

/// SSE frame stream over one registered event queue.
///
/// Attaching claims the queue's consuming half, so each stream has at most
/// one consumer. The first frame is a `connection` bootstrap event carrying
/// the stream id; delivery then proceeds in FIFO order and completes after
/// writing a terminal `end` frame. When the client disconnects, the HTTP
/// server drops the response body — and with it this stream — which both
/// stops delivery and cleans up the registry: the `Drop` impl calls
/// [`StreamManager::remove`] exactly once on every exit path, making
/// subsequent producer sends fail and cancelling the producer early.
pub struct DeliveryStream {
    id: String,
    manager: Arc<StreamManager>,
    rx: mpsc::UnboundedReceiver<ExecutionEvent>,
    state: DeliveryState,
}

impl DeliveryStream {
    /// Claims the queue of `id` and prepares delivery.
    ///
    /// Returns `None` when the stream does not exist or is already being
    /// consumed.
    pub fn attach(manager: Arc<StreamManager>, id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let rx = manager.take_receiver(&id)?;
        Some(Self {
            id,
            manager,
            rx,
            state: DeliveryState::Bootstrap,
        })
    }

    /// The stream id this delivery is bound to.
    pub fn stream_id(&self) -> &str {
        &self.id
    }

    fn frame_or_error(&mut self, event: &ExecutionEvent) -> String {
        match format_frame(event) {
            Ok(frame) => frame,
            Err(e) => {
                // Serialization failure terminates this delivery with one
                // error frame; the producer and other streams are unaffected.
                warn!(stream_id = %self.id, error = %e, "Event serialization failed");
                self.state = DeliveryState::Done;
                let mut error = ExecutionEvent::error(format!("Event serialization failed: {e}"));
                error.stream_id = Some(self.id.clone());
                format_frame(&error).unwrap_or_else(|_| {
                    "data: {\"type\":\"error\",\"agent\":\"System\",\"message\":\"serialization failed\"}\n\n"
                        .to_string()
                })
            }
        }
    }
}

impl Stream for DeliveryStream {
    type Item = Result<String, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.state {
            DeliveryState::Done => Poll::Ready(None),
            DeliveryState::Bootstrap => {
                this.state = DeliveryState::Draining;
                let event = ExecutionEvent::connection(this.id.clone());
                let frame = this.frame_or_error(&event);
                Poll::Ready(Some(Ok(frame)))
            }
            DeliveryState::Draining => match this.rx.poll_recv(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(None) => {
                    // Producer gone and queue drained without a terminal
                    // event; end delivery quietly.
                    debug!(stream_id = %this.id, "Queue closed without end event");
                    this.state = DeliveryState::Done;
                    Poll::Ready(None)
                }
                Poll::Ready(Some(event)) => {
                    if event.is_terminal() {
                        this.state = DeliveryState::Done;
                    }
                    let frame = this.frame_or_error(&event);
                    Poll::Ready(Some(Ok(frame)))
                }
            },
        }
    }
}

impl Drop for DeliveryStream {
    fn drop(&mut self) {
        self.manager.remove(&self.id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_frame_format() {
        let frame = format_frame(&ExecutionEvent::end("done")).unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
        // Single-line JSON: the only newlines are the frame terminator.
        assert_eq!(frame.trim_end_matches('\n').matches('\n').count(), 0);
    }

    #[tokio::test]
    async fn test_delivery_bootstrap_then_events_then_end() {
        let manager = StreamManager::new();
        let id = manager.create();
        manager.send(&id, ExecutionEvent::status("System", "working", "system"));
        manager.close(&id);

        let mut delivery = DeliveryStream::attach(manager.clone(), id.clone()).unwrap();

        let first = delivery.next().await.unwrap().unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(first.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(parsed["type"], "connection");
        assert_eq!(parsed["stream_id"], id.as_str());

        let second = delivery.next().await.unwrap().unwrap();
        assert!(second.contains("\"working\""));

        let third = delivery.next().await.unwrap().unwrap();
        assert!(third.contains("\"end\""));

        // Terminal end stops delivery even though the queue still exists.
        assert!(delivery.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_removes_stream_exactly_once() {
        let manager = StreamManager::new();
        let id = manager.create();
        let delivery = DeliveryStream::attach(manager.clone(), id.clone()).unwrap();
        drop(delivery);

        assert!(!manager.contains(&id));
        // Producer sends after disconnect are no-ops and signal cancellation.
        assert!(!manager.send(&id, ExecutionEvent::status("System", "late", "system")));
        // A second removal (e.g. defensive cleanup elsewhere) is harmless.
        manager.remove(&id);
    }

    #[tokio::test]
    async fn test_second_consumer_cannot_attach() {
        let manager = StreamManager::new();
        let id = manager.create();
        let _delivery = DeliveryStream::attach(manager.clone(), id.clone()).unwrap();
        assert!(DeliveryStream::attach(manager, id).is_none());
    }

    #[tokio::test]
    async fn test_queue_closed_without_end_stops_quietly() {
        let manager = StreamManager::new();
        let id = manager.create();
        manager.send(&id, ExecutionEvent::status("System", "only", "system"));

        let mut delivery = DeliveryStream::attach(manager.clone(), id.clone()).unwrap();
        let _connection = delivery.next().await.unwrap();
        let _status = delivery.next().await.unwrap();

        // Removing the stream drops the registered sender; the drained queue
        // then terminates delivery without a frame.
        manager.remove(&id);
        assert!(delivery.next().await.is_none());
    }

    #[tokio::test]
    async fn test_events_for_other_streams_not_observed() {
        let manager = StreamManager::new();
        let a = manager.create();
        let b = manager.create();
        manager.send(&a, ExecutionEvent::status("System", "a-only", "system"));
        manager.close(&a);
        manager.close(&b);

        let frames: Vec<_> = DeliveryStream::attach(manager.clone(), b)
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert!(frames.iter().all(|f| !f.contains("a-only")));
    }
}
