// Event Sink
use tokio::sync::mpsc;
use tracing::debug;

use turnstile_protocol::EventMsg;

/// Default capacity of event channels handed to the orchestrator.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Sending half of a caller's event channel.
///
/// Events are delivered in order; a closed or missing receiver never fails
/// the sender.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
  tx: Option<mpsc::Sender<EventMsg>>,
}

impl EventSink {
  pub fn new(tx: mpsc::Sender<EventMsg>) -> Self {
    Self { tx: Some(tx) }
  }

  /// Sink that discards everything.
  pub fn disabled() -> Self {
    Self { tx: None }
  }

  pub async fn send(&self, event: EventMsg) {
    let Some(tx) = &self.tx else {
      return;
    };
    if let Err(e) = tx.send(event).await {
      debug!("Dropping event because channel is closed: {e}");
    }
  }
}

impl From<mpsc::Sender<EventMsg>> for EventSink {
  fn from(tx: mpsc::Sender<EventMsg>) -> Self {
    Self::new(tx)
  }
}

/// Create a bounded event channel with the default capacity.
pub fn event_channel() -> (EventSink, mpsc::Receiver<EventMsg>) {
  let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CAPACITY);
  (EventSink::new(tx), rx)
}
