// Event Module
pub mod broadcaster;

pub use broadcaster::{DEFAULT_EVENT_CAPACITY, EventSink, event_channel};
