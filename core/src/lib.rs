// Turnstile Core Library

pub mod approval;
pub mod checkpoint;
pub mod context;
pub mod event;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod tools;
pub mod turn;

pub use approval::{ApprovalCheck, ApprovalGate};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use context::ContextTracker;
pub use event::{EventSink, event_channel};
pub use model::ModelClient;
pub use orchestrator::Orchestrator;
pub use session::{SessionHandle, SessionState};
pub use tools::build_default_tools;
pub use turn::{StopReason, TurnError, TurnOutcome};
