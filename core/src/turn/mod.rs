//! Turn execution
//!
//! The model/tool loop that runs one user turn, plus the hooks around it

pub mod accumulator;
pub mod executor;
pub mod hooks;
pub mod sub_agent;

pub use accumulator::{ModelResponse, ResponseAccumulator, ToolCallRequest};
pub use executor::{
  DENIED_MESSAGE, MAX_ITERATIONS_MESSAGE, StopReason, TurnConfig, TurnError, TurnExecutor,
  TurnOutcome,
};
pub use hooks::TurnHook;
pub use sub_agent::SubAgentRunner;
