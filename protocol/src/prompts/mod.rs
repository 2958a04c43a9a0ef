mod agent;
mod system;

pub use agent::SUB_AGENT_PROMPT;
pub use system::SYSTEM_PROMPT;
