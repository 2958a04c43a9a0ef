// Turnstile Protocol
// Types exchanged between the core, model providers and front ends

pub mod prompts;
pub mod protocol;

pub use protocol::*;
