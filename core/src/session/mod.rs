//! Session state and its keyed storage

pub mod state;
pub mod store;

pub use state::{FileAction, FileNote, SessionState, Todo, TodoStatus};
pub use store::{InMemorySessionStore, SessionHandle, SessionStore};
