//! Hooks run around every user turn.

use async_trait::async_trait;

use crate::session::SessionState;

/// Observer that may transform session state before and after a turn.
///
/// Hooks run in registration order. An error aborts the turn.
#[async_trait]
pub trait TurnHook: Send + Sync {
  fn name(&self) -> &str;

  async fn before_turn(&self, _state: &mut SessionState) -> anyhow::Result<()> {
    Ok(())
  }

  async fn after_turn(&self, _state: &mut SessionState) -> anyhow::Result<()> {
    Ok(())
  }
}
