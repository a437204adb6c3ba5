//! Driving port for the dashboard table proxy.

use async_trait::async_trait;

use crate::domain::{DataCommand, DataOutcome, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataProxyCommand: Send + Sync {
    /// Run `command` on behalf of `caller`, applying row ownership rules.
    async fn execute(&self, caller: &UserId, command: DataCommand) -> Result<DataOutcome, Error>;
}
