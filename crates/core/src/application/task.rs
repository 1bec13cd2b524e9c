// Instance Task - unit of work the scheduler runs against every instance
use async_trait::async_trait;

use crate::application::cancellation::CancelToken;
use crate::domain::Instance;
use crate::error::Result;

/// A periodic task executed once per instance per scheduler tick
///
/// Invocations are independent: the scheduler may run the same task for many
/// instances at once, and re-runs it on the next tick regardless of outcome.
#[async_trait]
pub trait InstanceTask: Send + Sync {
    /// Stable name used for registration and logging
    fn name(&self) -> &str;

    /// Run against `instance`, aborting promptly once `cancel` fires
    async fn run(&self, cancel: &CancelToken, instance: &Instance) -> Result<()>;
}
