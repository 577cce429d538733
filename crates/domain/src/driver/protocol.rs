use async_trait::async_trait;

use super::{AsyncSender, CommandRequest};
use crate::device::Addressable;
use crate::error::Result;
use crate::value::CommandValue;

/// Device-specific I/O capability.
///
/// Implementations must be safe to call concurrently for different devices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    /// Called once at service start with the sender for unsolicited values.
    async fn initialize(&self, async_tx: AsyncSender) -> Result<()>;

    /// Executes read requests in order, returning one value per request
    /// it could satisfy.
    async fn handle_get_commands(
        &self,
        addr: &Addressable,
        reqs: Vec<CommandRequest>,
    ) -> Result<Vec<CommandValue>>;

    /// Executes write requests; `params[i]` belongs to `reqs[i]`.
    async fn handle_put_commands(
        &self,
        addr: &Addressable,
        reqs: Vec<CommandRequest>,
        params: Vec<CommandValue>,
    ) -> Result<()>;

    async fn stop(&self, force: bool) -> Result<()>;

    /// Releases any connection held for a removed device.
    async fn disconnect_device(&self, addr: &Addressable) -> Result<()>;
}
