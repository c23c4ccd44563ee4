// Position sink trait - where accepted fixes are delivered
use crate::domain::position::PositionFix;
use async_trait::async_trait;

#[async_trait]
pub trait PositionSink: Send + Sync {
    /// Deliver one accepted fix. `Ok` means the consumer took it.
    async fn transmit(&self, fix: PositionFix) -> anyhow::Result<()>;
}

