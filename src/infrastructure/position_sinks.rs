// Position sinks - delivery targets for accepted fixes
use crate::application::position_sink::PositionSink;
use crate::domain::position::PositionFix;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Stand-in for the radio link: logs each outgoing position.
#[derive(Debug, Default)]
pub struct LoggingRadioSink {
    sent: AtomicU64,
}

impl LoggingRadioSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PositionSink for LoggingRadioSink {
    async fn transmit(&self, fix: PositionFix) -> anyhow::Result<()> {
        let seq = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            seq,
            latitude = fix.latitude,
            longitude = fix.longitude,
            accuracy_m = ?fix.accuracy_m,
            "Sending position to mesh"
        );
        Ok(())
    }
}

/// Hands fixes to an mpsc consumer, waiting for room in the channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PositionFix>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PositionFix>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PositionSink for ChannelSink {
    async fn transmit(&self, fix: PositionFix) -> anyhow::Result<()> {
        self.tx
            .send(fix)
            .await
            .map_err(|_| anyhow::anyhow!("position consumer went away"))
    }
}
