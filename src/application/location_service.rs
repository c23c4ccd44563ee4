// Location service - debounced location update sessions
use crate::application::location_debouncer::LocationDebouncer;
use crate::application::position_sink::PositionSink;
use crate::domain::emit_policy::LocationEmitPolicy;
use crate::domain::position::PositionFix;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Monotonic time source for live sessions.
pub trait Clock: Send + Sync {
    fn elapsed_ms(&self) -> u64;
}

/// Where "now" comes from when a fix is judged.
#[derive(Clone)]
enum Timebase {
    /// Time the fix reached us
    Receipt(Arc<dyn Clock>),
    /// The fix's own capture time, for replaying recorded tracks
    Capture,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForwardStats {
    pub received: usize,
    pub accepted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Receiving end of a debounced session.
///
/// Holds one slot. A newer fix overwrites one the consumer has not read yet,
/// so a slow consumer always wakes up to the latest position.
pub struct LocationUpdates {
    rx: watch::Receiver<Option<PositionFix>>,
}

impl LocationUpdates {
    /// Latest unread fix, or `None` once the session has ended and
    /// everything has been read.
    pub async fn recv(&mut self) -> Option<PositionFix> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(fix) = *self.rx.borrow_and_update() {
                return Some(fix);
            }
        }
    }
}

#[derive(Clone)]
pub struct LocationService {
    policy: LocationEmitPolicy,
    timebase: Timebase,
}

impl LocationService {
    pub fn new(policy: LocationEmitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            timebase: Timebase::Receipt(clock),
        }
    }

    pub fn replay(policy: LocationEmitPolicy) -> Self {
        Self {
            policy,
            timebase: Timebase::Capture,
        }
    }

    pub fn policy(&self) -> &LocationEmitPolicy {
        &self.policy
    }

    fn now_ms(&self, fix: &PositionFix) -> u64 {
        match &self.timebase {
            Timebase::Receipt(clock) => clock.elapsed_ms(),
            Timebase::Capture => fix.elapsed_ms,
        }
    }

    fn log_start(&self) {
        tracing::info!(
            "Starting location updates intervalMs={} minDistanceM={} emitMinDistanceM={} emitMaxIntervalMs={}",
            self.policy.request_interval_ms(),
            self.policy.request_min_distance_m(),
            self.policy.emit_min_distance_m(),
            self.policy.emit_max_interval_ms()
        );
    }

    /// Start a debounced session over `source`.
    ///
    /// Every subscription gets its own debouncer. An accepted fix is stored in
    /// the session slot and marked emitted right away, replacing any fix the
    /// consumer has not picked up yet. The session ends when the source ends
    /// or the consumer is dropped.
    pub fn subscribe<S>(&self, source: S) -> LocationUpdates
    where
        S: Stream<Item = PositionFix> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let service = self.clone();
        service.log_start();

        tokio::spawn(async move {
            let mut debouncer = LocationDebouncer::new(service.policy);
            let mut source = Box::pin(source);

            while let Some(fix) = source.next().await {
                let now = service.now_ms(&fix);
                if !debouncer.should_emit(&fix, now) {
                    continue;
                }

                if tx.send(Some(fix)).is_err() {
                    break;
                }
                debouncer.mark_emitted(&fix, now);
            }

            tracing::info!("Stopping location updates");
        });

        LocationUpdates { rx }
    }

    /// Drive `source` through a fresh debouncer into `sink`, awaiting each
    /// delivery. Failed deliveries are not marked as emitted.
    pub async fn forward<S>(&self, source: S, sink: Arc<dyn PositionSink>) -> ForwardStats
    where
        S: Stream<Item = PositionFix> + Send,
    {
        self.log_start();
        let mut debouncer = LocationDebouncer::new(self.policy);
        let mut stats = ForwardStats::default();
        let mut source = std::pin::pin!(source);

        while let Some(fix) = source.next().await {
            stats.received += 1;
            let now = self.now_ms(&fix);
            if !debouncer.should_emit(&fix, now) {
                continue;
            }
            stats.accepted += 1;

            match sink.transmit(fix).await {
                Ok(()) => {
                    debouncer.mark_emitted(&fix, now);
                    stats.delivered += 1;
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!("Failed to deliver fix at {}ms: {:#}", now, e);
                }
            }
        }

        tracing::info!(
            "Stopping location updates: {} received, {} delivered",
            stats.received,
            stats.delivered
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    struct FakeClock(AtomicU64);

    impl Clock for FakeClock {
        fn elapsed_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<PositionFix>>,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl PositionSink for RecordingSink {
        async fn transmit(&self, fix: PositionFix) -> anyhow::Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                anyhow::bail!("radio link down");
            }
            self.delivered.lock().unwrap().push(fix);
            Ok(())
        }
    }

    // ~0.001 degrees of latitude is ~111m
    fn far(elapsed_ms: u64, step: f64) -> PositionFix {
        PositionFix::new(0.001 * step, 0.0, elapsed_ms)
    }

    #[tokio::test]
    async fn test_subscribe_delivers_accepted_fixes() {
        let service = LocationService::replay(LocationEmitPolicy::default());
        let (src_tx, src_rx) = mpsc::channel(8);
        let mut updates = service.subscribe(ReceiverStream::new(src_rx));

        let first = PositionFix::new(0.0, 0.0, 0);
        src_tx.send(first).await.unwrap();
        assert_eq!(updates.recv().await, Some(first));

        // Same spot a second later is filtered, the far one goes through
        src_tx.send(PositionFix::new(0.0, 0.0, 1_000)).await.unwrap();
        let moved = far(2_000, 1.0);
        src_tx.send(moved).await.unwrap();
        assert_eq!(updates.recv().await, Some(moved));

        drop(src_tx);
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_lagging_consumer_gets_latest_fix() {
        let service = LocationService::replay(LocationEmitPolicy::default());
        let fixes = vec![
            PositionFix::new(0.0, 0.0, 0),
            far(1_000, 1.0),
            far(2_000, 2.0),
        ];
        let mut updates = service.subscribe(futures::stream::iter(fixes.clone()));

        // Nothing is read until the source is exhausted; the newest fix wins
        assert_eq!(updates.recv().await, Some(fixes[2]));
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_overwritten_fixes_still_count_as_emitted() {
        let service = LocationService::replay(LocationEmitPolicy::default());
        let fixes = vec![
            PositionFix::new(0.0, 0.0, 0),
            far(1_000, 1.0),
            // 5m from the previous stored fix, so filtered even though unread
            PositionFix::new(0.001 + 0.000_045, 0.0, 2_000),
        ];
        let mut updates = service.subscribe(futures::stream::iter(fixes.clone()));

        assert_eq!(updates.recv().await, Some(fixes[1]));
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_live_clock_drives_interval() {
        let clock = Arc::new(FakeClock(AtomicU64::new(0)));
        let service = LocationService::new(LocationEmitPolicy::live(), clock.clone());
        let (src_tx, src_rx) = mpsc::channel(8);
        let mut updates = service.subscribe(ReceiverStream::new(src_rx));

        let fix = PositionFix::new(45.0, 9.0, 0);
        src_tx.send(fix).await.unwrap();
        assert_eq!(updates.recv().await, Some(fix));

        // Capture time is ignored for live sessions
        clock.0.store(30_000, Ordering::SeqCst);
        let stale_capture = PositionFix::new(45.0, 9.0, 1);
        src_tx.send(stale_capture).await.unwrap();
        assert_eq!(updates.recv().await, Some(stale_capture));
    }

    #[tokio::test]
    async fn test_forward_marks_only_confirmed_deliveries() {
        let service = LocationService::replay(LocationEmitPolicy::default());
        let sink = Arc::new(RecordingSink::default());
        sink.fail_next.store(true, Ordering::SeqCst);

        let fixes = vec![
            PositionFix::new(0.0, 0.0, 0),
            // Still a "first" fix because the previous delivery failed
            PositionFix::new(0.0, 0.0, 500),
            PositionFix::new(0.0, 0.0, 1_000),
        ];
        let stats = service
            .forward(futures::stream::iter(fixes.clone()), sink.clone())
            .await;

        assert_eq!(
            stats,
            ForwardStats {
                received: 3,
                accepted: 2,
                delivered: 1,
                failed: 1,
            }
        );
        assert_eq!(*sink.delivered.lock().unwrap(), vec![fixes[1]]);
    }

    #[tokio::test]
    async fn test_forward_uses_capture_time_on_replay() {
        let service = LocationService::replay(LocationEmitPolicy::default());
        let sink = Arc::new(RecordingSink::default());

        let fixes = vec![
            PositionFix::new(0.0, 0.0, 0),
            PositionFix::new(0.0, 0.0, 100_000),
            PositionFix::new(0.0, 0.0, 300_000),
            PositionFix::new(0.0, 0.0, 400_000),
        ];
        let stats = service
            .forward(futures::stream::iter(fixes.clone()), sink.clone())
            .await;

        assert_eq!(stats.delivered, 2);
        assert_eq!(*sink.delivered.lock().unwrap(), vec![fixes[0], fixes[2]]);
    }
}
