// Location debouncer - decides which raw fixes are worth forwarding
use crate::domain::emit_policy::LocationEmitPolicy;
use crate::domain::position::PositionFix;

/// Per-session filter state.
///
/// Only the last *emitted* fix is kept. Callers must serialize
/// `should_emit`/`mark_emitted` pairs; one instance backs one subscription.
#[derive(Debug, Clone)]
pub struct LocationDebouncer {
    policy: LocationEmitPolicy,
    last_emitted: Option<PositionFix>,
    last_emitted_elapsed_ms: Option<u64>,
}

impl LocationDebouncer {
    pub fn new(policy: LocationEmitPolicy) -> Self {
        Self {
            policy,
            last_emitted: None,
            last_emitted_elapsed_ms: None,
        }
    }

    pub fn last_emitted(&self) -> Option<&PositionFix> {
        self.last_emitted.as_ref()
    }

    pub fn should_emit(&self, next: &PositionFix, now_elapsed_ms: u64) -> bool {
        // Garbage fixes never go out, however long it has been
        if let Some(accuracy) = next.accuracy_m {
            if accuracy > self.policy.emit_max_accuracy_m() {
                return false;
            }
        }

        let Some(prev) = self.last_emitted.as_ref() else {
            return true;
        };

        if let (Some(prev_acc), Some(next_acc)) = (prev.accuracy_m, next.accuracy_m) {
            let abs_improvement = prev_acc - next_acc;
            if abs_improvement >= self.policy.emit_on_accuracy_improvement_abs_m()
                || (prev_acc > 0.0
                    && next_acc <= prev_acc * self.policy.emit_on_accuracy_improvement_factor())
            {
                return true;
            }
        }

        let Some(prev_elapsed) = self.last_emitted_elapsed_ms else {
            return true;
        };
        let delta_t = now_elapsed_ms.saturating_sub(prev_elapsed);

        let delta_m = prev.distance_to(next).unwrap_or_else(|e| {
            tracing::debug!("Distance between fixes unavailable ({}), forcing emit", e);
            f64::INFINITY
        });

        delta_m >= self.policy.emit_min_distance_m() as f64
            || delta_t >= self.policy.emit_max_interval_ms()
    }

    /// Record a fix as delivered. Call only after the consumer accepted it.
    pub fn mark_emitted(&mut self, fix: &PositionFix, now_elapsed_ms: u64) {
        self.last_emitted = Some(*fix);
        self.last_emitted_elapsed_ms = Some(now_elapsed_ms);
    }
}
