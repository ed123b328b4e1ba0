use std::time::{Duration, Instant};

use ndarray::Array1;

use crate::consts::{SHADOW_BASE_OPACITY, SHADOW_DECAY_SECS};
use crate::frame::Trace;

/// Time-decaying snapshot of a previously displayed trace.
///
/// Purely presentational: the display sink alpha-blends the frozen trace over
/// the live one at the current opacity, which fades linearly from
/// [`SHADOW_BASE_OPACITY`] to zero across the decay window. Carries no
/// correction semantics.
#[derive(Clone, Debug)]
pub struct ShadowOverlay {
    snapshot: Option<Snapshot>,
    decay: Duration,
}

#[derive(Clone, Debug)]
struct Snapshot {
    trace: Array1<f32>,
    frozen_at: Instant,
}

impl Default for ShadowOverlay {
    fn default() -> Self {
        Self::new(Duration::from_secs_f32(SHADOW_DECAY_SECS))
    }
}

impl ShadowOverlay {
    pub fn new(decay: Duration) -> Self {
        Self {
            snapshot: None,
            decay,
        }
    }

    /// Replace the snapshot wholesale with a copy of the current display
    /// trace, timestamped at `now`.
    pub fn freeze(&mut self, trace: &Trace, now: Instant) {
        self.snapshot = Some(Snapshot {
            trace: trace.data.clone(),
            frozen_at: now,
        });
    }

    /// Blend opacity at `now`: `clamp(1 - elapsed/decay, 0, 1) * 0.5`.
    /// Zero when nothing is frozen.
    pub fn opacity(&self, now: Instant) -> f32 {
        let Some(snapshot) = &self.snapshot else {
            return 0.0;
        };
        let elapsed = now
            .saturating_duration_since(snapshot.frozen_at)
            .as_secs_f32();
        let remaining = (1.0 - elapsed / self.decay.as_secs_f32()).clamp(0.0, 1.0);
        remaining * SHADOW_BASE_OPACITY
    }

    /// The frozen trace, if one is held.
    pub fn frozen(&self) -> Option<&Array1<f32>> {
        self.snapshot.as_ref().map(|s| &s.trace)
    }
}
