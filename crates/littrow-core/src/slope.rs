use tracing::{debug, info};

use crate::config::{ReduceParams, SlopeParams};
use crate::frame::{FrameView, Trace};
use crate::reduce::reduce;

/// Sum of absolute differences between adjacent trace samples.
///
/// Sharp spectral lines produce a higher total variation than the same lines
/// smeared across columns, which makes this a cheap sharpness proxy for the
/// slope search.
pub fn total_variation(trace: &Trace) -> f64 {
    trace
        .data
        .windows(2)
        .into_iter()
        .map(|w| (w[1] as f64 - w[0] as f64).abs())
        .sum()
}

/// Search for the tilt correction that maximizes the total variation of the
/// uncalibrated reduced trace.
///
/// Coordinate descent with a reversing step: reduce the frame at the current
/// slope, and when the total variation drops relative to the previous
/// iteration, flip the search direction and halve the step. The search has
/// converged once the step falls below `params.min_step`. Exhausting the
/// iteration budget without converging discards the search and returns
/// `initial` untouched.
///
/// Each iteration runs one full parallel reduction, so the caller's frame is
/// blocked for up to `params.max_iterations` reduction passes.
pub fn optimize_slope(
    frame: &FrameView<'_>,
    initial: f32,
    params: &SlopeParams,
    reduce_params: &ReduceParams,
) -> f32 {
    let mut slope = initial;
    let mut direction = 1.0f32;
    let mut step = params.initial_step;
    let mut prev_tv = f64::NEG_INFINITY;

    for iteration in 0..params.max_iterations {
        let trace = reduce(frame, slope, reduce_params);
        let tv = total_variation(&trace);
        debug!(iteration, slope, tv, step, "slope search step");

        if tv < prev_tv {
            direction = -direction;
            step *= 0.5;
        }
        prev_tv = tv;

        if step < params.min_step {
            info!(slope, iterations = iteration + 1, "slope search converged");
            return slope;
        }
        slope += step * direction;
    }

    info!(
        initial,
        "slope search exhausted its budget, keeping previous slope"
    );
    initial
}
