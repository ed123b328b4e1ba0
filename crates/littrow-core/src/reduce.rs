use ndarray::Array1;
use rayon::prelude::*;

use crate::config::ReduceParams;
use crate::frame::{FrameView, Trace};

/// Collapse a planar frame into a per-column intensity trace.
///
/// Each output column accumulates, over every `row_stride`-th row, a weighted
/// sum of the luma sample at the slope-shifted column plus the two co-located
/// chroma samples. The shift `x2 = x + slope * y` is kept fractional: the
/// remainder is split linearly between columns `floor(x2)` and `floor(x2)+1`
/// so non-integer slopes do not introduce column-quantization banding.
/// Shifted columns are clamped to `[0, width)`.
pub fn reduce(frame: &FrameView<'_>, slope: f32, params: &ReduceParams) -> Trace {
    let mut trace = Trace::zeros(frame.width());
    reduce_into(frame, slope, params, &mut trace);
    trace
}

/// Like [`reduce`], writing into a caller-supplied trace.
///
/// Columns are split into `params.partitions` disjoint ranges reduced on the
/// rayon pool; each worker reads the shared frame and writes only its own
/// output range, so no locking is needed. The global maximum is the max of
/// the per-partition maxima. A zero-sized frame short-circuits to an all-zero
/// trace.
pub fn reduce_into(frame: &FrameView<'_>, slope: f32, params: &ReduceParams, out: &mut Trace) {
    let width = frame.width();
    if frame.is_empty() {
        *out = Trace::zeros(width);
        return;
    }

    let partitions = params.partitions.max(1);
    let chunk = width.div_ceil(partitions);

    let mut values = vec![0.0f32; width];
    let max = values
        .par_chunks_mut(chunk)
        .enumerate()
        .map(|(i, columns)| reduce_partition(frame, slope, params, i * chunk, columns))
        .reduce(|| 0.0f32, f32::max);

    out.data = Array1::from(values);
    out.max = max;
}

/// Reduce one disjoint column range starting at `x0`.
///
/// Returns the largest accumulator in the range.
fn reduce_partition(
    frame: &FrameView<'_>,
    slope: f32,
    params: &ReduceParams,
    x0: usize,
    out: &mut [f32],
) -> f32 {
    let width = frame.width();
    let [wy, wu, wv] = params.weights;
    let row_stride = params.row_stride.max(1);
    let mut local_max = 0.0f32;

    for (i, acc) in out.iter_mut().enumerate() {
        let x = x0 + i;
        let mut sum = 0.0f32;
        for y in (0..frame.height()).step_by(row_stride) {
            let x2 = (x as f32 + slope * y as f32).clamp(0.0, (width - 1) as f32);
            let lo = x2.floor() as usize;
            let hi = (lo + 1).min(width - 1);
            let frac = x2 - x2.floor();

            sum += sample(frame, lo, y, wy, wu, wv) * (1.0 - frac)
                + sample(frame, hi, y, wy, wu, wv) * frac;
        }
        *acc = sum;
        if sum > local_max {
            local_max = sum;
        }
    }
    local_max
}

/// Weighted Y/U/V sample at one pixel. Chroma planes are half resolution in
/// both axes, hence the halved coordinates.
#[inline]
fn sample(frame: &FrameView<'_>, x: usize, y: usize, wy: f32, wu: f32, wv: f32) -> f32 {
    frame.luma(x, y) as f32 * wy
        + frame.chroma_u(x, y) as f32 * wu
        + frame.chroma_v(x, y) as f32 * wv
}
