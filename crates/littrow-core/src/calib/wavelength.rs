use tracing::{debug, info};

use crate::config::{LampConfig, PeakParams};
use crate::consts::{MAX_FIT_PEAKS, MIN_FIT_PEAKS};
use crate::frame::Trace;

use super::store::WavelengthFit;

/// A detected spectral peak.
#[derive(Clone, Copy, Debug)]
pub struct Peak {
    pub column: usize,
    pub intensity: f32,
}

/// Find local maxima in a trace, ordered left to right.
///
/// A column qualifies when no sample within `params.window` columns on either
/// side exceeds it, no sample to its left inside the window equals it (so a
/// flat-topped line yields exactly one peak), and it reaches
/// `params.min_fraction` of the trace maximum.
pub fn find_peaks(trace: &Trace, params: &PeakParams) -> Vec<Peak> {
    let n = trace.len();
    let window = params.window.max(1);
    let threshold = params.min_fraction * trace.max;
    let mut peaks = Vec::new();

    for x in 0..n {
        let v = trace.data[x];
        if v <= 0.0 || v < threshold {
            continue;
        }
        let lo = x.saturating_sub(window);
        let hi = (x + window + 1).min(n);
        let mut is_peak = true;
        for i in lo..hi {
            if trace.data[i] > v || (i < x && trace.data[i] == v) {
                is_peak = false;
                break;
            }
        }
        if is_peak {
            peaks.push(Peak {
                column: x,
                intensity: v,
            });
        }
    }
    peaks
}

/// Detect reference-lamp peaks in a raw trace and refit the pixel-to-
/// wavelength mapping.
///
/// Returns the new fit, or `None` when fewer than three usable peaks were
/// found; the previous fit must then stay in effect.
pub fn calibrate_wavelengths(
    trace: &Trace,
    lamp: &LampConfig,
    params: &PeakParams,
) -> Option<WavelengthFit> {
    let mut peaks = find_peaks(trace, params);
    if peaks.len() < MIN_FIT_PEAKS {
        debug!(found = peaks.len(), "not enough peaks for a wavelength fit");
        return None;
    }

    // Strongest first, then pair rank-for-rank with the lamp lines, which
    // are listed by expected relative brightness.
    peaks.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    peaks.truncate(MAX_FIT_PEAKS.min(lamp.lines.len()));

    if lamp.swap_guard {
        apply_swap_guard(&mut peaks, &lamp.lines);
    }

    let pairs: Vec<(f64, f64)> = peaks
        .iter()
        .zip(lamp.lines.iter())
        .map(|(p, &line)| (line as f64, p.column as f64))
        .collect();
    if pairs.len() < MIN_FIT_PEAKS {
        return None;
    }

    let fit = fit_line(&pairs)?;
    info!(
        scale = fit.scale,
        offset = fit.offset,
        peaks = pairs.len(),
        lamp = %lamp.name,
        "wavelength fit updated"
    );
    Some(fit)
}

/// Intensity ranking can misassign closely spaced lamp lines. When the two
/// strongest peaks sit in the opposite left-to-right order from their
/// assigned lines, swap them; likewise for the fourth and fifth ranks (the
/// mercury yellow doublet). Lamp-specific heuristic, kept as-is pending
/// review against other calibration sources.
fn apply_swap_guard(peaks: &mut [Peak], lines: &[f32]) {
    maybe_swap(peaks, lines, 0, 1);
    maybe_swap(peaks, lines, 3, 4);
}

fn maybe_swap(peaks: &mut [Peak], lines: &[f32], a: usize, b: usize) {
    if peaks.len() <= b || lines.len() <= b {
        return;
    }
    let lines_ascending = lines[a] < lines[b];
    let peaks_ascending = peaks[a].column < peaks[b].column;
    if lines_ascending != peaks_ascending {
        peaks.swap(a, b);
    }
}

/// Least-squares fit of `column = offset + scale * wavelength` over
/// `(wavelength, column)` pairs.
fn fit_line(pairs: &[(f64, f64)]) -> Option<WavelengthFit> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let sum_w: f64 = pairs.iter().map(|(w, _)| w).sum();
    let sum_c: f64 = pairs.iter().map(|(_, c)| c).sum();
    let sum_ww: f64 = pairs.iter().map(|(w, _)| w * w).sum();
    let sum_wc: f64 = pairs.iter().map(|(w, c)| w * c).sum();

    let denom = n * sum_ww - sum_w * sum_w;
    if denom.abs() < 1e-12 {
        return None;
    }
    let scale = (n * sum_wc - sum_w * sum_c) / denom;
    if scale.abs() < 1e-12 {
        return None;
    }
    let offset = (sum_c - scale * sum_w) / n;
    Some(WavelengthFit { scale, offset })
}

/// Pixel columns for the display label wavelengths under `fit`, clamped to
/// the trace width.
pub fn label_positions(fit: &WavelengthFit, label_wavelengths: &[f32], width: usize) -> Vec<usize> {
    if width == 0 {
        return Vec::new();
    }
    label_wavelengths
        .iter()
        .map(|&wl| {
            fit.column(wl as f64)
                .round()
                .clamp(0.0, (width - 1) as f64) as usize
        })
        .collect()
}
