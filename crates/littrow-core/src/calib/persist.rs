use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Array1;
use tracing::{info, warn};

use crate::error::{LittrowError, Result};

use super::store::{CalibrationState, WavelengthFit};

/// File names of the four persisted calibration artifacts. All are plain
/// text, one value per line; the trace files start with a count line.
pub const SLOPE_FILE: &str = "slope.txt";
pub const DARK_FILE: &str = "dark.txt";
pub const FLAT_FIELD_FILE: &str = "flatfield.txt";
pub const WAVELENGTH_FILE: &str = "wavelength.txt";

/// Write all four artifacts into `dir`, creating it if needed.
pub fn save(state: &CalibrationState, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    save_scalars(&dir.join(SLOPE_FILE), &[state.slope as f64])?;
    save_trace(&dir.join(DARK_FILE), &state.dark)?;
    save_trace(&dir.join(FLAT_FIELD_FILE), &state.flat_field)?;
    save_scalars(
        &dir.join(WAVELENGTH_FILE),
        &[state.fit.scale, state.fit.offset],
    )?;
    info!(dir = %dir.display(), "calibration saved");
    Ok(())
}

/// Load whichever artifacts exist in `dir` into `state`.
///
/// Best-effort per file: a missing or malformed artifact leaves the matching
/// in-memory default untouched and logs a warning, never aborting startup.
/// Trace artifacts whose length does not match the active width are skipped
/// the same way.
pub fn load(state: &mut CalibrationState, dir: &Path) {
    match load_scalars(&dir.join(SLOPE_FILE), 1) {
        Ok(values) => state.slope = values[0] as f32,
        Err(e) => warn!(error = %e, "skipping slope artifact"),
    }

    match load_trace(&dir.join(DARK_FILE)) {
        Ok(dark) if dark.len() == state.width() => state.dark = dark,
        Ok(dark) => warn!(
            stored = dark.len(),
            active = state.width(),
            "dark artifact length does not match frame width, skipping"
        ),
        Err(e) => warn!(error = %e, "skipping dark artifact"),
    }

    match load_trace(&dir.join(FLAT_FIELD_FILE)) {
        Ok(flat) if flat.len() == state.width() => state.flat_field = flat,
        Ok(flat) => warn!(
            stored = flat.len(),
            active = state.width(),
            "flat-field artifact length does not match frame width, skipping"
        ),
        Err(e) => warn!(error = %e, "skipping flat-field artifact"),
    }

    match load_scalars(&dir.join(WAVELENGTH_FILE), 2) {
        Ok(values) if values[0].abs() > f64::EPSILON => {
            state.fit = WavelengthFit {
                scale: values[0],
                offset: values[1],
            };
        }
        Ok(_) => warn!("wavelength artifact has a zero scale, skipping"),
        Err(e) => warn!(error = %e, "skipping wavelength artifact"),
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> LittrowError {
    LittrowError::MalformedCalibration {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn save_scalars(path: &Path, values: &[f64]) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for v in values {
        writeln!(writer, "{v}")?;
    }
    writer.flush()?;
    Ok(())
}

fn save_trace(path: &Path, values: &Array1<f32>) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    writeln!(writer, "{}", values.len())?;
    for v in values.iter() {
        writeln!(writer, "{v}")?;
    }
    writer.flush()?;
    Ok(())
}

fn load_scalars(path: &Path, expected: usize) -> Result<Vec<f64>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut values = Vec::with_capacity(expected);
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let v: f64 = trimmed
            .parse()
            .map_err(|_| malformed(path, format!("not a number: {trimmed:?}")))?;
        values.push(v);
    }
    if values.len() != expected {
        return Err(malformed(
            path,
            format!("expected {expected} values, found {}", values.len()),
        ));
    }
    Ok(values)
}

fn load_trace(path: &Path) -> Result<Array1<f32>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut lines = reader.lines();

    let count_line = lines
        .next()
        .ok_or_else(|| malformed(path, "missing count line"))??;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| malformed(path, format!("bad count line: {:?}", count_line.trim())))?;

    let mut values = Vec::with_capacity(count);
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let v: f32 = trimmed
            .parse()
            .map_err(|_| malformed(path, format!("not a number: {trimmed:?}")))?;
        values.push(v);
    }
    if values.len() != count {
        return Err(malformed(
            path,
            format!("count line says {count}, found {} values", values.len()),
        ));
    }
    Ok(Array1::from(values))
}
