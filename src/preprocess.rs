//! Band-pass filtering and epoch rejection on continuous recordings.
use std::collections::BTreeMap;
use anyhow::{Context, Result};

use crate::epochs::{EpochParams, Epochs};
use crate::events::Event;
use crate::filter::{design_fir, filter_rows};
use crate::recording::Recording;

/// Band-pass `rec` to `[l_freq, h_freq]` Hz with a zero-phase FIR.
///
/// Returns a filtered copy; `rec` is untouched. Only EEG and MEG channels
/// are filtered. Pipeline defaults are `1.0` and `40.0` Hz.
pub fn filter_raw(rec: &Recording, l_freq: f64, h_freq: f64) -> Result<Recording> {
    let h = design_fir(Some(l_freq), Some(h_freq), rec.sfreq)
        .with_context(|| format!("design {l_freq}-{h_freq} Hz band-pass"))?;
    let rows: Vec<usize> = rec
        .channels
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind.is_data())
        .map(|(i, _)| i)
        .collect();
    log::debug!("band-pass {l_freq}-{h_freq} Hz: {} taps on {} channels", h.len(), rows.len());

    let mut out = rec.clone();
    filter_rows(&mut out.data, &h, &rows)?;
    out.highpass = Some(l_freq);
    out.lowpass = Some(h_freq);
    log::info!("filtered {} channels to {l_freq}-{h_freq} Hz", rows.len());
    Ok(out)
}

/// Cut `[tmin, tmax]` windows around `events`, baseline-correct to
/// `(None, 0)` and drop trials whose EEG peak-to-peak reaches
/// `reject_threshold` volts.
///
/// `event_id = None` keeps every code, each tagged by its decimal string.
/// Pipeline defaults: `tmin = -0.2`, `tmax = 0.8`, `reject_threshold = 100e-6`.
pub fn reject_epochs(
    rec: &Recording,
    events: &[Event],
    event_id: Option<&BTreeMap<String, i32>>,
    tmin: f64,
    tmax: f64,
    reject_threshold: f64,
) -> Result<Epochs> {
    let params = EpochParams {
        event_id: event_id.cloned(),
        tmin,
        tmax,
        reject_eeg: Some(reject_threshold),
        ..EpochParams::default()
    };
    Epochs::new(rec, events, &params)
}
