//! Event-locked epoching with baseline correction and amplitude rejection.
//!
//! For every selected event the window
//! `round(tmin·sfreq) ..= round(tmax·sfreq)` samples around the onset is cut
//! from the recording, the baseline mean is subtracted per channel, and the
//! trial is kept only if each good EEG channel's peak-to-peak amplitude is
//! strictly below the threshold.
use std::collections::BTreeMap;
use anyhow::{anyhow, bail, Result};
use ndarray::{s, Array2, Array3, ArrayView2, Axis};

use crate::events::{unique_codes, Event};
use crate::recording::{Channel, ChannelKind, Recording};

/// Baseline interval in seconds; `None` on either side means the window edge.
pub type Baseline = (Option<f64>, Option<f64>);

/// Parameters for [`Epochs::new`].
#[derive(Debug, Clone)]
pub struct EpochParams {
    /// Condition tag → event code; `None` keeps every code, tagged by its
    /// decimal string.
    pub event_id: Option<BTreeMap<String, i32>>,
    pub tmin: f64,
    pub tmax: f64,
    /// Peak-to-peak limit (volts) on EEG channels; `None` disables rejection.
    pub reject_eeg: Option<f64>,
    /// Default `(None, Some(0.0))`: everything up to stimulus onset.
    pub baseline: Option<Baseline>,
}

impl Default for EpochParams {
    fn default() -> Self {
        Self {
            event_id: None,
            tmin: -0.2,
            tmax: 0.8,
            reject_eeg: Some(100e-6),
            baseline: Some((None, Some(0.0))),
        }
    }
}

/// Why an event did not become an epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// The window runs past the start or end of the recording.
    NoData,
    /// Peak-to-peak amplitude on `channel` reached the threshold.
    Rejected { channel: String, ptp: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEpoch {
    pub event:  Event,
    pub reason: DropReason,
}

/// Trials × channels × samples, all trials the same shape.
#[derive(Debug, Clone)]
pub struct Epochs {
    /// `[n_epochs, n_chan, n_times]`.
    pub data:     Array3<f64>,
    /// Seconds relative to the event, one per sample.
    pub times:    Vec<f64>,
    pub sfreq:    f64,
    pub channels: Vec<Channel>,
    pub bads:     Vec<String>,
    /// Retained events, aligned with `data`'s first axis.
    pub events:   Vec<Event>,
    pub event_id: BTreeMap<String, i32>,
    pub drop_log: Vec<DroppedEpoch>,
}

impl Epochs {
    pub fn new(rec: &Recording, events: &[Event], params: &EpochParams) -> Result<Self> {
        if params.tmin > params.tmax {
            bail!("tmin ({}) must not exceed tmax ({})", params.tmin, params.tmax);
        }
        let event_id = resolve_event_id(events, params.event_id.as_ref())?;
        let wanted: Vec<i32> = event_id.values().copied().collect();

        let start = (params.tmin * rec.sfreq).round() as i64;
        let stop = (params.tmax * rec.sfreq).round() as i64;
        let n_times = (stop - start + 1) as usize;
        let times: Vec<f64> = (start..=stop).map(|k| k as f64 / rec.sfreq).collect();
        let baseline = params
            .baseline
            .map(|b| baseline_range(&times, b))
            .transpose()?
            .flatten();

        let reject_rows: Vec<usize> = (0..rec.n_chan())
            .filter(|&i| rec.channels[i].kind == ChannelKind::Eeg && !rec.is_bad(i))
            .collect();

        let mut kept: Vec<(Event, Array2<f64>)> = Vec::new();
        let mut drop_log = Vec::new();
        for ev in events.iter().filter(|e| wanted.contains(&e.code)) {
            let first = ev.sample as i64 + start;
            let last = ev.sample as i64 + stop;
            if first < 0 || last >= rec.n_times() as i64 {
                drop_log.push(DroppedEpoch { event: *ev, reason: DropReason::NoData });
                continue;
            }
            let mut trial = rec.data.slice(s![.., first as usize..=last as usize]).to_owned();
            if let Some((b0, b1)) = baseline {
                subtract_baseline(&mut trial, b0, b1);
            }
            if let Some(limit) = params.reject_eeg {
                if let Some((row, ptp)) = first_over_limit(trial.view(), &reject_rows, limit) {
                    let channel = rec.channels[row].name.clone();
                    log::debug!("event @{} rejected: {channel} ptp {ptp:e} V", ev.sample);
                    drop_log.push(DroppedEpoch { event: *ev, reason: DropReason::Rejected { channel, ptp } });
                    continue;
                }
            }
            kept.push((*ev, trial));
        }

        let mut data = Array3::<f64>::zeros((kept.len(), rec.n_chan(), n_times));
        for (mut slot, (_, trial)) in data.outer_iter_mut().zip(&kept) {
            slot.assign(trial);
        }
        let events: Vec<Event> = kept.into_iter().map(|(e, _)| e).collect();
        log::info!(
            "{} of {} epochs kept ({} dropped)",
            events.len(),
            events.len() + drop_log.len(),
            drop_log.len()
        );

        Ok(Self {
            data,
            times,
            sfreq: rec.sfreq,
            channels: rec.channels.clone(),
            bads: rec.bads.clone(),
            events,
            event_id,
            drop_log,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_chan(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn n_times(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn channel_index(&self, name: &str) -> Result<usize> {
        self.channels
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| anyhow!("channel {name:?} not found"))
    }

    /// Trial indices tagged with `condition`.
    ///
    /// Fails if the tag is unknown; an empty result means every trial of a
    /// known condition was dropped.
    pub fn condition_indices(&self, condition: &str) -> Result<Vec<usize>> {
        let code = self.event_id.get(condition).ok_or_else(|| {
            let known: Vec<&str> = self.event_id.keys().map(String::as_str).collect();
            anyhow!("unknown condition {condition:?}; known: {known:?}")
        })?;
        Ok(self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.code == *code)
            .map(|(i, _)| i)
            .collect())
    }
}

fn resolve_event_id(
    events: &[Event],
    requested: Option<&BTreeMap<String, i32>>,
) -> Result<BTreeMap<String, i32>> {
    match requested {
        None => Ok(unique_codes(events).into_iter().map(|c| (c.to_string(), c)).collect()),
        Some(map) => {
            if map.is_empty() {
                bail!("event_id must not be empty");
            }
            for (tag, code) in map {
                if !events.iter().any(|e| e.code == *code) {
                    bail!("no events found for {tag:?} (code {code})");
                }
            }
            Ok(map.clone())
        }
    }
}

/// Sample range `[b0, b1)` covered by the baseline interval, or `None` if it
/// contains no samples.
fn baseline_range(times: &[f64], (lo, hi): Baseline) -> Result<Option<(usize, usize)>> {
    let lo = lo.unwrap_or(f64::NEG_INFINITY);
    let hi = hi.unwrap_or(f64::INFINITY);
    if lo > hi {
        bail!("baseline start {lo} is after its end {hi}");
    }
    let eps = 1e-9;
    let b0 = times.iter().position(|&t| t >= lo - eps);
    let b1 = times.iter().rposition(|&t| t <= hi + eps);
    match (b0, b1) {
        (Some(a), Some(b)) if a <= b => Ok(Some((a, b + 1))),
        _ => {
            log::warn!("baseline interval contains no samples; skipping baseline correction");
            Ok(None)
        }
    }
}

/// Subtract each row's mean over `[b0, b1)`.
pub fn subtract_baseline(trial: &mut Array2<f64>, b0: usize, b1: usize) {
    for mut row in trial.rows_mut() {
        let m = row.slice(s![b0..b1]).mean().unwrap_or(0.0);
        row.mapv_inplace(|v| v - m);
    }
}

/// Peak-to-peak amplitude of a 1-D signal.
pub fn peak_to_peak<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi < lo { 0.0 } else { hi - lo }
}

fn first_over_limit(trial: ArrayView2<f64>, rows: &[usize], limit: f64) -> Option<(usize, f64)> {
    rows.iter()
        .map(|&r| (r, peak_to_peak(trial.row(r))))
        .find(|&(_, ptp)| ptp >= limit)
}
