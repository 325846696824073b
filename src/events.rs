//! Event markers read from a trigger channel.
use anyhow::{bail, Result};

use crate::recording::{ChannelKind, Recording};

/// A stimulus onset: sample index into the recording's data and its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Event {
    pub sample: usize,
    pub code:   i32,
}

impl Event {
    pub fn new(sample: usize, code: i32) -> Self {
        Self { sample, code }
    }
}

/// Find event onsets on `stim_channel`.
///
/// An onset is recorded wherever the trigger value steps up to a new
/// positive code (from zero or from a lower code). A value already high at
/// the first sample is not an onset. Trigger values are rounded to integers.
pub fn find_events(rec: &Recording, stim_channel: &str) -> Result<Vec<Event>> {
    let idx = rec.channel_index(stim_channel)?;
    if rec.channels[idx].kind != ChannelKind::Stim {
        log::warn!("{stim_channel} is not a stimulus channel; scanning it anyway");
    }
    let row = rec.data.row(idx);
    let codes: Vec<i32> = row.iter().map(|v| v.round() as i32).collect();

    let events: Vec<Event> = codes
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] > 0 && w[1] > w[0])
        .map(|(i, w)| Event::new(i + 1, w[1]))
        .collect();

    log::info!("{} events found on {stim_channel}", events.len());
    Ok(events)
}

/// Distinct event codes in ascending order.
pub fn unique_codes(events: &[Event]) -> Vec<i32> {
    let mut codes: Vec<i32> = events.iter().map(|e| e.code).collect();
    codes.sort_unstable();
    codes.dedup();
    codes
}

/// Build events from `(sample, code)` pairs, checking they are time-ordered.
pub fn from_pairs(pairs: &[(usize, i32)]) -> Result<Vec<Event>> {
    if pairs.windows(2).any(|w| w[1].0 < w[0].0) {
        bail!("event samples must be non-decreasing");
    }
    Ok(pairs.iter().map(|&(s, c)| Event::new(s, c)).collect())
}
