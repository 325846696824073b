//! Evoked responses and ERP peak export.
use std::path::Path;
use anyhow::{anyhow, bail, Result};
use ndarray::{Array2, Axis};

use crate::epochs::Epochs;
use crate::export::{write_records, PeakRow};
use crate::recording::Channel;

/// Volts → microvolts.
pub const UV_PER_V: f64 = 1e6;

/// Trial average of one condition.
#[derive(Debug, Clone)]
pub struct Evoked {
    /// `[n_chan, n_times]`.
    pub data:     Array2<f64>,
    pub times:    Vec<f64>,
    pub sfreq:    f64,
    pub channels: Vec<Channel>,
    /// Condition tag the average was built from.
    pub comment:  String,
    /// Number of trials averaged.
    pub nave:     usize,
}

impl Evoked {
    pub fn channel_index(&self, name: &str) -> Result<usize> {
        self.channels
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| anyhow!("channel {name:?} not in evoked response"))
    }

    /// Positive-going peak of the selected channel(s) within `[tmin, tmax]`.
    /// A window with no sample above zero is an error.
    ///
    /// A single channel yields [`PeakAmplitude::Scalar`]. A channel list yields
    /// [`PeakAmplitude::Array`] holding every listed channel's value at the
    /// latency of the overall maximum, so a one-element list gives a
    /// length-1 array rather than a scalar.
    pub fn find_peak(&self, selection: &ChannelSelection, tmin: f64, tmax: f64) -> Result<Peak> {
        if tmin > tmax {
            bail!("peak window start {tmin} is after its end {tmax}");
        }
        let window: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t >= tmin - 1e-9 && t <= tmax + 1e-9)
            .map(|(i, _)| i)
            .collect();
        if window.is_empty() {
            bail!("no samples in peak window [{tmin}, {tmax}] s");
        }

        let rows: Vec<usize> = selection
            .names()
            .iter()
            .map(|n| self.channel_index(n))
            .collect::<Result<_>>()?;
        if rows.is_empty() {
            bail!("empty channel selection");
        }

        // First occurrence wins on ties, scanning channels then time.
        let mut best = (rows[0], window[0], f64::NEG_INFINITY);
        for &r in &rows {
            for &t in &window {
                let v = self.data[[r, t]];
                if v > best.2 {
                    best = (r, t, v);
                }
            }
        }
        let (row, t_idx, value) = best;
        if value <= 0.0 {
            bail!("no positive value in peak window [{tmin}, {tmax}] s");
        }

        let amplitude = match selection {
            ChannelSelection::Single(_) => PeakAmplitude::Scalar(value),
            ChannelSelection::List(_) => {
                PeakAmplitude::Array(rows.iter().map(|&r| self.data[[r, t_idx]]).collect())
            }
        };
        Ok(Peak {
            channel: self.channels[row].name.clone(),
            latency: self.times[t_idx],
            amplitude,
        })
    }
}

/// Which channel(s) a peak search runs on.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSelection {
    Single(String),
    List(Vec<String>),
}

impl ChannelSelection {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(n) => vec![n.as_str()],
            Self::List(ns)  => ns.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ChannelSelection {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<&[&str]> for ChannelSelection {
    fn from(names: &[&str]) -> Self {
        Self::List(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ChannelSelection {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Peak value in either shape the search can return.
#[derive(Debug, Clone, PartialEq)]
pub enum PeakAmplitude {
    Scalar(f64),
    Array(Vec<f64>),
}

impl PeakAmplitude {
    /// Collapse to one number: a scalar passes through, an array yields its
    /// first element.
    ///
    /// Arrays longer than one element are accepted with a warning; only the
    /// first element is kept.
    pub fn to_scalar(&self) -> Result<f64> {
        match self {
            Self::Scalar(v) => Ok(*v),
            Self::Array(vs) => {
                let first = vs.first().copied().ok_or_else(|| anyhow!("empty peak amplitude array"))?;
                if vs.len() > 1 {
                    log::warn!("peak amplitude has {} values; exporting only the first", vs.len());
                }
                Ok(first)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Channel holding the maximum.
    pub channel:   String,
    /// Seconds relative to the event.
    pub latency:   f64,
    pub amplitude: PeakAmplitude,
}

/// Average the trials tagged `condition`.
///
/// Fails for an unknown tag and for a known tag whose trials were all dropped.
pub fn compute_evoked(epochs: &Epochs, condition: &str) -> Result<Evoked> {
    let idx = epochs.condition_indices(condition)?;
    if idx.is_empty() {
        bail!("no retained epochs for condition {condition:?}");
    }
    let data = epochs
        .data
        .select(Axis(0), &idx)
        .mean_axis(Axis(0))
        .ok_or_else(|| anyhow!("cannot average zero epochs"))?;
    log::info!("evoked {condition:?}: {} trials averaged", idx.len());
    Ok(Evoked {
        data,
        times: epochs.times.clone(),
        sfreq: epochs.sfreq,
        channels: epochs.channels.clone(),
        comment: condition.to_string(),
        nave: idx.len(),
    })
}

/// Find the peak on `channel` within `[tmin, tmax]` and write it, in µV, to
/// `csv_path` under the header `channel,amplitude_uV,latency_s`.
///
/// Defaults used by the pipeline: `tmin = 0.25`, `tmax = 0.5`,
/// `csv_path = "erp_peaks.csv"`.
pub fn export_peak_to_csv(
    evoked: &Evoked,
    channel: impl Into<ChannelSelection>,
    tmin: f64,
    tmax: f64,
    csv_path: &Path,
) -> Result<PeakRow> {
    let selection = channel.into();
    let peak = evoked.find_peak(&selection, tmin, tmax)?;
    let amplitude = peak.amplitude.to_scalar()?;
    // the kept array element belongs to the first listed channel
    let channel = match &selection {
        ChannelSelection::Single(_) => peak.channel,
        ChannelSelection::List(names) => names.first().cloned().unwrap_or(peak.channel),
    };
    let row = PeakRow {
        channel,
        amplitude_uv: amplitude * UV_PER_V,
        latency_s: peak.latency,
    };
    write_records(csv_path, std::slice::from_ref(&row))?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::ChannelKind;
    use approx::assert_abs_diff_eq;

    fn evoked() -> Evoked {
        let times: Vec<f64> = (0..101).map(|i| -0.2 + i as f64 * 0.01).collect();
        let mut data = Array2::zeros((2, 101));
        data[[0, 50]] = 4e-6; // t = 0.30
        data[[0, 10]] = 9e-6; // t = -0.10, outside the window
        data[[1, 60]] = 6e-6; // t = 0.40
        Evoked {
            data,
            times,
            sfreq: 100.0,
            channels: vec![Channel::new("EEG 001", ChannelKind::Eeg), Channel::new("EEG 002", ChannelKind::Eeg)],
            comment: "1".into(),
            nave: 3,
        }
    }

    #[test]
    fn scalar_peak_in_window() {
        let p = evoked().find_peak(&"EEG 001".into(), 0.25, 0.5).unwrap();
        assert_eq!(p.amplitude, PeakAmplitude::Scalar(4e-6));
        assert_abs_diff_eq!(p.latency, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn list_peak_is_array_at_shared_latency() {
        let p = evoked().find_peak(&["EEG 001", "EEG 002"].into(), 0.25, 0.5).unwrap();
        assert_eq!(p.channel, "EEG 002");
        assert_abs_diff_eq!(p.latency, 0.4, epsilon = 1e-9);
        assert_eq!(p.amplitude, PeakAmplitude::Array(vec![0.0, 6e-6]));
    }

    #[test]
    fn scalar_coercion_paths() {
        assert_eq!(PeakAmplitude::Scalar(2.0).to_scalar().unwrap(), 2.0);
        assert_eq!(PeakAmplitude::Array(vec![3.0]).to_scalar().unwrap(), 3.0);
        assert_eq!(PeakAmplitude::Array(vec![1.0, 5.0]).to_scalar().unwrap(), 1.0);
        assert!(PeakAmplitude::Array(vec![]).to_scalar().is_err());
    }

    #[test]
    fn negative_window_has_no_peak() {
        let mut ev = evoked();
        ev.data.fill(-3e-6);
        assert!(ev.find_peak(&"EEG 001".into(), 0.25, 0.5).is_err());
        assert!(ev.find_peak(&["EEG 001", "EEG 002"].into(), 0.25, 0.5).is_err());
    }

    #[test]
    fn window_without_samples() {
        assert!(evoked().find_peak(&"EEG 001".into(), 2.0, 3.0).is_err());
        assert!(evoked().find_peak(&"EEG 001".into(), 0.5, 0.25).is_err());
        assert!(evoked().find_peak(&"EEG 999".into(), 0.25, 0.5).is_err());
    }
}
