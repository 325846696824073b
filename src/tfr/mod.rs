//! Time-frequency analysis: Morlet power, log-ratio display and band power
//! export.
//!
//! ```text
//! Epochs [trial, ch, t]
//!   └─ compute_tfr ─ per-trial |x ∗ W_f|², averaged ─→ Power [ch, f, t]
//!        ├─ plot_tfr           baseline (None, 0) log-ratio, cropped, rendered
//!        └─ export_band_power  mean over [low, high] Hz × [tmin, tmax] s → CSV
//! ```
pub mod morlet;

use std::path::Path;
use anyhow::{bail, Result};
use ndarray::{s, Array2, Array3, Axis};

use crate::epochs::Epochs;
use crate::export::write_channel_values;
use crate::recording::Channel;
use crate::render::{Renderer, TfrImage};

pub use morlet::{morlet, WaveletBank};

/// 4, 6, …, 30 Hz.
pub fn default_freqs() -> Vec<f64> {
    (4..=30).step_by(2).map(f64::from).collect()
}

/// Half a cycle per hertz.
pub fn default_cycles(freqs: &[f64]) -> Vec<f64> {
    freqs.iter().map(|f| f / 2.0).collect()
}

/// Trial-averaged power.
#[derive(Debug, Clone)]
pub struct Power {
    /// `[n_chan, n_freqs, n_times]`.
    pub data:     Array3<f64>,
    pub freqs:    Vec<f64>,
    pub times:    Vec<f64>,
    pub channels: Vec<Channel>,
    pub n_cycles: Vec<f64>,
    /// Trials averaged.
    pub nave:     usize,
}

impl Power {
    /// Time-frequency cell count per channel.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Keep times in `[tmin, tmax]` and frequencies in `[fmin, fmax]`.
    pub fn crop(&self, tmin: f64, tmax: f64, fmin: f64, fmax: f64) -> Result<Power> {
        let t_idx = mask(&self.times, tmin, tmax);
        let f_idx = mask(&self.freqs, fmin, fmax);
        if t_idx.is_empty() {
            bail!("no time points in [{tmin}, {tmax}] s");
        }
        if f_idx.is_empty() {
            bail!("no frequencies in [{fmin}, {fmax}] Hz");
        }
        let data = self.data.select(Axis(1), &f_idx).select(Axis(2), &t_idx);
        Ok(Power {
            data,
            freqs: f_idx.iter().map(|&i| self.freqs[i]).collect(),
            times: t_idx.iter().map(|&i| self.times[i]).collect(),
            channels: self.channels.clone(),
            n_cycles: f_idx.iter().map(|&i| self.n_cycles[i]).collect(),
            nave: self.nave,
        })
    }

    /// `log10(P / mean(P over the baseline))` per channel and frequency.
    ///
    /// The baseline runs from `b0` (start of data when `None`) to `b1` (end of
    /// data when `None`).
    pub fn rescale_logratio(&self, b0: Option<f64>, b1: Option<f64>) -> Result<Power> {
        let lo = b0.unwrap_or(f64::NEG_INFINITY);
        let hi = b1.unwrap_or(f64::INFINITY);
        let base = mask(&self.times, lo, hi);
        let (Some(&i0), Some(&i1)) = (base.first(), base.last()) else {
            bail!("baseline window holds no time points");
        };
        let mut data = self.data.clone();
        for mut row in data.lanes_mut(Axis(2)) {
            let mean = row.slice(s![i0..=i1]).mean().unwrap_or(0.0);
            if mean <= 0.0 {
                bail!("non-positive baseline power; cannot take a log ratio");
            }
            row.mapv_inplace(|p| (p / mean).log10());
        }
        Ok(Power { data, ..self.clone() })
    }
}

/// Indices of `values` within `[lo, hi]`, allowing for float rounding in
/// sample times.
fn mask(values: &[f64], lo: f64, hi: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= lo - 1e-9 && v <= hi + 1e-9)
        .map(|(i, _)| i)
        .collect()
}

/// Morlet power for channels `picks` (indices into `epochs.channels`),
/// averaged across trials.
///
/// `freqs` defaults to [`default_freqs`], `n_cycles` to [`default_cycles`].
/// A single cycle count applies to every frequency.
pub fn compute_tfr(
    epochs: &Epochs,
    picks: &[usize],
    freqs: Option<&[f64]>,
    n_cycles: Option<&[f64]>,
) -> Result<Power> {
    if epochs.is_empty() {
        bail!("no epochs to transform");
    }
    if picks.is_empty() {
        bail!("no channels picked for time-frequency analysis");
    }
    if let Some(&bad) = picks.iter().find(|&&p| p >= epochs.n_chan()) {
        bail!("pick {bad} out of range for {} channels", epochs.n_chan());
    }
    let freqs = freqs.map(<[f64]>::to_vec).unwrap_or_else(default_freqs);
    if freqs.is_empty() {
        bail!("empty frequency grid");
    }
    let n_cycles = match n_cycles {
        None => default_cycles(&freqs),
        Some([c]) => vec![*c; freqs.len()],
        Some(cs) if cs.len() == freqs.len() => cs.to_vec(),
        Some(cs) => bail!("{} cycle counts for {} frequencies", cs.len(), freqs.len()),
    };

    let n_times = epochs.n_times();
    let wavelets = morlet(epochs.sfreq, &freqs, &n_cycles, true)?;
    let bank = WaveletBank::new(&wavelets, n_times)?;

    let mut data = Array3::<f64>::zeros((picks.len(), freqs.len(), n_times));
    let mut acc = vec![vec![0.0; n_times]; freqs.len()];
    let mut signal = vec![0.0; n_times];
    for (out_ch, &ch) in picks.iter().enumerate() {
        acc.iter_mut().for_each(|a| a.fill(0.0));
        for trial in epochs.data.axis_iter(Axis(0)) {
            for (dst, &v) in signal.iter_mut().zip(trial.row(ch)) {
                *dst = v;
            }
            bank.accumulate_power(&signal, &mut acc)?;
        }
        for (fi, a) in acc.iter().enumerate() {
            for (ti, &p) in a.iter().enumerate() {
                data[[out_ch, fi, ti]] = p / epochs.len() as f64;
            }
        }
    }
    log::info!(
        "tfr: {} channel(s) × {} frequencies × {} samples from {} trials",
        picks.len(),
        freqs.len(),
        n_times,
        epochs.len()
    );

    Ok(Power {
        data,
        freqs,
        times: epochs.times.clone(),
        channels: picks.iter().map(|&p| epochs.channels[p].clone()).collect(),
        n_cycles,
        nave: epochs.len(),
    })
}

/// Render the baseline-normalised (`(None, 0)`, log-ratio) power of every
/// channel within the given window.
pub fn plot_tfr(
    power: &Power,
    tmin: f64,
    tmax: f64,
    fmin: f64,
    fmax: f64,
    renderer: &mut dyn Renderer,
) -> Result<()> {
    let scaled = power.rescale_logratio(None, Some(0.0))?;
    let cropped = scaled.crop(tmin, tmax, fmin, fmax)?;
    for (ch, channel) in cropped.channels.iter().enumerate() {
        let values: Array2<f64> = cropped.data.index_axis(Axis(0), ch).to_owned();
        renderer.plot_tfr(&TfrImage {
            channel: channel.name.clone(),
            freqs: cropped.freqs.clone(),
            times: cropped.times.clone(),
            values,
            mode: "logratio",
        })?;
    }
    Ok(())
}

/// Mean power per channel over `band` (inclusive, Hz) and `[tmin, tmax]`
/// (inclusive, s), written to `csv_path` as `channel,<low>-<high>Hz_power`.
///
/// Defaults used by the pipeline: `band = (8, 12)`, `tmin = 0`, `tmax = 0.5`,
/// `csv_path = "tfr_band_power.csv"`.
pub fn export_band_power(
    power: &Power,
    band: (f64, f64),
    tmin: f64,
    tmax: f64,
    csv_path: &Path,
) -> Result<Vec<(String, f64)>> {
    let (low, high) = band;
    let f_idx = mask(&power.freqs, low, high);
    let t_idx = mask(&power.times, tmin, tmax);
    if f_idx.is_empty() {
        bail!("no frequencies of the grid fall in [{low}, {high}] Hz");
    }
    if t_idx.is_empty() {
        bail!("no time points fall in [{tmin}, {tmax}] s");
    }

    let rows: Vec<(String, f64)> = power
        .channels
        .iter()
        .enumerate()
        .map(|(ch, channel)| {
            let cells = power
                .data
                .index_axis(Axis(0), ch)
                .select(Axis(0), &f_idx)
                .select(Axis(1), &t_idx);
            let mean = cells.sum() / cells.len() as f64;
            (channel.name.clone(), mean)
        })
        .collect();

    write_channel_values(csv_path, &format!("{low}-{high}Hz_power"), &rows)?;
    Ok(rows)
}
