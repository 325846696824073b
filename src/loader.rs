//! Recording loader and raw preview.
use std::path::Path;
use anyhow::{bail, Context, Result};
use ndarray::s;

use crate::config::DataConfig;
use crate::fiff::read_raw_fif;
use crate::recording::{PickTypes, Recording};
use crate::render::{RawView, Renderer};

/// What the preview shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    pub n_channels: usize,
    /// Seconds from the first stored sample.
    pub start:      f64,
    pub duration:   f64,
}

impl Default for Preview {
    fn default() -> Self {
        Self { n_channels: 5, start: 0.0, duration: 10.0 }
    }
}

/// Read a raw recording and render a preview of its first five good EEG
/// channels over the first ten seconds.
///
/// `raw_path` falls back to the sample recording under `data`'s root.
/// Returns the recording and the previewed channel indices.
pub fn load_and_plot(
    raw_path: Option<&Path>,
    data: &DataConfig,
    renderer: &mut dyn Renderer,
) -> Result<(Recording, Vec<usize>)> {
    load_and_plot_with(raw_path, data, Preview::default(), renderer)
}

pub fn load_and_plot_with(
    raw_path: Option<&Path>,
    data: &DataConfig,
    preview: Preview,
    renderer: &mut dyn Renderer,
) -> Result<(Recording, Vec<usize>)> {
    let path = match raw_path {
        Some(p) => p.to_path_buf(),
        None => data.sample_raw_path()?,
    };
    let rec = read_raw_fif(&path).with_context(|| format!("load {}", path.display()))?;
    log::info!(
        "loaded {}: {} channels, {} samples @ {} Hz ({:.1} s)",
        path.display(),
        rec.n_chan(),
        rec.n_times(),
        rec.sfreq,
        rec.duration_secs()
    );

    let picks: Vec<usize> = rec.pick_types(PickTypes::EEG).into_iter().take(preview.n_channels).collect();
    if picks.is_empty() {
        bail!("{} has no good EEG channels to preview", path.display());
    }
    renderer.plot_raw(&raw_view(&rec, &picks, preview.start, preview.duration)?)?;
    Ok((rec, picks))
}

/// Slice `[start, start + duration)` seconds of the picked channels, clipped
/// to the recording.
pub fn raw_view(rec: &Recording, picks: &[usize], start: f64, duration: f64) -> Result<RawView> {
    if start < 0.0 || duration <= 0.0 {
        bail!("invalid preview span: start {start} s, duration {duration} s");
    }
    let first = ((start * rec.sfreq).round() as usize).min(rec.n_times());
    let stop = (((start + duration) * rec.sfreq).round() as usize).min(rec.n_times());
    if first >= stop {
        bail!("preview starts after the end of the recording ({:.1} s)", rec.duration_secs());
    }
    let data = rec.data.select(ndarray::Axis(0), picks).slice(s![.., first..stop]).to_owned();
    Ok(RawView {
        title: "Raw EEG".into(),
        channels: picks.iter().map(|&i| rec.channels[i].name.clone()).collect(),
        times: (first..stop).map(|k| k as f64 / rec.sfreq).collect(),
        data,
    })
}
