//! # erpkit: event-related EEG/MEG analysis in pure Rust
//!
//! `erpkit` loads a continuous `.fif` recording, band-pass filters it, cuts
//! trials around stimulus events with amplitude rejection, and summarises
//! them as an evoked-response peak and Morlet time-frequency band power.
//! The numerical engines follow [MNE-Python](https://mne.tools) behaviour.
//!
//! ## Pipeline overview
//!
//! ```text
//! sample_audvis_raw.fif
//!   │
//!   ├─ loader::load_and_plot()       native FIFF reader, 5-channel EEG preview
//!   ├─ events::find_events()         onsets on STI 014
//!   ├─ preprocess::filter_raw()      zero-phase FIR band-pass 1–40 Hz
//!   ├─ preprocess::reject_epochs()   −0.2…0.8 s, baseline (None, 0), ptp < 100 µV
//!   │
//!   ├─ evoked::compute_evoked()      trial mean of one condition
//!   │    └─ export_peak_to_csv()     → erp_peaks.csv
//!   │
//!   └─ tfr::compute_tfr()            Morlet power 4–30 Hz, averaged over trials
//!        ├─ plot_tfr()               log-ratio vs. pre-stimulus baseline
//!        └─ export_band_power()      → tfr_band_power.csv
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use erpkit::{run_pipeline, AnalysisConfig, DataConfig, NullRenderer};
//!
//! let cfg = AnalysisConfig::default();
//! let summary = run_pipeline(None, &DataConfig::default(), &cfg, &mut NullRenderer).unwrap();
//! println!("{} epochs kept, ERP peak {:?}", summary.n_epochs, summary.peak);
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use erpkit::{events::find_events, preprocess, evoked, tfr};
//! use erpkit::fiff::read_raw_fif;
//! use std::path::Path;
//!
//! let raw    = read_raw_fif("sample_audvis_raw.fif").unwrap();
//! let events = find_events(&raw, "STI 014").unwrap();
//! let filt   = preprocess::filter_raw(&raw, 1.0, 40.0).unwrap();
//! let epochs = preprocess::reject_epochs(&filt, &events, None, -0.2, 0.8, 100e-6).unwrap();
//!
//! let erp = evoked::compute_evoked(&epochs, "1").unwrap();
//! evoked::export_peak_to_csv(&erp, "EEG 001", 0.25, 0.5, Path::new("erp_peaks.csv")).unwrap();
//!
//! let eeg   = epochs.channel_index("EEG 001").unwrap();
//! let power = tfr::compute_tfr(&epochs, &[eeg], None, None).unwrap();
//! tfr::export_band_power(&power, (8.0, 12.0), 0.0, 0.5, Path::new("tfr_band_power.csv")).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod epochs;
pub mod events;
pub mod evoked;
pub mod export;
pub mod fiff;
pub mod filter;
pub mod loader;
pub mod preprocess;
pub mod recording;
pub mod render;
pub mod tfr;

use std::path::Path;
use anyhow::{bail, Result};

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::{AnalysisConfig, DataConfig};
pub use epochs::{DropReason, EpochParams, Epochs};
pub use events::{find_events, Event};
pub use evoked::{compute_evoked, export_peak_to_csv, ChannelSelection, Evoked, Peak, PeakAmplitude};
pub use export::PeakRow;
pub use loader::{load_and_plot, load_and_plot_with, Preview};
pub use preprocess::{filter_raw, reject_epochs};
pub use recording::{Channel, ChannelKind, PickTypes, Recording};
pub use render::{NullRenderer, PngRenderer, RawView, Renderer, TfrImage};
pub use tfr::{compute_tfr, export_band_power, plot_tfr, Power};

/// What one end-to-end run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub n_events:   usize,
    pub n_epochs:   usize,
    pub n_dropped:  usize,
    pub peak:       PeakRow,
    /// `(channel, mean band power)` per TFR channel.
    pub band_power: Vec<(String, f64)>,
}

/// Run every stage in order: load and preview, find events, filter, epoch,
/// export the ERP peak, then compute, plot and export TFR band power on the
/// first previewed EEG channel.
///
/// All parameters come from `cfg`; `raw_path = None` reads the sample
/// recording under `data`.
pub fn run_pipeline(
    raw_path: Option<&Path>,
    data: &DataConfig,
    cfg: &AnalysisConfig,
    renderer: &mut dyn Renderer,
) -> Result<PipelineSummary> {
    let preview = Preview {
        n_channels: cfg.preview_channels,
        duration: cfg.preview_duration,
        ..Preview::default()
    };
    let (raw, picks) = load_and_plot_with(raw_path, data, preview, renderer)?;
    let events = find_events(&raw, &cfg.stim_channel)?;
    if events.is_empty() {
        bail!("no events on {}", cfg.stim_channel);
    }

    let filtered = filter_raw(&raw, cfg.l_freq, cfg.h_freq)?;
    let epochs = reject_epochs(
        &filtered,
        &events,
        cfg.event_id.as_ref(),
        cfg.tmin,
        cfg.tmax,
        cfg.reject_threshold,
    )?;

    let erp = compute_evoked(&epochs, &cfg.condition)?;
    let peak = export_peak_to_csv(&erp, cfg.peak_channel.as_str(), cfg.peak_tmin, cfg.peak_tmax, &cfg.erp_csv)?;

    let power = compute_tfr(&epochs, &picks[..1], cfg.freqs.as_deref(), cfg.n_cycles.as_deref())?;
    plot_tfr(&power, cfg.plot_tmin, cfg.plot_tmax, cfg.plot_fmin, cfg.plot_fmax, renderer)?;
    let band_power = export_band_power(&power, cfg.band, cfg.band_tmin, cfg.band_tmax, &cfg.tfr_csv)?;

    Ok(PipelineSummary {
        n_events: events.len(),
        n_epochs: epochs.len(),
        n_dropped: epochs.drop_log.len(),
        peak,
        band_power,
    })
}
