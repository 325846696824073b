//! Configuration.
//!
//! [`DataConfig`] says where the sample dataset lives; it is an explicit value
//! handed to the loader so tests can point it at a fixture.
//! [`AnalysisConfig`] holds every tunable default of the pipeline. Both have
//! `pub` fields for struct-update syntax:
//!
//! ```
//! use erpkit::AnalysisConfig;
//!
//! let cfg = AnalysisConfig {
//!     h_freq: 30.0,
//!     reject_threshold: 150e-6,
//!     ..AnalysisConfig::default()
//! };
//! assert_eq!(cfg.l_freq, 1.0);
//! ```
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the sample dataset root directly.
pub const DATA_ENV: &str = "ERPKIT_DATA";
/// MNE's data-home variable; the sample folder sits below it.
pub const MNE_DATA_ENV: &str = "MNE_DATA";
/// Folder name of the sample dataset inside an MNE data home.
pub const SAMPLE_FOLDER: &str = "MNE-sample-data";

/// Location of the default sample dataset.
///
/// Resolution order for [`DataConfig::sample_root`]:
/// 1. the explicit `sample_root` field,
/// 2. `$ERPKIT_DATA`,
/// 3. `$MNE_DATA/MNE-sample-data`,
/// 4. `~/mne_data/MNE-sample-data`.
///
/// Nothing is downloaded; a missing dataset surfaces as a file-not-found
/// error from the reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub sample_root: Option<PathBuf>,
}

impl DataConfig {
    /// Config pinned to an explicit dataset root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { sample_root: Some(root.into()) }
    }

    /// Resolve the dataset root using the process environment.
    pub fn sample_root(&self) -> Result<PathBuf> {
        self.sample_root_with(|key| std::env::var_os(key))
    }

    /// Resolve the dataset root with an injected environment lookup.
    pub fn sample_root_with<F>(&self, env: F) -> Result<PathBuf>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(root) = &self.sample_root {
            return Ok(root.clone());
        }
        if let Some(root) = env(DATA_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(root));
        }
        if let Some(home) = env(MNE_DATA_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(home).join(SAMPLE_FOLDER));
        }
        dirs::home_dir()
            .map(|h| h.join("mne_data").join(SAMPLE_FOLDER))
            .ok_or_else(|| anyhow!("cannot locate sample data: set {DATA_ENV} or {MNE_DATA_ENV}"))
    }

    /// Path of the sample raw recording below a dataset root.
    pub fn sample_raw_in(root: &Path) -> PathBuf {
        root.join("MEG").join("sample").join("sample_audvis_raw.fif")
    }

    /// Path of the sample raw recording.
    pub fn sample_raw_path(&self) -> Result<PathBuf> {
        Ok(Self::sample_raw_in(&self.sample_root()?))
    }
}

/// Every tunable default of the pipeline.
///
/// Loadable from JSON with any subset of fields; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Channels drawn in the loader preview. Default: `5`.
    pub preview_channels: usize,
    /// Seconds drawn in the loader preview. Default: `10.0`.
    pub preview_duration: f64,

    /// Band-pass edges in Hz. Defaults: `1.0` and `40.0`.
    pub l_freq: f64,
    pub h_freq: f64,

    /// Trigger channel scanned for events. Default: `"STI 014"`.
    pub stim_channel: String,
    /// Condition tag → event code; `None` keeps every code found.
    pub event_id: Option<BTreeMap<String, i32>>,
    /// Epoch window in seconds relative to each event. Defaults: `-0.2`, `0.8`.
    pub tmin: f64,
    pub tmax: f64,
    /// Peak-to-peak EEG rejection threshold in volts. Default: `100e-6`.
    pub reject_threshold: f64,

    /// Condition averaged by the ERP stage. Default: `"1"`.
    pub condition: String,
    /// Channel searched for the ERP peak. Default: `"EEG 001"`.
    pub peak_channel: String,
    /// Peak search window in seconds. Defaults: `0.25`, `0.5`.
    pub peak_tmin: f64,
    pub peak_tmax: f64,
    pub erp_csv: PathBuf,

    /// Wavelet frequencies; `None` → 4, 6, …, 30 Hz.
    pub freqs: Option<Vec<f64>>,
    /// Cycles per frequency; `None` → `freq / 2`.
    pub n_cycles: Option<Vec<f64>>,
    /// Display window of the TFR plot.
    pub plot_tmin: f64,
    pub plot_tmax: f64,
    pub plot_fmin: f64,
    pub plot_fmax: f64,
    /// Band and time window exported as mean power. Defaults: 8–12 Hz, 0–0.5 s.
    pub band: (f64, f64),
    pub band_tmin: f64,
    pub band_tmax: f64,
    pub tfr_csv: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            preview_channels: 5,
            preview_duration: 10.0,
            l_freq: 1.0,
            h_freq: 40.0,
            stim_channel: "STI 014".into(),
            event_id: None,
            tmin: -0.2,
            tmax: 0.8,
            reject_threshold: 100e-6,
            condition: "1".into(),
            peak_channel: "EEG 001".into(),
            peak_tmin: 0.25,
            peak_tmax: 0.5,
            erp_csv: PathBuf::from("erp_peaks.csv"),
            freqs: None,
            n_cycles: None,
            plot_tmin: -0.2,
            plot_tmax: 0.8,
            plot_fmin: 4.0,
            plot_fmax: 30.0,
            band: (8.0, 12.0),
            band_tmin: 0.0,
            band_tmax: 0.5,
            tfr_csv: PathBuf::from("tfr_band_power.csv"),
        }
    }
}

impl AnalysisConfig {
    /// Read overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// JSON file if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None    => Ok(Self::default()),
        }
    }
}
