//! Continuous multi-channel recordings.
//!
//! A [`Recording`] is the in-memory counterpart of MNE's preloaded `Raw`:
//! `[n_chan, n_times]` samples in SI units plus the channel table. It is never
//! mutated by the pipeline; every processing step returns a new value.
use anyhow::{anyhow, bail, Result};
use ndarray::Array2;

use crate::fiff::constants::*;

/// Broad channel category, decoded from the FIFF channel kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Meg,
    Eeg,
    Stim,
    Eog,
    Emg,
    Ecg,
    Misc,
    Other(i32),
}

impl ChannelKind {
    pub fn from_fiff(code: i32) -> Self {
        match code {
            FIFFV_MEG_CH  => Self::Meg,
            FIFFV_EEG_CH  => Self::Eeg,
            FIFFV_STIM_CH => Self::Stim,
            FIFFV_EOG_CH  => Self::Eog,
            FIFFV_EMG_CH  => Self::Emg,
            FIFFV_ECG_CH  => Self::Ecg,
            FIFFV_MISC_CH => Self::Misc,
            other         => Self::Other(other),
        }
    }

    /// Brain-signal channels: the ones filtering applies to.
    pub fn is_data(self) -> bool {
        matches!(self, Self::Meg | Self::Eeg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub kind: ChannelKind,
}

impl Channel {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// Which channel categories [`Recording::pick_types`] should return.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickTypes {
    pub meg:  bool,
    pub eeg:  bool,
    pub stim: bool,
}

impl PickTypes {
    pub const EEG: Self = Self { meg: false, eeg: true, stim: false };

    fn accepts(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Meg  => self.meg,
            ChannelKind::Eeg  => self.eeg,
            ChannelKind::Stim => self.stim,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recording {
    /// `[n_chan, n_times]`, volts for EEG, tesla(/m) for MEG.
    pub data:       Array2<f64>,
    pub sfreq:      f64,
    pub channels:   Vec<Channel>,
    /// Names of channels marked bad in the file.
    pub bads:       Vec<String>,
    /// Acquisition index of `data[.., 0]`.
    pub first_samp: u64,
    pub highpass:   Option<f64>,
    pub lowpass:    Option<f64>,
}

impl Recording {
    /// Build a recording, checking that the channel table matches the data.
    pub fn new(data: Array2<f64>, sfreq: f64, channels: Vec<Channel>) -> Result<Self> {
        if data.nrows() != channels.len() {
            bail!("data has {} rows but {} channels were given", data.nrows(), channels.len());
        }
        if !(sfreq > 0.0) {
            bail!("sampling rate must be positive, got {sfreq}");
        }
        Ok(Self {
            data,
            sfreq,
            channels,
            bads: Vec::new(),
            first_samp: 0,
            highpass: None,
            lowpass: None,
        })
    }

    #[inline]
    pub fn n_chan(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    pub fn ch_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index of the channel called `name`.
    pub fn channel_index(&self, name: &str) -> Result<usize> {
        self.channels
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| anyhow!("channel {name:?} not found"))
    }

    pub fn is_bad(&self, idx: usize) -> bool {
        self.channels
            .get(idx)
            .is_some_and(|c| self.bads.iter().any(|b| *b == c.name))
    }

    /// Indices of channels of the requested kinds, in file order, bads excluded.
    pub fn pick_types(&self, types: PickTypes) -> Vec<usize> {
        (0..self.n_chan())
            .filter(|&i| types.accepts(self.channels[i].kind) && !self.is_bad(i))
            .collect()
    }
}
