//! Shared helpers: synthetic recordings and a minimal `.fif` writer.
#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::Path;

use erpkit::fiff::constants::*;
use erpkit::render::{RawView, Renderer, TfrImage};
use erpkit::{Channel, ChannelKind, Recording};
use ndarray::Array2;

// ── Synthetic recordings ─────────────────────────────────────────────────────

/// Shape of a synthetic auditory-oddball-like recording.
#[derive(Debug, Clone)]
pub struct Synth {
    pub sfreq:        f64,
    pub n_eeg:        usize,
    pub duration:     f64,
    /// Onset of the first event, seconds.
    pub first_event:  f64,
    /// Spacing between events, seconds.
    pub event_every:  f64,
    /// Event indices carrying a large artifact on `EEG 002`.
    pub artifacts:    Vec<usize>,
}

impl Default for Synth {
    fn default() -> Self {
        Self {
            sfreq: 200.0,
            n_eeg: 6,
            duration: 30.0,
            first_event: 1.0,
            event_every: 1.5,
            artifacts: Vec::new(),
        }
    }
}

/// ERP peak of `EEG 001`, volts, at 0.3 s after each event (before filtering).
pub const ERP_PEAK: f64 = 7e-6;
pub const ERP_LATENCY: f64 = 0.3;

/// Build a recording with `n_eeg` EEG channels, one MEG channel and a
/// `STI 014` trigger. Events alternate codes 1 and 2; each is followed by a
/// Gaussian ERP peaking at 0.3 s and a 10 Hz burst during 0–0.5 s.
///
/// Returns the recording and the `(sample, code)` of every event.
pub fn synthetic(s: &Synth) -> (Recording, Vec<(usize, i32)>) {
    let n_times = (s.duration * s.sfreq).round() as usize;
    let n_ch = s.n_eeg + 2;
    let mut data = Array2::<f64>::zeros((n_ch, n_times));

    let mut events = Vec::new();
    let mut t_ev = s.first_event;
    while t_ev < s.duration {
        let code = if events.len() % 2 == 0 { 1 } else { 2 };
        events.push(((t_ev * s.sfreq).round() as usize, code));
        t_ev += s.event_every;
    }

    for t in 0..n_times {
        let ta = t as f64 / s.sfreq;
        for k in 0..s.n_eeg {
            data[[k, t]] = 0.3e-6 * (2.0 * PI * 3.3 * ta + k as f64).sin()
                + 0.2e-6 * (2.0 * PI * 23.0 * ta).sin();
        }
        data[[s.n_eeg, t]] = 1e-12 * (2.0 * PI * 7.0 * ta).sin();
    }

    for (i, &(onset, code)) in events.iter().enumerate() {
        for t in onset..(onset + (0.8 * s.sfreq) as usize).min(n_times) {
            let tr = (t - onset) as f64 / s.sfreq;
            let erp = (-((tr - ERP_LATENCY) / 0.05).powi(2) / 2.0).exp();
            let alpha = if tr <= 0.5 { (2.0 * PI * 10.0 * (tr - ERP_LATENCY)).cos() } else { 0.0 };
            for k in 0..s.n_eeg {
                let gain = 1.0 / (1.0 + 0.2 * k as f64);
                data[[k, t]] += gain * (5e-6 * erp + 2e-6 * alpha);
            }
        }
        for t in onset..(onset + 5).min(n_times) {
            data[[n_ch - 1, t]] = code as f64;
        }
        if s.artifacts.contains(&i) && s.n_eeg > 1 {
            let at = onset + (0.5 * s.sfreq) as usize;
            for t in at..(at + 10).min(n_times) {
                data[[1, t]] += 300e-6;
            }
        }
    }

    let mut channels: Vec<Channel> = (1..=s.n_eeg)
        .map(|k| Channel::new(format!("EEG {k:03}"), ChannelKind::Eeg))
        .collect();
    channels.push(Channel::new("MEG 0111", ChannelKind::Meg));
    channels.push(Channel::new("STI 014", ChannelKind::Stim));
    let rec = Recording::new(data, s.sfreq, channels).expect("valid synthetic recording");
    (rec, events)
}

// ── Minimal FIFF writer ──────────────────────────────────────────────────────

/// Writes tags sequentially; the last tag gets a `next = -1` terminator.
pub struct FifWriter {
    buf:      Vec<u8>,
    last_tag: Option<usize>,
}

impl FifWriter {
    pub fn new() -> Self {
        let mut w = Self { buf: Vec::new(), last_tag: None };
        w.tag(FIFF_FILE_ID, FIFFT_ID_STRUCT, &[0u8; 20]);
        w.tag(FIFF_DIR_POINTER, FIFFT_INT, &(-1_i32).to_be_bytes());
        w
    }

    pub fn tag(&mut self, kind: i32, ftype: u32, payload: &[u8]) {
        self.last_tag = Some(self.buf.len());
        self.buf.extend_from_slice(&kind.to_be_bytes());
        self.buf.extend_from_slice(&ftype.to_be_bytes());
        self.buf.extend_from_slice(&(payload.len() as i32).to_be_bytes());
        self.buf.extend_from_slice(&FIFFV_NEXT_SEQ.to_be_bytes());
        self.buf.extend_from_slice(payload);
    }

    pub fn start_block(&mut self, block: i32) {
        self.tag(FIFF_BLOCK_START, FIFFT_INT, &block.to_be_bytes());
    }

    pub fn end_block(&mut self, block: i32) {
        self.tag(FIFF_BLOCK_END, FIFFT_INT, &block.to_be_bytes());
    }

    pub fn int(&mut self, kind: i32, v: i32) {
        self.tag(kind, FIFFT_INT, &v.to_be_bytes());
    }

    pub fn float(&mut self, kind: i32, v: f32) {
        self.tag(kind, FIFFT_FLOAT, &v.to_be_bytes());
    }

    pub fn string(&mut self, kind: i32, s: &str) {
        self.tag(kind, FIFFT_STRING, s.as_bytes());
    }

    pub fn ch_info(&mut self, scan_no: i32, kind: i32, cal: f32, name: &str) {
        let mut raw = vec![0u8; 96];
        raw[0..4].copy_from_slice(&scan_no.to_be_bytes());
        raw[4..8].copy_from_slice(&scan_no.to_be_bytes());
        raw[8..12].copy_from_slice(&kind.to_be_bytes());
        raw[12..16].copy_from_slice(&1.0_f32.to_be_bytes());
        raw[16..20].copy_from_slice(&cal.to_be_bytes());
        let n = name.len().min(16);
        raw[80..80 + n].copy_from_slice(&name.as_bytes()[..n]);
        self.tag(FIFF_CH_INFO, FIFFT_CH_INFO_STRUCT, &raw);
    }

    /// `[n_chan, n_samp]` block, stored sample-major as big-endian f32.
    pub fn float_buffer(&mut self, block: &Array2<f64>, cals: &[f32]) {
        let mut raw = Vec::with_capacity(block.len() * 4);
        for t in 0..block.ncols() {
            for c in 0..block.nrows() {
                raw.extend_from_slice(&((block[[c, t]] / cals[c] as f64) as f32).to_be_bytes());
            }
        }
        self.tag(FIFF_DATA_BUFFER, FIFFT_FLOAT, &raw);
    }

    /// `[n_chan, n_samp]` block as big-endian i16 counts.
    pub fn short_buffer(&mut self, counts: &Array2<i16>) {
        let mut raw = Vec::with_capacity(counts.len() * 2);
        for t in 0..counts.ncols() {
            for c in 0..counts.nrows() {
                raw.extend_from_slice(&counts[[c, t]].to_be_bytes());
            }
        }
        self.tag(FIFF_DATA_BUFFER, FIFFT_SHORT, &raw);
    }

    pub fn finish(mut self, path: &Path) {
        if let Some(at) = self.last_tag {
            self.buf[at + 12..at + 16].copy_from_slice(&FIFFV_NEXT_NONE.to_be_bytes());
        }
        std::fs::write(path, &self.buf).expect("write fif");
    }
}

fn fiff_kind(kind: ChannelKind) -> i32 {
    match kind {
        ChannelKind::Meg => FIFFV_MEG_CH,
        ChannelKind::Eeg => FIFFV_EEG_CH,
        ChannelKind::Stim => FIFFV_STIM_CH,
        ChannelKind::Eog => FIFFV_EOG_CH,
        ChannelKind::Emg => FIFFV_EMG_CH,
        ChannelKind::Ecg => FIFFV_ECG_CH,
        ChannelKind::Misc => FIFFV_MISC_CH,
        ChannelKind::Other(k) => k,
    }
}

/// Layout knobs for [`write_raw_fif`].
#[derive(Debug, Clone)]
pub struct FifLayout {
    pub buffer_len: usize,
    pub first_samp: i32,
    /// Buffers omitted after the first one and declared with `FIFF_DATA_SKIP`.
    pub skip:       usize,
    /// Calibration stored for every channel.
    pub cal:        f32,
}

impl Default for FifLayout {
    fn default() -> Self {
        Self { buffer_len: 100, first_samp: 0, skip: 0, cal: 1.0 }
    }
}

/// Write `rec` as a raw `.fif` file, bads in the MNE bad-channel block.
pub fn write_raw_fif(path: &Path, rec: &Recording, layout: &FifLayout) {
    let mut w = FifWriter::new();
    w.start_block(FIFFB_MEAS);
    w.start_block(FIFFB_MEAS_INFO);
    w.int(FIFF_NCHAN, rec.n_chan() as i32);
    w.float(FIFF_SFREQ, rec.sfreq as f32);
    if let Some(hp) = rec.highpass {
        w.float(FIFF_HIGHPASS, hp as f32);
    }
    if let Some(lp) = rec.lowpass {
        w.float(FIFF_LOWPASS, lp as f32);
    }
    for (i, ch) in rec.channels.iter().enumerate() {
        w.ch_info(i as i32 + 1, fiff_kind(ch.kind), layout.cal, &ch.name);
    }
    if !rec.bads.is_empty() {
        w.start_block(FIFFB_MNE_BAD_CHANNELS);
        w.string(FIFF_MNE_CH_NAME_LIST, &rec.bads.join(":"));
        w.end_block(FIFFB_MNE_BAD_CHANNELS);
    }
    w.end_block(FIFFB_MEAS_INFO);

    w.start_block(FIFFB_RAW_DATA);
    w.int(FIFF_FIRST_SAMPLE, layout.first_samp);
    let cals = vec![layout.cal; rec.n_chan()];
    let n = rec.n_times();
    let mut start = 0;
    let mut index = 0;
    while start < n {
        let stop = (start + layout.buffer_len).min(n);
        if index == 1 && layout.skip > 0 {
            w.int(FIFF_DATA_SKIP, layout.skip as i32);
            start += layout.skip * layout.buffer_len;
            index += 1;
            continue;
        }
        let block = rec.data.slice(ndarray::s![.., start..stop]).to_owned();
        w.float_buffer(&block, &cals);
        start = stop;
        index += 1;
    }
    w.end_block(FIFFB_RAW_DATA);
    w.end_block(FIFFB_MEAS);
    w.finish(path);
}

/// Place a recording where `DataConfig` expects the sample file.
pub fn write_sample_dataset(root: &Path, rec: &Recording) -> std::path::PathBuf {
    let path = erpkit::DataConfig::sample_raw_in(root);
    std::fs::create_dir_all(path.parent().expect("sample path has a parent")).expect("mkdir");
    write_raw_fif(&path, rec, &FifLayout::default());
    path
}

// ── Renderer that records what it was asked to draw ─────────────────────────

#[derive(Debug, Default)]
pub struct CaptureRenderer {
    pub raw: Vec<RawView>,
    pub tfr: Vec<TfrImage>,
}

impl Renderer for CaptureRenderer {
    fn plot_raw(&mut self, view: &RawView) -> anyhow::Result<()> {
        self.raw.push(view.clone());
        Ok(())
    }

    fn plot_tfr(&mut self, image: &TfrImage) -> anyhow::Result<()> {
        self.tfr.push(image.clone());
        Ok(())
    }
}
