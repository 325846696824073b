//! Windowed-sinc FIR design with MNE's automatic parameters.
//!
//! For a pass band `[l_freq, h_freq]` at sampling rate `sfreq`:
//!   • lower transition  = min(max(0.25 · l_freq, 2), l_freq)
//!   • upper transition  = min(max(0.25 · h_freq, 2), sfreq/2 − h_freq)
//!   • length N          = ⌈3.3 · sfreq / narrowest transition⌉, made odd
//!   • cutoffs sit at the middle of each transition band
//!   • Hamming window, unit gain in the pass band
use std::f64::consts::PI;
use anyhow::{bail, Result};

/// Lower transition bandwidth used for a highpass edge at `l_freq`.
pub fn lower_transition(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Upper transition bandwidth used for a lowpass edge at `h_freq`.
pub fn upper_transition(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for the given transition width; always odd.
pub fn filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (3.3 * sfreq / trans_bw).ceil().max(1.0) as usize;
    n + (n % 2 == 0) as usize
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Hamming-windowed sinc lowpass with `n` (odd) taps and unit DC gain.
pub fn firwin_lowpass(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    let centre = (n / 2) as f64;
    let fc = cutoff_hz / (sfreq / 2.0);
    let win = hamming(n);
    let mut h: Vec<f64> = win
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let x = i as f64 - centre;
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * w
        })
        .collect();
    let dc: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= dc);
    h
}

/// Design a zero-phase FIR filter.
///
/// * `(Some(l), Some(h))` → band-pass
/// * `(Some(l), None)`    → highpass
/// * `(None, Some(h))`    → lowpass
pub fn design_fir(l_freq: Option<f64>, h_freq: Option<f64>, sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    if let Some(l) = l_freq {
        if l <= 0.0 {
            bail!("l_freq must be positive, got {l}");
        }
    }
    if let Some(h) = h_freq {
        if h >= nyq {
            bail!("h_freq ({h} Hz) must be below Nyquist ({nyq} Hz)");
        }
    }

    let h = match (l_freq, h_freq) {
        (Some(l), Some(h)) => {
            if l >= h {
                bail!("l_freq ({l} Hz) must be below h_freq ({h} Hz)");
            }
            let (ltb, htb) = (lower_transition(l), upper_transition(h, sfreq));
            let n = filter_length(ltb.min(htb), sfreq);
            let upper = firwin_lowpass(n, h + htb / 2.0, sfreq);
            let lower = firwin_lowpass(n, l - ltb / 2.0, sfreq);
            upper.iter().zip(&lower).map(|(u, l)| u - l).collect()
        }
        (Some(l), None) => {
            let tb = lower_transition(l);
            let n = filter_length(tb, sfreq);
            let mut hp: Vec<f64> = firwin_lowpass(n, l - tb / 2.0, sfreq).iter().map(|v| -v).collect();
            hp[n / 2] += 1.0;
            hp
        }
        (None, Some(h)) => {
            let tb = upper_transition(h, sfreq);
            firwin_lowpass(filter_length(tb, sfreq), h + tb / 2.0, sfreq)
        }
        (None, None) => bail!("at least one of l_freq / h_freq is required"),
    };
    log::debug!("designed {}-tap FIR for {l_freq:?}-{h_freq:?} Hz @ {sfreq} Hz", h.len());
    Ok(h)
}

/// Frequency response magnitude of `h` at `freq` Hz.
pub fn gain_at(h: &[f64], freq: f64, sfreq: f64) -> f64 {
    let w = 2.0 * PI * freq / sfreq;
    let (re, im) = h.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &c)| {
        let ph = w * k as f64;
        (re + c * ph.cos(), im - c * ph.sin())
    });
    (re * re + im * im).sqrt()
}
