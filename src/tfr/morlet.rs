//! Complex Morlet wavelets and FFT convolution.
//!
//! Wavelet construction matches `mne.time_frequency.morlet`:
//!
//! ```text
//! σₜ = n_cycles / (2π·f)
//! t  = −k/sfreq … k/sfreq,  k < 5σₜ·sfreq
//! W  = (exp(2πi·f·t) − c) · exp(−t² / 2σₜ²),   W ← W / (√0.5 · ‖W‖)
//! ```
//!
//! With `zero_mean`, `c = exp(−2(π·f·σₜ)²)` removes the DC response of the
//! truncated oscillation; otherwise `c = 0`.
//!
//! Convolution is `same`-mode: the full linear convolution is computed with
//! one FFT size large enough for the longest wavelet and its centre
//! `n_times` samples are kept.
use std::f64::consts::PI;
use std::sync::Arc;
use anyhow::{bail, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// One wavelet per frequency.
pub fn morlet(sfreq: f64, freqs: &[f64], n_cycles: &[f64], zero_mean: bool) -> Result<Vec<Vec<Complex<f64>>>> {
    if freqs.len() != n_cycles.len() {
        bail!("{} frequencies but {} cycle counts", freqs.len(), n_cycles.len());
    }
    freqs
        .iter()
        .zip(n_cycles)
        .map(|(&f, &nc)| {
            if !(f > 0.0) || !(nc > 0.0) {
                bail!("frequency ({f}) and cycle count ({nc}) must be positive");
            }
            let sigma_t = nc / (2.0 * PI * f);
            let half = (5.0 * sigma_t * sfreq).ceil().max(1.0) as i64;
            let offset = if zero_mean { (-2.0 * (PI * f * sigma_t).powi(2)).exp() } else { 0.0 };
            let mut w: Vec<Complex<f64>> = (-(half - 1)..half)
                .map(|k| {
                    let t = k as f64 / sfreq;
                    let gauss = (-t * t / (2.0 * sigma_t * sigma_t)).exp();
                    (Complex::from_polar(1.0, 2.0 * PI * f * t) - offset) * gauss
                })
                .collect();
            let norm = w.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
            let scale = 1.0 / (0.5_f64.sqrt() * norm);
            w.iter_mut().for_each(|c| *c *= scale);
            Ok(w)
        })
        .collect()
}

/// Convolves equal-length signals with a fixed wavelet bank.
pub struct WaveletBank {
    n_times: usize,
    n_fft:   usize,
    lens:    Vec<usize>,
    spectra: Vec<Vec<Complex<f64>>>,
    fwd:     Arc<dyn Fft<f64>>,
    inv:     Arc<dyn Fft<f64>>,
}

impl WaveletBank {
    pub fn new(wavelets: &[Vec<Complex<f64>>], n_times: usize) -> Result<Self> {
        let longest = wavelets.iter().map(Vec::len).max().unwrap_or(0);
        if longest > n_times {
            bail!(
                "a wavelet ({longest} samples) is longer than the signal ({n_times} samples); \
                 use a longer epoch or fewer cycles"
            );
        }
        let n_fft = (n_times + longest).saturating_sub(1).max(1).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let spectra = wavelets
            .iter()
            .map(|w| {
                let mut buf = vec![Complex::default(); n_fft];
                buf[..w.len()].copy_from_slice(w);
                fwd.process(&mut buf);
                buf
            })
            .collect();
        Ok(Self {
            n_times,
            n_fft,
            lens: wavelets.iter().map(Vec::len).collect(),
            spectra,
            fwd,
            inv,
        })
    }

    pub fn n_wavelets(&self) -> usize {
        self.spectra.len()
    }

    /// Power `|x ∗ Wᵢ|²` for every wavelet, each `n_times` long, added into
    /// `out[i]`.
    pub fn accumulate_power(&self, x: &[f64], out: &mut [Vec<f64>]) -> Result<()> {
        if x.len() != self.n_times {
            bail!("wavelet bank planned for {} samples, got {}", self.n_times, x.len());
        }
        let mut x_fft = vec![Complex::default(); self.n_fft];
        for (b, &v) in x_fft.iter_mut().zip(x) {
            b.re = v;
        }
        self.fwd.process(&mut x_fft);

        let scale = 1.0 / self.n_fft as f64;
        let mut buf = vec![Complex::default(); self.n_fft];
        for ((spec, &len), acc) in self.spectra.iter().zip(&self.lens).zip(out.iter_mut()) {
            for ((b, a), w) in buf.iter_mut().zip(&x_fft).zip(spec) {
                *b = a * w;
            }
            self.inv.process(&mut buf);
            let full = self.n_times + len - 1;
            let start = (full - self.n_times) / 2;
            for (dst, c) in acc.iter_mut().zip(&buf[start..start + self.n_times]) {
                *dst += (c * scale).norm_sqr();
            }
        }
        Ok(())
    }
}
