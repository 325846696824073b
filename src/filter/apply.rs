//! Zero-phase FIR application by FFT overlap-add.
//!
//! Follows MNE's `_overlap_add_filter`: the signal is extended by `N − 1`
//! samples of reflect-limited padding on both sides, convolved block-wise, and
//! the output is shifted left by `(N − 1) / 2` so the symmetric kernel adds no
//! delay.
use std::sync::Arc;
use anyhow::{bail, Result};
use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// An FIR kernel planned for signals of one fixed length.
///
/// Planning is the expensive part, so a filter is built once and reused for
/// every channel of a recording.
pub struct OverlapAdd {
    n_h:   usize,
    n_x:   usize,
    n_fft: usize,
    h_fft: Vec<Complex<f64>>,
    fwd:   Arc<dyn Fft<f64>>,
    inv:   Arc<dyn Fft<f64>>,
}

impl OverlapAdd {
    /// Plan `h` (odd length) for signals of `n_x` samples.
    pub fn new(h: &[f64], n_x: usize) -> Result<Self> {
        let n_h = h.len();
        if n_h % 2 == 0 {
            bail!("zero-phase FIR needs an odd number of taps, got {n_h}");
        }
        let n_ext = n_x + 2 * (n_h - 1);
        let n_fft = choose_fft_len(n_h, n_ext);

        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft = zero_padded(h, n_fft);
        fwd.process(&mut h_fft);
        Ok(Self { n_h, n_x, n_fft, h_fft, fwd, inv })
    }

    /// Filter one signal of the planned length.
    pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.n_x {
            bail!("filter planned for {} samples, got {}", self.n_x, x.len());
        }
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let n_edge = self.n_h - 1;
        let shift = n_edge / 2;
        let x_ext = reflect_limited_pad(x, n_edge);
        let n_ext = x_ext.len();
        let n_seg = self.n_fft - self.n_h + 1;
        let scale = 1.0 / self.n_fft as f64;

        let mut acc = vec![0.0_f64; n_ext];
        for start in (0..n_ext).step_by(n_seg) {
            let stop = (start + n_seg).min(n_ext);
            let mut buf = zero_padded(&x_ext[start..stop], self.n_fft);
            self.fwd.process(&mut buf);
            for (b, hf) in buf.iter_mut().zip(&self.h_fft) {
                *b *= hf;
            }
            self.inv.process(&mut buf);

            // Output index o receives product index o - start + shift.
            let out_start = start.saturating_sub(shift);
            let prod_start = shift.saturating_sub(start);
            for (o, p) in (out_start..n_ext).zip(prod_start..self.n_fft) {
                acc[o] += buf[p].re * scale;
            }
        }
        Ok(acc[n_edge..n_edge + self.n_x].to_vec())
    }
}

/// Filter the listed rows of `data` (`[C, T]`) in place; other rows are untouched.
pub fn filter_rows(data: &mut Array2<f64>, h: &[f64], rows: &[usize]) -> Result<()> {
    let fir = OverlapAdd::new(h, data.ncols())?;
    for &r in rows {
        if r >= data.nrows() {
            bail!("row {r} out of range for {} channels", data.nrows());
        }
        let filtered = fir.apply(&data.row(r).to_vec())?;
        data.row_mut(r).assign(&ndarray::ArrayView1::from(&filtered));
    }
    Ok(())
}

/// One-shot convenience wrapper around [`OverlapAdd`].
pub fn filter_1d(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    OverlapAdd::new(h, x.len())?.apply(x)
}

fn zero_padded(x: &[f64], n: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::default(); n];
    for (b, &v) in buf.iter_mut().zip(x) {
        b.re = v;
    }
    buf
}

/// Odd reflection about the end samples (MNE's `_smart_pad`), zero-filled
/// when the signal is shorter than the requested padding.
fn reflect_limited_pad(x: &[f64], n_pad: usize) -> Vec<f64> {
    let n = x.len();
    let reach = n_pad.min(n - 1);
    let mut out = Vec::with_capacity(n + 2 * n_pad);

    out.extend(std::iter::repeat(0.0).take(n_pad - reach));
    out.extend((1..=reach).rev().map(|i| 2.0 * x[0] - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=reach).map(|i| 2.0 * x[n - 1] - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_pad - reach));
    out
}

/// Power-of-two block size minimising MNE's overlap-add cost estimate.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    (min_pow..=max_pow)
        .map(|p| {
            let n = 1usize << p;
            let blocks = (n_x as f64 / (n - n_h + 1) as f64).ceil();
            let cost = blocks * n as f64 * (p as f64 + 1.0) + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .fold((1usize << max_pow, f64::INFINITY), |best, cand| if cand.1 < best.1 { cand } else { best })
        .0
}
