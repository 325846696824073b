//! FIR filter design and zero-phase application.
//!
//! - [`design`]: Hamming-windowed sinc band-pass / highpass / lowpass with
//!   MNE's automatic transition bandwidth and length rules.
//! - [`apply`]: FFT overlap-add convolution without phase delay.

pub mod apply;
pub mod design;

pub use apply::{filter_1d, filter_rows, OverlapAdd};
pub use design::{design_fir, filter_length, firwin_lowpass, gain_at, hamming, lower_transition, upper_transition};
