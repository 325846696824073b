//! FIFF numeric codes used by the raw reader.
//!
//! Names follow `mne/_fiff/constants.py` so the reader can be checked against
//! MNE side by side. Only the codes this crate reads are listed.

// ── Blocks ────────────────────────────────────────────────────────────────

pub const FIFFB_MEAS:             i32 = 100;
pub const FIFFB_MEAS_INFO:        i32 = 101;
pub const FIFFB_RAW_DATA:         i32 = 102;
pub const FIFFB_CONTINUOUS_DATA:  i32 = 112;
/// MNE-written bad-channel block (holds a `FIFF_MNE_CH_NAME_LIST`).
pub const FIFFB_MNE_BAD_CHANNELS: i32 = 359;

// ── Structural tags ───────────────────────────────────────────────────────

pub const FIFF_FILE_ID:     i32 = 100;
pub const FIFF_DIR_POINTER: i32 = 101;
pub const FIFF_BLOCK_START: i32 = 104;
pub const FIFF_BLOCK_END:   i32 = 105;

// ── Measurement-info tags ─────────────────────────────────────────────────

pub const FIFF_NCHAN:        i32 = 200;
pub const FIFF_SFREQ:        i32 = 201;
pub const FIFF_CH_INFO:      i32 = 203;
pub const FIFF_COMMENT:      i32 = 206;
pub const FIFF_FIRST_SAMPLE: i32 = 208;
pub const FIFF_LOWPASS:      i32 = 219;
/// Colon-separated bad channel names (legacy location).
pub const FIFF_BAD_CHS:      i32 = 220;
pub const FIFF_HIGHPASS:     i32 = 223;
pub const FIFF_LINE_FREQ:    i32 = 235;
/// Colon-separated channel-name list inside `FIFFB_MNE_BAD_CHANNELS`.
pub const FIFF_MNE_CH_NAME_LIST: i32 = 3507;

// ── Data tags ─────────────────────────────────────────────────────────────

/// Interleaved `[n_samp, n_chan]` big-endian samples.
pub const FIFF_DATA_BUFFER: i32 = 300;
/// Skip `n` buffers' worth of samples (payload: i32 `n`).
pub const FIFF_DATA_SKIP:   i32 = 301;

// ── Payload types ─────────────────────────────────────────────────────────

pub const FIFFT_SHORT:            u32 = 2;
pub const FIFFT_INT:              u32 = 3;
pub const FIFFT_FLOAT:            u32 = 4;
pub const FIFFT_DOUBLE:           u32 = 5;
pub const FIFFT_STRING:           u32 = 10;
pub const FIFFT_DAU_PACK16:       u32 = 16;
pub const FIFFT_CH_INFO_STRUCT:   u32 = 30;
pub const FIFFT_ID_STRUCT:        u32 = 31;
pub const FIFFT_DIR_ENTRY_STRUCT: u32 = 32;

// ── `next` sentinels ──────────────────────────────────────────────────────

/// Next tag follows immediately after this one's payload.
pub const FIFFV_NEXT_SEQ:  i32 = 0;
/// End of the tag chain.
pub const FIFFV_NEXT_NONE: i32 = -1;

// ── Channel kinds ─────────────────────────────────────────────────────────

pub const FIFFV_MEG_CH:  i32 = 1;
pub const FIFFV_EEG_CH:  i32 = 2;
pub const FIFFV_STIM_CH: i32 = 3;
pub const FIFFV_EOG_CH:  i32 = 202;
pub const FIFFV_EMG_CH:  i32 = 302;
pub const FIFFV_ECG_CH:  i32 = 402;
pub const FIFFV_MISC_CH: i32 = 502;

/// Width in bytes of one sample of a data-buffer payload type.
///
/// ```
/// use erpkit::fiff::constants::{sample_width, FIFFT_FLOAT, FIFFT_SHORT};
/// assert_eq!(sample_width(FIFFT_FLOAT), Some(4));
/// assert_eq!(sample_width(FIFFT_SHORT), Some(2));
/// assert_eq!(sample_width(99), None);
/// ```
pub fn sample_width(ftype: u32) -> Option<usize> {
    match ftype {
        FIFFT_SHORT | FIFFT_DAU_PACK16 => Some(2),
        FIFFT_INT | FIFFT_FLOAT        => Some(4),
        FIFFT_DOUBLE                   => Some(8),
        _                              => None,
    }
}
