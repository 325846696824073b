//! Measurement info: sampling rate, channel descriptors, bad channels.
//!
//! Only what the analysis pipeline consumes is decoded; projectors,
//! digitisation points and coordinate transforms are skipped.
use std::io::{Read, Seek};
use anyhow::{anyhow, bail, Result};

use super::constants::*;
use super::tag::TagRead;
use super::tree::Node;

/// Size of a `FIFFT_CH_INFO_STRUCT` payload.
pub const CH_INFO_LEN: usize = 96;

/// One `FIFFT_CH_INFO_STRUCT` record.
///
/// ```text
/// scanno i32 | logno i32 | kind i32 | range f32 | cal f32 | coil_type i32
/// loc 12×f32 | unit i32 | unit_mul i32 | ch_name 16×u8 (NUL padded)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub scan_no:   i32,
    pub log_no:    i32,
    pub kind:      i32,
    pub range:     f32,
    pub cal:       f32,
    pub coil_type: i32,
    pub loc:       [f32; 12],
    pub unit:      i32,
    pub unit_mul:  i32,
    pub name:      String,
}

#[inline]
fn be_i32(b: &[u8], at: usize) -> i32 {
    i32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[inline]
fn be_f32(b: &[u8], at: usize) -> f32 {
    f32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

impl ChannelInfo {
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < CH_INFO_LEN {
            bail!("ch_info payload too short: {} bytes (need {CH_INFO_LEN})", raw.len());
        }
        let mut loc = [0f32; 12];
        for (i, v) in loc.iter_mut().enumerate() {
            *v = be_f32(raw, 24 + 4 * i);
        }
        let name_field = &raw[80..96];
        let end = name_field.iter().position(|&b| b == 0).unwrap_or(name_field.len());
        Ok(Self {
            scan_no:   be_i32(raw, 0),
            log_no:    be_i32(raw, 4),
            kind:      be_i32(raw, 8),
            range:     be_f32(raw, 12),
            cal:       be_f32(raw, 16),
            coil_type: be_i32(raw, 20),
            loc,
            unit:      be_i32(raw, 72),
            unit_mul:  be_i32(raw, 76),
            name:      name_field[..end].iter().copied().map(char::from).collect(),
        })
    }

    /// Factor turning stored samples into physical units: `cal × range`.
    #[inline]
    pub fn calibration(&self) -> f64 {
        self.cal as f64 * self.range as f64
    }
}

/// Contents of `FIFFB_MEAS_INFO`.
#[derive(Debug, Clone)]
pub struct MeasInfo {
    pub sfreq:     f64,
    pub highpass:  Option<f64>,
    pub lowpass:   Option<f64>,
    pub line_freq: Option<f64>,
    pub chs:       Vec<ChannelInfo>,
    pub bads:      Vec<String>,
    pub description: Option<String>,
}

impl MeasInfo {
    pub fn n_chan(&self) -> usize {
        self.chs.len()
    }

    pub fn cals(&self) -> Vec<f64> {
        self.chs.iter().map(ChannelInfo::calibration).collect()
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn finite(v: f32) -> Option<f64> {
    v.is_finite().then_some(v as f64)
}

/// Decode the measurement info below `FIFFB_MEAS`.
pub fn read_meas_info<R: Read + Seek>(reader: &mut R, tree: &Node) -> Result<MeasInfo> {
    let info_node = tree
        .find_block(FIFFB_MEAS)
        .and_then(|m| m.find_block(FIFFB_MEAS_INFO))
        .ok_or_else(|| anyhow!("FIFFB_MEAS_INFO block not found"))?;

    let mut n_chan = None;
    let mut sfreq = None;
    let mut info = MeasInfo {
        sfreq: 0.0,
        highpass: None,
        lowpass: None,
        line_freq: None,
        chs: Vec::new(),
        bads: Vec::new(),
        description: None,
    };

    for ent in &info_node.entries {
        match ent.kind {
            FIFF_NCHAN     => n_chan = Some(reader.tag_i32(ent)?),
            FIFF_SFREQ     => sfreq = Some(reader.tag_f32(ent)? as f64),
            FIFF_HIGHPASS  => info.highpass = finite(reader.tag_f32(ent)?),
            FIFF_LOWPASS   => info.lowpass = finite(reader.tag_f32(ent)?),
            FIFF_LINE_FREQ => info.line_freq = finite(reader.tag_f32(ent)?),
            FIFF_CH_INFO   => info.chs.push(ChannelInfo::from_bytes(&reader.tag_bytes(ent)?)?),
            FIFF_BAD_CHS   => info.bads = split_names(&reader.tag_string(ent)?),
            FIFF_COMMENT   => info.description = Some(reader.tag_string(ent)?),
            _ => {}
        }
    }

    // MNE writes bads in their own block; prefer it when present.
    if let Some(list) = info_node
        .find_block(FIFFB_MNE_BAD_CHANNELS)
        .and_then(|b| b.find_tag(FIFF_MNE_CH_NAME_LIST))
    {
        info.bads = split_names(&reader.tag_string(list)?);
    }

    let n_chan = n_chan.ok_or_else(|| anyhow!("FIFF_NCHAN not found"))?;
    info.sfreq = sfreq.ok_or_else(|| anyhow!("FIFF_SFREQ not found"))?;
    if info.sfreq <= 0.0 {
        bail!("non-positive sampling rate {}", info.sfreq);
    }
    if info.chs.len() != n_chan.max(0) as usize {
        bail!("expected {n_chan} ch_info structs, got {}", info.chs.len());
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch_bytes(kind: i32, cal: f32, range: f32, name: &str) -> Vec<u8> {
        let mut raw = vec![0u8; CH_INFO_LEN];
        raw[8..12].copy_from_slice(&kind.to_be_bytes());
        raw[12..16].copy_from_slice(&range.to_be_bytes());
        raw[16..20].copy_from_slice(&cal.to_be_bytes());
        raw[24..28].copy_from_slice(&0.07_f32.to_be_bytes());
        raw[80..80 + name.len()].copy_from_slice(name.as_bytes());
        raw
    }

    #[test]
    fn parses_channel_struct() {
        let ch = ChannelInfo::from_bytes(&ch_bytes(FIFFV_EEG_CH, 2.0, 0.5, "EEG 001")).unwrap();
        assert_eq!(ch.kind, FIFFV_EEG_CH);
        assert_eq!(ch.name, "EEG 001");
        approx::assert_abs_diff_eq!(ch.loc[0], 0.07, epsilon = 1e-7);
        approx::assert_abs_diff_eq!(ch.calibration(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn full_width_name_without_nul() {
        let ch = ChannelInfo::from_bytes(&ch_bytes(FIFFV_MEG_CH, 1.0, 1.0, "MEG 0113ABCDEFGH")).unwrap();
        assert_eq!(ch.name.len(), 16);
    }

    #[test]
    fn short_payload_rejected() {
        assert!(ChannelInfo::from_bytes(&[0u8; CH_INFO_LEN - 1]).is_err());
    }

    #[test]
    fn bad_list_splitting() {
        assert_eq!(split_names("MEG 2443: EEG 053:"), vec!["MEG 2443", "EEG 053"]);
        assert!(split_names("").is_empty());
    }
}
