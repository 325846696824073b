//! Raw-data reader, the counterpart of `mne.io.read_raw_fif(preload=True)`.
//!
//! Opening a file reads the directory, block tree and measurement info and
//! builds a table of data buffers; [`RawFif::read_data`] then decodes every
//! buffer into a calibrated `[n_chan, n_times]` array:
//!
//! ```text
//! data[ch, t] = stored[t, ch] × chs[ch].cal × chs[ch].range
//! ```
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{s, Array2};

use super::constants::*;
use super::info::{read_meas_info, MeasInfo};
use super::tag::{TagHeader, TagRead};
use super::tree::{load_directory, Node};
use crate::recording::{Channel, ChannelKind, Recording};

/// One contiguous run of samples in the file.
#[derive(Debug, Clone)]
pub struct BufferRecord {
    /// Source tag; a negative kind marks a skipped (zero-filled) gap.
    pub tag:        TagHeader,
    pub first_samp: u64,
    pub n_samp:     usize,
}

/// An opened raw file whose samples have not been read yet.
#[derive(Debug, Clone)]
pub struct RawFif {
    pub info:       MeasInfo,
    pub first_samp: u64,
    pub path:       PathBuf,
    pub buffers:    Vec<BufferRecord>,
}

impl RawFif {
    pub fn n_times(&self) -> usize {
        self.buffers.iter().map(|b| b.n_samp).sum()
    }

    /// Decode all buffers into a calibrated `[n_chan, n_times]` array.
    pub fn read_data(&self) -> Result<Array2<f64>> {
        let n_ch = self.info.n_chan();
        let cals = self.info.cals();
        let mut out = Array2::<f64>::zeros((n_ch, self.n_times()));

        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let mut offset = 0usize;
        for buf in &self.buffers {
            if !buf.tag.is_gap() {
                let block = decode_buffer(&mut reader, &buf.tag, buf.n_samp, &cals)?;
                out.slice_mut(s![.., offset..offset + buf.n_samp]).assign(&block);
            }
            offset += buf.n_samp;
        }
        Ok(out)
    }

    /// Read the samples and assemble a [`Recording`].
    pub fn into_recording(self) -> Result<Recording> {
        let data = self.read_data()?;
        let channels = self
            .info
            .chs
            .iter()
            .map(|c| Channel::new(c.name.clone(), ChannelKind::from_fiff(c.kind)))
            .collect();
        let mut rec = Recording::new(data, self.info.sfreq, channels)?;
        rec.bads = self.info.bads;
        rec.first_samp = self.first_samp;
        rec.highpass = self.info.highpass;
        rec.lowpass = self.info.lowpass;
        Ok(rec)
    }
}

/// Open a raw FIF file: header, info and buffer table only.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawFif> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let directory = load_directory(&mut reader)
        .with_context(|| format!("read tag directory of {}", path.display()))?;
    let tree = Node::from_directory(&mut reader, &directory)?;
    let info = read_meas_info(&mut reader, &tree)?;

    let raw_node = tree
        .find_block(FIFFB_MEAS)
        .and_then(|m| m.find_block(FIFFB_RAW_DATA).or_else(|| m.find_block(FIFFB_CONTINUOUS_DATA)))
        .ok_or_else(|| anyhow!("no raw-data block in {}", path.display()))?;

    let (first_samp, buffers) = buffer_table(&mut reader, raw_node, info.n_chan())?;
    log::debug!(
        "{}: {} channels @ {} Hz, {} buffers",
        path.display(),
        info.n_chan(),
        info.sfreq,
        buffers.len()
    );
    Ok(RawFif { info, first_samp, path: path.to_path_buf(), buffers })
}

/// Open and fully load a raw FIF file.
pub fn read_raw_fif<P: AsRef<Path>>(path: P) -> Result<Recording> {
    open_raw(path)?.into_recording()
}

/// Walk the raw-data block, turning data and skip tags into buffer records.
fn buffer_table<R: Read + Seek>(
    reader: &mut R,
    raw_node: &Node,
    n_chan: usize,
) -> Result<(u64, Vec<BufferRecord>)> {
    if n_chan == 0 {
        bail!("raw file declares zero channels");
    }
    let mut samp = match raw_node.find_tag(FIFF_FIRST_SAMPLE) {
        Some(t) => reader.tag_i32(t)?.max(0) as u64,
        None    => 0,
    };
    // A skip before the first buffer shifts first_samp; later skips are gaps.
    let mut leading_skip = 0usize;
    let mut pending_skip = 0usize;
    let mut buffers: Vec<BufferRecord> = Vec::new();

    for ent in &raw_node.entries {
        match ent.kind {
            FIFF_DATA_SKIP => {
                let n = reader.tag_i32(ent)?.max(0) as usize;
                if buffers.is_empty() {
                    leading_skip += n;
                } else {
                    pending_skip += n;
                }
            }
            FIFF_DATA_BUFFER => {
                let width = sample_width(ent.ftype)
                    .ok_or_else(|| anyhow!("unsupported buffer type {}", ent.ftype))?;
                let n_samp = ent.payload_len() / (width * n_chan);
                if buffers.is_empty() && leading_skip > 0 {
                    samp += (leading_skip * n_samp) as u64;
                    leading_skip = 0;
                }
                if pending_skip > 0 {
                    let gap = pending_skip * n_samp;
                    let tag = TagHeader { kind: -1, ftype: 0, size: 0, next: FIFFV_NEXT_NONE, pos: 0 };
                    buffers.push(BufferRecord { tag, first_samp: samp, n_samp: gap });
                    samp += gap as u64;
                    pending_skip = 0;
                }
                buffers.push(BufferRecord { tag: *ent, first_samp: samp, n_samp });
                samp += n_samp as u64;
            }
            _ => {}
        }
    }

    let first = buffers
        .first()
        .map(|b| b.first_samp)
        .ok_or_else(|| anyhow!("no FIFF_DATA_BUFFER tags in raw-data block"))?;
    Ok((first, buffers))
}

/// Decode one interleaved big-endian buffer into `[n_chan, n_samp]`.
fn decode_buffer<R: Read + Seek>(
    reader: &mut R,
    tag: &TagHeader,
    n_samp: usize,
    cals: &[f64],
) -> Result<Array2<f64>> {
    let n_ch = cals.len();
    let width = sample_width(tag.ftype)
        .ok_or_else(|| anyhow!("unsupported buffer type {}", tag.ftype))?;
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to buffer data @ {:#x}", tag.data_pos()))?;
    let mut bytes = vec![0u8; n_samp * n_ch * width];
    reader
        .read_exact(&mut bytes)
        .with_context(|| format!("read data buffer @ {:#x}", tag.data_pos()))?;

    let decode: fn(&[u8]) -> f64 = match tag.ftype {
        FIFFT_FLOAT  => |b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        FIFFT_DOUBLE => |b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        FIFFT_INT    => |b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        FIFFT_SHORT | FIFFT_DAU_PACK16 => |b| i16::from_be_bytes([b[0], b[1]]) as f64,
        other => bail!("unsupported buffer type {other}"),
    };

    let mut out = Array2::<f64>::zeros((n_ch, n_samp));
    for (i, chunk) in bytes.chunks_exact(width).enumerate() {
        let (t, c) = (i / n_ch, i % n_ch);
        out[[c, t]] = decode(chunk) * cals[c];
    }
    Ok(out)
}
