//! Tag headers and payload decoding.
//!
//! Every FIFF item is a 16-byte big-endian header followed by its payload:
//!
//! ```text
//! kind: i32 | type: u32 | size: i32 | next: i32 | <size bytes>
//! ```
//!
//! `next == 0` chains to the tag right after the payload, `next > 0` is an
//! absolute offset, `next == -1` ends the chain.
use std::io::{Read, Seek, SeekFrom};
use anyhow::{bail, Context, Result};

use super::constants::*;

/// A tag header; the payload stays on disk until one of the
/// [`TagRead`] methods asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub kind:  i32,
    pub ftype: u32,
    pub size:  i32,
    pub next:  i32,
    /// File offset of the header itself.
    pub pos:   u64,
}

impl TagHeader {
    pub const LEN: u64 = 16;

    /// Decode a header from its 16 on-disk bytes.
    pub fn from_bytes(buf: &[u8; 16], pos: u64) -> Self {
        Self {
            kind:  i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            ftype: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            size:  i32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            next:  i32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
            pos,
        }
    }

    /// Offset of the first payload byte.
    #[inline]
    pub fn data_pos(&self) -> u64 {
        self.pos + Self::LEN
    }

    /// Payload length in bytes (negative sizes are treated as empty).
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.size.max(0) as usize
    }

    /// Where the following tag header lives, if anywhere.
    pub fn next_pos(&self) -> Option<u64> {
        match self.next {
            FIFFV_NEXT_SEQ => Some(self.data_pos() + self.payload_len() as u64),
            n if n > 0     => Some(n as u64),
            _              => None,
        }
    }

    /// True for the gap placeholders the raw reader inserts for `DATA_SKIP`.
    #[inline]
    pub fn is_gap(&self) -> bool {
        self.kind < 0
    }
}

/// Payload readers for any seekable byte source.
///
/// Each method seeks to the tag's payload itself, so calls can be made in any
/// order.
pub trait TagRead: Read + Seek {
    fn tag_header_at(&mut self, pos: u64) -> Result<TagHeader> {
        self.seek(SeekFrom::Start(pos))
            .with_context(|| format!("seek to tag header @ {pos:#x}"))?;
        let mut buf = [0u8; 16];
        self.read_exact(&mut buf)
            .with_context(|| format!("read tag header @ {pos:#x}"))?;
        Ok(TagHeader::from_bytes(&buf, pos))
    }

    fn tag_bytes(&mut self, tag: &TagHeader) -> Result<Vec<u8>> {
        self.seek(SeekFrom::Start(tag.data_pos()))
            .with_context(|| format!("seek to tag data @ {:#x}", tag.data_pos()))?;
        let mut buf = vec![0u8; tag.payload_len()];
        self.read_exact(&mut buf)
            .with_context(|| format!("read {} payload bytes of tag {}", buf.len(), tag.kind))?;
        Ok(buf)
    }

    fn tag_i32(&mut self, tag: &TagHeader) -> Result<i32> {
        let b = self.tag_bytes(tag)?;
        if b.len() < 4 {
            bail!("tag {} too short for i32 ({} bytes)", tag.kind, b.len());
        }
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn tag_f32(&mut self, tag: &TagHeader) -> Result<f32> {
        let b = self.tag_bytes(tag)?;
        if b.len() < 4 {
            bail!("tag {} too short for f32 ({} bytes)", tag.kind, b.len());
        }
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Latin-1 string payload.
    fn tag_string(&mut self, tag: &TagHeader) -> Result<String> {
        Ok(self.tag_bytes(tag)?.into_iter().map(char::from).collect())
    }

    /// Decode an embedded tag directory (`FIFFT_DIR_ENTRY_STRUCT`).
    ///
    /// Entries reuse the header layout but carry the tag's file position in
    /// the last field instead of a `next` pointer.
    fn tag_directory(&mut self, tag: &TagHeader) -> Result<Vec<TagHeader>> {
        if tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
            bail!("expected a directory tag, got payload type {}", tag.ftype);
        }
        let bytes = self.tag_bytes(tag)?;
        Ok(bytes
            .chunks_exact(16)
            .map(|c| {
                let kind  = i32::from_be_bytes([c[0], c[1], c[2], c[3]]);
                let ftype = u32::from_be_bytes([c[4], c[5], c[6], c[7]]);
                let size  = i32::from_be_bytes([c[8], c[9], c[10], c[11]]);
                let pos   = u32::from_be_bytes([c[12], c[13], c[14], c[15]]) as u64;
                TagHeader { kind, ftype, size, next: FIFFV_NEXT_NONE, pos }
            })
            .collect())
    }
}

impl<R: Read + Seek + ?Sized> TagRead for R {}
