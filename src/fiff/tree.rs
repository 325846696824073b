//! Block tree of a FIFF file.
//!
//! The flat tag directory is folded into nested blocks delimited by
//! `FIFF_BLOCK_START` (payload: block kind) and `FIFF_BLOCK_END`.
use std::io::{Read, Seek, SeekFrom};
use anyhow::Result;

use super::constants::*;
use super::tag::{TagHeader, TagRead};

/// One block and everything nested in it.
#[derive(Debug, Default, Clone)]
pub struct Node {
    /// Block kind; `0` for the synthetic root.
    pub block:    i32,
    /// Non-structural tags directly inside this block.
    pub entries:  Vec<TagHeader>,
    pub children: Vec<Node>,
}

impl Node {
    /// Depth-first search for the first block of `kind` (including `self`).
    pub fn find_block(&self, kind: i32) -> Option<&Node> {
        if self.block == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_block(kind))
    }

    /// First direct entry of the given tag kind.
    pub fn find_tag(&self, kind: i32) -> Option<&TagHeader> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Fold a flat directory into a tree, reading each block's kind from its
    /// `FIFF_BLOCK_START` payload.
    ///
    /// Unterminated blocks are closed at the end of the directory.
    pub fn from_directory<R: Read + Seek>(reader: &mut R, directory: &[TagHeader]) -> Result<Node> {
        let mut stack = vec![Node::default()];
        for tag in directory {
            match tag.kind {
                FIFF_BLOCK_START => {
                    let block = reader.tag_i32(tag)?;
                    stack.push(Node { block, ..Node::default() });
                }
                FIFF_BLOCK_END if stack.len() > 1 => close_top(&mut stack),
                FIFF_BLOCK_END => {}
                _ => {
                    if let Some(top) = stack.last_mut() {
                        top.entries.push(*tag);
                    }
                }
            }
        }
        while stack.len() > 1 {
            close_top(&mut stack);
        }
        Ok(stack.pop().unwrap_or_default())
    }
}

fn close_top(stack: &mut Vec<Node>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

/// Collect every header by walking the `next` chain from offset 0.
///
/// The walk ends at a `next == -1` tag or exactly at end of file.
pub fn scan_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<TagHeader>> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let mut out = Vec::new();
    let mut pos = Some(0u64);
    while let Some(p) = pos.filter(|&p| p < file_len || out.is_empty()) {
        let tag = reader.tag_header_at(p)?;
        pos = tag.next_pos();
        out.push(tag);
    }
    Ok(out)
}

/// Use the directory embedded by the writer when the file has one.
///
/// The file must start with `FIFF_FILE_ID` followed by `FIFF_DIR_POINTER`;
/// a non-positive pointer means "no directory" and yields `None`.
pub fn embedded_directory<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<TagHeader>>> {
    let id = reader.tag_header_at(0)?;
    if id.kind != FIFF_FILE_ID {
        return Ok(None);
    }
    let Some(next) = id.next_pos() else { return Ok(None) };
    let ptr = reader.tag_header_at(next)?;
    if ptr.kind != FIFF_DIR_POINTER {
        return Ok(None);
    }
    let dir_pos = reader.tag_i32(&ptr)?;
    if dir_pos <= 0 {
        return Ok(None);
    }
    let dir = reader.tag_header_at(dir_pos as u64)?;
    if dir.ftype != FIFFT_DIR_ENTRY_STRUCT {
        return Ok(None);
    }
    reader.tag_directory(&dir).map(Some)
}

/// Embedded directory if present, otherwise a full scan.
pub fn load_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<TagHeader>> {
    match embedded_directory(reader)? {
        Some(dir) => Ok(dir),
        None      => scan_directory(reader),
    }
}
