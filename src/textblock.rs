//! Inner text-block codec (spec §4.D) — the record-bearing payload carried
//! inside some [`crate::container::InnerBlock`]s.
//!
//! ```text
//!   0      4  all_blocks     (u32 LE)
//!   4      4  reserved (=0)
//!   8      4  work_blocks    (u32 LE)
//!   12     4  reserved (=0)
//!   16     4  magic = DC 96 58 59
//!   20     4  reserved (=0)
//!   24     N  code_bytes     (N = all_blocks)
//!   24+N   17 padding        (see PADDING_LEN)
//!   41+N   16*all_blocks  descriptor_table
//!   41+N+16*all_blocks …  text_area (UTF-8 bytes, concatenated)
//! ```
//!
//! Each descriptor is `id[8] | offset_to_text: u32 LE | length: u32 LE`.
//! `offset_to_text` is relative to the position of its own field — i.e. the
//! byte right after the 8-byte id, not the start of the descriptor.

use crate::binio::{id_to_hex, read_u32_le, write_u32_le};
use crate::error::{Error, Result};
use std::io::Cursor;

pub const MAGIC: [u8; 4] = [0xDC, 0x96, 0x58, 0x59];
const HEADER_LEN: usize = 24;
const PADDING_LEN: usize = 17;
const DESCRIPTOR_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub id: [u8; 8],
    pub text: String,
    pub code: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub all_blocks: u32,
    pub work_blocks: u32,
    pub records: Vec<TextRecord>,
}

/// Absolute byte offsets of the descriptor table and the text area, given
/// the record count. Kept separate from parse/serialize per spec Design
/// Notes §9 ("offset arithmetic is easy to miscompute").
pub fn text_layout(all_blocks: usize) -> (usize, usize) {
    let descriptor_table_start = HEADER_LEN + all_blocks + PADDING_LEN;
    let text_area_start = descriptor_table_start + DESCRIPTOR_LEN * all_blocks;
    (descriptor_table_start, text_area_start)
}

/// `true` if `bytes` looks like a text block (magic present at offset 16).
/// Too-short buffers are simply not text blocks.
pub fn is_text_block(bytes: &[u8]) -> bool {
    bytes.get(16..20) == Some(&MAGIC[..])
}

pub fn parse(bytes: &[u8]) -> Result<TextBlock> {
    if !is_text_block(bytes) {
        return Err(Error::BadTextMagic);
    }

    let mut header = Cursor::new(bytes);
    let all_blocks = read_u32_le(&mut header)?;
    let n = all_blocks as usize;

    let work_blocks = {
        let mut c = Cursor::new(&bytes[8..12]);
        read_u32_le(&mut c)?
    };

    let code_bytes = bytes
        .get(HEADER_LEN..HEADER_LEN + n)
        .ok_or(Error::DescriptorOutOfRange { record_index: 0 })?;

    let (descriptor_table_start, text_area_start) = text_layout(n);
    let _ = text_area_start; // validated per-record below

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let desc_start = descriptor_table_start + DESCRIPTOR_LEN * i;
        let desc = bytes
            .get(desc_start..desc_start + DESCRIPTOR_LEN)
            .ok_or(Error::DescriptorOutOfRange { record_index: i })?;

        let mut id = [0u8; 8];
        id.copy_from_slice(&desc[0..8]);

        let offset_to_text = u32::from_le_bytes(desc[8..12].try_into().unwrap()) as usize;
        let length = u32::from_le_bytes(desc[12..16].try_into().unwrap()) as usize;

        // offset_to_text is anchored at the offset_to_text field itself,
        // i.e. desc_start + 8.
        let anchor = desc_start + 8;
        let text_start = anchor
            .checked_add(offset_to_text)
            .ok_or(Error::DescriptorOutOfRange { record_index: i })?;
        let text_end = text_start
            .checked_add(length)
            .ok_or(Error::DescriptorOutOfRange { record_index: i })?;
        let text_bytes = bytes
            .get(text_start..text_end)
            .ok_or(Error::DescriptorOutOfRange { record_index: i })?;

        let text = String::from_utf8_lossy(text_bytes).into_owned();
        records.push(TextRecord {
            id,
            text,
            code: code_bytes[i],
        });
    }

    Ok(TextBlock {
        all_blocks,
        work_blocks,
        records,
    })
}

pub fn serialize(block: &TextBlock) -> Result<Vec<u8>> {
    for rec in &block.records {
        if rec.text.contains('\t') || rec.text.contains('\n') || rec.text.contains('\r') {
            return Err(Error::IllegalCharacter {
                id: id_to_hex(&rec.id),
            });
        }
    }

    let n = block.records.len();
    let (descriptor_table_start, text_area_start) = text_layout(n);

    let mut out = Vec::with_capacity(text_area_start);
    write_u32_le(&mut out, block.all_blocks)?;
    write_u32_le(&mut out, 0)?;
    write_u32_le(&mut out, block.work_blocks)?;
    write_u32_le(&mut out, 0)?;
    out.extend_from_slice(&MAGIC);
    write_u32_le(&mut out, 0)?;

    for rec in &block.records {
        out.push(rec.code);
    }

    out.push(0xFF);
    for i in 0..16 {
        out.push(block.records.get(i).map(|r| r.code).unwrap_or(0x80));
    }

    debug_assert_eq!(out.len(), descriptor_table_start);

    let mut descriptors = Vec::with_capacity(DESCRIPTOR_LEN * n);
    let mut text_area = Vec::new();
    let mut running_text_offset = text_area_start;

    for (i, rec) in block.records.iter().enumerate() {
        let desc_start = descriptor_table_start + DESCRIPTOR_LEN * i;
        let anchor = desc_start + 8;
        let text_bytes = rec.text.as_bytes();

        descriptors.extend_from_slice(&rec.id);
        let offset_to_text = (running_text_offset - anchor) as u32;
        descriptors.extend_from_slice(&offset_to_text.to_le_bytes());
        descriptors.extend_from_slice(&(text_bytes.len() as u32).to_le_bytes());

        text_area.extend_from_slice(text_bytes);
        running_text_offset += text_bytes.len();
    }

    out.extend_from_slice(&descriptors);
    out.extend_from_slice(&text_area);

    Ok(out)
}
