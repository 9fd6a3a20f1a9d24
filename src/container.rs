//! Outer container codec (spec §4.C) — packs and unpacks a numbered sequence
//! of independently zstd-compressed blocks behind a single offset table.
//!
//! ```text
//!   offset  size                field
//!   ------  ------------------  ---------------------------------
//!   0       4                   magic = EF BE AD DE
//!   4       4                   reserved (written as 01 00 00 00)
//!   8       4                   block_count_minus_one (u32 LE)
//!   12      4 * block_count     offset table (u32 LE), non-decreasing
//!   ...     variable            concatenated compressed blocks
//! ```
//!
//! A compressed block is a 9-byte header (`kind`, `compressed_size` u32 LE,
//! `decompressed_size` u32 LE) followed by `compressed_size` payload bytes.
//! `block_count == 1` omits the offset table in favor of a single `u32 LE`
//! length prefix — see [`unpack`]/[`pack`].

use crate::binio::{read_u32_le, read_u8, read_vec, write_u32_le, write_u8};
use crate::codec;
use crate::error::{Error, ProgressFn, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;

pub const MAGIC: u32 = 0xDEAD_BEEF; // on-disk bytes EF BE AD DE
const RESERVED: u32 = 1;
const BLOCK_HEADER_SIZE: usize = 9;

/// One decompressed unit stored in the container. Position within the
/// container is solely its index; there is no internal key (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerBlock {
    pub data: Vec<u8>,
}

impl InnerBlock {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

// ── Unpack ───────────────────────────────────────────────────────────────────

/// Parse a container and return its blocks in index order.
///
/// Blocks compressed with an unrecognised `compression_kind` are preserved
/// opaquely (their raw on-disk payload becomes the block's data) and a
/// warning is emitted via `progress` rather than failing the whole unpack —
/// per spec §7, `UnsupportedCompression` is a warning on unpack, fatal only
/// on pack.
pub fn unpack(bytes: &[u8], mut progress: Option<&mut ProgressFn>) -> Result<Vec<InnerBlock>> {
    let mut r = Cursor::new(bytes);

    let magic = read_u32_le(&mut r)?;
    if magic != MAGIC {
        return Err(Error::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let _reserved = read_u32_le(&mut r)?;
    let block_count_minus_one = read_u32_le(&mut r)?;
    let block_count = block_count_minus_one as usize + 1;

    let offsets: Vec<u32> = if block_count == 1 {
        // Single-block special case: one u32 LE length, no offset table.
        vec![0, read_u32_le(&mut r)?]
    } else {
        let mut offs = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            offs.push(read_u32_le(&mut r)?);
        }
        offs
    };

    // Validate monotonicity up front so a single bad entry can't corrupt
    // every downstream block silently.
    for w in offsets.windows(2) {
        if w[1] < w[0] {
            return Err(Error::CorruptContainer(format!(
                "offset table is not monotonically non-decreasing: {} then {}",
                w[0], w[1]
            )));
        }
    }

    let payload_area_start = r.position() as usize;
    let total_len = bytes.len();

    let mut ranges = Vec::with_capacity(block_count);
    for i in 0..block_count {
        let start = payload_area_start
            + if block_count == 1 {
                0
            } else {
                offsets[i] as usize
            };
        let end = if i + 1 < block_count {
            payload_area_start + offsets[i + 1] as usize
        } else {
            total_len
        };
        if start > total_len || end > total_len || start > end {
            return Err(Error::CorruptContainer(format!(
                "block {i} range {start}..{end} exceeds container length {total_len}"
            )));
        }
        ranges.push((start, end));
    }

    #[cfg(feature = "parallel")]
    let decoded: Vec<(InnerBlock, Option<u8>)> = {
        use rayon::prelude::*;
        ranges
            .par_iter()
            .enumerate()
            .map(|(i, (start, end))| decode_compressed_block(&bytes[*start..*end], i))
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let decoded: Vec<(InnerBlock, Option<u8>)> = ranges
        .iter()
        .enumerate()
        .map(|(i, (start, end))| decode_compressed_block(&bytes[*start..*end], i))
        .collect::<Result<Vec<_>>>()?;

    let mut blocks = Vec::with_capacity(decoded.len());
    for (i, (block, unsupported_kind)) in decoded.into_iter().enumerate() {
        if let Some(kind) = unsupported_kind {
            if let Some(cb) = progress.as_deref_mut() {
                cb(&Error::UnsupportedCompression { kind }.to_string());
            }
        }
        blocks.push(block);

        if let Some(cb) = progress.as_deref_mut() {
            if (i + 1) % 100 == 0 || i + 1 == block_count {
                cb(&format!("unpacked block {}/{}", i + 1, block_count));
            }
        }
    }

    Ok(blocks)
}

/// Decode one compressed block. Returns the decompressed block plus, when
/// the on-disk `compression_kind` isn't zstd, the raw kind byte so the
/// caller can emit an `UnsupportedCompression` warning — decoding itself
/// never fails for an unknown kind, it just passes the payload through.
fn decode_compressed_block(bytes: &[u8], index: usize) -> Result<(InnerBlock, Option<u8>)> {
    let mut r = Cursor::new(bytes);
    let kind = read_u8(&mut r)?;
    let compressed_size = read_u32_le(&mut r)? as usize;
    let decompressed_size = read_u32_le(&mut r)? as usize;

    let available = bytes.len() - BLOCK_HEADER_SIZE;
    if compressed_size != available {
        return Err(Error::CorruptContainer(format!(
            "block {index}: header compressed_size {compressed_size} does not match \
             {available} bytes available before the next offset"
        )));
    }
    let payload = read_vec(&mut r, compressed_size)?;

    if kind == codec::KIND_ZSTD {
        let data = codec::decompress(&payload, decompressed_size)?;
        Ok((InnerBlock::new(data), None))
    } else {
        // Unknown kind: pass through opaquely, no decompression attempted.
        Ok((InnerBlock::new(payload), Some(kind)))
    }
}

/// Parse a container and write each block to `<dir>/<stem>_<i>.dat`.
/// Returns the number of blocks written.
pub fn unpack_to_dir(
    bytes: &[u8],
    dir: &Path,
    stem: &str,
    mut progress: Option<&mut ProgressFn>,
) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let blocks = unpack(bytes, progress.as_deref_mut())?;
    for (i, block) in blocks.iter().enumerate() {
        let path = dir.join(format!("{stem}_{i}.dat"));
        std::fs::write(path, &block.data)?;
    }
    Ok(blocks.len())
}

// ── Pack ─────────────────────────────────────────────────────────────────────

/// Compress and assemble `blocks` into a container, each with zstd.
pub fn pack(blocks: &[InnerBlock], mut progress: Option<&mut ProgressFn>) -> Result<Vec<u8>> {
    if blocks.is_empty() {
        return Err(Error::NoBlocks);
    }

    #[cfg(feature = "parallel")]
    let compressed: Vec<Vec<u8>> = {
        use rayon::prelude::*;
        blocks
            .par_iter()
            .map(|b| encode_compressed_block(&b.data))
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let compressed: Vec<Vec<u8>> = blocks
        .iter()
        .map(|b| encode_compressed_block(&b.data))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::new();
    write_u32_le(&mut out, MAGIC)?;
    write_u32_le(&mut out, RESERVED)?;
    write_u32_le(&mut out, (blocks.len() - 1) as u32)?;

    if blocks.len() == 1 {
        write_u32_le(&mut out, compressed[0].len() as u32)?;
    } else {
        let mut offset = 0u32;
        for enc in &compressed {
            write_u32_le(&mut out, offset)?;
            offset += enc.len() as u32;
        }
    }

    for (i, enc) in compressed.iter().enumerate() {
        out.write_all(enc)?;
        if let Some(cb) = progress.as_deref_mut() {
            if (i + 1) % 100 == 0 || i + 1 == compressed.len() {
                cb(&format!("packed block {}/{}", i + 1, compressed.len()));
            }
        }
    }

    Ok(out)
}

fn encode_compressed_block(data: &[u8]) -> Result<Vec<u8>> {
    let payload = codec::compress(data, codec::DEFAULT_LEVEL)?;
    let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + payload.len());
    write_u8(&mut out, codec::KIND_ZSTD)?;
    write_u32_le(&mut out, payload.len() as u32)?;
    write_u32_le(&mut out, data.len() as u32)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Read every `<stem>_<i>.dat` file in `dir`, ordered by the trailing
/// numeric suffix (natural sort — `_10.dat` sorts after `_9.dat`, not
/// lexically), and pack them into a container.
pub fn pack_from_dir(dir: &Path, progress: Option<&mut ProgressFn>) -> Result<Vec<u8>> {
    let mut entries = list_dat_files(dir)?;
    entries.sort_by_key(|(idx, _)| *idx);

    if entries.is_empty() {
        return Err(Error::NoBlocks);
    }

    let blocks: Result<Vec<InnerBlock>> = entries
        .iter()
        .map(|(_, path)| Ok(InnerBlock::new(std::fs::read(path)?)))
        .collect();
    pack(&blocks?, progress)
}

/// List `.dat` files in `dir` paired with their trailing numeric index.
/// Files that don't match `<anything>_<digits>.dat` are ignored.
fn list_dat_files(dir: &Path) -> Result<Vec<(u64, std::path::PathBuf)>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if let Some(idx) = dat_index(&path) {
            out.push((idx, path));
        }
    }
    Ok(out)
}

fn dat_index(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    if path.extension()?.to_str()? != "dat" {
        return None;
    }
    let (_, suffix) = stem.rsplit_once('_')?;
    suffix.parse::<u64>().ok()
}
