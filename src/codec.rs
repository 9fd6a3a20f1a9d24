//! Zstd codec adapter (spec §2 component B).
//!
//! The container format observes exactly one compression kind in the wild —
//! `0x04` (zstd). Every other kind is preserved opaquely by the outer
//! container codec without attempting to decompress it (spec §4.C); this
//! module therefore only ever wraps zstd, unlike the reference crate's
//! multi-codec registry (`codec/mod.rs`), which this crate has no use for —
//! see DESIGN.md.

use crate::error::{Error, Result};

/// The only compression kind this format's pack path ever emits.
pub const KIND_ZSTD: u8 = 0x04;

/// Default zstd level used when packing. The reference crate defaults to 3
/// (`DEFAULT_COMPRESSION_LEVEL`); kept identical here.
pub const DEFAULT_LEVEL: i32 = 3;

pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level).map_err(|e| Error::CompressionFailed(e.to_string()))
}

pub fn decompress(data: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(decompressed_size);
    let mut decoder = zstd::Decoder::new(data).map_err(|e| Error::DecompressionFailed(e.to_string()))?;
    std::io::Read::read_to_end(&mut decoder, &mut out)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;
    Ok(out)
}
