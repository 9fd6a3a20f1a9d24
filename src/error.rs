//! Typed error surface for the whole toolchain (spec §7).
//!
//! One enum, matching the reference crate's per-concern pattern
//! (`CodecError`, `SuperblockError`) collapsed into a single concern here —
//! there is one format, one failure domain. Progress reporting is a
//! separate, non-fatal channel; see [`ProgressFn`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad container magic: expected {expected:08x}, found {found:08x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    #[error("Unsupported compression kind {kind:#04x}")]
    UnsupportedCompression { kind: u8 },

    #[error("Block is not a text block (missing magic at offset 16)")]
    BadTextMagic,

    #[error("Descriptor for record {record_index} points outside the decompressed buffer")]
    DescriptorOutOfRange { record_index: usize },

    #[error("Record {id} contains a raw tab or newline, which is illegal in the text area")]
    IllegalCharacter { id: String },

    #[error("Malformed TSV: {0}")]
    TsvMalformed(String),

    #[error("Pack requires a structural map next to the TSV, none found at {0}")]
    MissingMap(PathBuf),

    #[error("A pack directory must contain at least one *_<n>.dat file")]
    NoBlocks,

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal progress callback. Invoked at least once per 100 blocks and
/// once per 50 rebuilt text blocks (spec §5), never re-entrantly.
pub type ProgressFn<'a> = dyn FnMut(&str) + 'a;
