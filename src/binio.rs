//! Fixed-width little-endian primitives over a seekable byte stream (spec
//! §2 component A).
//!
//! The reference crate inlines `put_u32le!`-style macros per struct because
//! each of its headers is a one-off. The container and text-block formats
//! here share enough repeated shape (several `u32`/`u64` LE fields per
//! record, read and written from more than one call site) that plain free
//! functions pull their weight without becoming a premature abstraction.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    Ok(r.read_u8()?)
}

pub fn read_u32_le<R: Read>(r: &mut R) -> Result<u32> {
    Ok(r.read_u32::<LittleEndian>()?)
}

pub fn read_u64_le<R: Read>(r: &mut R) -> Result<u64> {
    Ok(r.read_u64::<LittleEndian>()?)
}

pub fn read_array<R: Read, const N: usize>(r: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_vec<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_u8(v)?;
    Ok(())
}

pub fn write_u32_le<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_u32::<LittleEndian>(v)?;
    Ok(())
}

pub fn write_u64_le<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_u64::<LittleEndian>(v)?;
    Ok(())
}

/// Read exactly 16 hex-renderable raw bytes (e.g. a record id).
pub fn read_id<R: Read>(r: &mut R) -> Result<[u8; 8]> {
    read_array::<R, 8>(r)
}

/// Lowercase 16-hex-digit rendering of an 8-byte id, per spec §3.
pub fn id_to_hex(id: &[u8; 8]) -> String {
    hex::encode(id)
}

/// Parse a 16-hex-digit id back into its 8 raw bytes. Case-insensitive.
pub fn id_from_hex(s: &str) -> Result<[u8; 8]> {
    if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::TsvMalformed(format!(
            "id {s:?} is not exactly 16 hex digits"
        )));
    }
    let bytes = hex::decode(s)
        .map_err(|e| Error::TsvMalformed(format!("id {s:?} failed to decode: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::TsvMalformed(format!("id {s:?} did not decode to 8 bytes")))
}
