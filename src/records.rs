//! TSV record store and sidecar structural map (spec §4.E).
//!
//! Hand-rolled rather than built on a CSV crate: the format is strictly
//! tab-delimited with no quoting and no field escaping beyond `\n`/`\r`, so a
//! general CSV engine's quoting machinery has nothing to do here — see
//! DESIGN.md.

use crate::binio::id_from_hex;
use crate::error::{Error, Result};

const ID_ALIASES: &[&str] = &["id"];
const TEXT_ALIASES: &[&str] = &["originaltext", "text", "original"];

/// One `(id, text)` pair from the editable TSV, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRecord {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tsv {
    pub records: Vec<TsvRecord>,
    pub trailing_newline: bool,
    pub crlf: bool,
}

fn line_ending(input: &str) -> bool {
    input.contains("\r\n")
}

fn split_lines(input: &str) -> Vec<&str> {
    input
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Undo the `\n`/`\r` two-character escapes used to carry real newlines
/// through a tab-delimited field. No other sequence is an escape.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('r') => {
                    out.push('\r');
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn normalize_id(raw: &str) -> Result<String> {
    let bytes = id_from_hex(raw)?;
    Ok(hex::encode(bytes))
}

fn find_column(header: &[&str], aliases: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| aliases.iter().any(|a| a.eq_ignore_ascii_case(h.trim())))
}

pub fn parse_tsv(input: &str) -> Result<Tsv> {
    if input.is_empty() {
        return Err(Error::TsvMalformed("empty file, no header row".into()));
    }
    let crlf = line_ending(input);
    let trailing_newline = input.ends_with('\n');
    let lines = split_lines(input.trim_end_matches(['\n', '\r']));

    let mut iter = lines.into_iter();
    let header_line = iter.next().ok_or_else(|| Error::TsvMalformed("missing header row".into()))?;
    let header: Vec<&str> = header_line.split('\t').collect();

    let id_col = find_column(&header, ID_ALIASES)
        .ok_or_else(|| Error::TsvMalformed(format!("no id column in header {header:?}")))?;
    let text_col = find_column(&header, TEXT_ALIASES)
        .ok_or_else(|| Error::TsvMalformed(format!("no text column in header {header:?}")))?;

    let mut records = Vec::new();
    for line in iter {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let id = normalize_id(fields.get(id_col).unwrap_or(&"").trim())?;
        let text = fields
            .get(text_col)
            .map(|f| unescape(f))
            .unwrap_or_default();
        records.push(TsvRecord { id, text });
    }

    Ok(Tsv {
        records,
        trailing_newline,
        crlf,
    })
}

pub fn write_tsv(tsv: &Tsv) -> String {
    let nl = if tsv.crlf { "\r\n" } else { "\n" };
    let mut out = String::new();
    out.push_str("ID\tOriginalText");
    for rec in &tsv.records {
        out.push_str(nl);
        out.push_str(&rec.id);
        out.push('\t');
        out.push_str(&escape(&rec.text));
    }
    if tsv.trailing_newline {
        out.push_str(nl);
    }
    out
}

/// One row of the sidecar structural map, keyed by source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRow {
    pub file: String,
    pub all_blocks: u32,
    pub work_blocks: u32,
    pub block: u32,
    pub unknown: u8,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralMap {
    pub rows: Vec<MapRow>,
}

const MAP_HEADER: &[&str] = &["File", "AllBlocks", "WorkBlocks", "Block", "Unknown", "ID"];

pub fn parse_map(input: &str) -> Result<StructuralMap> {
    if input.is_empty() {
        return Err(Error::TsvMalformed("empty map file, no header row".into()));
    }
    let lines = split_lines(input.trim_end_matches(['\n', '\r']));
    let mut iter = lines.into_iter();
    let header_line = iter
        .next()
        .ok_or_else(|| Error::TsvMalformed("missing map header row".into()))?;
    let header: Vec<&str> = header_line.split('\t').collect();
    if header.len() < MAP_HEADER.len()
        || !MAP_HEADER
            .iter()
            .enumerate()
            .all(|(i, name)| header.get(i).map(|h| h.eq_ignore_ascii_case(name)).unwrap_or(false))
    {
        return Err(Error::TsvMalformed(format!(
            "map header must start with {MAP_HEADER:?}, found {header:?}"
        )));
    }

    let mut rows = Vec::new();
    for line in iter {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let get = |i: usize| -> Result<&str> {
            fields
                .get(i)
                .copied()
                .ok_or_else(|| Error::TsvMalformed(format!("map row {line:?} is missing column {i}")))
        };
        let parse_u32 = |s: &str| -> Result<u32> {
            s.parse()
                .map_err(|_| Error::TsvMalformed(format!("map row {line:?} has a non-numeric field")))
        };
        let file = get(0)?.to_string();
        let all_blocks = parse_u32(get(1)?)?;
        let work_blocks = parse_u32(get(2)?)?;
        let block = parse_u32(get(3)?)?;
        let unknown: u8 = get(4)?
            .parse()
            .map_err(|_| Error::TsvMalformed(format!("map row {line:?} has a non-byte Unknown field")))?;
        let id = normalize_id(get(5)?.trim())?;
        rows.push(MapRow {
            file,
            all_blocks,
            work_blocks,
            block,
            unknown,
            id,
        });
    }

    Ok(StructuralMap { rows })
}

pub fn write_map(map: &StructuralMap) -> String {
    let mut out = String::new();
    out.push_str("File\tAllBlocks\tWorkBlocks\tBlock\tUnknown\tID\n");
    for row in &map.rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            row.file, row.all_blocks, row.work_blocks, row.block, row.unknown, row.id
        ));
    }
    out
}

impl StructuralMap {
    /// Rows belonging to `file`, ordered by `block` ascending (spec §4.E:
    /// "sorted by Block ascending on pack").
    pub fn rows_for_file_sorted(&self, file: &str) -> Vec<&MapRow> {
        let mut rows: Vec<&MapRow> = self.rows.iter().filter(|r| r.file == file).collect();
        rows.sort_by_key(|r| r.block);
        rows
    }

    pub fn files(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.file) {
                seen.push(row.file.clone());
            }
        }
        seen
    }
}
