//! # gloc — game text container extraction, repacking, and translation merge
//!
//! Format guarantees:
//! - All numeric fields are little-endian; never negotiated
//! - The outer container holds an ordered sequence of independently
//!   zstd-compressed blocks behind a single offset table
//! - Text-bearing inner blocks carry a fixed-layout descriptor table whose
//!   offsets are anchored per-descriptor, not to a shared base
//! - Extraction and packing round-trip byte-for-byte when the TSV is
//!   unedited; only the text area's content is meant to change

pub mod binio;
pub mod codec;
pub mod container;
pub mod error;
pub mod merge;
pub mod records;
pub mod session;
pub mod textblock;

pub use container::{InnerBlock, MAGIC as CONTAINER_MAGIC};
pub use error::{Error, ProgressFn, Result};
pub use merge::{merge as merge_tsv, render_report, MergeOutcome, MergeStats};
pub use records::{parse_map, parse_tsv, write_map, write_tsv, MapRow, StructuralMap, Tsv, TsvRecord};
pub use session::Session;
pub use textblock::{TextBlock, TextRecord, MAGIC as TEXT_MAGIC};
