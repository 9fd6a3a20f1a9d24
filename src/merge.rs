//! Three-way TSV merge engine (spec §4.F) — reconciles a previously
//! translated TSV against a freshly extracted original TSV across a game
//! version bump.
//!
//! Grounded on the original tool's `wwm_merge_tsv.py`, whose module
//! docstring states the workflow this module follows (extract new version,
//! merge old translations forward, retranslate new/empty entries, repack
//! with the new structural map); the body of that script was not present in
//! the retrieved source, so the algorithm itself comes directly from the
//! pseudocode this crate was specified against.

use crate::records::{Tsv, TsvRecord};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub total_old: usize,
    pub total_new: usize,
    pub preserved: usize,
    pub new_strings: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: Vec<TsvRecord>,
    pub missing: Vec<TsvRecord>,
    pub stats: MergeStats,
    pub added_ids: Vec<String>,
    pub removed_ids: Vec<String>,
}

/// Merge `old_translated` forward onto `new_original`'s ordering.
///
/// `new_original`'s order is authoritative for the output. For each id in
/// `new_original`, a non-empty (after trim) translation carried over from
/// `old_translated` is preserved; otherwise the new original text is used
/// verbatim and counted as a new string still needing translation.
pub fn merge(old_translated: &Tsv, new_original: &Tsv) -> MergeOutcome {
    let old_by_id: HashMap<&str, &str> = old_translated
        .records
        .iter()
        .map(|r| (r.id.as_str(), r.text.as_str()))
        .collect();
    let new_ids: std::collections::HashSet<&str> =
        new_original.records.iter().map(|r| r.id.as_str()).collect();

    let mut merged = Vec::with_capacity(new_original.records.len());
    let mut missing = Vec::new();
    let mut added_ids = Vec::new();
    let mut preserved = 0usize;
    let mut new_strings = 0usize;

    for rec in &new_original.records {
        match old_by_id.get(rec.id.as_str()) {
            Some(old_text) if !old_text.trim().is_empty() => {
                merged.push(TsvRecord {
                    id: rec.id.clone(),
                    text: old_text.to_string(),
                });
                preserved += 1;
            }
            _ => {
                merged.push(rec.clone());
                missing.push(rec.clone());
                added_ids.push(rec.id.clone());
                new_strings += 1;
            }
        }
    }

    let removed_ids: Vec<String> = old_translated
        .records
        .iter()
        .map(|r| r.id.clone())
        .filter(|id| !new_ids.contains(id.as_str()))
        .collect();

    let stats = MergeStats {
        total_old: old_translated.records.len(),
        total_new: new_original.records.len(),
        preserved,
        new_strings,
        removed: removed_ids.len(),
    };

    MergeOutcome {
        merged,
        missing,
        stats,
        added_ids,
        removed_ids,
    }
}

const REPORT_PREVIEW_LEN: usize = 60;
const REPORT_MAX_IDS: usize = 50;

/// Render the human-readable merge report (spec §4.F): up to 50 added and 50
/// removed ids, each with a flattened 60-character text preview.
pub fn render_report(outcome: &MergeOutcome, new_original: &Tsv, old_translated: &Tsv) -> String {
    let new_by_id: HashMap<&str, &str> = new_original
        .records
        .iter()
        .map(|r| (r.id.as_str(), r.text.as_str()))
        .collect();
    let old_by_id: HashMap<&str, &str> = old_translated
        .records
        .iter()
        .map(|r| (r.id.as_str(), r.text.as_str()))
        .collect();

    let mut out = String::new();
    out.push_str(&format!(
        "total_old={} total_new={} preserved={} new_strings={} removed={}\n",
        outcome.stats.total_old,
        outcome.stats.total_new,
        outcome.stats.preserved,
        outcome.stats.new_strings,
        outcome.stats.removed
    ));

    out.push_str(&format!(
        "\nAdded ({} shown of {}):\n",
        outcome.added_ids.len().min(REPORT_MAX_IDS),
        outcome.added_ids.len()
    ));
    for id in outcome.added_ids.iter().take(REPORT_MAX_IDS) {
        let text = new_by_id.get(id.as_str()).copied().unwrap_or("");
        out.push_str(&format!("  {} {}\n", id, preview(text)));
    }

    out.push_str(&format!(
        "\nRemoved ({} shown of {}):\n",
        outcome.removed_ids.len().min(REPORT_MAX_IDS),
        outcome.removed_ids.len()
    ));
    for id in outcome.removed_ids.iter().take(REPORT_MAX_IDS) {
        let text = old_by_id.get(id.as_str()).copied().unwrap_or("");
        out.push_str(&format!("  {} {}\n", id, preview(text)));
    }

    out
}

fn preview(text: &str) -> String {
    let flattened: String = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
    if flattened.trim().is_empty() {
        return "(empty)".to_string();
    }
    let truncated: String = flattened.chars().take(REPORT_PREVIEW_LEN).collect();
    truncated
}
