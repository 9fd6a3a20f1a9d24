use clap::{Parser, Subcommand};
use gloc::{container, records, session::Session, textblock};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gloc", version = "0.1.0", about = "Game text container extract/pack/merge toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack a container into a new session: raw blocks, TSV and map
    Extract {
        container: PathBuf,
        /// Parent directory under which a new timestamped session is created
        #[arg(long, default_value = ".")]
        session_dir: PathBuf,
    },
    /// Rebuild a container from an edited session's TSV + map
    Pack {
        session: PathBuf,
    },
    /// Three-way merge an old translated TSV forward onto a new original TSV
    Merge {
        #[arg(long)]
        old: PathBuf,
        #[arg(long)]
        new: PathBuf,
        #[arg(long, default_value = "translation_merged.tsv")]
        output: PathBuf,
        /// Disable the missing-strings TSV and text report sidecars
        #[arg(long)]
        no_report: bool,
    },
    /// List existing sessions under a root directory
    Sessions {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> gloc::Result<()> {
    match Cli::parse().command {
        Commands::Extract { container: container_path, session_dir } => extract(&container_path, &session_dir),
        Commands::Pack { session } => pack(&session),
        Commands::Merge { old, new, output, no_report } => run_merge(&old, &new, &output, no_report),
        Commands::Sessions { root } => list_sessions(&root),
    }
}

// ── Extract ──────────────────────────────────────────────────────────────────

fn extract(container_path: &Path, session_dir: &Path) -> gloc::Result<()> {
    let stem = container_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("container")
        .to_string();

    let bytes = std::fs::read(container_path)?;
    let session = Session::create(session_dir)?;

    let mut log = |msg: &str| println!("  {msg}");
    let progress: &mut gloc::ProgressFn = &mut log;
    let block_count = container::unpack_to_dir(&bytes, &session.dat_dir(), &stem, Some(progress))?;
    println!("Unpacked {block_count} block(s) → {}", session.dat_dir().display());

    let mut tsv_records = Vec::new();
    let mut map_rows = Vec::new();
    let mut text_blocks_parsed = 0usize;

    for i in 0..block_count {
        let file_name = format!("{stem}_{i}.dat");
        let block_bytes = std::fs::read(session.dat_dir().join(&file_name))?;
        if !textblock::is_text_block(&block_bytes) {
            continue;
        }
        let block = textblock::parse(&block_bytes)?;
        text_blocks_parsed += 1;
        if text_blocks_parsed % 50 == 0 {
            log(&format!("parsed {text_blocks_parsed} text block(s)"));
        }
        for (block_index, rec) in block.records.iter().enumerate() {
            let id_hex = gloc::binio::id_to_hex(&rec.id);
            tsv_records.push(records::TsvRecord {
                id: id_hex.clone(),
                text: rec.text.clone(),
            });
            map_rows.push(records::MapRow {
                file: file_name.clone(),
                all_blocks: block.all_blocks,
                work_blocks: block.work_blocks,
                block: block_index as u32,
                unknown: rec.code,
                id: id_hex,
            });
        }
    }
    if text_blocks_parsed > 0 && text_blocks_parsed % 50 != 0 {
        log(&format!("parsed {text_blocks_parsed} text block(s)"));
    }

    let tsv = records::Tsv {
        records: tsv_records,
        trailing_newline: true,
        crlf: false,
    };
    let map = records::StructuralMap { rows: map_rows };

    std::fs::write(session.tsv_path(&stem), records::write_tsv(&tsv))?;
    std::fs::write(session.map_path(&stem), records::write_map(&map))?;

    println!(
        "Extracted {} text record(s) → {}",
        tsv.records.len(),
        session.tsv_path(&stem).display()
    );
    println!("Session: {}", session.root().display());
    Ok(())
}

// ── Pack ─────────────────────────────────────────────────────────────────────

fn pack(session_dir: &Path) -> gloc::Result<()> {
    let session = Session::open(session_dir)?;
    let stem = find_stem(&session.tsv_dir())?;

    let tsv_text = std::fs::read_to_string(session.tsv_path(&stem))?;
    let map_path = session.map_path(&stem);
    if !map_path.is_file() {
        return Err(gloc::Error::MissingMap(map_path));
    }
    let map_text = std::fs::read_to_string(&map_path)?;

    let tsv = records::parse_tsv(&tsv_text)?;
    let map = records::parse_map(&map_text)?;

    let text_by_id: std::collections::HashMap<&str, &str> =
        tsv.records.iter().map(|r| (r.id.as_str(), r.text.as_str())).collect();

    let mut log = |msg: &str| println!("  {msg}");
    let files = map.files();
    let mut text_blocks_rebuilt = 0usize;

    for file in &files {
        let rows = map.rows_for_file_sorted(file);
        let all_blocks = rows.first().map(|r| r.all_blocks).unwrap_or(0);
        let work_blocks = rows.first().map(|r| r.work_blocks).unwrap_or(0);

        let mut text_records = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = gloc::binio::id_from_hex(&row.id)?;
            let text = text_by_id.get(row.id.as_str()).copied().unwrap_or("").to_string();
            text_records.push(textblock::TextRecord {
                id,
                text,
                code: row.unknown,
            });
        }

        let block = textblock::TextBlock {
            all_blocks,
            work_blocks,
            records: text_records,
        };
        let bytes = textblock::serialize(&block)?;
        std::fs::write(session.dat_dir().join(file), bytes)?;

        text_blocks_rebuilt += 1;
        if text_blocks_rebuilt % 50 == 0 {
            log(&format!("rebuilt {text_blocks_rebuilt} text block(s)"));
        }
    }
    if text_blocks_rebuilt > 0 && text_blocks_rebuilt % 50 != 0 {
        log(&format!("rebuilt {text_blocks_rebuilt} text block(s)"));
    }

    let progress: &mut gloc::ProgressFn = &mut log;
    let packed = container::pack_from_dir(&session.dat_dir(), Some(progress))?;
    let out_path = session.container_path(&stem);
    std::fs::write(&out_path, &packed)?;

    println!("Packed → {} ({} B)", out_path.display(), packed.len());
    Ok(())
}

fn find_stem(tsv_dir: &Path) -> gloc::Result<String> {
    for entry in std::fs::read_dir(tsv_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tsv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                return Ok(stem.to_string());
            }
        }
    }
    Err(gloc::Error::TsvMalformed(format!(
        "no .tsv file found under {}",
        tsv_dir.display()
    )))
}

// ── Merge ────────────────────────────────────────────────────────────────────

fn run_merge(old: &Path, new: &Path, output: &Path, no_report: bool) -> gloc::Result<()> {
    let old_tsv = records::parse_tsv(&std::fs::read_to_string(old)?)?;
    let new_tsv = records::parse_tsv(&std::fs::read_to_string(new)?)?;

    let outcome = gloc::merge_tsv(&old_tsv, &new_tsv);
    let merged_tsv = records::Tsv {
        records: outcome.merged.clone(),
        trailing_newline: true,
        crlf: new_tsv.crlf,
    };
    std::fs::write(output, records::write_tsv(&merged_tsv))?;

    println!(
        "total_old={} total_new={} preserved={} new_strings={} removed={}",
        outcome.stats.total_old,
        outcome.stats.total_new,
        outcome.stats.preserved,
        outcome.stats.new_strings,
        outcome.stats.removed
    );
    println!("Merged → {}", output.display());

    if !no_report {
        let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("translation_merged");
        let dir = output.parent().unwrap_or_else(|| Path::new("."));

        let missing_tsv = records::Tsv {
            records: outcome.missing.clone(),
            trailing_newline: true,
            crlf: new_tsv.crlf,
        };
        let missing_path = dir.join(format!("{stem}_faltando.tsv"));
        std::fs::write(&missing_path, records::write_tsv(&missing_tsv))?;
        println!("Missing strings → {}", missing_path.display());

        let report = gloc::render_report(&outcome, &new_tsv, &old_tsv);
        let report_path = dir.join(format!("{stem}_relatorio.txt"));
        std::fs::write(&report_path, report)?;
        println!("Report → {}", report_path.display());
    }

    Ok(())
}

// ── Sessions ─────────────────────────────────────────────────────────────────

fn list_sessions(root: &Path) -> gloc::Result<()> {
    let sessions = Session::list(root)?;
    if sessions.is_empty() {
        println!("No sessions under {}", root.display());
        return Ok(());
    }
    println!("Sessions under {}:", root.display());
    for s in &sessions {
        println!("  {}", s.display());
    }
    Ok(())
}
