//! Session working-directory layout (spec §4.G).
//!
//! A session is a timestamped directory (`DDMMYYYYhhmmss`) with three
//! subtrees: `dat/` (raw inner-block files from the container codec),
//! `tsv/` (the editable TSV and its `.map` sidecar) and `bin/` (the packed
//! container). Timestamp formatting uses `chrono`, matching the reference
//! crate's use of `chrono::Utc` for its own recovery checkpoints.

use crate::error::{Error, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%d%m%Y%H%M%S";

pub struct Session {
    root: PathBuf,
}

impl Session {
    /// Create a fresh, timestamped session under `parent`.
    pub fn create(parent: &Path) -> Result<Self> {
        let name = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let root = parent.join(name);
        std::fs::create_dir_all(root.join("dat"))?;
        std::fs::create_dir_all(root.join("tsv"))?;
        std::fs::create_dir_all(root.join("bin"))?;
        Ok(Self { root })
    }

    /// Attach to an existing session directory (e.g. to pack it back up).
    pub fn open(root: &Path) -> Result<Self> {
        if !root.join("dat").is_dir() || !root.join("tsv").is_dir() || !root.join("bin").is_dir() {
            return Err(Error::CorruptContainer(format!(
                "{} is missing one of dat/tsv/bin and is not a valid session",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dat_dir(&self) -> PathBuf {
        self.root.join("dat")
    }

    pub fn tsv_dir(&self) -> PathBuf {
        self.root.join("tsv")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn tsv_path(&self, stem: &str) -> PathBuf {
        self.tsv_dir().join(format!("{stem}.tsv"))
    }

    pub fn map_path(&self, stem: &str) -> PathBuf {
        self.tsv_dir().join(format!("{stem}.map"))
    }

    pub fn container_path(&self, stem: &str) -> PathBuf {
        self.bin_dir().join(stem)
    }

    /// List session directories under `root`, most recent first. A
    /// directory counts as a session if it has all three subtrees.
    pub fn list(root: &Path) -> Result<Vec<PathBuf>> {
        let mut sessions = Vec::new();
        if !root.is_dir() {
            return Ok(sessions);
        }
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && Session::open(&path).is_ok() {
                sessions.push(path);
            }
        }
        sessions.sort();
        sessions.reverse();
        Ok(sessions)
    }
}
