//! Per-session log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Create `folder` (and parents) if it does not exist yet.
pub fn ensure_folder(folder: &Path) -> io::Result<()> {
    if !folder.is_dir() {
        std::fs::create_dir_all(folder)?;
    }
    Ok(())
}

/// Candidate name for the `n`th file: `Debuglog.txt`, `Debuglog (2).txt`, …
fn numbered_name(file_name: &str, n: u32) -> String {
    if n <= 1 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", file_name, n),
    }
}

/// First path in `folder` built from `file_name` that does not exist yet.
pub fn nonexistent_sibling(folder: &Path, file_name: &str) -> PathBuf {
    let mut n = 1;
    loop {
        let candidate = folder.join(numbered_name(file_name, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Append-only Markdown file owned by one logging session.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Create a fresh file in `folder`, never reusing an existing one.
    pub fn create(folder: &Path, file_name: &str) -> io::Result<Self> {
        ensure_folder(folder)?;

        loop {
            let path = nonexistent_sibling(folder, file_name);
            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => return Ok(Self { path, file }),
                // Lost a race with another writer; pick the next name.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()
    }
}
