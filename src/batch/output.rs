//! Append-only CSV output for batch runs.
//!
//! Each row is written with a single `write_all`, flushed and synced
//! before the next user starts, so an interrupted run leaves only
//! complete rows behind.

use crate::models::ResultRow;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sibling output path for a username list: `users.txt` -> `users-output.csv`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "users".to_string());

    input.with_file_name(format!("{}-output.csv", stem))
}

/// Usernames that already have a complete row in `path`.
///
/// A missing file yields an empty set. Lines that do not parse as a row
/// (the header, or a row cut short by a crash) are ignored.
pub fn completed_usernames(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read output file: {}", path.display()))?;

    Ok(content
        .lines()
        .filter_map(ResultRow::parse_csv_line)
        .map(|row| row.username)
        .collect())
}

/// Appends [`ResultRow`]s to a CSV file.
pub struct ResultWriter {
    file: File,
    path: PathBuf,
    rows_written: usize,
}

impl ResultWriter {
    /// Open `path` for appending, creating it with a header if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file: {}", path.display()))?;

        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat output file: {}", path.display()))?
            .len();

        if len == 0 {
            debug!("Writing CSV header to {}", path.display());
            writeln!(file, "{}", ResultRow::CSV_HEADER)
                .with_context(|| format!("Failed to write header to {}", path.display()))?;
        } else if !ends_with_newline(&mut file, len)? {
            warn!(
                "{} ends with an incomplete line; starting a new line",
                path.display()
            );
            file.write_all(b"\n")
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        file.sync_all()
            .with_context(|| format!("Failed to sync {}", path.display()))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    /// Append one row and force it to disk.
    pub fn append(&mut self, row: &ResultRow) -> Result<()> {
        let line = format!("{}\n", row.to_csv_line());

        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .with_context(|| format!("Failed to append row to {}", self.path.display()))?;

        self.rows_written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this writer.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))
        .and_then(|_| file.read_exact(&mut last))
        .context("Failed to inspect end of output file")?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(name: &str, h: usize) -> ResultRow {
        ResultRow {
            username: name.to_string(),
            submission_count: 10,
            rank_statistic: h,
            karma: 500,
        }
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/data/users.txt")),
            PathBuf::from("/data/users-output.csv")
        );
        assert_eq!(
            output_path_for(Path::new("names")),
            PathBuf::from("names-output.csv")
        );
    }

    #[test]
    fn test_writer_creates_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = ResultWriter::open(&path).unwrap();
        writer.append(&row("pg", 40)).unwrap();
        assert_eq!(writer.rows_written(), 1);
        drop(writer);

        let mut writer = ResultWriter::open(&path).unwrap();
        writer.append(&row("dang", 12)).unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "username,submission_count,rank_statistic,karma\npg,10,40,500\ndang,10,12,500\n"
        );
    }

    #[test]
    fn test_rows_are_complete_after_each_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut writer = ResultWriter::open(&path).unwrap();

        for (k, name) in ["a", "b", "c"].iter().enumerate() {
            writer.append(&row(name, k)).unwrap();

            // Read while the writer is still open, as a crash would leave it.
            let content = std::fs::read_to_string(&path).unwrap();
            let rows: Vec<_> = content.lines().skip(1).collect();
            assert_eq!(rows.len(), k + 1);
            assert!(rows.iter().all(|l| ResultRow::parse_csv_line(l).is_some()));
        }
    }

    #[test]
    fn test_truncated_tail_is_repaired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "username,submission_count,rank_statistic,karma\npg,10,40,500\nda").unwrap();

        let mut writer = ResultWriter::open(&path).unwrap();
        writer.append(&row("dang", 12)).unwrap();
        drop(writer);

        let done = completed_usernames(&path).unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains("pg"));
        assert!(done.contains("dang"));
    }

    #[test]
    fn test_completed_usernames_missing_file() {
        let dir = TempDir::new().unwrap();
        let done = completed_usernames(&dir.path().join("none.csv")).unwrap();
        assert!(done.is_empty());
    }
}
