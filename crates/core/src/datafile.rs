//! One month's worth of intervals, stored as an append-only text file and
//! committed atomically (write to a sibling temp file, then rename).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::time::Instant;

pub struct Datafile {
    path: PathBuf,
    day1: Instant,
    day_n: Instant,
    lines: Vec<String>,
    lines_loaded: bool,
    dirty: bool,
    exclusions: Vec<String>,
}

impl Datafile {
    /// `path` must be named `YYYY-MM.data`; the month it encodes becomes
    /// `[day1, dayN)`.
    pub fn initialize(path: PathBuf) -> Result<Datafile> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| io_err(&path, "datafile path has no file stem"))?;
        let day1 = Instant::parse_iso(&format!("{stem}-01T00:00:00Z"), "datafile month")
            .map_err(|_| io_err(&path, &format!("datafile name {stem:?} is not YYYY-MM")))?;
        let day_n = day1.month_end();
        Ok(Datafile {
            path,
            day1,
            day_n,
            lines: Vec::new(),
            lines_loaded: false,
            dirty: false,
            exclusions: Vec::new(),
        })
    }

    pub fn name(&self) -> &Path {
        &self.path
    }

    pub fn day1(&self) -> Instant {
        self.day1
    }

    pub fn day_n(&self) -> Instant {
        self.day_n
    }

    pub fn owns(&self, start: Instant) -> bool {
        self.day1 <= start && start < self.day_n
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.lines_loaded {
            return Ok(());
        }
        self.lines = match fs::read_to_string(&self.path) {
            Ok(contents) => contents
                .lines()
                .filter(|l| !l.is_empty() && !l.starts_with("exc "))
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        self.lines_loaded = true;
        Ok(())
    }

    pub fn all_lines(&mut self) -> Result<&[String]> {
        self.ensure_loaded()?;
        Ok(&self.lines)
    }

    pub fn last_line(&mut self) -> Result<Option<&String>> {
        self.ensure_loaded()?;
        Ok(self.lines.last())
    }

    /// Exclusion lines scoped to this file's month; written at the top of
    /// the file on commit, never interpreted by the storage layer itself.
    pub fn set_exclusions(&mut self, lines: Vec<String>) {
        self.exclusions = lines;
        self.dirty = true;
    }

    /// Appends `interval`'s line in chronological order. Only accepts
    /// intervals whose start falls within this file's month.
    pub fn add_interval(&mut self, interval: &Interval) -> Result<bool> {
        if !self.owns(interval.start) {
            return Ok(false);
        }
        self.ensure_loaded()?;
        let line = interval.to_line();
        let pos = self
            .lines
            .iter()
            .position(|existing| line_start(existing) > interval.start)
            .unwrap_or(self.lines.len());
        self.lines.insert(pos, line);
        self.dirty = true;
        Ok(true)
    }

    /// Removes the line matching `interval`'s canonical serialization.
    pub fn delete_interval(&mut self, interval: &Interval) -> Result<bool> {
        self.ensure_loaded()?;
        let line = interval.to_line();
        if let Some(pos) = self.lines.iter().position(|l| *l == line) {
            self.lines.remove(pos);
            self.dirty = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Atomically rewrites the file if dirty; a no-op otherwise.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.ensure_loaded()?;

        let mut contents = String::new();
        for exclusion in &self.exclusions {
            contents.push_str(exclusion);
            contents.push('\n');
        }
        for line in &self.lines {
            contents.push_str(line);
            contents.push('\n');
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err_source(&self.path, e))?;
        }
        let tmp_path = self.path.with_extension("data.tmp");
        fs::write(&tmp_path, &contents).map_err(|e| io_err_source(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| io_err_source(&self.path, e))?;

        self.dirty = false;
        Ok(())
    }

    pub fn dump(&self) -> String {
        format!(
            "{} [{}, {}) lines={} dirty={}",
            self.path.display(),
            self.day1,
            self.day_n,
            self.lines.len(),
            self.dirty
        )
    }
}

fn line_start(line: &str) -> Instant {
    line.split_whitespace()
        .nth(1)
        .and_then(|tok| Instant::parse_iso(tok, "start").ok())
        .unwrap_or(Instant::ZERO)
}

fn io_err(path: &Path, detail: &str) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, detail.to_string()),
    }
}

fn io_err_source(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn inst(s: &str) -> Instant {
        Instant::parse_iso(s, "start").unwrap()
    }

    fn interval(start: &str, end: &str, tag: &str) -> Interval {
        let tags: BTreeSet<String> = [tag.to_string()].into_iter().collect();
        if end.is_empty() {
            Interval::open(inst(start), tags, String::new())
        } else {
            Interval::closed(inst(start), inst(end), tags, String::new())
        }
    }

    #[test]
    fn rejects_interval_outside_month() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = Datafile::initialize(dir.path().join("2023-01.data")).unwrap();
        let i = interval("2023-02-01T09:00:00Z", "2023-02-01T10:00:00Z", "work");
        assert!(!df.add_interval(&i).unwrap());
    }

    #[test]
    fn appends_in_chronological_order_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023-01.data");
        let mut df = Datafile::initialize(path.clone()).unwrap();

        let later = interval("2023-01-05T09:00:00Z", "2023-01-05T10:00:00Z", "b");
        let earlier = interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", "a");
        assert!(df.add_interval(&later).unwrap());
        assert!(df.add_interval(&earlier).unwrap());

        let lines = df.all_lines().unwrap().to_vec();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2023-01-01"));
        assert!(lines[1].contains("2023-01-05"));

        df.commit().unwrap();
        assert!(!df.is_dirty());
        assert!(path.exists());

        let mut reloaded = Datafile::initialize(path).unwrap();
        assert_eq!(reloaded.all_lines().unwrap().len(), 2);
    }

    #[test]
    fn commit_is_noop_when_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023-01.data");
        let mut df = Datafile::initialize(path.clone()).unwrap();
        df.commit().unwrap();
        assert!(!path.exists(), "commit on a clean, never-written file writes nothing");
    }

    #[test]
    fn delete_removes_matching_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = Datafile::initialize(dir.path().join("2023-01.data")).unwrap();
        let i = interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", "a");
        df.add_interval(&i).unwrap();
        assert!(df.delete_interval(&i).unwrap());
        assert_eq!(df.all_lines().unwrap().len(), 0);
        assert!(!df.delete_interval(&i).unwrap());
    }
}
