//! The ordered collection of `Datafile`s covering recorded history, plus
//! the open-interval invariant (spec §4.3).

use std::fs;
use std::path::{Path, PathBuf};

use crate::datafile::Datafile;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::interval::Interval;
use crate::journal::{Journal, JournalOp};
use crate::time::Instant;

pub struct Database {
    root: PathBuf,
    files: Vec<Datafile>,
}

/// A closed interval with `end <= start` can never be read back
/// (`Interval::parse_line` rejects it), so reject it before it is ever
/// written instead of corrupting the month's Datafile.
fn check_well_formed(interval: &Interval) -> Result<()> {
    if !interval.is_open() && interval.end <= interval.start {
        return Err(Error::InvariantViolation(format!(
            "end {} is not after start {}",
            interval.end, interval.start
        )));
    }
    Ok(())
}

impl Database {
    /// Opens `<root>/data`, loading any existing `YYYY-MM.data` files and
    /// writing the `backend.flag` version marker if absent.
    pub fn open(root: PathBuf) -> Result<Database> {
        let data_dir = root.join("data");
        fs::create_dir_all(&data_dir).map_err(|e| Error::Io {
            path: data_dir.clone(),
            source: e,
        })?;

        let flag_path = data_dir.join("backend.flag");
        if !flag_path.exists() {
            fs::write(&flag_path, "1\n").map_err(|e| Error::Io {
                path: flag_path.clone(),
                source: e,
            })?;
        }

        let mut files = Vec::new();
        let entries = fs::read_dir(&data_dir).map_err(|e| Error::Io {
            path: data_dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Io {
                path: data_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_month_file = path.extension().is_some_and(|ext| ext == "data")
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem.len() == 7 && stem.as_bytes()[4] == b'-');
            if is_month_file {
                files.push(Datafile::initialize(path)?);
            }
        }
        files.sort_by_key(|f| f.day1());

        Ok(Database {
            root: data_dir,
            files,
        })
    }

    fn data_dir(&self) -> &Path {
        &self.root
    }

    fn index_for_month(&self, start: Instant) -> Option<usize> {
        self.files.iter().position(|f| f.owns(start))
    }

    fn get_or_create_index(&mut self, start: Instant) -> Result<usize> {
        if let Some(idx) = self.index_for_month(start) {
            return Ok(idx);
        }
        let path = self.data_dir().join(format!("{}.data", start.month_key()));
        let df = Datafile::initialize(path)?;
        let day1 = df.day1();
        self.files.push(df);
        self.files.sort_by_key(|f| f.day1());
        Ok(self.files.iter().position(|f| f.day1() == day1).unwrap())
    }

    /// The database-wide latest interval by start, i.e. the open interval if
    /// one exists (it is always the latest by the invariant).
    fn current_open_interval(&mut self) -> Result<Option<Interval>> {
        for df in self.files.iter_mut().rev() {
            if let Some(last) = df.last_line()?.cloned() {
                let interval = Interval::parse_line(&last, df.name(), 0)?;
                return Ok(interval.is_open().then_some(interval));
            }
        }
        Ok(None)
    }

    /// Routes `interval` to its month's Datafile, enforcing the
    /// at-most-one-open-interval invariant, and records the journal op.
    pub fn add_interval(
        &mut self,
        interval: Interval,
        journal: &mut Journal,
    ) -> Result<()> {
        check_well_formed(&interval)?;
        if interval.is_open() && self.current_open_interval()?.is_some() {
            return Err(Error::InvariantViolation(
                "a second open interval would be created".to_string(),
            ));
        }
        self.add_interval_raw(&interval)?;
        journal.record_op(JournalOp::Create { created: interval })
    }

    /// Single-file update if both intervals fall in the same month,
    /// otherwise a delete from the old month and an add to the new one.
    pub fn modify_interval(
        &mut self,
        before: Interval,
        after: Interval,
        journal: &mut Journal,
    ) -> Result<()> {
        check_well_formed(&after)?;
        self.delete_interval_raw(&before)?;
        self.add_interval_raw(&after)?;
        journal.record_op(JournalOp::Update { before, after })
    }

    pub fn delete_interval(&mut self, interval: Interval, journal: &mut Journal) -> Result<()> {
        self.delete_interval_raw(&interval)?;
        journal.record_op(JournalOp::Delete { deleted: interval })
    }

    /// Applies `interval` to storage without touching the journal. Used by
    /// `Journal::undo`/`repair` replay, where the reversal is the op itself.
    pub fn add_interval_raw(&mut self, interval: &Interval) -> Result<()> {
        let idx = self.get_or_create_index(interval.start)?;
        if !self.files[idx].add_interval(interval)? {
            return Err(Error::InvariantViolation(format!(
                "interval {} does not belong to datafile {}",
                interval.dump(),
                self.files[idx].name().display()
            )));
        }
        Ok(())
    }

    pub fn delete_interval_raw(&mut self, interval: &Interval) -> Result<()> {
        let Some(idx) = self.index_for_month(interval.start) else {
            return Err(Error::InvariantViolation(format!(
                "no datafile covers {}",
                interval.dump()
            )));
        };
        if !self.files[idx].delete_interval(interval)? {
            return Err(Error::InvariantViolation(format!(
                "interval {} not found for deletion",
                interval.dump()
            )));
        }
        Ok(())
    }

    /// Commits every dirty Datafile. Per spec §4.4/§5, this must happen
    /// before the journal's `txn-end` is written.
    pub fn flush(&mut self) -> Result<()> {
        for df in &mut self.files {
            df.commit()?;
        }
        Ok(())
    }

    /// All intervals, chronological ascending, ids assigned newest-first
    /// over the whole returned set (id 1 = last / most recent element).
    pub fn get_all_intervals(&mut self) -> Result<Vec<Interval>> {
        self.materialize(true, None)
    }

    /// Filter-matching intervals. Scans every Datafile if `filter` is
    /// endless; otherwise only those whose month could intersect its
    /// range (spec §4.9 scanning optimization).
    pub fn iter_filtered(&mut self, filter: &Filter) -> Result<Vec<Interval>> {
        let scan_all = filter.is_endless();
        let lower_bound = filter.lower_bound();
        let intervals = self.materialize(scan_all, lower_bound)?;
        Ok(intervals.into_iter().filter(|i| filter.matches(i)).collect())
    }

    fn materialize(&mut self, scan_all: bool, lower_bound: Option<Instant>) -> Result<Vec<Interval>> {
        let mut intervals = Vec::new();
        for df in self.files.iter_mut() {
            if !scan_all {
                if let Some(lb) = lower_bound {
                    if df.day_n() <= lb {
                        continue;
                    }
                }
            }
            let path = df.name().to_path_buf();
            for (line_no, line) in df.all_lines()?.to_vec().iter().enumerate() {
                intervals.push(Interval::parse_line(line, &path, line_no + 1)?);
            }
        }
        intervals.sort_by_key(|i| i.start);
        let n = intervals.len();
        for (idx, interval) in intervals.iter_mut().enumerate() {
            interval.id = Some((n - idx) as u64);
        }
        Ok(intervals)
    }
}
