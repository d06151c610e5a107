//! Append-only undo log. A transaction is a sequence of operations, each the
//! *reversal* of a mutation the `Database` already applied; `undo` replays
//! the newest transaction's ops in reverse with inverse semantics.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum JournalOp {
    /// Undoing a create: delete `created`.
    Create { created: Interval },
    /// Undoing a delete: re-add `deleted`.
    Delete { deleted: Interval },
    /// Undoing an update: replace `after` with `before`.
    Update { before: Interval, after: Interval },
}

impl JournalOp {
    fn to_line(&self) -> String {
        match self {
            JournalOp::Create { created } => format!("undo create {}", created.to_line()),
            JournalOp::Delete { deleted } => format!("undo delete {}", deleted.to_line()),
            JournalOp::Update { before, after } => {
                format!(
                    "undo update from {} to {}",
                    before.to_line(),
                    after.to_line()
                )
            }
        }
    }

    fn parse(line: &str, path: &Path, line_no: usize) -> Result<JournalOp> {
        let rest = line
            .strip_prefix("undo ")
            .ok_or_else(|| perr(path, line_no, "op", "expected 'undo' prefix".into()))?;

        if let Some(rest) = rest.strip_prefix("create ") {
            let created = Interval::parse_line(rest, path, line_no)?;
            Ok(JournalOp::Create { created })
        } else if let Some(rest) = rest.strip_prefix("delete ") {
            let deleted = Interval::parse_line(rest, path, line_no)?;
            Ok(JournalOp::Delete { deleted })
        } else if let Some(rest) = rest.strip_prefix("update from ") {
            let (before_part, after_part) = rest
                .split_once(" to ")
                .ok_or_else(|| perr(path, line_no, "op", "malformed update op".into()))?;
            let before = Interval::parse_line(before_part, path, line_no)?;
            let after = Interval::parse_line(after_part, path, line_no)?;
            Ok(JournalOp::Update { before, after })
        } else {
            Err(perr(path, line_no, "op", format!("unknown op {rest:?}")))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: Instant,
    pub ops: Vec<JournalOp>,
}

/// The on-disk undo log. `start_transaction`/`record_op`/`end_transaction`
/// are the write path; `undo` is the read-and-rewrite path.
pub struct Journal {
    path: PathBuf,
    pending: Option<Vec<JournalOp>>,
}

impl Journal {
    /// Opens the journal at `path`. If the file ends in a `txn-begin` with
    /// no matching `txn-end`, refuses to proceed (§9 crash recovery design):
    /// the caller must call `repair` before any further writes.
    pub fn open(path: PathBuf) -> Result<Journal> {
        if dangling_transaction(&path)? {
            return Err(Error::JournalOpenTransaction { path });
        }
        Ok(Journal {
            path,
            pending: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bypasses the dangling-transaction guard `open` enforces, for a caller
    /// that is about to call `repair` immediately.
    pub fn open_for_repair(path: PathBuf) -> Journal {
        Journal {
            path,
            pending: None,
        }
    }

    pub fn start_transaction(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::InvariantViolation(
                "a journal transaction is already open".to_string(),
            ));
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    pub fn record_op(&mut self, op: JournalOp) -> Result<()> {
        self.pending
            .as_mut()
            .ok_or_else(|| Error::InvariantViolation("no open journal transaction".to_string()))?
            .push(op);
        Ok(())
    }

    /// Appends the completed transaction to the journal file. Only after
    /// this returns are the datafile commits durable in the user's view.
    pub fn end_transaction(&mut self) -> Result<()> {
        let ops = self
            .pending
            .take()
            .ok_or_else(|| Error::InvariantViolation("no open journal transaction".to_string()))?;

        if ops.is_empty() {
            return Ok(());
        }

        let mut block = format!("txn-begin {}\n", now().to_iso_extended());
        for op in &ops {
            block.push_str(&op.to_line());
            block.push('\n');
        }
        block.push_str("txn-end\n");

        append(&self.path, &block)
    }

    /// Discards the in-memory pending transaction without writing it —
    /// used when a validator step fails mid-transaction.
    pub fn rollback(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replays the newest committed transaction's ops in reverse against
    /// `apply`, then truncates the journal file to drop that transaction.
    /// Returns `false` if the journal has no transactions.
    pub fn undo(&mut self, mut apply: impl FnMut(&JournalOp) -> Result<()>) -> Result<bool> {
        let contents = read_or_empty(&self.path)?;
        let mut transactions = parse_transactions(&contents, &self.path)?;
        let Some(last) = transactions.pop() else {
            return Ok(false);
        };

        for op in last.ops.iter().rev() {
            apply(op)?;
        }

        write_transactions(&self.path, &transactions)?;
        Ok(true)
    }

    /// Recovery for a dangling `txn-begin` (§9): replay its ops in reverse
    /// against `apply`, as `undo` would, then drop it from the file.
    pub fn repair(&mut self, apply: impl FnMut(&JournalOp) -> Result<()>) -> Result<()> {
        let contents = read_or_empty(&self.path)?;
        let mut lines = contents.lines().peekable();
        let mut completed = String::new();
        let mut dangling_ops: Vec<JournalOp> = Vec::new();

        while let Some(line) = lines.next() {
            if line.starts_with("txn-begin") {
                let mut block = vec![line.to_string()];
                let mut ops = Vec::new();
                let mut terminated = false;
                for line in lines.by_ref() {
                    block.push(line.to_string());
                    if line == "txn-end" {
                        terminated = true;
                        break;
                    }
                    ops.push(JournalOp::parse(line, &self.path, 0)?);
                }
                if terminated {
                    completed.push_str(&block.join("\n"));
                    completed.push('\n');
                } else {
                    dangling_ops = ops;
                }
            }
        }

        let mut apply = apply;
        for op in dangling_ops.iter().rev() {
            apply(op)?;
        }

        fs::write(&self.path, completed).map_err(|e| Error::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

fn now() -> Instant {
    Instant(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0),
    )
}

fn dangling_transaction(path: &Path) -> Result<bool> {
    let contents = read_or_empty(path)?;
    let mut depth = 0i32;
    for line in contents.lines() {
        if line.starts_with("txn-begin") {
            depth += 1;
        } else if line == "txn-end" {
            depth -= 1;
        }
    }
    Ok(depth != 0)
}

fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn append(path: &Path, block: &str) -> Result<()> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    file.write_all(block.as_bytes()).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_transactions(contents: &str, path: &Path) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();
    let mut lines = contents.lines().enumerate().peekable();

    while let Some((line_no, line)) = lines.next() {
        let Some(ts_str) = line.strip_prefix("txn-begin ") else {
            continue;
        };
        let timestamp = Instant::parse_iso(ts_str, "txn-begin")
            .map_err(|_| perr(path, line_no, "txn-begin", format!("bad timestamp {ts_str:?}")))?;
        let mut ops = Vec::new();
        loop {
            let (line_no, line) = lines
                .next()
                .ok_or_else(|| perr(path, line_no, "txn", "missing txn-end".into()))?;
            if line == "txn-end" {
                break;
            }
            ops.push(JournalOp::parse(line, path, line_no)?);
        }
        transactions.push(Transaction { timestamp, ops });
    }

    Ok(transactions)
}

fn write_transactions(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut contents = String::new();
    for txn in transactions {
        contents.push_str(&format!("txn-begin {}\n", txn.timestamp.to_iso_extended()));
        for op in &txn.ops {
            contents.push_str(&op.to_line());
            contents.push('\n');
        }
        contents.push_str("txn-end\n");
    }
    fs::write(path, contents).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn perr(path: &Path, line: usize, field: &'static str, detail: String) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        field,
        detail,
    }
}
