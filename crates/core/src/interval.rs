//! The tagged time-range value type, and its line-format (de)serialization.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::time::Instant;

/// A tagged time range `[start, end)`, or `[start, infinity)` if `end` is
/// zero (open). Equality ignores `id`: ids are assigned fresh on every read
/// pass and are not part of an interval's identity.
#[derive(Debug, Clone)]
pub struct Interval {
    pub start: Instant,
    pub end: Instant,
    pub tags: BTreeSet<String>,
    pub annotation: String,
    /// Assigned on read, newest-first; never persisted. `None` until a
    /// materializing pass (`Database::get_all_intervals` and friends) fills
    /// it in.
    pub id: Option<u64>,
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.tags == other.tags
            && self.annotation == other.annotation
    }
}
impl Eq for Interval {}

impl Interval {
    pub fn open(start: Instant, tags: BTreeSet<String>, annotation: String) -> Interval {
        Interval {
            start,
            end: Instant::ZERO,
            tags,
            annotation,
            id: None,
        }
    }

    pub fn closed(
        start: Instant,
        end: Instant,
        tags: BTreeSet<String>,
        annotation: String,
    ) -> Interval {
        Interval {
            start,
            end,
            tags,
            annotation,
            id: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_open() && self.end == self.start
    }

    /// `self` fully covers `other`'s range.
    pub fn encloses(&self, other: &Interval) -> bool {
        if other.start < self.start {
            return false;
        }
        if self.is_open() {
            return true;
        }
        !other.is_open() && other.end <= self.end
    }

    /// `other.start` falls strictly inside `self`'s half-open range.
    pub fn starts_within(&self, other: &Interval) -> bool {
        other.start < self.start && (other.is_open() || self.start < other.end)
    }

    /// `other.end` falls strictly inside `self`'s half-open range (an open
    /// `self` never "ends within" anything, since it has no end).
    pub fn ends_within(&self, other: &Interval) -> bool {
        !self.is_open()
            && other.start < self.end
            && (other.is_open() || self.end < other.end)
    }

    /// Half-open range intersection: `[start, end) ∩ [other.start, other.end) ≠ ∅`.
    pub fn intersects(&self, other: &Interval) -> bool {
        let self_end = if self.is_open() { i64::MAX } else { self.end.0 };
        let other_end = if other.is_open() {
            i64::MAX
        } else {
            other.end.0
        };
        self.start.0 < other_end && other.start.0 < self_end
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn untag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// Single-line human-readable debug form, e.g. for `debug!()` logging.
    pub fn dump(&self) -> String {
        format!(
            "[{}] {} - {} # {}{}",
            self.id.map(|i| format!("@{i}")).unwrap_or_default(),
            self.start,
            if self.is_open() {
                "∞".to_string()
            } else {
                self.end.to_string()
            },
            self.tags.iter().cloned().collect::<Vec<_>>().join(" "),
            if self.annotation.is_empty() {
                String::new()
            } else {
                format!(" ({})", self.annotation)
            }
        )
    }

    /// Render the canonical storage line (§6 grammar). Tags are sorted
    /// ascending for stable diffs.
    pub fn to_line(&self) -> String {
        let mut out = format!("inc {}", self.start.to_iso_extended());
        if !self.is_open() {
            out.push_str(&format!(" - {}", self.end.to_iso_extended()));
        }
        if !self.annotation.is_empty() {
            out.push_str(&format!(" annotation:{}", quote(&self.annotation)));
        }
        if !self.tags.is_empty() {
            out.push_str(" #");
            for tag in &self.tags {
                out.push(' ');
                out.push_str(&encode_tag(tag));
            }
        }
        out
    }

    /// Parse one storage line. `path`/`line_no` are only used to annotate
    /// `Error::Parse`.
    pub fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<Interval> {
        let mut tokens = tokenize(line, path, line_no)?.into_iter();

        let head = tokens.next().unwrap_or_default();
        if head != "inc" {
            return Err(perr(path, line_no, "keyword", format!("expected 'inc', got {head:?}")));
        }

        let start_tok = tokens
            .next()
            .ok_or_else(|| perr(path, line_no, "start", "missing start timestamp".into()))?;
        let start = Instant::parse_iso(&start_tok, "start")
            .map_err(|_| perr(path, line_no, "start", format!("invalid timestamp {start_tok:?}")))?;

        let mut rest: Vec<String> = tokens.collect();

        let mut end = Instant::ZERO;
        if rest.first().map(String::as_str) == Some("-") {
            rest.remove(0);
            let end_tok = rest
                .first()
                .cloned()
                .ok_or_else(|| perr(path, line_no, "end", "missing end timestamp after '-'".into()))?;
            rest.remove(0);
            end = Instant::parse_iso(&end_tok, "end")
                .map_err(|_| perr(path, line_no, "end", format!("invalid timestamp {end_tok:?}")))?;
            if end <= start {
                return Err(perr(
                    path,
                    line_no,
                    "end",
                    format!("end {end} is not after start {start}"),
                ));
            }
        }

        let mut annotation = String::new();
        while let Some(tok) = rest.first() {
            if let Some((key, value)) = tok.split_once(':') {
                if key.chars().all(|c| c.is_ascii_alphabetic()) && !key.is_empty() {
                    if key == "annotation" {
                        annotation = value.to_string();
                    }
                    rest.remove(0);
                    continue;
                }
            }
            break;
        }

        let mut tags = BTreeSet::new();
        if rest.first().map(String::as_str) == Some("#") {
            rest.remove(0);
            for tag in rest {
                tags.insert(tag);
            }
        }

        Ok(Interval {
            start,
            end,
            tags,
            annotation,
            id: None,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

fn perr(path: &Path, line: usize, field: &'static str, detail: String) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        field,
        detail,
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn encode_tag(tag: &str) -> String {
    if tag.chars().any(|c| c.is_whitespace() || c == '"') {
        quote(tag)
    } else {
        tag.to_string()
    }
}

/// Whitespace-separated tokenizer that respects double-quoted substrings and
/// their backslash escapes, per the §6 `qstring` grammar.
fn tokenize(line: &str, path: &Path, line_no: usize) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut tok = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(next) = chars.next() {
                            tok.push(next);
                        } else {
                            return Err(perr(
                                path,
                                line_no,
                                "tags",
                                "dangling escape at end of line".into(),
                            ));
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => tok.push(other),
                }
            }
            if !closed {
                return Err(perr(path, line_no, "tags", "unbalanced quote".into()));
            }
            tokens.push(tok);
        } else {
            let mut tok = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                if c == '"' && tok.ends_with(':') {
                    chars.next();
                    let mut closed = false;
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' => {
                                if let Some(next) = chars.next() {
                                    tok.push(next);
                                } else {
                                    return Err(perr(
                                        path,
                                        line_no,
                                        "tags",
                                        "dangling escape at end of line".into(),
                                    ));
                                }
                            }
                            '"' => {
                                closed = true;
                                break;
                            }
                            other => tok.push(other),
                        }
                    }
                    if !closed {
                        return Err(perr(path, line_no, "tags", "unbalanced quote".into()));
                    }
                    break;
                }
                tok.push(c);
                chars.next();
            }
            tokens.push(tok);
        }
    }

    Ok(tokens)
}
