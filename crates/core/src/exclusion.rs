//! The boundary the core treats as read-only: rule-derived non-workable
//! time (weekends, holidays, off-hours). The core never constructs these
//! itself — it only asks a provider for them and feeds the answer to
//! `flatten`.

use crate::interval::Interval;
use crate::time::Instant;

/// Yields a finite, non-overlapping, chronologically ordered sequence of
/// exclusion intervals intersecting `[start, end)`.
pub trait ExclusionProvider {
    fn exclusions(&self, start: Instant, end: Instant) -> Vec<Interval>;
}

/// The trivial provider: no time is ever excluded. Used by callers with no
/// rule-derived calendar (and by every test in this crate).
pub struct NoExclusions;

impl ExclusionProvider for NoExclusions {
    fn exclusions(&self, _start: Instant, _end: Instant) -> Vec<Interval> {
        Vec::new()
    }
}
