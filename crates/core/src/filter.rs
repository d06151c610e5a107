//! Composable predicates over intervals, re-architected (per spec §9) as a
//! tagged variant rather than the teacher domain's runtime polymorphism:
//! one `matches`/`is_endless` evaluator, no heap-shared trait objects.

use std::collections::BTreeSet;

use crate::interval::Interval;
use crate::time::Instant;

#[derive(Debug, Clone)]
pub enum Filter {
    /// Intersects `[start, end)`. `(0, 0)` means unbounded.
    AllInRange { start: Instant, end: Instant },
    /// Tag set is a superset of these tags; an empty set matches everything.
    AllWithTags(BTreeSet<String>),
    AllWithIds(BTreeSet<u64>),
    AndGroup(Vec<Filter>),
}

impl Filter {
    pub fn unbounded() -> Filter {
        Filter::AllInRange {
            start: Instant::ZERO,
            end: Instant::ZERO,
        }
    }

    pub fn in_range(start: Instant, end: Instant) -> Filter {
        Filter::AllInRange { start, end }
    }

    pub fn matches(&self, interval: &Interval) -> bool {
        match self {
            Filter::AllInRange { start, end } => {
                if start.is_zero() && end.is_zero() {
                    return true;
                }
                let range = Interval::open(*start, BTreeSet::new(), String::new());
                let range = if end.is_zero() {
                    range
                } else {
                    Interval::closed(*start, *end, BTreeSet::new(), String::new())
                };
                range.intersects(interval)
            }
            Filter::AllWithTags(tags) => tags.is_subset(&interval.tags),
            Filter::AllWithIds(ids) => interval.id.is_some_and(|id| ids.contains(&id)),
            Filter::AndGroup(children) => children.iter().all(|f| f.matches(interval)),
        }
    }

    /// Whether this filter can match arbitrarily far into the past — used
    /// by `Database` iteration to decide how much history to scan.
    pub fn is_endless(&self) -> bool {
        match self {
            Filter::AllInRange { start, end } => start.is_zero() && end.is_zero(),
            Filter::AllWithTags(_) | Filter::AllWithIds(_) => true,
            Filter::AndGroup(children) => children.iter().all(Filter::is_endless),
        }
    }

    /// The earliest instant this filter could possibly match, if bounded.
    pub fn lower_bound(&self) -> Option<Instant> {
        match self {
            Filter::AllInRange { start, end } if !(start.is_zero() && end.is_zero()) => {
                Some(*start)
            }
            Filter::AndGroup(children) => children.iter().filter_map(Filter::lower_bound).min(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(s: &str) -> Instant {
        Instant::parse_iso(s, "start").unwrap()
    }

    fn interval(start: &str, end: &str, tags: &[&str]) -> Interval {
        let tags = tags.iter().map(|s| s.to_string()).collect();
        Interval::closed(inst(start), inst(end), tags, String::new())
    }

    #[test]
    fn unbounded_range_is_endless_and_matches_all() {
        let f = Filter::unbounded();
        assert!(f.is_endless());
        assert!(f.matches(&interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", &[])));
    }

    #[test]
    fn bounded_range_excludes_non_intersecting() {
        let f = Filter::in_range(inst("2023-01-01T00:00:00Z"), inst("2023-01-02T00:00:00Z"));
        assert!(!f.is_endless());
        assert!(f.matches(&interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", &[])));
        assert!(!f.matches(&interval("2023-02-01T09:00:00Z", "2023-02-01T10:00:00Z", &[])));
    }

    #[test]
    fn empty_tag_filter_matches_everything() {
        let f = Filter::AllWithTags(BTreeSet::new());
        assert!(f.matches(&interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", &[])));
    }

    #[test]
    fn tag_filter_requires_superset() {
        let f = Filter::AllWithTags(["work".to_string()].into_iter().collect());
        assert!(f.matches(&interval(
            "2023-01-01T09:00:00Z",
            "2023-01-01T10:00:00Z",
            &["work", "extra"]
        )));
        assert!(!f.matches(&interval("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", &["other"])));
    }

    #[test]
    fn and_group_is_endless_only_if_all_children_are() {
        let bounded = Filter::in_range(inst("2023-01-01T00:00:00Z"), inst("2023-01-02T00:00:00Z"));
        let endless = Filter::AllWithTags(BTreeSet::new());
        assert!(!Filter::AndGroup(vec![bounded.clone(), endless.clone()]).is_endless());
        assert!(Filter::AndGroup(vec![endless.clone(), endless]).is_endless());
    }
}
