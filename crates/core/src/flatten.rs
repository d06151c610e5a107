//! Subtracts a set of exclusions from a closed interval, producing the
//! remaining sub-intervals that avoid them (spec §4.6).

use crate::interval::Interval;
use crate::time::Instant;

/// `flatten(interval, exclusions)` ⇒ sequence of closed sub-intervals of
/// `interval` that excludes the union of `exclusions`. Each sub-interval
/// inherits `interval`'s tags and annotation; callers must filter out any
/// empty results themselves (spec explicitly permits them).
pub fn flatten(interval: &Interval, exclusions: &[Interval]) -> Vec<Interval> {
    let mut clipped: Vec<(Instant, Instant)> = exclusions
        .iter()
        .filter_map(|e| {
            let start = e.start.max(interval.start);
            let end = if e.is_open() { interval.end } else { e.end.min(interval.end) };
            (start < end).then_some((start, end))
        })
        .collect();
    clipped.sort_by_key(|(start, _)| *start);

    let mut out = Vec::new();
    let mut cursor = interval.start;

    for (start, end) in clipped {
        if cursor < start {
            out.push(sub(interval, cursor, start));
        }
        cursor = cursor.max(end);
    }

    if cursor < interval.end {
        out.push(sub(interval, cursor, interval.end));
    }

    out
}

fn sub(interval: &Interval, start: Instant, end: Instant) -> Interval {
    Interval::closed(start, end, interval.tags.clone(), interval.annotation.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn inst(s: &str) -> Instant {
        Instant::parse_iso(s, "start").unwrap()
    }

    fn closed(start: &str, end: &str) -> Interval {
        Interval::closed(inst(start), inst(end), BTreeSet::new(), String::new())
    }

    #[test]
    fn no_exclusions_is_identity() {
        let i = closed("2023-01-01T09:00:00Z", "2023-01-01T12:00:00Z");
        let out = flatten(&i, &[]);
        assert_eq!(out, vec![i]);
    }

    #[test]
    fn single_exclusion_in_middle_splits_in_two() {
        let i = closed("2023-01-01T09:00:00Z", "2023-01-01T12:00:00Z");
        let exclusion = closed("2023-01-01T10:00:00Z", "2023-01-01T11:00:00Z");
        let out = flatten(&i, &[exclusion]);
        assert_eq!(
            out,
            vec![
                closed("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z"),
                closed("2023-01-01T11:00:00Z", "2023-01-01T12:00:00Z"),
            ]
        );
    }

    #[test]
    fn exclusion_covering_whole_interval_yields_nothing() {
        let i = closed("2023-01-01T09:00:00Z", "2023-01-01T12:00:00Z");
        let exclusion = closed("2023-01-01T08:00:00Z", "2023-01-01T13:00:00Z");
        assert!(flatten(&i, &[exclusion]).is_empty());
    }

    #[test]
    fn sub_intervals_inherit_tags_and_annotation() {
        let mut i = closed("2023-01-01T09:00:00Z", "2023-01-01T12:00:00Z");
        i.tag("work");
        i.annotation = "note".to_string();
        let exclusion = closed("2023-01-01T10:00:00Z", "2023-01-01T11:00:00Z");
        for out in flatten(&i, &[exclusion]) {
            assert_eq!(out.tags, i.tags);
            assert_eq!(out.annotation, i.annotation);
            assert!(out.id.is_none());
        }
    }

    #[test]
    fn unordered_exclusions_are_sorted_before_walking() {
        let i = closed("2023-01-01T09:00:00Z", "2023-01-01T12:00:00Z");
        let e1 = closed("2023-01-01T11:00:00Z", "2023-01-01T11:30:00Z");
        let e2 = closed("2023-01-01T09:30:00Z", "2023-01-01T10:00:00Z");
        let out = flatten(&i, &[e1, e2]);
        assert_eq!(
            out,
            vec![
                closed("2023-01-01T09:00:00Z", "2023-01-01T09:30:00Z"),
                closed("2023-01-01T10:00:00Z", "2023-01-01T11:00:00Z"),
                closed("2023-01-01T11:30:00Z", "2023-01-01T12:00:00Z"),
            ]
        );
    }
}
