//! The `:fill`/`:adjust` overlap-resolution pipeline a command runs over an
//! interval before committing it, grounded directly on the original
//! `autoFill`/`autoAdjust` pair.

use crate::database::Database;
use crate::error::{Error, Result};
use crate::exclusion::ExclusionProvider;
use crate::filter::Filter;
use crate::flatten::flatten;
use crate::interval::Interval;
use crate::journal::Journal;
use crate::query::{get_latest_interval, get_tracked};
use crate::rules::Rules;

/// The two CLI hints that gate validation behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateRequest {
    pub fill: bool,
    pub adjust: bool,
}

/// Runs `:fill` (if requested) then `:adjust`. Mutations this makes to
/// `database`/`journal` along the way (flattening the currently-open
/// interval, trimming/splitting overlaps) are NOT rolled back on an
/// `Error::Overlap` return — the caller must discard the whole in-memory
/// `Database`/`Journal` (never calling `flush`/`end_transaction`) if it
/// wants the attempt to have no effect, exactly as the original one-
/// invocation-per-process CLI does.
pub fn validate(
    request: ValidateRequest,
    rules: &Rules,
    database: &mut Database,
    journal: &mut Journal,
    exclusions: &dyn ExclusionProvider,
    interval: &mut Interval,
) -> Result<bool> {
    if request.fill {
        auto_fill(rules, database, interval)?;
    }
    auto_adjust(request.adjust, rules, database, journal, exclusions, interval)
}

/// Extends `interval` backwards and (if closed) forwards to the nearest
/// tracked boundary, without crossing into any other recorded interval.
fn auto_fill(rules: &Rules, database: &mut Database, interval: &mut Interval) -> Result<()> {
    let verbose = rules.get_bool("verbose", false);
    let tracked = get_tracked(database, rules, &Filter::unbounded())?;

    for earlier in tracked.iter().rev() {
        if !earlier.is_open() && earlier.end <= interval.start {
            interval.start = earlier.end;
            if verbose {
                log::info!(
                    "Backfilled {}to {}",
                    interval.id.map(|id| format!("@{id} ")).unwrap_or_default(),
                    interval.start
                );
            }
            break;
        }
    }

    if !interval.is_open() {
        for later in &tracked {
            if interval.end <= later.start {
                interval.end = later.start;
                if verbose {
                    log::info!(
                        "Filled {}to {}",
                        interval.id.map(|id| format!("@{id} ")).unwrap_or_default(),
                        interval.end
                    );
                }
                break;
            }
        }
    }

    Ok(())
}

fn auto_adjust(
    adjust: bool,
    rules: &Rules,
    database: &mut Database,
    journal: &mut Journal,
    exclusions: &dyn ExclusionProvider,
    interval: &mut Interval,
) -> Result<bool> {
    let verbose = rules.get_bool("verbose", false);

    // Flattening the open interval never needs the :adjust hint: it isn't
    // an overlap, it's the natural consequence of starting a new one.
    if let Some(latest) = get_latest_interval(database)? {
        if interval.is_open() && latest.encloses(interval) {
            if latest.tags == interval.tags {
                return Ok(false);
            }

            database.delete_interval(latest.clone(), journal)?;
            let mut closed_latest = latest;
            closed_latest.end = interval.start;

            let excl = exclusions.exclusions(closed_latest.start, closed_latest.end);
            for piece in flatten(&closed_latest, &excl) {
                if piece.is_empty() {
                    continue;
                }
                if verbose {
                    log::info!("{}", piece.dump());
                }
                database.add_interval(piece, journal)?;
            }
        }
    }

    let overlaps_filter = Filter::in_range(interval.start, interval.end);
    let overlaps = get_tracked(database, rules, &overlaps_filter)?;

    if overlaps.is_empty() {
        return Ok(true);
    }

    log::debug!("Input         {}", interval.dump());
    log::debug!("Overlaps with");
    for overlap in &overlaps {
        log::debug!("              {}", overlap.dump());
    }

    if !adjust {
        return Err(Error::Overlap);
    }

    for overlap in overlaps {
        let start_within = interval.starts_within(&overlap);
        let end_within = interval.ends_within(&overlap);

        if start_within && !end_within {
            let mut modified = overlap.clone();
            modified.end = interval.start;
            replace_or_delete(database, journal, overlap, modified)?;
        } else if !start_within && end_within {
            let mut modified = overlap.clone();
            modified.start = interval.end;
            replace_or_delete(database, journal, overlap, modified)?;
        } else if !start_within && !end_within {
            database.delete_interval(overlap, journal)?;
        } else {
            let mut split1 = overlap.clone();
            let mut split2 = overlap.clone();
            split1.end = interval.start;
            split2.start = interval.end;

            replace_or_delete(database, journal, overlap, split1)?;
            if !split2.is_empty() {
                database.add_interval(split2, journal)?;
            }
        }
    }

    Ok(true)
}

fn replace_or_delete(
    database: &mut Database,
    journal: &mut Journal,
    original: Interval,
    modified: Interval,
) -> Result<()> {
    if modified.is_empty() {
        database.delete_interval(original, journal)
    } else {
        database.modify_interval(original, modified, journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::NoExclusions;
    use crate::time::Instant;
    use std::collections::BTreeSet;

    fn inst(s: &str) -> Instant {
        Instant::parse_iso(s, "start").unwrap()
    }

    fn closed(start: &str, end: &str, tag: &str) -> Interval {
        let tags: BTreeSet<String> = [tag.to_string()].into_iter().collect();
        Interval::closed(inst(start), inst(end), tags, String::new())
    }

    fn setup() -> (tempfile::TempDir, Database, Journal, Rules) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().to_path_buf()).unwrap();
        let journal = Journal::open(dir.path().join("data/undo.data")).unwrap();
        (dir, db, journal, Rules::empty())
    }

    #[test]
    fn fill_extends_to_nearest_tracked_boundary() {
        let (_dir, mut db, mut journal, rules) = setup();
        journal.start_transaction().unwrap();
        db.add_interval(closed("2023-01-01T09:00:00Z", "2023-01-01T10:00:00Z", "a"), &mut journal)
            .unwrap();
        db.add_interval(closed("2023-01-01T12:00:00Z", "2023-01-01T13:00:00Z", "b"), &mut journal)
            .unwrap();
        journal.end_transaction().unwrap();

        let mut gap = closed("2023-01-01T10:30:00Z", "2023-01-01T11:30:00Z", "c");
        journal.start_transaction().unwrap();
        let request = ValidateRequest { fill: true, adjust: false };
        validate(request, &rules, &mut db, &mut journal, &NoExclusions, &mut gap).unwrap();

        assert_eq!(gap.start, inst("2023-01-01T10:00:00Z"));
        assert_eq!(gap.end, inst("2023-01-01T12:00:00Z"));
    }

    #[test]
    fn overlap_without_adjust_is_rejected() {
        let (_dir, mut db, mut journal, rules) = setup();
        journal.start_transaction().unwrap();
        db.add_interval(closed("2023-01-01T09:00:00Z", "2023-01-01T11:00:00Z", "a"), &mut journal)
            .unwrap();
        journal.end_transaction().unwrap();

        let mut overlapping = closed("2023-01-01T10:00:00Z", "2023-01-01T12:00:00Z", "b");
        journal.start_transaction().unwrap();
        let request = ValidateRequest { fill: false, adjust: false };
        let err = validate(request, &rules, &mut db, &mut journal, &NoExclusions, &mut overlapping)
            .unwrap_err();
        assert!(matches!(err, Error::Overlap));
    }

    #[test]
    fn adjust_trims_the_existing_intervals_end() {
        let (_dir, mut db, mut journal, rules) = setup();
        journal.start_transaction().unwrap();
        db.add_interval(closed("2023-01-01T09:00:00Z", "2023-01-01T11:00:00Z", "a"), &mut journal)
            .unwrap();
        journal.end_transaction().unwrap();

        let mut overlapping = closed("2023-01-01T10:00:00Z", "2023-01-01T12:00:00Z", "b");
        journal.start_transaction().unwrap();
        let request = ValidateRequest { fill: false, adjust: true };
        validate(request, &rules, &mut db, &mut journal, &NoExclusions, &mut overlapping).unwrap();
        database_add_new_interval_for_test(&mut db, &mut journal, &overlapping);
        journal.end_transaction().unwrap();

        let all = db.get_all_intervals().unwrap();
        let trimmed = all.iter().find(|i| i.has_tag("a")).unwrap();
        assert_eq!(trimmed.end, inst("2023-01-01T10:00:00Z"));
    }

    fn database_add_new_interval_for_test(db: &mut Database, journal: &mut Journal, interval: &Interval) {
        db.add_interval(interval.clone(), journal).unwrap();
    }

    #[test]
    fn adjust_splits_an_enclosing_interval() {
        let (_dir, mut db, mut journal, rules) = setup();
        journal.start_transaction().unwrap();
        db.add_interval(closed("2023-01-01T09:00:00Z", "2023-01-01T13:00:00Z", "a"), &mut journal)
            .unwrap();
        journal.end_transaction().unwrap();

        let mut inner = closed("2023-01-01T10:00:00Z", "2023-01-01T11:00:00Z", "b");
        journal.start_transaction().unwrap();
        let request = ValidateRequest { fill: false, adjust: true };
        validate(request, &rules, &mut db, &mut journal, &NoExclusions, &mut inner).unwrap();
        db.add_interval(inner.clone(), &mut journal).unwrap();
        journal.end_transaction().unwrap();

        let all = db.get_all_intervals().unwrap();
        let a_pieces: Vec<_> = all.iter().filter(|i| i.has_tag("a")).collect();
        assert_eq!(a_pieces.len(), 2);
        assert!(a_pieces.iter().any(|i| i.end == inst("2023-01-01T10:00:00Z")));
        assert!(a_pieces.iter().any(|i| i.start == inst("2023-01-01T11:00:00Z")));
    }

    #[test]
    fn open_interval_enclosing_new_one_with_same_tags_is_noop() {
        let (_dir, mut db, mut journal, rules) = setup();
        journal.start_transaction().unwrap();
        let tags: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        db.add_interval(Interval::open(inst("2023-01-01T09:00:00Z"), tags.clone(), String::new()), &mut journal)
            .unwrap();
        journal.end_transaction().unwrap();

        let mut fresh = Interval::open(inst("2023-01-01T09:30:00Z"), tags, String::new());
        journal.start_transaction().unwrap();
        let request = ValidateRequest { fill: false, adjust: false };
        let proceed = validate(request, &rules, &mut db, &mut journal, &NoExclusions, &mut fresh).unwrap();
        journal.rollback();

        assert!(!proceed);
        assert_eq!(db.get_all_intervals().unwrap().len(), 1);
    }
}
