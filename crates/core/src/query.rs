//! Read-only entry points over a `Database`, kept separate from the
//! mutating methods so the validator reads through the same surface a
//! reporting command would.

use crate::database::Database;
use crate::error::Result;
use crate::exclusion::ExclusionProvider;
use crate::filter::Filter;
use crate::interval::Interval;
use crate::rules::Rules;
use crate::time::Instant;

/// The most recent interval in the database: the open one if any exists
/// (it is always latest by the invariant), otherwise the closed interval
/// with the greatest start.
pub fn get_latest_interval(database: &mut Database) -> Result<Option<Interval>> {
    Ok(database.get_all_intervals()?.into_iter().next_back())
}

/// All intervals matching `filter`. `rules` is accepted for parity with the
/// original two-argument call shape; no rule currently alters the scan.
pub fn get_tracked(database: &mut Database, _rules: &Rules, filter: &Filter) -> Result<Vec<Interval>> {
    database.iter_filtered(filter)
}

/// All exclusion intervals intersecting `[start, end)`, as reported by
/// whatever calendar the caller's rules describe.
pub fn get_all_exclusions(
    provider: &dyn ExclusionProvider,
    start: Instant,
    end: Instant,
) -> Vec<Interval> {
    provider.exclusions(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use std::collections::BTreeSet;

    fn inst(s: &str) -> Instant {
        Instant::parse_iso(s, "start").unwrap()
    }

    #[test]
    fn latest_interval_is_the_open_one_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path().to_path_buf()).unwrap();
        let mut journal = Journal::open(dir.path().join("data/undo.data")).unwrap();

        journal.start_transaction().unwrap();
        db.add_interval(
            Interval::closed(
                inst("2023-01-01T09:00:00Z"),
                inst("2023-01-01T10:00:00Z"),
                BTreeSet::new(),
                String::new(),
            ),
            &mut journal,
        )
        .unwrap();
        db.add_interval(
            Interval::open(inst("2023-01-02T09:00:00Z"), BTreeSet::new(), String::new()),
            &mut journal,
        )
        .unwrap();
        journal.end_transaction().unwrap();

        let latest = get_latest_interval(&mut db).unwrap().unwrap();
        assert!(latest.is_open());
    }

    #[test]
    fn latest_interval_is_none_when_database_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path().to_path_buf()).unwrap();
        assert!(get_latest_interval(&mut db).unwrap().is_none());
    }
}
