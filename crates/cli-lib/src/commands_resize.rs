use std::collections::BTreeSet;

use timew_core::{query, validate, Error, Filter, Instant, NoExclusions, ValidateRequest};

use crate::commands::ResizeArgs;
use crate::session::Session;
use crate::util::{parse_duration_secs, parse_ids};

/// Grounded directly on the original resize command: delete, set `end` to
/// `start + duration`, re-validate, re-add.
pub fn run(session: &mut Session, args: ResizeArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let ids = parse_ids(&args.ids)?;
    let delta = parse_duration_secs(&args.duration)?;

    session.in_transaction(|session| {
        let id_set: BTreeSet<u64> = ids.iter().copied().collect();
        let filter = Filter::AllWithIds(id_set);
        let tracked = query::get_tracked(&mut session.database, &session.rules, &filter)?;

        for id in &ids {
            if !tracked.iter().any(|i| i.id == Some(*id)) {
                return Err(Error::NotFound(*id));
            }
        }

        for interval in tracked {
            let id = interval.id.unwrap_or_default();
            if interval.is_open() {
                return Err(Error::InvariantViolation(format!(
                    "cannot resize open interval @{id}"
                )));
            }

            session.database.delete_interval(interval.clone(), &mut session.journal)?;
            let mut resized = interval;
            resized.end = Instant(resized.start.0 + delta);
            if resized.end <= resized.start {
                return Err(Error::InvariantViolation(format!(
                    "resizing @{id} would make it end before it starts"
                )));
            }

            let request = ValidateRequest {
                fill: false,
                adjust: false,
            };
            validate(
                request,
                &session.rules,
                &mut session.database,
                &mut session.journal,
                &NoExclusions,
                &mut resized,
            )?;
            session.database.add_interval(resized.clone(), &mut session.journal)?;

            if verbose {
                println!("Resized @{id} by {delta}s");
            }
        }

        Ok(())
    })
}
