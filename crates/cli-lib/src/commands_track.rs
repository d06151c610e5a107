use std::collections::BTreeSet;

use timew_core::{validate, Interval, NoExclusions, ValidateRequest};

use crate::commands::TrackArgs;
use crate::session::Session;
use crate::util::parse_instant;

pub fn run(session: &mut Session, args: TrackArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let start = parse_instant(&args.start)?;
    let end = parse_instant(&args.end)?;
    let tags: BTreeSet<String> = args.tags.into_iter().collect();
    let request = ValidateRequest {
        fill: args.fill,
        adjust: args.adjust,
    };

    session.in_transaction(|session| {
        let mut interval = Interval::closed(start, end, tags, String::new());
        validate(
            request,
            &session.rules,
            &mut session.database,
            &mut session.journal,
            &NoExclusions,
            &mut interval,
        )?;
        session.database.add_interval(interval.clone(), &mut session.journal)?;
        if verbose {
            println!("Recorded {}", interval.dump());
        }
        Ok(())
    })
}
