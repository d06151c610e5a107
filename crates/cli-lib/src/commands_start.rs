use std::collections::BTreeSet;

use timew_core::{validate, Instant, Interval, NoExclusions, ValidateRequest};

use crate::commands::StartArgs;
use crate::session::Session;
use crate::util::parse_instant;

pub fn run(session: &mut Session, args: StartArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let start = match args.at {
        Some(s) => parse_instant(&s)?,
        None => Instant::now(),
    };
    let tags: BTreeSet<String> = args.tags.into_iter().collect();

    session.in_transaction(|session| {
        let mut interval = Interval::open(start, tags, String::new());
        let request = ValidateRequest {
            fill: false,
            adjust: false,
        };
        let proceed = validate(
            request,
            &session.rules,
            &mut session.database,
            &mut session.journal,
            &NoExclusions,
            &mut interval,
        )?;

        if proceed {
            session.database.add_interval(interval.clone(), &mut session.journal)?;
            if verbose {
                println!("Tracking {}", interval.dump());
            }
        } else if verbose {
            println!("Already tracking those tags.");
        }
        Ok(())
    })
}
