use timew_core::{query, validate, Error, Instant, NoExclusions, ValidateRequest};

use crate::commands::StopArgs;
use crate::session::Session;
use crate::util::parse_instant;

pub fn run(session: &mut Session, args: StopArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let end = match args.at {
        Some(s) => parse_instant(&s)?,
        None => Instant::now(),
    };

    session.in_transaction(|session| {
        let latest = query::get_latest_interval(&mut session.database)?
            .filter(timew_core::Interval::is_open)
            .ok_or_else(|| Error::InvariantViolation("There is no active time tracking.".to_string()))?;

        session.database.delete_interval(latest.clone(), &mut session.journal)?;
        let mut closed = latest;
        closed.end = end;

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
            &mut closed,
        )?;
        session.database.add_interval(closed.clone(), &mut session.journal)?;

        if verbose {
            println!("Recorded {}", closed.dump());
        }
        Ok(())
    })
}
