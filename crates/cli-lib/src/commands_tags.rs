use std::collections::BTreeSet;

use timew_core::{query, Filter, Instant};

use crate::commands::TagsArgs;
use crate::session::Session;
use crate::util::parse_instant;

/// Grounded on the original tags command: the distinct tag set over tracked
/// intervals in a range (no color, no description table).
pub fn run(session: &mut Session, args: TagsArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let start = match &args.from {
        Some(s) => parse_instant(s)?,
        None => Instant::ZERO,
    };
    let end = match &args.to {
        Some(s) => parse_instant(s)?,
        None => Instant::ZERO,
    };

    let filter = Filter::in_range(start, end);
    let tracked = query::get_tracked(&mut session.database, &session.rules, &filter)
        .map_err(|e| e.to_string())?;

    let mut tags = BTreeSet::new();
    for interval in &tracked {
        tags.extend(interval.tags.iter().cloned());
    }

    if tags.is_empty() {
        if verbose {
            println!("No data found.");
        }
    } else {
        for tag in &tags {
            println!("{tag}");
        }
    }
    Ok(())
}
