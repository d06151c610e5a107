use std::collections::BTreeSet;

use timew_core::{query, Error, Filter};

use crate::commands::DeleteArgs;
use crate::session::Session;
use crate::util::parse_ids;

pub fn run(session: &mut Session, args: DeleteArgs) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);
    let ids = parse_ids(&args.ids)?;

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
            session.database.delete_interval(interval, &mut session.journal)?;
            if verbose {
                println!("Deleted @{id}");
            }
        }
        Ok(())
    })
}
