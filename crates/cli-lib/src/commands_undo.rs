use crate::session::{apply_reverse, Session};

pub fn run(session: &mut Session) -> Result<(), String> {
    let verbose = session.rules.get_bool("verbose", false);

    let Session { database, journal, .. } = session;
    let had_transaction = journal
        .undo(|op| apply_reverse(database, op))
        .map_err(|e| e.to_string())?;

    if had_transaction {
        database.flush().map_err(|e| e.to_string())?;
        if verbose {
            println!("Undone.");
        }
    } else if verbose {
        println!("Nothing to undo.");
    }
    Ok(())
}
