use std::path::PathBuf;

use timew_core::{Database, Error, Journal, JournalOp, Rules};

use crate::util::fmt_err;

/// The open storage handles a single command invocation needs: the engine
/// owns no notion of "the current command", so this is where that lives.
pub struct Session {
    pub database: Database,
    pub journal: Journal,
    pub rules: Rules,
}

impl Session {
    pub fn open(data_dir: PathBuf) -> std::result::Result<Session, String> {
        let mut database = Database::open(data_dir.clone()).map_err(fmt_err)?;

        let undo_path = data_dir.join("data").join("undo.data");
        let journal = match Journal::open(undo_path.clone()) {
            Ok(journal) => journal,
            Err(Error::JournalOpenTransaction { .. }) => {
                log::warn!(
                    "journal at {} has an unterminated transaction; repairing",
                    undo_path.display()
                );
                let mut journal = Journal::open_for_repair(undo_path);
                journal
                    .repair(|op| apply_reverse(&mut database, op))
                    .map_err(fmt_err)?;
                database.flush().map_err(fmt_err)?;
                journal
            }
            Err(e) => return Err(fmt_err(e)),
        };

        let rules = Rules::load(&data_dir.join("timewarrior.cfg")).map_err(fmt_err)?;

        Ok(Session {
            database,
            journal,
            rules,
        })
    }

    /// Brackets `body` in a journal transaction: on success, flushes the
    /// datafiles and closes the transaction; on failure, rolls the pending
    /// transaction back and surfaces the error. Mirrors the
    /// `journal.startTransaction(); ...; journal.endTransaction();` shape
    /// every mutating command uses.
    pub fn in_transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Session) -> timew_core::Result<T>,
    ) -> std::result::Result<T, String> {
        self.journal.start_transaction().map_err(fmt_err)?;
        match body(self) {
            Ok(value) => {
                self.database.flush().map_err(fmt_err)?;
                self.journal.end_transaction().map_err(fmt_err)?;
                Ok(value)
            }
            Err(e) => {
                self.journal.rollback();
                Err(fmt_err(e))
            }
        }
    }
}

/// Applies `op` as its own reversal: the same replay `Journal::undo`'s
/// callback performs, reused for crash-recovery `repair`.
pub fn apply_reverse(database: &mut Database, op: &JournalOp) -> timew_core::Result<()> {
    match op {
        JournalOp::Create { created } => database.delete_interval_raw(created),
        JournalOp::Delete { deleted } => database.add_interval_raw(deleted),
        JournalOp::Update { before, after } => {
            database.delete_interval_raw(after)?;
            database.add_interval_raw(before)
        }
    }
}
