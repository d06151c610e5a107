use std::path::PathBuf;

/// The error taxonomy of the storage engine (spec §7).
///
/// Every fallible operation in this crate returns one of these variants;
/// nothing in the core panics on a user-triggerable condition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}:{line}: malformed {field}: {detail}")]
    Parse {
        path: PathBuf,
        line: usize,
        field: &'static str,
        detail: String,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("You cannot overlap intervals. Correct the start/end time, or specify the :adjust hint.")]
    Overlap,

    #[error("ID '@{0}' does not correspond to any tracking.")]
    NotFound(u64),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "the journal at {path} has an unterminated transaction; run repair before writing again"
    )]
    JournalOpenTransaction { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
