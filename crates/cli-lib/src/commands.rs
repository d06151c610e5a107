use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "timew")]
#[command(about = "A command-line time tracker", long_about = None, version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Directory holding the `data/` directory and `timewarrior.cfg`.
    /// Defaults to `~/.timewarrior`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Start tracking a new open interval")]
    Start(StartArgs),
    #[command(about = "Close the current open interval")]
    Stop(StopArgs),
    #[command(about = "Record a fully-specified closed interval")]
    Track(TrackArgs),
    #[command(about = "Change the duration of a tracked interval, resolving any new overlaps")]
    Resize(ResizeArgs),
    #[command(about = "List the distinct tags used over a range")]
    Tags(TagsArgs),
    #[command(about = "Delete one or more tracked intervals")]
    Delete(DeleteArgs),
    #[command(about = "Undo the most recent change")]
    Undo,
}

#[derive(Debug, Parser)]
pub struct StartArgs {
    /// ISO-8601 extended timestamp; defaults to now.
    #[arg(long)]
    pub at: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct StopArgs {
    /// ISO-8601 extended timestamp; defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Parser)]
pub struct TrackArgs {
    /// ISO-8601 extended start timestamp.
    pub start: String,
    /// ISO-8601 extended end timestamp.
    pub end: String,
    pub tags: Vec<String>,
    /// Extend the interval to the nearest tracked boundary before checking
    /// for overlaps.
    #[arg(long)]
    pub fill: bool,
    /// Resolve overlaps by trimming or splitting the conflicting intervals
    /// instead of rejecting the command.
    #[arg(long)]
    pub adjust: bool,
}

#[derive(Debug, Parser)]
pub struct ResizeArgs {
    /// One or more `@ID` references.
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Signed duration, e.g. `1h30m`, `-15m`, `45s`.
    pub duration: String,
}

#[derive(Debug, Parser)]
pub struct TagsArgs {
    /// ISO-8601 extended start of the range; omit for unbounded.
    #[arg(long)]
    pub from: Option<String>,
    /// ISO-8601 extended end of the range; omit for unbounded.
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// One or more `@ID` references.
    #[arg(required = true)]
    pub ids: Vec<String>,
}
