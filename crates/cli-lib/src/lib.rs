use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser as _;

use crate::commands::{Cli, Commands};
use crate::session::Session;

mod commands;
mod commands_delete;
mod commands_resize;
mod commands_start;
mod commands_stop;
mod commands_tags;
mod commands_track;
mod commands_undo;
mod logger;
mod session;
mod util;

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let _ = logger::init();
    let cli = Cli::parse_from(args);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let mut session = match Session::open(data_dir) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let result = match cli.command {
        Commands::Start(args) => commands_start::run(&mut session, args),
        Commands::Stop(args) => commands_stop::run(&mut session, args),
        Commands::Track(args) => commands_track::run(&mut session, args),
        Commands::Resize(args) => commands_resize::run(&mut session, args),
        Commands::Tags(args) => commands_tags::run(&mut session, args),
        Commands::Delete(args) => commands_delete::run(&mut session, args),
        Commands::Undo => commands_undo::run(&mut session),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".timewarrior")
}
