pub fn main() {
    std::process::exit(timew_cli_lib::run_with_args(std::env::args_os()));
}
