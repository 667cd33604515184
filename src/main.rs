use std::process::ExitCode;

mod command_line;

fn main() -> ExitCode {
    command_line::cli::run()
}
