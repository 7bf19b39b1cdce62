//! nodefix - remap outdated node class identifiers in workflow files

use std::process::ExitCode;

use nodefix::cli;

fn main() -> ExitCode {
    cli::run()
}
