#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    todoboard::cli::main()
}
