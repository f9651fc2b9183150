use std::process::ExitCode;

fn main() -> ExitCode {
    shopguide_cli::run()
}
