use std::process::ExitCode;

fn main() -> ExitCode {
    custodia_cli::run()
}
