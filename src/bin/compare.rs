use std::process::ExitCode;

fn main() -> ExitCode {
    parpath::cli::run_comparison()
}
